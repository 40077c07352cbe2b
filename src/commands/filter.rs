use anyhow::{Context as _, Result};
use clap::Args;
use tripfind::{OfflineOracle, SearchFilters, Season, TripSearch, TripType};

use super::{Context, OutputOptions, render};

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
   /// Highest price in USD, inclusive
   #[arg(long)]
   pub max_price: Option<f64>,

   #[arg(long)]
   pub min_price: Option<f64>,

   /// Longest trip in days, inclusive
   #[arg(long)]
   pub max_days: Option<u32>,

   #[arg(long)]
   pub min_days: Option<u32>,

   #[arg(long = "destination")]
   pub destinations: Vec<String>,

   #[arg(long = "type")]
   pub types: Vec<TripType>,

   /// Year-round trips match every season
   #[arg(long = "season")]
   pub seasons: Vec<Season>,

   #[arg(long = "activity")]
   pub activities: Vec<String>,

   #[arg(long = "keyword")]
   pub keywords: Vec<String>,
}

impl FilterArgs {
   /// Repeated flags OR together; omitted flags place no constraint.
   pub fn into_filters(self) -> SearchFilters {
      fn list<T>(v: Vec<T>) -> Option<Vec<T>> {
         (!v.is_empty()).then_some(v)
      }

      SearchFilters {
         max_price:    self.max_price,
         min_price:    self.min_price,
         max_duration: self.max_days,
         min_duration: self.min_days,
         destinations: list(self.destinations),
         types:        list(self.types),
         seasons:      list(self.seasons),
         activities:   list(self.activities),
         keywords:     list(self.keywords),
      }
      .normalize()
   }
}

pub fn execute(ctx: &Context, args: FilterArgs, options: OutputOptions) -> Result<()> {
   let filters = args.into_filters();
   filters.validate().context("invalid filter flags")?;

   let search = TripSearch::new(ctx.catalog.clone(), OfflineOracle);
   let trips = search.apply_filters(&filters);

   if options.json {
      return render::trips_json(&trips, Some(&filters));
   }

   let count = filters.active_count();
   render::header(
      &format!("{} trips, {count} active filter{}", trips.len(), if count == 1 { "" } else { "s" }),
      options,
   );
   render::chips(&filters, options);
   render::trips(&trips, options);
   Ok(())
}
