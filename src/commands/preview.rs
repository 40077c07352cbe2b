use anyhow::Result;
use tripfind::{OfflineOracle, TripSearch, parser};

use super::{Context, OutputOptions, render};

/// Rule-based results only; the interpreter is never contacted.
pub fn execute(ctx: &Context, query: &str, options: OutputOptions) -> Result<()> {
   let search = TripSearch::new(ctx.catalog.clone(), OfflineOracle);
   let filters = parser::parse(query);
   let trips = search.preview_sync(query);

   if options.json {
      return render::trips_json(&trips, Some(&filters));
   }

   render::header(&format!("Preview for: {query}"), options);
   render::chips(&filters, options);
   render::trips(&trips, options);
   Ok(())
}
