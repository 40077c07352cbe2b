use anyhow::Result;
use console::style;
use serde::Serialize;
use tripfind::{NO_MATCH_HINT, SearchFilters, SearchResult, Trip, types::format_amount};

use super::OutputOptions;

#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
   #[serde(skip_serializing_if = "Option::is_none")]
   filters: Option<&'a SearchFilters>,
   trips:   &'a [Trip],
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
   println!("{}", serde_json::to_string_pretty(value)?);
   Ok(())
}

pub fn trips_json(trips: &[Trip], filters: Option<&SearchFilters>) -> Result<()> {
   print_json(&JsonOutput { filters, trips })
}

pub fn header(text: &str, options: OutputOptions) {
   if options.plain {
      println!("\n{text}");
   } else {
      println!("\n{}", style(text).bold());
   }
}

pub fn dim(text: &str, options: OutputOptions) {
   if options.plain {
      println!("{text}");
   } else {
      println!("{}", style(text).dim());
   }
}

/// One chip per active filter, in display order.
pub fn chips(filters: &SearchFilters, options: OutputOptions) {
   let labels = filters.labels();
   if labels.is_empty() {
      return;
   }

   let line = labels
      .iter()
      .map(|l| {
         if options.plain {
            format!("[{}]", l.text)
         } else {
            style(format!("[{}]", l.text)).yellow().to_string()
         }
      })
      .collect::<Vec<_>>()
      .join(" ");
   println!("Filters: {line}");
}

pub fn trips(trips: &[Trip], options: OutputOptions) {
   if trips.is_empty() {
      println!();
      dim(NO_MATCH_HINT, options);
      return;
   }

   println!();
   for (i, trip) in trips.iter().enumerate() {
      let facts = format!(
         "${} · {} days · {} · {}",
         format_amount(trip.price),
         trip.duration,
         trip.trip_type,
         trip.season
      );

      if options.plain {
         println!("{}. {} ({})", i + 1, trip.name, trip.destination);
         println!("   {facts}");
         println!("   {}", trip.activities.join(", "));
      } else {
         print!("{} ", style(format!("{}.", i + 1)).bold().cyan());
         print!("{}", style(&trip.name).green());
         println!(" {}", style(format!("({})", trip.destination)).dim());
         println!("   {facts}");
         println!("   {}", style(trip.activities.join(", ")).dim());
      }
   }
   println!();
}

pub fn result(query: &str, result: &SearchResult, options: OutputOptions) {
   header(&format!("Results for: {query}"), options);
   if !result.explanation.is_empty() {
      dim(&result.explanation, options);
   }
   if let Some(error) = &result.error {
      if options.plain {
         println!("warning: {error}");
      } else {
         println!("{} {error}", style("warning:").yellow().bold());
      }
   }
   chips(&result.filters, options);
   if result.is_empty() {
      println!();
      dim(NO_MATCH_HINT, options);
   } else {
      trips(&result.trips, options);
   }
}
