//! Grounding context sent to the oracle.
//!
//! The context is built once per catalog: schema, allowed values, every trip
//! serialized as text, a few derived facts, the output format and five worked
//! examples. Only the query line changes between requests.

use std::fmt::Write;

use serde_json::{Value, json};

use crate::{
   catalog::Catalog,
   parser::DESTINATION_KEYWORDS,
   types::{Season, TripType, format_amount},
};

pub const SYSTEM_PROMPT: &str =
   "You are a travel search query parser. Always respond with valid JSON only.";

const OUTPUT_FORMAT: &str = r#"{
  "filters": {
    "maxPrice": number | null,
    "minPrice": number | null,
    "maxDuration": integer | null,
    "minDuration": integer | null,
    "destinations": string[] | null,
    "types": string[] | null,
    "seasons": string[] | null,
    "activities": string[] | null,
    "keywords": string[] | null
  },
  "explanation": "Brief explanation of how you interpreted the query"
}"#;

/// Worked examples steering the oracle toward the exact output schema.
pub fn few_shot_examples() -> Vec<(&'static str, Value)> {
   vec![
      (
         "Show me safaris under $3,000",
         json!({
            "filters": { "types": ["wildlife"], "maxPrice": 3000 },
            "explanation": "Filtering wildlife/safari trips under $3,000"
         }),
      ),
      (
         "Luxury trips in Asia",
         json!({
            "filters": { "types": ["luxury"], "destinations": ["Japan", "Maldives", "Indonesia"] },
            "explanation": "Filtering luxury trips in Asian destinations"
         }),
      ),
      (
         "Adventures longer than 10 days",
         json!({
            "filters": { "types": ["adventure"], "minDuration": 10 },
            "explanation": "Filtering adventure trips longer than 10 days"
         }),
      ),
      (
         "Beach destinations for summer",
         json!({
            "filters": { "types": ["beach"], "seasons": ["summer", "year-round"] },
            "explanation": "Filtering beach trips suitable for summer travel"
         }),
      ),
      (
         "Cultural experiences in Europe",
         json!({
            "filters": { "types": ["cultural"], "destinations": ["Switzerland", "Greece", "Iceland"] },
            "explanation": "Filtering cultural trips in European destinations"
         }),
      ),
   ]
}

fn join<T: ToString>(items: impl IntoIterator<Item = T>, sep: &str) -> String {
   items
      .into_iter()
      .map(|i| i.to_string())
      .collect::<Vec<_>>()
      .join(sep)
}

/// Everything in the user prompt except the query itself.
pub fn grounding_context(catalog: &Catalog) -> String {
   let mut out = String::with_capacity(8 * 1024);

   out.push_str(
      "You are a travel search assistant. You have access to a trips database with the following structure:\n\n",
   );
   out.push_str("TRIPS TABLE:\n");
   out.push_str("- id: string (unique identifier)\n");
   out.push_str("- name: string (trip title)\n");
   out.push_str("- destination: string (country/location)\n");
   out.push_str("- price: number (USD price)\n");
   out.push_str("- duration: number (days)\n");
   let _ = writeln!(out, "- type: {}", join(TripType::ALL.map(|t| format!("'{t}'")), " | "));
   let _ = writeln!(out, "- season: {}", join(Season::ALL.map(|s| format!("'{s}'")), " | "));
   out.push_str("- activities: string[] (array of activities)\n");
   out.push_str("- description: string (detailed description)\n\n");

   out.push_str("Available trips data:\n");
   for trip in catalog.iter() {
      let _ = write!(
         out,
         "\nID: {}\nName: {}\nDestination: {}\nPrice: ${}\nDuration: {} days\nType: {}\nSeason: {}\nActivities: {}\nDescription: {}\n",
         trip.id,
         trip.name,
         trip.destination,
         format_amount(trip.price),
         trip.duration,
         trip.trip_type,
         trip.season,
         trip.activities.join(", "),
         trip.description,
      );
   }

   out.push_str("\nKey data for filtering:\n");
   for (region, countries) in DESTINATION_KEYWORDS.iter().filter(|(_, c)| c.len() > 1) {
      let listed: Vec<String> = countries
         .iter()
         .filter_map(|country| {
            catalog
               .iter()
               .find(|t| t.destination.eq_ignore_ascii_case(country))
               .map(|t| format!("{country} (${})", format_amount(t.price)))
         })
         .collect();
      if !listed.is_empty() {
         let _ = writeln!(out, "- {region} destinations: {}", listed.join(", "));
      }
   }
   if let (Some(lo), Some(hi)) = (
      catalog.iter().map(|t| t.price).min_by(f64::total_cmp),
      catalog.iter().map(|t| t.price).max_by(f64::total_cmp),
   ) {
      let _ = writeln!(out, "- Price range: ${} - ${}", format_amount(lo), format_amount(hi));
   }
   if let (Some(lo), Some(hi)) = (
      catalog.iter().map(|t| t.duration).min(),
      catalog.iter().map(|t| t.duration).max(),
   ) {
      let _ = writeln!(out, "- Duration range: {lo} - {hi} days");
   }
   let _ = writeln!(out, "- Trip types: {}", join(TripType::ALL, ", "));
   out.push_str("- Year-round trips qualify for every season\n\n");

   out.push_str(
      "Your task is to analyze the user's natural language query and return a JSON object with filtering criteria.\n",
   );
   out.push_str("Return ONLY valid JSON in this exact format:\n");
   out.push_str(OUTPUT_FORMAT);
   out.push_str("\nOmit a field (or set it to null) when the query places no constraint on it.\n\n");

   out.push_str("Few-shot examples:\n");
   let examples = few_shot_examples();
   for (i, (query, response)) in examples.iter().enumerate() {
      if i > 0 {
         out.push('\n');
      }
      let _ = writeln!(out, "Query: \"{query}\"\nResponse: {response}");
   }

   out
}

/// Appends the query to a prebuilt context.
pub fn render(context: &str, query: &str) -> String {
   format!(
      "{context}\nNow parse this query:\nQuery: \"{query}\"\n\nRemember to return ONLY valid JSON in the specified format."
   )
}
