//! Rule-based query parsing.
//!
//! Used as the fallback when the semantic interpreter fails and for instant
//! previews. Every rule is independent: a rule that does not match leaves its
//! field unset, so parsing never fails.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{SearchFilters, Season, TripType};

static MAX_PRICE: Lazy<Regex> = Lazy::new(|| {
   Regex::new(r"(?:under|below|less than|<)\s*\$?(\d+(?:,\d+)*)(\s*days?\b)?").unwrap()
});

static MIN_PRICE: Lazy<Regex> = Lazy::new(|| {
   Regex::new(r"(?:over|above|more than|>)\s*\$?(\d+(?:,\d+)*)(\s*days?\b)?").unwrap()
});

static MAX_DURATION: Lazy<Regex> =
   Lazy::new(|| Regex::new(r"(?:under|below|less than|shorter than)\s*(\d+)\s*days?").unwrap());

static MIN_DURATION: Lazy<Regex> =
   Lazy::new(|| Regex::new(r"(?:over|above|more than|longer than)\s*(\d+)\s*days?").unwrap());

/// Keyword → trip types. Table order decides ties: the first entry found
/// anywhere in the query wins.
pub const TYPE_KEYWORDS: &[(&str, &[TripType])] = &[
   ("safari", &[TripType::Wildlife]),
   ("adventure", &[TripType::Adventure]),
   ("luxury", &[TripType::Luxury]),
   ("cultural", &[TripType::Cultural]),
   ("culture", &[TripType::Cultural]),
   ("beach", &[TripType::Beach]),
   ("mountain", &[TripType::Mountain]),
   ("wellness", &[TripType::Wellness]),
   ("wildlife", &[TripType::Wildlife]),
];

/// Keyword → destinations. Regions expand to their member countries. Same
/// first-entry-wins rule as [`TYPE_KEYWORDS`].
pub const DESTINATION_KEYWORDS: &[(&str, &[&str])] = &[
   ("asia", &["Japan", "Maldives", "Indonesia"]),
   ("europe", &["Switzerland", "Greece", "Iceland"]),
   ("africa", &["Kenya", "Morocco"]),
   ("japan", &["Japan"]),
   ("maldives", &["Maldives"]),
   ("indonesia", &["Indonesia"]),
   ("switzerland", &["Switzerland"]),
   ("greece", &["Greece"]),
   ("iceland", &["Iceland"]),
   ("kenya", &["Kenya"]),
   ("morocco", &["Morocco"]),
   ("argentina", &["Argentina"]),
   ("bali", &["Indonesia"]),
   ("patagonia", &["Argentina"]),
   ("south america", &["Argentina"]),
];

pub const SEASON_KEYWORDS: &[(&str, Season)] = &[
   ("spring", Season::Spring),
   ("summer", Season::Summer),
   ("fall", Season::Fall),
   ("winter", Season::Winter),
];

/// Every word found is collected, unlike the first-match tables.
pub const ACTIVITY_KEYWORDS: &[&str] =
   &["diving", "snorkeling", "hiking", "yoga", "spa", "temple", "skiing"];

/// Extracts structured filters from free text.
pub fn parse(query: &str) -> SearchFilters {
   let query = query.to_lowercase();

   let activities: Vec<String> = ACTIVITY_KEYWORDS
      .iter()
      .filter(|kw| query.contains(**kw))
      .map(|kw| (*kw).to_string())
      .collect();

   let filters = SearchFilters {
      max_price:    find_amount(&MAX_PRICE, &query),
      min_price:    find_amount(&MIN_PRICE, &query),
      max_duration: find_days(&MAX_DURATION, &query),
      min_duration: find_days(&MIN_DURATION, &query),
      destinations: first_hit(DESTINATION_KEYWORDS, &query)
         .map(|dests| dests.iter().map(|d| (*d).to_string()).collect()),
      types:        first_hit(TYPE_KEYWORDS, &query).map(|types| types.to_vec()),
      seasons:      first_hit(SEASON_KEYWORDS, &query).map(|s| vec![s, Season::YearRound]),
      activities:   (!activities.is_empty()).then_some(activities),
      keywords:     None,
   };

   tracing::debug!(
      "parsed {:?} into {}",
      query,
      serde_json::to_string(&filters).unwrap_or_default()
   );

   filters
}

fn first_hit<T: Copy>(table: &[(&str, T)], query: &str) -> Option<T> {
   table
      .iter()
      .find(|(keyword, _)| query.contains(keyword))
      .map(|(keyword, value)| {
         tracing::debug!("keyword hit: {keyword}");
         *value
      })
}

/// First amount after a trigger that is not actually a day count.
fn find_amount(re: &Regex, query: &str) -> Option<f64> {
   re.captures_iter(query)
      .filter(|caps| caps.get(2).is_none())
      .find_map(|caps| parse_amount(&caps[1]))
}

fn find_days(re: &Regex, query: &str) -> Option<u32> {
   re.captures(query).and_then(|caps| caps[1].parse().ok())
}

/// Parses `3,000`-style amounts. Returns `None` on overflow.
fn parse_amount(raw: &str) -> Option<f64> {
   let digits: String = raw.chars().filter(|c| *c != ',').collect();
   digits.parse::<u64>().ok().map(|v| v as f64)
}
