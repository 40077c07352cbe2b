use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripType {
   Adventure,
   Luxury,
   Cultural,
   Wildlife,
   Beach,
   Mountain,
   Wellness,
}

impl TripType {
   pub const ALL: [Self; 7] = [
      Self::Adventure,
      Self::Luxury,
      Self::Cultural,
      Self::Wildlife,
      Self::Beach,
      Self::Mountain,
      Self::Wellness,
   ];

   pub const fn as_str(self) -> &'static str {
      match self {
         Self::Adventure => "adventure",
         Self::Luxury => "luxury",
         Self::Cultural => "cultural",
         Self::Wildlife => "wildlife",
         Self::Beach => "beach",
         Self::Mountain => "mountain",
         Self::Wellness => "wellness",
      }
   }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Season {
   Spring,
   Summer,
   Fall,
   Winter,
   YearRound,
}

impl Season {
   pub const ALL: [Self; 5] = [Self::Spring, Self::Summer, Self::Fall, Self::Winter, Self::YearRound];

   pub const fn as_str(self) -> &'static str {
      match self {
         Self::Spring => "spring",
         Self::Summer => "summer",
         Self::Fall => "fall",
         Self::Winter => "winter",
         Self::YearRound => "year-round",
      }
   }
}

macro_rules! impl_str_enum {
   ($ty:ident, $what:literal) => {
      impl fmt::Display for $ty {
         fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
         }
      }

      impl FromStr for $ty {
         type Err = Error;

         fn from_str(s: &str) -> Result<Self> {
            let needle = s.trim();
            Self::ALL
               .into_iter()
               .find(|v| v.as_str().eq_ignore_ascii_case(needle))
               .ok_or_else(|| Error::InvalidFilters(format!("unknown {} '{s}'", $what)))
         }
      }
   };
}

impl_str_enum!(TripType, "trip type");
impl_str_enum!(Season, "season");

/// A catalog entry. Never mutated once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
   pub id:          String,
   pub name:        String,
   pub destination: String,
   pub price:       f64,
   pub duration:    u32,
   #[serde(rename = "type")]
   pub trip_type:   TripType,
   pub season:      Season,
   #[serde(default)]
   pub activities:  Vec<String>,
   pub description: String,
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub image:       Option<String>,
}

/// Structured constraints produced from a query.
///
/// A `None` field places no constraint on its dimension. Populated fields are
/// combined with AND; the values inside a list field are combined with OR.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilters {
   #[serde(skip_serializing_if = "Option::is_none")]
   pub max_price:    Option<f64>,
   #[serde(skip_serializing_if = "Option::is_none")]
   pub min_price:    Option<f64>,
   #[serde(skip_serializing_if = "Option::is_none")]
   pub max_duration: Option<u32>,
   #[serde(skip_serializing_if = "Option::is_none")]
   pub min_duration: Option<u32>,
   #[serde(skip_serializing_if = "Option::is_none")]
   pub destinations: Option<Vec<String>>,
   #[serde(skip_serializing_if = "Option::is_none")]
   pub types:        Option<Vec<TripType>>,
   #[serde(skip_serializing_if = "Option::is_none")]
   pub seasons:      Option<Vec<Season>>,
   #[serde(skip_serializing_if = "Option::is_none")]
   pub activities:   Option<Vec<String>>,
   #[serde(skip_serializing_if = "Option::is_none")]
   pub keywords:     Option<Vec<String>>,
}

/// One removable dimension of [`SearchFilters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterField {
   MaxPrice,
   MinPrice,
   MaxDuration,
   MinDuration,
   Destinations,
   Types,
   Seasons,
   Activities,
   Keywords,
}

/// A display label for one populated filter, tagged with the field that
/// removing it would clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterLabel {
   pub field: FilterField,
   pub text:  String,
}

impl SearchFilters {
   pub fn is_empty(&self) -> bool {
      self.active_count() == 0
   }

   /// Number of populated dimensions. Empty lists are not counted.
   pub fn active_count(&self) -> usize {
      fn list<T>(v: Option<&Vec<T>>) -> usize {
         usize::from(v.is_some_and(|v| !v.is_empty()))
      }

      usize::from(self.max_price.is_some())
         + usize::from(self.min_price.is_some())
         + usize::from(self.max_duration.is_some())
         + usize::from(self.min_duration.is_some())
         + list(self.destinations.as_ref())
         + list(self.types.as_ref())
         + list(self.seasons.as_ref())
         + list(self.activities.as_ref())
         + list(self.keywords.as_ref())
   }

   pub const fn has_price_bound(&self) -> bool {
      self.max_price.is_some() || self.min_price.is_some()
   }

   pub const fn has_duration_bound(&self) -> bool {
      self.max_duration.is_some() || self.min_duration.is_some()
   }

   pub fn remove(&mut self, field: FilterField) {
      match field {
         FilterField::MaxPrice => self.max_price = None,
         FilterField::MinPrice => self.min_price = None,
         FilterField::MaxDuration => self.max_duration = None,
         FilterField::MinDuration => self.min_duration = None,
         FilterField::Destinations => self.destinations = None,
         FilterField::Types => self.types = None,
         FilterField::Seasons => self.seasons = None,
         FilterField::Activities => self.activities = None,
         FilterField::Keywords => self.keywords = None,
      }
   }

   pub fn clear(&mut self) {
      *self = Self::default();
   }

   /// Trims text entries, drops blanks and duplicates, and turns empty lists
   /// into `None`.
   pub fn normalize(mut self) -> Self {
      fn text(list: Option<Vec<String>>) -> Option<Vec<String>> {
         let mut out: Vec<String> = Vec::new();
         for item in list? {
            let item = item.trim();
            if !item.is_empty() && !out.iter().any(|o| o.eq_ignore_ascii_case(item)) {
               out.push(item.to_string());
            }
         }
         (!out.is_empty()).then_some(out)
      }

      fn enums<T: PartialEq>(list: Option<Vec<T>>) -> Option<Vec<T>> {
         let mut out = Vec::new();
         for item in list? {
            if !out.contains(&item) {
               out.push(item);
            }
         }
         (!out.is_empty()).then_some(out)
      }

      self.destinations = text(self.destinations);
      self.activities = text(self.activities);
      self.keywords = text(self.keywords);
      self.types = enums(self.types);
      self.seasons = enums(self.seasons);
      self
   }

   pub fn validate(&self) -> Result<()> {
      for (name, value) in [("maxPrice", self.max_price), ("minPrice", self.min_price)] {
         if let Some(v) = value
            && (!v.is_finite() || v < 0.0)
         {
            return Err(Error::InvalidFilters(format!("{name} must be a non-negative number, got {v}")));
         }
      }
      Ok(())
   }

   pub fn labels(&self) -> Vec<FilterLabel> {
      let mut labels = Vec::new();
      let mut push = |field, text: String| labels.push(FilterLabel { field, text });

      for d in self.destinations.iter().flatten() {
         push(FilterField::Destinations, d.clone());
      }
      for t in self.types.iter().flatten() {
         push(FilterField::Types, t.to_string());
      }
      if let Some(p) = self.max_price {
         push(FilterField::MaxPrice, format!("Under ${}", format_amount(p)));
      }
      if let Some(p) = self.min_price {
         push(FilterField::MinPrice, format!("Over ${}", format_amount(p)));
      }
      if let Some(d) = self.max_duration {
         push(FilterField::MaxDuration, format!("Under {d} days"));
      }
      if let Some(d) = self.min_duration {
         push(FilterField::MinDuration, format!("Over {d} days"));
      }
      for s in self.seasons.iter().flatten() {
         push(FilterField::Seasons, s.to_string());
      }
      if let Some(a) = self.activities.as_ref().filter(|a| !a.is_empty()) {
         push(FilterField::Activities, a.join(", "));
      }
      for k in self.keywords.iter().flatten() {
         push(FilterField::Keywords, format!("\"{k}\""));
      }

      labels
   }
}

/// Formats a dollar amount with thousands separators, dropping a zero
/// fractional part.
pub fn format_amount(value: f64) -> String {
   // round once, in cents, so a carry reaches the whole part
   let cents = (value.abs() * 100.0).round() as u64;
   let digits = (cents / 100).to_string();

   let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
   for (i, ch) in digits.chars().enumerate() {
      if i > 0 && (digits.len() - i) % 3 == 0 {
         grouped.push(',');
      }
      grouped.push(ch);
   }

   let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
   match cents % 100 {
      0 => format!("{sign}{grouped}"),
      frac => format!("{sign}{grouped}.{frac:02}"),
   }
}

/// Where the effective filters of a [`SearchResult`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterSource {
   /// Blank query: the whole catalog, no filters.
   Catalog,
   Interpreter,
   /// The deterministic parser, after the interpreter failed.
   Parser,
   UserEdit,
   /// Last-resort raw-text scan after the filter pipeline faulted.
   KeywordScan,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
   pub trips:       Vec<Trip>,
   pub explanation: String,
   pub success:     bool,
   pub filters:     SearchFilters,
   #[serde(skip_serializing_if = "Option::is_none")]
   pub error:       Option<String>,
   pub source:      FilterSource,
}

impl SearchResult {
   pub fn is_empty(&self) -> bool {
      self.trips.is_empty()
   }
}
