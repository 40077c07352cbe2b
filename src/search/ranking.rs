//! Result ordering based on which filter dimensions were requested.

use std::cmp::Ordering;

use crate::types::{SearchFilters, Trip};

/// Which key [`rank`] sorts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankKey {
   PriceAscending,
   DurationDescending,
}

impl RankKey {
   /// Price bounds take precedence over duration bounds; with neither, the
   /// cheapest trips come first.
   pub const fn for_filters(filters: &SearchFilters) -> Self {
      if filters.has_price_bound() {
         Self::PriceAscending
      } else if filters.has_duration_bound() {
         Self::DurationDescending
      } else {
         Self::PriceAscending
      }
   }

   fn compare(self, a: &Trip, b: &Trip) -> Ordering {
      match self {
         Self::PriceAscending => a.price.total_cmp(&b.price),
         Self::DurationDescending => b.duration.cmp(&a.duration),
      }
   }
}

/// Stable sort of `trips`; ties keep their filtered order.
pub fn rank(mut trips: Vec<Trip>, filters: &SearchFilters) -> Vec<Trip> {
   let key = RankKey::for_filters(filters);
   trips.sort_by(|a, b| key.compare(a, b));
   tracing::debug!("ranked {} trips by {key:?}", trips.len());
   trips
}
