//! Applies [`SearchFilters`] to a trip sequence.

use std::fmt;

use crate::{
   error::Result,
   types::{SearchFilters, Season, Trip},
};

fn contains_ci(haystack: &str, needle: &str) -> bool {
   haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Why a trip failed a filter. Only used for tracing.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
   AboveMaxPrice { price: f64, max: f64 },
   BelowMinPrice { price: f64, min: f64 },
   AboveMaxDuration { duration: u32, max: u32 },
   BelowMinDuration { duration: u32, min: u32 },
   Type,
   Destination,
   Season,
   Activities,
   Keywords,
}

impl fmt::Display for Rejection {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self {
         Self::AboveMaxPrice { price, max } => write!(f, "price {price} > maxPrice {max}"),
         Self::BelowMinPrice { price, min } => write!(f, "price {price} < minPrice {min}"),
         Self::AboveMaxDuration { duration, max } => {
            write!(f, "duration {duration} > maxDuration {max}")
         },
         Self::BelowMinDuration { duration, min } => {
            write!(f, "duration {duration} < minDuration {min}")
         },
         Self::Type => f.write_str("type not requested"),
         Self::Destination => f.write_str("destination not matching"),
         Self::Season => f.write_str("season not matching"),
         Self::Activities => f.write_str("no matching activity"),
         Self::Keywords => f.write_str("no keyword found"),
      }
   }
}

/// Evaluates every populated filter against one trip, returning the first
/// failing predicate.
pub fn check(trip: &Trip, filters: &SearchFilters) -> Result<(), Rejection> {
   if let Some(max) = filters.max_price
      && trip.price > max
   {
      return Err(Rejection::AboveMaxPrice { price: trip.price, max });
   }
   if let Some(min) = filters.min_price
      && trip.price < min
   {
      return Err(Rejection::BelowMinPrice { price: trip.price, min });
   }
   if let Some(max) = filters.max_duration
      && trip.duration > max
   {
      return Err(Rejection::AboveMaxDuration { duration: trip.duration, max });
   }
   if let Some(min) = filters.min_duration
      && trip.duration < min
   {
      return Err(Rejection::BelowMinDuration { duration: trip.duration, min });
   }

   if let Some(types) = &filters.types
      && !types.contains(&trip.trip_type)
   {
      return Err(Rejection::Type);
   }

   if let Some(destinations) = &filters.destinations
      && !destinations.iter().any(|d| contains_ci(&trip.destination, d))
   {
      return Err(Rejection::Destination);
   }

   // Year-round trips satisfy any non-empty season list.
   if let Some(seasons) = &filters.seasons
      && !seasons.contains(&trip.season)
      && (seasons.is_empty() || trip.season != Season::YearRound)
   {
      return Err(Rejection::Season);
   }

   if let Some(activities) = &filters.activities
      && !activities.iter().any(|wanted| {
         trip
            .activities
            .iter()
            .any(|have| contains_ci(have, wanted) || contains_ci(wanted, have))
      })
   {
      return Err(Rejection::Activities);
   }

   if let Some(keywords) = &filters.keywords
      && !keywords.iter().any(|k| {
         contains_ci(&trip.name, k)
            || contains_ci(&trip.description, k)
            || contains_ci(&trip.destination, k)
      })
   {
      return Err(Rejection::Keywords);
   }

   Ok(())
}

/// Returns the trips passing every populated filter, in input order.
pub fn apply(trips: &[Trip], filters: &SearchFilters) -> Vec<Trip> {
   let passed: Vec<Trip> = trips
      .iter()
      .filter(|trip| match check(trip, filters) {
         Ok(()) => true,
         Err(reason) => {
            tracing::trace!("rejected {} ({}): {reason}", trip.name, trip.destination);
            false
         },
      })
      .cloned()
      .collect();

   tracing::debug!("{} of {} trips passed filters", passed.len(), trips.len());
   passed
}

/// Like [`apply`], but refuses filters that fail validation.
pub fn try_apply(trips: &[Trip], filters: &SearchFilters) -> Result<Vec<Trip>> {
   filters.validate()?;
   Ok(apply(trips, filters))
}

/// Last-resort raw-text match across name, destination, description and
/// activities. Ignores all structured constraints.
pub fn keyword_scan(trips: &[Trip], text: &str) -> Vec<Trip> {
   let needle = text.trim().to_lowercase();
   trips
      .iter()
      .filter(|trip| {
         contains_ci(&trip.name, &needle)
            || contains_ci(&trip.destination, &needle)
            || contains_ci(&trip.description, &needle)
            || trip.activities.iter().any(|a| contains_ci(a, &needle))
      })
      .cloned()
      .collect()
}
