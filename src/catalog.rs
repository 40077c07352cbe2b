//! The read-only trip catalog the pipeline filters.

use std::{collections::HashSet, ops::Deref, path::Path, sync::Arc};

use serde::Deserialize;

use crate::{
   error::{Error, Result},
   types::{Season, Trip, TripType},
};

/// Shared, immutable, ordered trip collection. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct Catalog {
   trips: Arc<[Trip]>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
   Wrapped { trips: Vec<Trip> },
   Bare(Vec<Trip>),
}

impl CatalogFile {
   fn into_trips(self) -> Vec<Trip> {
      match self {
         Self::Wrapped { trips } | Self::Bare(trips) => trips,
      }
   }
}

impl Catalog {
   pub fn new(trips: Vec<Trip>) -> Result<Self> {
      let mut seen = HashSet::with_capacity(trips.len());
      for trip in &trips {
         if trip.id.trim().is_empty() {
            return Err(Error::InvalidCatalog(format!("trip '{}' has an empty id", trip.name)));
         }
         if !seen.insert(trip.id.as_str()) {
            return Err(Error::InvalidCatalog(format!("duplicate trip id '{}'", trip.id)));
         }
         if !trip.price.is_finite() || trip.price <= 0.0 {
            return Err(Error::InvalidCatalog(format!(
               "trip '{}' has non-positive price {}",
               trip.id, trip.price
            )));
         }
         if trip.duration == 0 {
            return Err(Error::InvalidCatalog(format!("trip '{}' has zero duration", trip.id)));
         }
      }

      Ok(Self { trips: trips.into() })
   }

   /// Loads a catalog file. `.toml` files are read as `[[trips]]` tables,
   /// anything else as JSON (either a bare array or `{"trips": [...]}`).
   pub fn load(path: &Path) -> Result<Self> {
      let content = std::fs::read_to_string(path)?;

      let trips = if path
         .extension()
         .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
      {
         #[derive(Deserialize)]
         struct TomlCatalog {
            trips: Vec<Trip>,
         }
         toml::from_str::<TomlCatalog>(&content)?.trips
      } else {
         serde_json::from_str::<CatalogFile>(&content)?.into_trips()
      };

      tracing::debug!("loaded {} trips from {}", trips.len(), path.display());
      Self::new(trips)
   }

   pub fn trips(&self) -> &[Trip] {
      &self.trips
   }

   pub fn get(&self, id: &str) -> Option<&Trip> {
      self.trips.iter().find(|t| t.id == id)
   }

   /// The nine-trip catalog shipped with the binary.
   pub fn builtin() -> Self {
      Self { trips: builtin_trips().into() }
   }
}

impl Deref for Catalog {
   type Target = [Trip];

   fn deref(&self) -> &[Trip] {
      &self.trips
   }
}

impl Default for Catalog {
   fn default() -> Self {
      Self::builtin()
   }
}

#[allow(clippy::too_many_arguments, reason = "flat table of literal rows")]
fn trip(
   id: &str,
   name: &str,
   destination: &str,
   price: f64,
   duration: u32,
   trip_type: TripType,
   season: Season,
   activities: &[&str],
   description: &str,
   image: &str,
) -> Trip {
   Trip {
      id: id.to_string(),
      name: name.to_string(),
      destination: destination.to_string(),
      price,
      duration,
      trip_type,
      season,
      activities: activities.iter().map(|a| (*a).to_string()).collect(),
      description: description.to_string(),
      image: Some(image.to_string()),
   }
}

fn builtin_trips() -> Vec<Trip> {
   vec![
      trip(
         "1",
         "Safari in Kenya",
         "Kenya",
         2300.0,
         12,
         TripType::Wildlife,
         Season::YearRound,
         &["game drives", "wildlife viewing", "photography"],
         "Experience the Great Migration and witness the Big Five in Kenya's premier national parks.",
         "https://images.unsplash.com/photo-1516026672322-bc52d61a55d5?w=500&h=300&fit=crop",
      ),
      trip(
         "2",
         "Luxury Maldives Escape",
         "Maldives",
         4500.0,
         7,
         TripType::Luxury,
         Season::YearRound,
         &["snorkeling", "spa treatments", "fine dining"],
         "Indulge in overwater villa luxury with pristine beaches and crystal-clear waters.",
         "https://images.unsplash.com/photo-1544551763-46a013bb70d5?w=500&h=300&fit=crop",
      ),
      trip(
         "3",
         "Cultural Japan Journey",
         "Japan",
         3200.0,
         14,
         TripType::Cultural,
         Season::Spring,
         &["temple visits", "traditional ceremonies", "cherry blossom viewing"],
         "Immerse yourself in Japanese culture, from ancient temples to modern Tokyo.",
         "https://images.unsplash.com/photo-1493976040374-85c8e12f0c0e?w=500&h=300&fit=crop",
      ),
      trip(
         "4",
         "Patagonia Trekking",
         "Argentina",
         1800.0,
         10,
         TripType::Adventure,
         Season::Summer,
         &["hiking", "mountaineering", "wildlife spotting"],
         "Challenge yourself with epic treks through stunning Patagonian landscapes.",
         "https://images.unsplash.com/photo-1469474968028-56623f02e42e?w=500&h=300&fit=crop",
      ),
      trip(
         "5",
         "Bali Wellness Retreat",
         "Indonesia",
         1200.0,
         8,
         TripType::Wellness,
         Season::YearRound,
         &["yoga", "meditation", "spa treatments"],
         "Rejuvenate your mind and body in Bali's serene temples and rice terraces.",
         "https://images.unsplash.com/photo-1537953773345-d172ccf13cf1?w=500&h=300&fit=crop",
      ),
      trip(
         "6",
         "Swiss Alps Adventure",
         "Switzerland",
         2800.0,
         9,
         TripType::Mountain,
         Season::Summer,
         &["hiking", "skiing", "mountain railways"],
         "Experience breathtaking alpine scenery and charming mountain villages.",
         "https://images.unsplash.com/photo-1531366936337-7c912a4589a7?w=500&h=300&fit=crop",
      ),
      trip(
         "7",
         "Morocco Imperial Cities",
         "Morocco",
         1500.0,
         11,
         TripType::Cultural,
         Season::Fall,
         &["medina tours", "desert camping", "traditional crafts"],
         "Explore the vibrant souks and historic architecture of Morocco's imperial cities.",
         "https://images.unsplash.com/photo-1671181087708-be3050f1974e?q=80&w=500&h=300&fit=crop",
      ),
      trip(
         "8",
         "Greek Island Hopping",
         "Greece",
         2100.0,
         12,
         TripType::Beach,
         Season::Summer,
         &["sailing", "swimming", "historical tours"],
         "Discover the beauty of the Greek islands with their white-washed villages and azure waters.",
         "https://images.unsplash.com/photo-1613395877344-13d4a8e0d49e?w=500&h=300&fit=crop",
      ),
      trip(
         "9",
         "Iceland Northern Lights",
         "Iceland",
         2600.0,
         6,
         TripType::Adventure,
         Season::Winter,
         &["aurora viewing", "ice caves", "hot springs"],
         "Witness the magical northern lights and explore Iceland's dramatic winter landscapes.",
         "https://images.unsplash.com/photo-1488415032361-b7e238421f1b?q=80&w=500&h=300&fit=crop",
      ),
   ]
}

#[cfg(test)]
mod tests {
   use std::io::Write;

   use tempfile::{Builder, NamedTempFile};

   use super::*;

   fn temp_file(suffix: &str) -> NamedTempFile {
      Builder::new().suffix(suffix).tempfile().unwrap()
   }

   #[test]
   fn builtin_catalog_is_valid() {
      let builtin = Catalog::builtin();
      assert_eq!(builtin.len(), 9);
      assert!(Catalog::new(builtin.to_vec()).is_ok());
      assert_eq!(builtin.get("3").map(|t| t.destination.as_str()), Some("Japan"));
   }

   #[test]
   fn rejects_duplicate_ids() {
      let mut trips = Catalog::builtin().to_vec();
      trips[1].id = trips[0].id.clone();
      assert!(matches!(Catalog::new(trips), Err(Error::InvalidCatalog(_))));
   }

   #[test]
   fn rejects_non_positive_price_and_duration() {
      let mut trips = Catalog::builtin().to_vec();
      trips[0].price = 0.0;
      assert!(Catalog::new(trips).is_err());

      let mut trips = Catalog::builtin().to_vec();
      trips[0].duration = 0;
      assert!(Catalog::new(trips).is_err());
   }

   #[test]
   fn loads_wrapped_and_bare_json() {
      let builtin = Catalog::builtin();
      let trips = &builtin[..2];

      let mut bare = temp_file(".json");
      write!(bare, "{}", serde_json::to_string(trips).unwrap()).unwrap();
      assert_eq!(Catalog::load(bare.path()).unwrap().len(), 2);

      let mut wrapped = temp_file(".json");
      write!(wrapped, "{}", serde_json::json!({ "trips": trips })).unwrap();
      assert_eq!(Catalog::load(wrapped.path()).unwrap().trips(), trips);
   }

   #[test]
   fn loads_toml_tables() {
      let mut file = temp_file(".toml");
      write!(
         file,
         r#"
[[trips]]
id = "a"
name = "Fjord Cruise"
destination = "Norway"
price = 3100
duration = 8
type = "luxury"
season = "summer"
activities = ["sailing", "fine dining"]
description = "Slow cruise through the western fjords."
"#
      )
      .unwrap();

      let catalog = Catalog::load(file.path()).unwrap();
      assert_eq!(catalog.len(), 1);
      assert_eq!(catalog[0].trip_type, TripType::Luxury);
      assert_eq!(catalog[0].price, 3100.0);
      assert_eq!(catalog[0].image, None);
   }
}
