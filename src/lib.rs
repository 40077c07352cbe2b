pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod interpret;
pub mod parser;
pub mod search;
pub mod types;

pub use catalog::Catalog;
pub use config::Config;
pub use error::{Error, Result};
pub use interpret::{OfflineOracle, OpenAiOracle, Oracle, SemanticInterpreter};
pub use search::{Delivery, FilterEdit, LatestOnly, NO_MATCH_HINT, TripSearch};
pub use types::{FilterField, FilterSource, SearchFilters, SearchResult, Season, Trip, TripType};
