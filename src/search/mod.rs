pub mod ranking;

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::{
   catalog::Catalog,
   config::Config,
   engine,
   interpret::{Oracle, SemanticInterpreter},
   parser,
   types::{FilterField, FilterSource, SearchFilters, SearchResult, Trip},
};

/// Shown by callers when a search produced no trips.
pub const NO_MATCH_HINT: &str =
   "No trips found. Try adjusting your search criteria or browse the full catalog.";

/// One of the two results a staged search hands to its caller.
#[derive(Debug, Clone)]
pub enum Delivery {
   /// Rule-based results, available before the interpreter answers
   Preview { generation: u64, trips: Vec<Trip> },
   /// Interpreter-backed results for the same query
   Final { generation: u64, result: SearchResult },
}

impl Delivery {
   pub const fn generation(&self) -> u64 {
      match self {
         Self::Preview { generation, .. } | Self::Final { generation, .. } => *generation,
      }
   }
}

/// Consumer-side guard: drops any delivery older than the newest one seen.
#[derive(Debug, Default)]
pub struct LatestOnly {
   newest: u64,
}

impl LatestOnly {
   pub fn accept(&mut self, delivery: &Delivery) -> bool {
      let generation = delivery.generation();
      if generation < self.newest {
         tracing::debug!("dropping delivery #{generation}, #{} already seen", self.newest);
         return false;
      }
      self.newest = generation;
      true
   }
}

/// A user-driven change to the current filter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterEdit {
   Remove(FilterField),
   ClearAll,
}

pub struct TripSearch<O> {
   catalog:     Catalog,
   interpreter: SemanticInterpreter<O>,
   generation:  AtomicU64,
   /// Serializes generation checks with their sends
   deliver:     Mutex<()>,
}

impl<O: Oracle> TripSearch<O> {
   pub fn new(catalog: Catalog, oracle: O) -> Self {
      Self::with_config(catalog, oracle, &Config::default())
   }

   pub fn with_config(catalog: Catalog, oracle: O, config: &Config) -> Self {
      let interpreter = SemanticInterpreter::with_config(oracle, &catalog, config);
      Self { catalog, interpreter, generation: AtomicU64::new(0), deliver: Mutex::new(()) }
   }

   pub const fn catalog(&self) -> &Catalog {
      &self.catalog
   }

   pub const fn interpreter(&self) -> &SemanticInterpreter<O> {
      &self.interpreter
   }

   /// Instant rule-based results. Never calls the interpreter.
   pub fn preview_sync(&self, query: &str) -> Vec<Trip> {
      if query.trim().is_empty() {
         return self.catalog.to_vec();
      }
      self.apply_filters(&parser::parse(query))
   }

   /// Filters and ranks the catalog directly, bypassing all parsing.
   pub fn apply_filters(&self, filters: &SearchFilters) -> Vec<Trip> {
      ranking::rank(engine::apply(&self.catalog, filters), filters)
   }

   /// Applies a user edit to `filters` and re-runs filtering and ranking.
   pub fn edit(&self, filters: &SearchFilters, edit: FilterEdit) -> SearchResult {
      let mut filters = filters.clone();
      match edit {
         FilterEdit::Remove(field) => filters.remove(field),
         FilterEdit::ClearAll => filters.clear(),
      }

      let count = filters.active_count();
      if count == 0 {
         return self.everything(FilterSource::UserEdit);
      }

      SearchResult {
         trips: self.apply_filters(&filters),
         explanation: format!(
            "Showing trips with {count} active filter{}",
            if count == 1 { "" } else { "s" }
         ),
         success: true,
         filters,
         error: None,
         source: FilterSource::UserEdit,
      }
   }

   /// Full pipeline for one query. Never fails: interpreter errors fall back
   /// to the rule-based parser, and a faulting filter pipeline falls back to
   /// a raw keyword scan.
   pub async fn search(&self, query: &str) -> SearchResult {
      if query.trim().is_empty() {
         tracing::debug!("blank query, returning full catalog");
         return self.everything(FilterSource::Catalog);
      }

      let interpretation = self.interpreter.interpret(query).await;

      match engine::try_apply(&self.catalog, &interpretation.filters) {
         Ok(trips) => {
            let trips = ranking::rank(trips, &interpretation.filters);
            tracing::debug!("search {query:?} found {} trips", trips.len());
            SearchResult {
               trips,
               explanation: interpretation.explanation,
               success: true,
               filters: interpretation.filters,
               error: None,
               source: interpretation.source,
            }
         },
         Err(e) => {
            tracing::error!("filter pipeline failed for {query:?}, using keyword scan: {e}");
            SearchResult {
               trips:       engine::keyword_scan(&self.catalog, query),
               explanation: format!("Fallback search results for: {query}"),
               success:     false,
               filters:     SearchFilters::default(),
               error:       Some(e.to_string()),
               source:      FilterSource::KeywordScan,
            }
         },
      }
   }

   /// Starts a new search generation, invalidating all earlier ones.
   pub fn begin(&self) -> u64 {
      self.generation.fetch_add(1, Ordering::SeqCst) + 1
   }

   pub fn is_current(&self, generation: u64) -> bool {
      self.generation.load(Ordering::SeqCst) == generation
   }

   /// Two-phase search: sends a [`Delivery::Preview`] right away, then a
   /// [`Delivery::Final`] once the interpreter answers, unless a newer search
   /// began in the meantime. Returns `None` for superseded searches.
   pub async fn search_staged(
      &self,
      query: &str,
      sink: &mpsc::UnboundedSender<Delivery>,
   ) -> Option<SearchResult> {
      let trips = self.preview_sync(query);
      let generation = {
         let _guard = self.deliver.lock();
         let generation = self.begin();
         tracing::debug!("preview #{generation}: {} trips", trips.len());
         let _ = sink.send(Delivery::Preview { generation, trips });
         generation
      };

      let result = self.search(query).await;

      let _guard = self.deliver.lock();
      if !self.is_current(generation) {
         tracing::debug!("discarding stale result #{generation} for {query:?}");
         return None;
      }
      let _ = sink.send(Delivery::Final { generation, result: result.clone() });
      Some(result)
   }

   fn everything(&self, source: FilterSource) -> SearchResult {
      SearchResult {
         trips: self.catalog.to_vec(),
         explanation: String::new(),
         success: true,
         filters: SearchFilters::default(),
         error: None,
         source,
      }
   }
}

#[cfg(test)]
mod tests {
   use std::{sync::Arc, time::Duration};

   use tokio::{sync::Notify, time};

   use super::*;
   use crate::{
      error::{Error, Result},
      interpret::{OfflineOracle, OracleRequest, tests::StubOracle},
      types::TripType,
   };

   fn ids(trips: &[Trip]) -> Vec<&str> {
      trips.iter().map(|t| t.id.as_str()).collect()
   }

   #[tokio::test]
   async fn blank_query_returns_whole_catalog() {
      let search = TripSearch::new(Catalog::builtin(), StubOracle::failing("unused"));
      for query in ["", "   \t"] {
         let result = search.search(query).await;
         assert_eq!(result.trips, search.catalog().to_vec());
         assert_eq!(result.filters, SearchFilters::default());
         assert!(result.explanation.is_empty());
         assert!(result.success);
         assert_eq!(result.source, FilterSource::Catalog);
      }
      assert_eq!(search.interpreter().oracle().calls.load(Ordering::SeqCst), 0);
   }

   #[tokio::test]
   async fn uses_interpreter_filters_and_ranks_by_price() {
      let oracle = StubOracle::ok(
         r#"{"filters":{"maxPrice":3000},"explanation":"Filtering trips under $3,000"}"#,
      );
      let search = TripSearch::new(Catalog::builtin(), oracle);

      let result = search.search("anything under three grand").await;
      assert!(result.success);
      assert_eq!(result.source, FilterSource::Interpreter);
      assert_eq!(result.explanation, "Filtering trips under $3,000");
      assert_eq!(ids(&result.trips), ["5", "7", "4", "8", "1", "9", "6"]);
      let prices: Vec<f64> = result.trips.iter().map(|t| t.price).collect();
      assert!(prices.is_sorted());
   }

   #[tokio::test]
   async fn interpreter_failure_degrades_to_parser() {
      let search = TripSearch::new(Catalog::builtin(), StubOracle::failing("timeout"));

      let result = search.search("Luxury trips in Asia").await;
      assert!(result.success);
      assert_eq!(result.source, FilterSource::Parser);
      assert_eq!(result.filters, parser::parse("Luxury trips in Asia"));
      assert_eq!(result.filters.types, Some(vec![TripType::Luxury]));
      assert_eq!(
         result.filters.destinations,
         Some(vec!["Japan".to_string(), "Maldives".to_string(), "Indonesia".to_string()])
      );
      assert_eq!(ids(&result.trips), ["2"]);
      assert!(result.error.is_none());
   }

   #[tokio::test]
   async fn no_match_is_a_successful_empty_result() {
      let search = TripSearch::new(Catalog::builtin(), OfflineOracle);
      let result = search.search("luxury trips under $100").await;
      assert!(result.success);
      assert!(result.is_empty());
      assert!(result.error.is_none());
   }

   #[tokio::test]
   async fn faulting_pipeline_falls_back_to_keyword_scan() {
      let oracle = StubOracle::ok(r#"{"filters":{"maxPrice":-5},"explanation":"nonsense"}"#);
      let search = TripSearch::new(Catalog::builtin(), oracle);

      let result = search.search("kenya").await;
      assert!(!result.success);
      assert_eq!(result.source, FilterSource::KeywordScan);
      assert_eq!(ids(&result.trips), ["1"]);
      assert_eq!(result.explanation, "Fallback search results for: kenya");
      assert!(result.filters.is_empty());
      assert!(result.error.unwrap().contains("maxPrice"));
   }

   #[test]
   fn preview_uses_only_the_parser() {
      let search = TripSearch::new(Catalog::builtin(), StubOracle::failing("unused"));
      assert_eq!(ids(&search.preview_sync("anything under $2,000")), ["5", "7", "4"]);
      assert_eq!(search.preview_sync(" ").len(), 9);
      assert_eq!(search.interpreter().oracle().calls.load(Ordering::SeqCst), 0);
   }

   #[test]
   fn edits_bypass_parsing() {
      let search = TripSearch::new(Catalog::builtin(), StubOracle::failing("unused"));
      let filters = parser::parse("Luxury trips in Asia");

      let removed = search.edit(&filters, FilterEdit::Remove(FilterField::Types));
      assert_eq!(removed.source, FilterSource::UserEdit);
      assert_eq!(removed.filters.types, None);
      assert_eq!(ids(&removed.trips), ["5", "3", "2"]);
      assert_eq!(removed.explanation, "Showing trips with 1 active filter");

      let cleared = search.edit(&filters, FilterEdit::ClearAll);
      assert!(cleared.filters.is_empty());
      assert_eq!(cleared.trips, search.catalog().to_vec());
      assert!(cleared.explanation.is_empty());

      assert_eq!(search.interpreter().oracle().calls.load(Ordering::SeqCst), 0);
   }

   #[test]
   fn apply_filters_ranks_duration_bound_longest_first() {
      let search = TripSearch::new(Catalog::builtin(), OfflineOracle);
      let filters = SearchFilters {
         types: Some(vec![TripType::Adventure, TripType::Cultural]),
         min_duration: Some(6),
         ..Default::default()
      };
      // duration descending: Japan 14, Morocco 11, Patagonia 10, Iceland 6
      assert_eq!(ids(&search.apply_filters(&filters)), ["3", "7", "4", "9"]);
   }

   #[tokio::test]
   async fn staged_search_delivers_preview_then_final() {
      let oracle = StubOracle::ok(
         r#"{"filters":{"types":["wildlife"],"maxPrice":3000},"explanation":"Safaris under $3,000"}"#,
      );
      let search = TripSearch::new(Catalog::builtin(), oracle);
      let (tx, mut rx) = mpsc::unbounded_channel();

      let result = search.search_staged("Show me safaris under $3,000", &tx).await.unwrap();
      assert_eq!(ids(&result.trips), ["1"]);

      let Some(Delivery::Preview { generation: g1, trips }) = rx.recv().await else {
         panic!("expected preview first");
      };
      assert_eq!(ids(&trips), ["1"]);
      let Some(Delivery::Final { generation: g2, result: last }) = rx.recv().await else {
         panic!("expected final second");
      };
      assert_eq!(g1, g2);
      assert_eq!(last.explanation, "Safaris under $3,000");
   }

   /// Holds any query containing `zzz-slow` until released.
   struct GatedOracle {
      gate: Notify,
   }

   #[async_trait::async_trait]
   impl Oracle for GatedOracle {
      async fn complete(&self, request: &OracleRequest) -> Result<String> {
         if request.prompt.contains("zzz-slow") {
            self.gate.notified().await;
         }
         Err(Error::OracleUnavailable("gated".to_string()))
      }
   }

   #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
   async fn final_never_follows_a_newer_preview() {
      let search = Arc::new(TripSearch::new(Catalog::builtin(), OfflineOracle));
      let (tx, mut rx) = mpsc::unbounded_channel();

      let tasks: Vec<_> = (0..200)
         .map(|i| {
            let search = Arc::clone(&search);
            let tx = tx.clone();
            tokio::spawn(async move {
               let query = if i % 2 == 0 { "beach" } else { "luxury under $5,000" };
               search.search_staged(query, &tx).await
            })
         })
         .collect();
      for task in tasks {
         task.await.unwrap();
      }
      drop(tx);

      let mut newest_preview = 0;
      while let Some(delivery) = rx.recv().await {
         match delivery {
            Delivery::Preview { generation, .. } => {
               assert!(generation > newest_preview, "previews out of order");
               newest_preview = generation;
            },
            Delivery::Final { generation, .. } => {
               assert_eq!(generation, newest_preview, "stale final #{generation}");
            },
         }
      }
   }

   #[test]
   fn latest_only_drops_older_generations() {
      let preview = |generation| Delivery::Preview { generation, trips: Vec::new() };
      let mut latest = LatestOnly::default();

      assert!(latest.accept(&preview(1)));
      assert!(latest.accept(&preview(3)));
      assert!(!latest.accept(&preview(2)));
      assert!(latest.accept(&preview(3)));
   }

   #[tokio::test]
   async fn stale_results_are_discarded() {
      let oracle = Arc::new(GatedOracle { gate: Notify::new() });
      let search = TripSearch::new(Catalog::builtin(), oracle.clone());
      let (tx, mut rx) = mpsc::unbounded_channel();

      let (slow, fast) = {
         let slow = search.search_staged("zzz-slow beach", &tx);
         tokio::pin!(slow);
         // drive the first search until it blocks on the oracle
         assert!(time::timeout(Duration::from_millis(50), &mut slow).await.is_err());

         let fast = search.search_staged("luxury", &tx).await;
         oracle.gate.notify_one();
         (slow.await, fast)
      };

      assert!(slow.is_none());
      let fast = fast.unwrap();
      assert_eq!(ids(&fast.trips), ["2"]);

      drop(tx);
      let mut deliveries = Vec::new();
      while let Some(d) = rx.recv().await {
         deliveries.push(d);
      }
      assert_eq!(deliveries.len(), 3);
      assert!(matches!(deliveries[0], Delivery::Preview { generation: 1, .. }));
      assert!(matches!(deliveries[1], Delivery::Preview { generation: 2, .. }));
      assert!(matches!(deliveries[2], Delivery::Final { generation: 2, .. }));
      assert!(!search.is_current(1));
      assert!(search.is_current(2));
   }
}
