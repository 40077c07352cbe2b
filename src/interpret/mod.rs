//! Semantic query interpretation backed by an external language model.
//!
//! The oracle is treated as unreliable: a single attempt is made per query,
//! and any failure (transport, empty answer, malformed document) falls back
//! to the rule-based [`parser`](crate::parser).

pub mod openai;
pub mod prompt;

use std::sync::Arc;

pub use openai::OpenAiOracle;
use serde::Deserialize;

use crate::{
   catalog::Catalog,
   config::Config,
   error::{Error, Result},
   parser,
   types::{FilterSource, SearchFilters},
};

/// One chat-style completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleRequest {
   /// Instruction sent in the system role
   pub system:      String,
   /// Grounding context, worked examples and the user query
   pub prompt:      String,
   pub temperature: f32,
   pub max_tokens:  u32,
}

/// The external text-completion capability the interpreter relies on.
#[async_trait::async_trait]
pub trait Oracle: Send + Sync {
   /// Returns the raw completion text for the request
   async fn complete(&self, request: &OracleRequest) -> Result<String>;
}

#[async_trait::async_trait]
impl<T: Oracle + ?Sized> Oracle for Arc<T> {
   async fn complete(&self, request: &OracleRequest) -> Result<String> {
      (**self).complete(request).await
   }
}

#[async_trait::async_trait]
impl<T: Oracle + ?Sized> Oracle for Box<T> {
   async fn complete(&self, request: &OracleRequest) -> Result<String> {
      (**self).complete(request).await
   }
}

/// Oracle that is never reachable. Every query goes through the fallback
/// parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineOracle;

#[async_trait::async_trait]
impl Oracle for OfflineOracle {
   async fn complete(&self, _request: &OracleRequest) -> Result<String> {
      Err(Error::OracleUnavailable("offline mode".to_string()))
   }
}

/// Filters resolved for one query, with the text explaining them.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
   pub filters:     SearchFilters,
   pub explanation: String,
   /// [`FilterSource::Interpreter`] or [`FilterSource::Parser`]
   pub source:      FilterSource,
}

impl Interpretation {
   /// Rule-based interpretation used whenever the oracle fails.
   pub fn fallback(query: &str) -> Self {
      Self {
         filters:     parser::parse(query),
         explanation: format!("Fallback parsing applied basic keyword matching for: {query}"),
         source:      FilterSource::Parser,
      }
   }
}

#[derive(Deserialize)]
struct OracleAnswer {
   filters:     SearchFilters,
   explanation: String,
}

/// Strictly parses the oracle's answer. The whole trimmed text must be one
/// JSON object with a `filters` object and a non-blank `explanation`.
pub fn parse_answer(text: &str) -> Result<Interpretation> {
   let text = text.trim();
   if text.is_empty() {
      return Err(Error::OracleMalformed("empty response".to_string()));
   }

   let answer: OracleAnswer =
      serde_json::from_str(text).map_err(|e| Error::OracleMalformed(e.to_string()))?;

   let explanation = answer.explanation.trim();
   if explanation.is_empty() {
      return Err(Error::OracleMalformed("missing explanation".to_string()));
   }

   Ok(Interpretation {
      filters:     answer.filters.normalize(),
      explanation: explanation.to_string(),
      source:      FilterSource::Interpreter,
   })
}

/// Turns free text into filters via the oracle, falling back to the parser.
pub struct SemanticInterpreter<O> {
   oracle:      O,
   system:      String,
   context:     String,
   temperature: f32,
   max_tokens:  u32,
}

impl<O: Oracle> SemanticInterpreter<O> {
   pub fn new(oracle: O, catalog: &Catalog) -> Self {
      Self::with_config(oracle, catalog, &Config::default())
   }

   pub fn with_config(oracle: O, catalog: &Catalog, config: &Config) -> Self {
      Self {
         oracle,
         system: prompt::SYSTEM_PROMPT.to_string(),
         context: prompt::grounding_context(catalog),
         temperature: config.temperature,
         max_tokens: config.max_tokens,
      }
   }

   pub const fn oracle(&self) -> &O {
      &self.oracle
   }

   /// The exact request that would be sent for `query`.
   pub fn request(&self, query: &str) -> OracleRequest {
      OracleRequest {
         system:      self.system.clone(),
         prompt:      prompt::render(&self.context, query),
         temperature: self.temperature,
         max_tokens:  self.max_tokens,
      }
   }

   /// One oracle attempt; errors are returned rather than recovered.
   pub async fn try_interpret(&self, query: &str) -> Result<Interpretation> {
      let request = self.request(query);
      tracing::debug!("sending query to oracle: {query:?}");

      let raw = self.oracle.complete(&request).await?;
      tracing::debug!("raw oracle response: {raw}");

      let interpretation = parse_answer(&raw)?;
      tracing::debug!(
         "oracle filters: {} ({})",
         serde_json::to_string(&interpretation.filters).unwrap_or_default(),
         interpretation.explanation
      );
      Ok(interpretation)
   }

   /// Never fails: any oracle error degrades to [`Interpretation::fallback`].
   pub async fn interpret(&self, query: &str) -> Interpretation {
      match self.try_interpret(query).await {
         Ok(interpretation) => interpretation,
         Err(e) => {
            tracing::warn!("interpreter failed, using rule-based parser: {e}");
            Interpretation::fallback(query)
         },
      }
   }
}

#[cfg(test)]
pub(crate) mod tests {
   use std::sync::atomic::{AtomicUsize, Ordering};

   use super::*;
   use crate::types::{Season, TripType};

   /// Oracle returning a canned answer and counting calls.
   pub struct StubOracle {
      pub answer: std::result::Result<String, String>,
      pub calls:  AtomicUsize,
   }

   impl StubOracle {
      pub fn ok(answer: &str) -> Self {
         Self { answer: Ok(answer.to_string()), calls: AtomicUsize::new(0) }
      }

      pub fn failing(reason: &str) -> Self {
         Self { answer: Err(reason.to_string()), calls: AtomicUsize::new(0) }
      }
   }

   #[async_trait::async_trait]
   impl Oracle for StubOracle {
      async fn complete(&self, _request: &OracleRequest) -> Result<String> {
         self.calls.fetch_add(1, Ordering::SeqCst);
         self.answer.clone().map_err(Error::OracleUnavailable)
      }
   }

   #[test]
   fn parses_valid_answer() {
      let interp = parse_answer(
         r#"{"filters":{"types":["beach"],"seasons":["summer","year-round"]},"explanation":"Beach trips for summer"}"#,
      )
      .unwrap();
      assert_eq!(interp.filters.types, Some(vec![TripType::Beach]));
      assert_eq!(interp.filters.seasons, Some(vec![Season::Summer, Season::YearRound]));
      assert_eq!(interp.explanation, "Beach trips for summer");
      assert_eq!(interp.source, FilterSource::Interpreter);
   }

   #[test]
   fn null_fields_mean_no_constraint() {
      let interp = parse_answer(
         r#"{"filters":{"maxPrice":2000,"minPrice":null,"destinations":[]},"explanation":"Under $2000"}"#,
      )
      .unwrap();
      assert_eq!(interp.filters.max_price, Some(2000.0));
      assert_eq!(interp.filters.min_price, None);
      assert_eq!(interp.filters.destinations, None);
   }

   #[test]
   fn rejects_malformed_answers() {
      let cases = [
         "",
         "   ",
         "Sure! Here are your filters.",
         r#"{"filters":{"maxPrice":2000}}"#,
         r#"{"explanation":"no filters"}"#,
         r#"{"filters":{"types":["safari"]},"explanation":"x"}"#,
         r#"{"filters":{"minDuration":-3},"explanation":"x"}"#,
         r#"{"filters":{},"explanation":"  "}"#,
         r#"{"filters":{},"explanation":"ok"} trailing"#,
      ];
      for case in cases {
         assert!(
            matches!(parse_answer(case), Err(Error::OracleMalformed(_))),
            "accepted {case:?}"
         );
      }
   }

   #[tokio::test]
   async fn uses_oracle_answer_when_valid() {
      let oracle = StubOracle::ok(
         r#"{"filters":{"types":["wildlife"],"maxPrice":3000},"explanation":"Safaris under $3,000"}"#,
      );
      let interpreter = SemanticInterpreter::new(oracle, &Catalog::builtin());

      let interp = interpreter.interpret("Show me safaris under $3,000").await;
      assert_eq!(interp.source, FilterSource::Interpreter);
      assert_eq!(interp.filters.max_price, Some(3000.0));
      assert_eq!(interp.explanation, "Safaris under $3,000");
      assert_eq!(interpreter.oracle.calls.load(Ordering::SeqCst), 1);
   }

   #[tokio::test]
   async fn falls_back_to_parser_on_transport_error() {
      let interpreter =
         SemanticInterpreter::new(StubOracle::failing("connection refused"), &Catalog::builtin());

      let interp = interpreter.interpret("Luxury trips in Asia").await;
      assert_eq!(interp.source, FilterSource::Parser);
      assert_eq!(interp.filters, parser::parse("Luxury trips in Asia"));
      assert_eq!(
         interp.explanation,
         "Fallback parsing applied basic keyword matching for: Luxury trips in Asia"
      );
      // exactly one attempt, no retries
      assert_eq!(interpreter.oracle.calls.load(Ordering::SeqCst), 1);
   }

   #[test]
   fn falls_back_on_malformed_answer() {
      let interpreter =
         SemanticInterpreter::new(StubOracle::ok("not json at all"), &Catalog::builtin());
      let interp = tokio_test::block_on(interpreter.interpret("beach in summer"));
      assert_eq!(interp.source, FilterSource::Parser);
      assert_eq!(interp.filters.types, Some(vec![TripType::Beach]));
   }

   #[test]
   fn offline_oracle_always_falls_back() {
      let interpreter = SemanticInterpreter::new(OfflineOracle, &Catalog::builtin());
      let err = tokio_test::block_on(interpreter.try_interpret("anything")).unwrap_err();
      assert!(matches!(err, Error::OracleUnavailable(_)));
   }

   #[test]
   fn request_is_deterministic_and_bounded() {
      let interpreter = SemanticInterpreter::new(OfflineOracle, &Catalog::builtin());
      let request = interpreter.request("Adventures longer than 10 days");
      assert_eq!(request.temperature, 0.0);
      assert_eq!(request.max_tokens, 500);
      assert!(request.prompt.ends_with(
         "Query: \"Adventures longer than 10 days\"\n\nRemember to return ONLY valid JSON in the specified format."
      ));
   }
}
