//! OpenAI-compatible chat-completions oracle.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
   config::Config,
   error::{Error, Result},
   interpret::{Oracle, OracleRequest},
};

pub struct OpenAiOracle {
   client:   Client,
   base_url: String,
   api_key:  String,
   model:    String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
   model:       &'a str,
   messages:    [ChatMessage<'a>; 2],
   temperature: f32,
   max_tokens:  u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
   role:    &'static str,
   content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
   #[serde(default)]
   choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
   message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
   content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
   error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
   message: String,
}

impl OpenAiOracle {
   pub fn new(base_url: &str, api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
      let client = Client::builder().timeout(timeout).build()?;

      Ok(Self {
         client,
         base_url: base_url.trim_end_matches('/').to_string(),
         api_key: api_key.to_string(),
         model: model.to_string(),
      })
   }

   /// Builds the oracle from configuration. Fails when no API key is set.
   pub fn from_config(config: &Config) -> Result<Self> {
      let api_key = config
         .api_key
         .as_deref()
         .filter(|k| !k.trim().is_empty())
         .ok_or_else(|| {
            Error::OracleUnavailable(
               "no API key configured (set TRIPFIND_API_KEY or OPENAI_API_KEY)".to_string(),
            )
         })?;

      Self::new(&config.api_base, api_key, &config.model, Duration::from_millis(config.timeout_ms))
   }

   pub fn endpoint(&self) -> String {
      format!("{}/chat/completions", self.base_url)
   }
}

#[async_trait::async_trait]
impl Oracle for OpenAiOracle {
   async fn complete(&self, request: &OracleRequest) -> Result<String> {
      let body = ChatRequest {
         model:       &self.model,
         messages:    [
            ChatMessage { role: "system", content: &request.system },
            ChatMessage { role: "user", content: &request.prompt },
         ],
         temperature: request.temperature,
         max_tokens:  request.max_tokens,
      };

      let response = self
         .client
         .post(self.endpoint())
         .bearer_auth(&self.api_key)
         .json(&body)
         .send()
         .await
         .map_err(|e| {
            if e.is_timeout() {
               Error::OracleUnavailable("request timed out".to_string())
            } else if e.is_connect() {
               Error::OracleUnavailable(format!("connection failed: {e}"))
            } else {
               Error::OracleUnavailable(format!("request failed: {e}"))
            }
         })?;

      let status = response.status();
      if !status.is_success() {
         let text = response.text().await.unwrap_or_default();
         return Err(api_error(status, &text));
      }

      let payload: ChatResponse = response
         .json()
         .await
         .map_err(|e| Error::OracleMalformed(format!("failed to decode completion: {e}")))?;

      payload
         .choices
         .into_iter()
         .next()
         .and_then(|c| c.message.content)
         .filter(|c| !c.trim().is_empty())
         .ok_or_else(|| Error::OracleMalformed("no response from model".to_string()))
   }
}

fn api_error(status: StatusCode, body: &str) -> Error {
   let detail = serde_json::from_str::<ErrorResponse>(body)
      .map(|e| e.error.message)
      .unwrap_or_else(|_| body.trim().to_string());

   if status == StatusCode::TOO_MANY_REQUESTS {
      Error::OracleUnavailable(format!("rate limited: {detail}"))
   } else {
      Error::OracleUnavailable(format!("API error ({status}): {detail}"))
   }
}
