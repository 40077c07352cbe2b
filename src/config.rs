use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
   Figment,
   providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_TIMEOUT_MS: u64 = 15000;

pub const ENV_PREFIX: &str = "TRIPFIND_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
   /// Base URL of an OpenAI-compatible API
   pub api_base:    String,
   /// Falls back to `OPENAI_API_KEY` when unset
   pub api_key:     Option<String>,
   pub model:       String,
   pub temperature: f32,
   pub max_tokens:  u32,
   pub timeout_ms:  u64,
   /// Catalog file replacing the built-in trips
   pub catalog:     Option<PathBuf>,
}

impl Default for Config {
   fn default() -> Self {
      Self {
         api_base:    DEFAULT_API_BASE.to_string(),
         api_key:     None,
         model:       DEFAULT_MODEL.to_string(),
         temperature: 0.0,
         max_tokens:  DEFAULT_MAX_TOKENS,
         timeout_ms:  DEFAULT_TIMEOUT_MS,
         catalog:     None,
      }
   }
}

pub fn config_dir() -> Option<PathBuf> {
   ProjectDirs::from("", "", "tripfind").map(|d| d.config_dir().to_path_buf())
}

pub fn default_config_path() -> Option<PathBuf> {
   config_dir().map(|d| d.join("config.toml"))
}

impl Config {
   /// Defaults, then the TOML file (explicit path or the default location),
   /// then `TRIPFIND_*` environment variables.
   pub fn figment(path: Option<&Path>) -> Figment {
      let mut figment = Figment::from(Serialized::defaults(Self::default()));

      if let Some(path) = path.map(Path::to_path_buf).or_else(default_config_path) {
         figment = figment.merge(Toml::file(path));
      }

      figment.merge(Env::prefixed(ENV_PREFIX))
   }

   pub fn load(path: Option<&Path>) -> Result<Self> {
      Self::from_figment(Self::figment(path))
   }

   pub fn from_figment(figment: Figment) -> Result<Self> {
      let mut config: Self = figment.extract()?;

      if config.api_key.is_none() {
         config.api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
      }

      Ok(config)
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn defaults_are_deterministic_and_bounded() {
      let config = Config::default();
      assert_eq!(config.temperature, 0.0);
      assert_eq!(config.max_tokens, 500);
      assert_eq!(config.model, DEFAULT_MODEL);
   }

   #[test]
   fn file_and_env_layers_override_defaults() {
      figment::Jail::expect_with(|jail| {
         jail.create_file(
            "tripfind.toml",
            r#"
model = "gpt-4o-mini"
timeout_ms = 2500
catalog = "trips.json"
"#,
         )?;
         jail.set_env("TRIPFIND_MAX_TOKENS", "300");
         jail.set_env("TRIPFIND_API_KEY", "sk-test");

         let config = Config::load(Some(Path::new("tripfind.toml"))).expect("config loads");
         assert_eq!(config.model, "gpt-4o-mini");
         assert_eq!(config.timeout_ms, 2500);
         assert_eq!(config.max_tokens, 300);
         assert_eq!(config.api_key.as_deref(), Some("sk-test"));
         assert_eq!(config.catalog, Some(PathBuf::from("trips.json")));
         assert_eq!(config.api_base, DEFAULT_API_BASE);
         Ok(())
      });
   }

   #[test]
   fn missing_file_is_not_an_error() {
      figment::Jail::expect_with(|_jail| {
         let config = Config::load(Some(Path::new("does-not-exist.toml"))).expect("config loads");
         assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
         Ok(())
      });
   }

   #[test]
   fn invalid_values_are_reported() {
      figment::Jail::expect_with(|jail| {
         jail.set_env("TRIPFIND_MAX_TOKENS", "lots");
         assert!(Config::load(None).is_err());
         Ok(())
      });
   }
}
