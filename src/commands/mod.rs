pub mod filter;
pub mod list;
pub mod preview;
pub mod render;
pub mod search;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use is_terminal::IsTerminal;
use tripfind::{Catalog, Config};

/// Configuration and catalog shared by every command.
pub struct Context {
   pub config:  Config,
   pub catalog: Catalog,
}

impl Context {
   /// `--catalog` wins over the configured catalog, which wins over the
   /// built-in trips.
   pub fn load(catalog: Option<PathBuf>, config: Option<PathBuf>) -> Result<Self> {
      let config = Config::load(config.as_deref()).context("failed to load configuration")?;

      let catalog = match catalog.or_else(|| config.catalog.clone()) {
         Some(path) => Catalog::load(&path)
            .with_context(|| format!("failed to load catalog {}", path.display()))?,
         None => Catalog::builtin(),
      };
      tracing::debug!("catalog has {} trips", catalog.len());

      Ok(Self { config, catalog })
   }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct OutputOptions {
   pub json:  bool,
   pub plain: bool,
}

impl OutputOptions {
   /// Colors are disabled when stdout is not a terminal.
   pub fn new(json: bool, plain: bool) -> Self {
      Self { json, plain: plain || !std::io::stdout().is_terminal() }
   }
}
