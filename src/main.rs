use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// Natural-language trip search
#[derive(Parser, Debug)]
#[command(name = "tripfind", version, about, long_about = None)]
struct Cli {
   /// Trip catalog (JSON or TOML) replacing the built-in trips
   #[arg(long, global = true)]
   catalog: Option<PathBuf>,

   /// Configuration file
   #[arg(long, global = true)]
   config: Option<PathBuf>,

   #[command(subcommand)]
   command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
   /// Search with the language-model interpreter, falling back to rules
   Search {
      query: String,

      #[arg(long)]
      json: bool,

      /// Disable colors
      #[arg(long)]
      plain: bool,

      /// Never contact the interpreter
      #[arg(long)]
      offline: bool,

      /// Print the interpreter request instead of sending it
      #[arg(long)]
      dry_run: bool,
   },

   /// Instant rule-based results
   Preview {
      query: String,

      #[arg(long)]
      json: bool,

      #[arg(long)]
      plain: bool,
   },

   /// Filter the catalog directly
   Filter {
      #[command(flatten)]
      filters: commands::filter::FilterArgs,

      #[arg(long)]
      json: bool,

      #[arg(long)]
      plain: bool,
   },

   /// Show every trip in the catalog
   List {
      #[arg(long)]
      json: bool,

      #[arg(long)]
      plain: bool,
   },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
   let cli = Cli::parse();

   tracing_subscriber::fmt()
      .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
      .with_writer(std::io::stderr)
      .init();

   let ctx = commands::Context::load(cli.catalog, cli.config)?;

   match cli.command {
      Command::Search { query, json, plain, offline, dry_run } => {
         commands::search::execute(ctx, &query, commands::search::SearchOptions {
            json,
            plain,
            offline,
            dry_run,
         })
         .await
      },
      Command::Preview { query, json, plain } => {
         commands::preview::execute(&ctx, &query, commands::OutputOptions::new(json, plain))
      },
      Command::Filter { filters, json, plain } => {
         commands::filter::execute(&ctx, filters, commands::OutputOptions::new(json, plain))
      },
      Command::List { json, plain } => {
         commands::list::execute(&ctx, commands::OutputOptions::new(json, plain))
      },
   }
}
