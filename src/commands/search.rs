use std::time::Duration;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tripfind::{
   Delivery, LatestOnly, OfflineOracle, OpenAiOracle, Oracle, SearchResult, SemanticInterpreter,
   TripSearch,
};

use super::{Context, OutputOptions, render};

#[derive(Default, Debug, Clone, Copy)]
pub struct SearchOptions {
   pub json:    bool,
   pub plain:   bool,
   pub offline: bool,
   pub dry_run: bool,
}

/// Offline when asked to be, or when no API key is configured.
fn oracle(ctx: &Context, offline: bool) -> Box<dyn Oracle> {
   if offline {
      return Box::new(OfflineOracle);
   }

   match OpenAiOracle::from_config(&ctx.config) {
      Ok(oracle) => Box::new(oracle),
      Err(e) => {
         tracing::warn!("{e}; using rule-based parsing only");
         Box::new(OfflineOracle)
      },
   }
}

pub async fn execute(ctx: Context, query: &str, options: SearchOptions) -> Result<()> {
   let output = OutputOptions::new(options.json, options.plain);

   if options.dry_run {
      return dry_run(&ctx, query, output);
   }

   let oracle = oracle(&ctx, options.offline);
   let search = TripSearch::with_config(ctx.catalog, oracle, &ctx.config);

   let spinner = (!output.json && !output.plain).then(|| {
      let spinner = ProgressBar::new_spinner();
      if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
         spinner.set_style(template);
      }
      spinner.enable_steady_tick(Duration::from_millis(100));
      spinner.set_message("Interpreting query...");
      spinner
   });

   let (tx, mut rx) = mpsc::unbounded_channel();
   let producer = async move {
      let result = search.search_staged(query, &tx).await;
      drop(tx);
      result
   };
   let consumer = async {
      let mut latest = LatestOnly::default();
      let mut last: Option<SearchResult> = None;
      while let Some(delivery) = rx.recv().await {
         if !latest.accept(&delivery) {
            continue;
         }
         match delivery {
            Delivery::Preview { trips, .. } => {
               if let Some(spinner) = &spinner {
                  spinner.set_message(format!("{} instant matches, refining...", trips.len()));
               }
            },
            Delivery::Final { result, .. } => last = Some(result),
         }
      }
      last
   };

   let (staged, delivered) = tokio::join!(producer, consumer);
   if let Some(spinner) = &spinner {
      spinner.finish_and_clear();
   }

   let Some(result) = delivered.or(staged) else {
      return Ok(());
   };

   if output.json {
      return render::print_json(&result);
   }

   render::result(query, &result, output);
   Ok(())
}

fn dry_run(ctx: &Context, query: &str, output: OutputOptions) -> Result<()> {
   let interpreter = SemanticInterpreter::with_config(OfflineOracle, &ctx.catalog, &ctx.config);
   let request = interpreter.request(query);

   if output.json {
      return render::print_json(&serde_json::json!({
         "model": ctx.config.model,
         "endpoint": format!("{}/chat/completions", ctx.config.api_base.trim_end_matches('/')),
         "temperature": request.temperature,
         "max_tokens": request.max_tokens,
         "system": request.system,
         "prompt": request.prompt,
      }));
   }

   if output.plain {
      println!("Dry run: would send to {} ({})", ctx.config.api_base, ctx.config.model);
   } else {
      println!(
         "{} would send to {} ({})",
         style("Dry run:").bold(),
         ctx.config.api_base,
         ctx.config.model
      );
   }
   println!("\n[system]\n{}\n\n[user]\n{}", request.system, request.prompt);
   Ok(())
}
