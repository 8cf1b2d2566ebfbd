mod app;
mod cache;
mod catapi;
mod commands;
mod config;
mod event;
mod logging;
mod query;
mod registration;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "catui")]
#[command(about = "Register cats and browse The Cat API from your terminal")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/catui/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Number of images to fetch for the gallery
  #[arg(short, long)]
  limit: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Keep the guard alive so buffered log lines are flushed on exit
  let _log_guard = logging::init()?;

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Override limit if specified on command line
  if let Some(limit) = args.limit {
    config.cat_api.limit = limit;
  }

  info!(
    limit = config.cat_api.limit,
    authenticated = config.cat_api.api_key.is_some(),
    "starting catui"
  );

  // Initialize and run the app
  let mut app = app::App::new(config)?;
  app.run().await?;

  Ok(())
}
