pub mod aggregation;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod modules;
pub mod plans;
pub mod progression;
pub mod seed;
pub mod users;

#[cfg(test)]
mod test_utils;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::AppConfig;

pub async fn run() -> anyhow::Result<()> {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  let cli = Cli::parse();
  let mut config = AppConfig::from_env().context("Invalid configuration")?;
  if cli.verbose {
    config.log_filter = "debug".to_string();
  }

  let filter = EnvFilter::try_new(&config.log_filter)
    .with_context(|| format!("Invalid log filter: {}", config.log_filter))?;
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();

  cli::execute(cli, config).await
}
