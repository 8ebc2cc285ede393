//! Reinhardt Fixtures CLI
//!
//! Loads a fixtures directory into a PostgreSQL or SQLite database in a
//! single transaction.
//!
//! ## Usage
//!
//! ```bash
//! reinhardt-fixtures --fixtures-path ./fixtures --delete
//! reinhardt-fixtures -p ./fixtures -s 500 --database-url sqlite://app.db
//! RUST_LOG=reinhardt_fixtures=debug reinhardt-fixtures
//! ```

mod progress;

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use reinhardt_fixtures::commands::{LoadFixturesCommand, LoadFixturesOptions};
use reinhardt_fixtures::settings::{DEFAULT_SETTINGS_FILE, FixtureSettings};
use reinhardt_fixtures::{FixtureStore, LoadSummary, TableCatalog};
use reinhardt_fixtures_db::{Dialect, PostgresStore, SqliteStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::progress::ConsoleProgress;

#[derive(Parser, Debug)]
#[command(name = "reinhardt-fixtures")]
#[command(about = "Load fixtures into the database", long_about = None)]
#[command(version)]
struct Cli {
	/// Fixtures root directory [default: ./fixtures]
	#[arg(short = 'p', long, alias = "fixturesPath", value_name = "DIR")]
	fixtures_path: Option<PathBuf>,

	/// Entities per insert statement, at least 1 [default: 250]
	#[arg(short = 's', long, alias = "transactionBatchSize", value_name = "N")]
	transaction_batch_size: Option<NonZeroUsize>,

	/// Clear every target table before loading
	#[arg(short, long)]
	delete: bool,

	/// Database URL; falls back to DATABASE_URL and the settings file
	#[arg(long, value_name = "URL")]
	database_url: Option<String>,

	/// Settings file
	#[arg(short, long, value_name = "FILE", default_value = DEFAULT_SETTINGS_FILE)]
	config: PathBuf,

	/// Verbosity level (can be repeated)
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbosity: u8,
}

impl Cli {
	/// Layers the flags over the settings file and environment.
	fn apply(&self, settings: &mut FixtureSettings) {
		if let Some(path) = &self.fixtures_path {
			settings.loader.fixtures_path = path.clone();
		}
		if let Some(size) = self.transaction_batch_size {
			settings.loader.batch_size = size.get();
		}
		if self.delete {
			settings.loader.delete = true;
		}
		if let Some(url) = &self.database_url {
			settings.database.url = Some(url.clone());
		}
	}
}

fn init_tracing(verbosity: u8) {
	let level = match verbosity {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace",
	};
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.compact()
		.init();
}

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	init_tracing(cli.verbosity);

	match run(cli).await {
		Ok(_) => println!("{}", "Fixtures are successfully loaded.".green()),
		Err(e) => {
			eprintln!("{}: {:#}", "Error".red(), e);
			process::exit(1);
		}
	}
}

async fn run(cli: Cli) -> anyhow::Result<LoadSummary> {
	let mut settings = FixtureSettings::load(&cli.config)
		.with_context(|| format!("failed to load settings from {}", cli.config.display()))?;
	cli.apply(&mut settings);

	let url = settings.database_url()?.to_string();
	let options = LoadFixturesOptions::from_settings(&settings).with_verbosity(cli.verbosity);
	let max_connections = settings.database.max_connections;

	let dialect = Dialect::from_url(&url)?;
	info!(%dialect, "connecting");
	match dialect {
		Dialect::Postgres => {
			let store = PostgresStore::connect(&url, max_connections)
				.await
				.context("failed to connect to PostgreSQL")?;
			load(store, &settings, options).await
		}
		Dialect::Sqlite => {
			let store = SqliteStore::connect(&url, max_connections)
				.await
				.context("failed to open SQLite database")?;
			load(store, &settings, options).await
		}
	}
}

async fn load<S>(
	store: S,
	settings: &FixtureSettings,
	options: LoadFixturesOptions,
) -> anyhow::Result<LoadSummary>
where
	S: FixtureStore + TableCatalog + Clone + 'static,
{
	let schema = settings
		.schema_registry()
		.with_catalog(Arc::new(store.clone()));

	let summary = LoadFixturesCommand::new()
		.execute(&store, &schema, options, &ConsoleProgress)
		.await?;
	Ok(summary)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_defaults_leave_settings_untouched() {
		let cli = Cli::try_parse_from(["reinhardt-fixtures"]).unwrap();
		let mut settings = FixtureSettings::default();
		cli.apply(&mut settings);

		assert_eq!(settings, FixtureSettings::default());
		assert_eq!(cli.config, PathBuf::from(DEFAULT_SETTINGS_FILE));
		assert_eq!(cli.verbosity, 0);
	}

	#[rstest]
	#[case(&["reinhardt-fixtures", "-p", "data", "-s", "10", "-d"])]
	#[case(&["reinhardt-fixtures", "--fixtures-path", "data", "--transaction-batch-size", "10", "--delete"])]
	#[case(&["reinhardt-fixtures", "--fixturesPath", "data", "--transactionBatchSize", "10", "--delete"])]
	fn test_flags_and_aliases(#[case] args: &[&str]) {
		let cli = Cli::try_parse_from(args).unwrap();
		let mut settings = FixtureSettings::default();
		cli.apply(&mut settings);

		assert_eq!(settings.loader.fixtures_path, PathBuf::from("data"));
		assert_eq!(settings.loader.batch_size, 10);
		assert!(settings.loader.delete);
	}

	#[rstest]
	fn test_zero_batch_size_is_rejected() {
		let result = Cli::try_parse_from(["reinhardt-fixtures", "-s", "0"]);
		assert!(result.is_err());
	}

	#[rstest]
	fn test_flags_override_settings_file() {
		let mut settings = FixtureSettings::from_toml_str(
			"[database]\nurl = \"sqlite://file.db\"\n[loader]\nbatch_size = 50\n",
		)
		.unwrap();
		let cli = Cli::try_parse_from([
			"reinhardt-fixtures",
			"--database-url",
			"postgres://localhost/app",
			"-vv",
		])
		.unwrap();
		cli.apply(&mut settings);

		assert_eq!(settings.database_url().unwrap(), "postgres://localhost/app");
		assert_eq!(settings.loader.batch_size, 50);
		assert_eq!(cli.verbosity, 2);
	}
}
