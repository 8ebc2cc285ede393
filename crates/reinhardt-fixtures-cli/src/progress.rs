//! Console progress output.

use colored::Colorize;
use reinhardt_fixtures::pipeline::{GroupReport, ProgressReporter};

/// Prints pipeline progress to stdout.
#[derive(Debug, Default)]
pub struct ConsoleProgress;

impl ProgressReporter for ConsoleProgress {
	fn fixtures_collected(&self, total: usize) {
		println!("total fixtures: {}", total);
	}

	fn truncate_started(&self, tables: &[String]) {
		if !tables.is_empty() {
			println!("{} {}", "Clearing".yellow(), tables.join(", "));
		}
	}

	fn truncate_finished(&self, tables: &[String]) {
		println!("  {} {} table(s)", "Cleared".green(), tables.len());
	}

	fn group_started(&self, entity_type: &str, entities: usize) {
		println!("{} {} ({} fixtures)", "Loading".cyan(), entity_type, entities);
	}

	fn group_finished(&self, report: &GroupReport) {
		println!(
			"  {} {} row(s) into {} in {} batch(es)",
			"Loaded".green(),
			report.rows_affected,
			report.table,
			report.batches
		);
	}
}
