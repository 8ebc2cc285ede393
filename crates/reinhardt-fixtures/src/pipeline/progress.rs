//! Progress callbacks for user-facing output.

use super::writer::GroupReport;

/// Receives pipeline progress. Every method defaults to doing nothing.
pub trait ProgressReporter: Send + Sync {
	/// Called after each fixture is grouped, with the running total.
	fn fixture_counted(&self, _total: usize) {}

	/// Called once all fixtures are in memory.
	fn fixtures_collected(&self, _total: usize) {}

	/// Called before the truncate statements are issued.
	fn truncate_started(&self, _tables: &[String]) {}

	/// Called once every truncate statement has completed.
	fn truncate_finished(&self, _tables: &[String]) {}

	/// Called before the batches of a group are issued.
	fn group_started(&self, _entity_type: &str, _entities: usize) {}

	/// Called once every batch of a group has completed.
	fn group_finished(&self, _report: &GroupReport) {}
}

/// Reporter that discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {}
