//! Transactional persistence of entity groups.
//!
//! One transaction covers the optional truncation step and every batch
//! insert. Groups are written one after another; the batches of a single
//! group are issued together and joined before the next group starts.

use std::fmt;
use std::num::NonZeroUsize;

use futures::future::try_join_all;
use tracing::{debug, info, warn};

use super::grouping::EntityGroups;
use super::progress::ProgressReporter;
use crate::error::{FixtureError, FixtureResult};
use crate::store::{FixtureStore, StoreTransaction};

/// Default number of entities per batch insert.
pub const DEFAULT_BATCH_SIZE: NonZeroUsize = match NonZeroUsize::new(250) {
	Some(size) => size,
	None => unreachable!(),
};

/// Lifecycle of one write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
	/// No transaction yet.
	Idle,
	/// Transaction acquired.
	TransactionOpen,
	/// Clearing tables (delete mode only).
	Truncating,
	/// Inserting batches.
	Persisting,
	/// Transaction committed.
	Committed,
	/// Transaction rolled back after a failure.
	RolledBack,
}

impl fmt::Display for WriterState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Idle => "idle",
			Self::TransactionOpen => "transaction_open",
			Self::Truncating => "truncating",
			Self::Persisting => "persisting",
			Self::Committed => "committed",
			Self::RolledBack => "rolled_back",
		};
		f.write_str(name)
	}
}

/// Outcome of writing one entity group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReport {
	/// Entity type of the group.
	pub entity_type: String,
	/// Target table.
	pub table: String,
	/// Number of entities written.
	pub entities: usize,
	/// Number of batch inserts issued.
	pub batches: usize,
	/// Rows reported by the database.
	pub rows_affected: u64,
}

/// Outcome of a committed write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
	/// Tables cleared before inserting, empty unless delete mode is on.
	pub truncated: Vec<String>,
	/// Per-group results in write order.
	pub groups: Vec<GroupReport>,
}

impl WriteReport {
	/// Returns the number of entities written.
	pub fn total_entities(&self) -> usize {
		self.groups.iter().map(|g| g.entities).sum()
	}

	/// Returns the number of rows reported by the database.
	pub fn total_rows(&self) -> u64 {
		self.groups.iter().map(|g| g.rows_affected).sum()
	}
}

/// Writes entity groups inside a single transaction.
#[derive(Debug, Clone, Copy)]
pub struct TransactionalWriter {
	batch_size: NonZeroUsize,
	delete: bool,
}

impl Default for TransactionalWriter {
	fn default() -> Self {
		Self::new(DEFAULT_BATCH_SIZE)
	}
}

impl TransactionalWriter {
	/// Creates an additive writer with the given batch size.
	pub fn new(batch_size: NonZeroUsize) -> Self {
		Self {
			batch_size,
			delete: false,
		}
	}

	/// Clears every target table before inserting.
	pub fn with_delete(mut self, delete: bool) -> Self {
		self.delete = delete;
		self
	}

	/// Returns the batch size.
	pub fn batch_size(&self) -> NonZeroUsize {
		self.batch_size
	}

	/// Writes `groups` to `store`.
	///
	/// Any failure after the transaction is opened rolls it back before the
	/// error is returned. The transaction is released on every path.
	///
	/// # Errors
	///
	/// - [`FixtureError::Connection`] if the transaction cannot be opened.
	/// - [`FixtureError::Persist`] if a truncate or batch insert fails.
	/// - [`FixtureError::Commit`] if the commit fails.
	pub async fn write<S>(
		&self,
		store: &S,
		groups: &EntityGroups,
		progress: &dyn ProgressReporter,
	) -> FixtureResult<WriteReport>
	where
		S: FixtureStore + ?Sized,
	{
		let mut state = WriterState::Idle;
		debug!(%state, groups = groups.len(), "starting write");

		let tx = store.begin().await.map_err(connection_error)?;
		state = WriterState::TransactionOpen;
		debug!(%state, "transaction opened");

		let outcome = match self.persist(&tx, groups, progress).await {
			Ok(report) => tx.commit().await.map(|()| report).map_err(commit_error),
			Err(error) => Err(error),
		};

		match &outcome {
			Ok(report) => {
				state = WriterState::Committed;
				info!(
					%state,
					entities = report.total_entities(),
					rows = report.total_rows(),
					"fixtures committed"
				);
			}
			Err(error) => {
				if tx.is_active()
					&& let Err(rollback_error) = tx.rollback().await
				{
					warn!(error = %rollback_error, "rollback failed");
				}
				state = WriterState::RolledBack;
				warn!(%state, %error, "write failed");
			}
		}

		tx.release().await;
		outcome
	}

	async fn persist<T>(
		&self,
		tx: &T,
		groups: &EntityGroups,
		progress: &dyn ProgressReporter,
	) -> FixtureResult<WriteReport>
	where
		T: StoreTransaction,
	{
		let mut report = WriteReport::default();

		if self.delete {
			let tables = groups.tables();
			debug!(state = %WriterState::Truncating, tables = ?tables, "clearing tables");
			progress.truncate_started(&tables);

			try_join_all(tables.iter().map(|table| async move {
				tx.truncate(table)
					.await
					.map_err(|e| persist_error(table, e))
			}))
			.await?;

			progress.truncate_finished(&tables);
			report.truncated = tables;
		}

		debug!(state = %WriterState::Persisting, batch_size = self.batch_size.get(), "inserting batches");
		for group in groups.iter() {
			progress.group_started(&group.entity_type, group.len());

			let batches: Vec<_> = group.batches(self.batch_size.get()).collect();
			let rows = try_join_all(batches.iter().map(|batch| async move {
				debug!(table = %group.table, size = batch.len(), "saving batch");
				tx.save_batch(&group.table, batch)
					.await
					.map_err(|e| persist_error(&group.table, e))
			}))
			.await?;

			let group_report = GroupReport {
				entity_type: group.entity_type.clone(),
				table: group.table.clone(),
				entities: group.len(),
				batches: batches.len(),
				rows_affected: rows.iter().sum(),
			};
			progress.group_finished(&group_report);
			report.groups.push(group_report);
		}

		Ok(report)
	}
}

fn connection_error(error: FixtureError) -> FixtureError {
	match error {
		FixtureError::Connection(_) => error,
		other => FixtureError::Connection(other.to_string()),
	}
}

fn persist_error(table: &str, error: FixtureError) -> FixtureError {
	match error {
		FixtureError::Persist { .. } => error,
		other => FixtureError::persist(table, other),
	}
}

fn commit_error(error: FixtureError) -> FixtureError {
	match error {
		FixtureError::Commit(_) => error,
		other => FixtureError::Commit(other.to_string()),
	}
}
