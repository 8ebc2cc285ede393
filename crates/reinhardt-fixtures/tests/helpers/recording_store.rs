//! In-memory store recording every storage operation.
//!
//! Committed rows survive across runs so additive and delete modes can be
//! compared. Writes inside a transaction are staged and only become visible
//! on commit.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reinhardt_fixtures::{Entity, FixtureError, FixtureResult, FixtureStore, StoreTransaction};

/// One recorded storage operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
	Begin,
	Truncate(String),
	/// Recorded on entry to a batch insert by yielding stores only.
	BatchStarted(String),
	Batch(String, Vec<String>),
	Commit,
	Rollback,
	Release,
	Close,
}

type Tables = HashMap<String, Vec<Entity>>;

#[derive(Default)]
struct Shared {
	ops: Mutex<Vec<Op>>,
	tables: Mutex<Tables>,
}

impl Shared {
	fn record(&self, op: Op) {
		self.ops.lock().unwrap().push(op);
	}
}

/// Store keeping committed rows in memory.
#[derive(Default, Clone)]
pub struct RecordingStore {
	shared: Arc<Shared>,
	fail_on_table: Option<String>,
	yield_in_batches: bool,
}

impl RecordingStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Fails every batch insert into `table`.
	pub fn failing_on(table: &str) -> Self {
		Self {
			fail_on_table: Some(table.to_string()),
			..Self::default()
		}
	}

	/// Suspends every batch insert between its start and its end, so
	/// concurrently issued batches interleave in the log.
	pub fn yielding() -> Self {
		Self {
			yield_in_batches: true,
			..Self::default()
		}
	}

	pub fn ops(&self) -> Vec<Op> {
		self.shared.ops.lock().unwrap().clone()
	}

	/// Returns committed fixture names of `table` in insertion order.
	pub fn rows(&self, table: &str) -> Vec<String> {
		self.shared
			.tables
			.lock()
			.unwrap()
			.get(table)
			.map(|rows| rows.iter().map(|e| e.fixture.clone()).collect())
			.unwrap_or_default()
	}

	/// Returns committed entities of `table`.
	pub fn entities(&self, table: &str) -> Vec<Entity> {
		self.shared
			.tables
			.lock()
			.unwrap()
			.get(table)
			.cloned()
			.unwrap_or_default()
	}

	pub fn total_rows(&self) -> usize {
		self.shared.tables.lock().unwrap().values().map(Vec::len).sum()
	}
}

pub struct RecordingTransaction {
	shared: Arc<Shared>,
	staged: Mutex<Tables>,
	fail_on_table: Option<String>,
	yield_in_batches: bool,
	active: AtomicBool,
}

#[async_trait]
impl FixtureStore for RecordingStore {
	type Transaction = RecordingTransaction;

	async fn begin(&self) -> FixtureResult<RecordingTransaction> {
		self.shared.record(Op::Begin);
		let staged = self.shared.tables.lock().unwrap().clone();
		Ok(RecordingTransaction {
			shared: Arc::clone(&self.shared),
			staged: Mutex::new(staged),
			fail_on_table: self.fail_on_table.clone(),
			yield_in_batches: self.yield_in_batches,
			active: AtomicBool::new(true),
		})
	}

	async fn close(&self) {
		self.shared.record(Op::Close);
	}
}

#[async_trait]
impl StoreTransaction for RecordingTransaction {
	async fn execute(&self, _sql: &str) -> FixtureResult<u64> {
		Ok(0)
	}

	async fn truncate(&self, table: &str) -> FixtureResult<()> {
		self.shared.record(Op::Truncate(table.to_string()));
		self.staged.lock().unwrap().remove(table);
		Ok(())
	}

	async fn save_batch(&self, table: &str, entities: &[Entity]) -> FixtureResult<u64> {
		if self.yield_in_batches {
			self.shared.record(Op::BatchStarted(table.to_string()));
			for _ in 0..3 {
				tokio::task::yield_now().await;
			}
		}
		if self.fail_on_table.as_deref() == Some(table) {
			return Err(FixtureError::persist(table, "constraint violation"));
		}
		let names = entities.iter().map(|e| e.fixture.clone()).collect();
		self.shared.record(Op::Batch(table.to_string(), names));
		self.staged
			.lock()
			.unwrap()
			.entry(table.to_string())
			.or_default()
			.extend_from_slice(entities);
		Ok(entities.len() as u64)
	}

	fn is_active(&self) -> bool {
		self.active.load(Ordering::SeqCst)
	}

	async fn commit(&self) -> FixtureResult<()> {
		self.active.store(false, Ordering::SeqCst);
		let staged = std::mem::take(&mut *self.staged.lock().unwrap());
		*self.shared.tables.lock().unwrap() = staged;
		self.shared.record(Op::Commit);
		Ok(())
	}

	async fn rollback(&self) -> FixtureResult<()> {
		self.active.store(false, Ordering::SeqCst);
		self.staged.lock().unwrap().clear();
		self.shared.record(Op::Rollback);
		Ok(())
	}

	async fn release(self) {
		self.shared.record(Op::Release);
	}
}
