//! Storage traits implemented by database backends.
//!
//! A run opens exactly one [`StoreTransaction`] through
//! [`FixtureStore::begin`]. Transaction methods take `&self` so several
//! truncate or batch futures can be in flight at once; backends serialize
//! them on the underlying connection in issue order.

use async_trait::async_trait;

use crate::entity::Entity;
use crate::error::FixtureResult;

/// Database a fixture run writes to.
#[async_trait]
pub trait FixtureStore: Send + Sync {
	/// Transaction handle produced by [`FixtureStore::begin`].
	type Transaction: StoreTransaction;

	/// Opens a transaction.
	///
	/// # Errors
	///
	/// Returns [`FixtureError::Connection`](crate::FixtureError::Connection)
	/// if no connection or transaction can be acquired.
	async fn begin(&self) -> FixtureResult<Self::Transaction>;

	/// Closes the underlying connection pool.
	async fn close(&self);
}

/// Single unit of work spanning truncation and every batch insert.
#[async_trait]
pub trait StoreTransaction: Send + Sync {
	/// Executes a raw statement inside the transaction.
	async fn execute(&self, sql: &str) -> FixtureResult<u64>;

	/// Removes every row of `table` and of the tables depending on it.
	async fn truncate(&self, table: &str) -> FixtureResult<()>;

	/// Inserts one batch of entities into `table`, returning affected rows.
	async fn save_batch(&self, table: &str, entities: &[Entity]) -> FixtureResult<u64>;

	/// Returns true while neither commit nor rollback has happened.
	fn is_active(&self) -> bool;

	/// Commits the transaction.
	async fn commit(&self) -> FixtureResult<()>;

	/// Rolls the transaction back.
	async fn rollback(&self) -> FixtureResult<()>;

	/// Returns the connection to its pool.
	///
	/// A transaction still active at this point is discarded.
	async fn release(self);
}

/// Catalog lookups used to validate derived table names.
#[async_trait]
pub trait TableCatalog: Send + Sync {
	/// Returns true if `table` exists.
	async fn table_exists(&self, table: &str) -> FixtureResult<bool>;
}
