//! PostgreSQL fixture store.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use reinhardt_fixtures::{
	Entity, FixtureError, FixtureResult, FixtureStore, StoreTransaction, TableCatalog,
};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::Mutex;
use tracing::debug;

use crate::dialect::{Dialect, batch_columns, batch_payload};

const DIALECT: Dialect = Dialect::Postgres;

/// Fixture store backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
	pool: PgPool,
}

impl PostgresStore {
	/// Connects a pool of at most `max_connections` connections.
	///
	/// # Errors
	///
	/// Returns [`FixtureError::Connection`] if the server cannot be reached.
	pub async fn connect(url: &str, max_connections: u32) -> FixtureResult<Self> {
		let pool = PgPoolOptions::new()
			.max_connections(max_connections)
			.connect(url)
			.await
			.map_err(|e| FixtureError::Connection(e.to_string()))?;
		Ok(Self::from_pool(pool))
	}

	/// Wraps an existing pool.
	pub fn from_pool(pool: PgPool) -> Self {
		Self { pool }
	}

	/// Returns the underlying pool.
	pub fn pool(&self) -> &PgPool {
		&self.pool
	}
}

#[async_trait]
impl FixtureStore for PostgresStore {
	type Transaction = PostgresTransaction;

	async fn begin(&self) -> FixtureResult<PostgresTransaction> {
		let tx = self
			.pool
			.begin()
			.await
			.map_err(|e| FixtureError::Connection(e.to_string()))?;
		Ok(PostgresTransaction::new(tx))
	}

	async fn close(&self) {
		self.pool.close().await;
	}
}

#[async_trait]
impl TableCatalog for PostgresStore {
	async fn table_exists(&self, table: &str) -> FixtureResult<bool> {
		sqlx::query_scalar::<_, bool>(DIALECT.table_exists_sql())
			.bind(table)
			.fetch_one(&self.pool)
			.await
			.map_err(|e| FixtureError::Connection(e.to_string()))
	}
}

/// PostgreSQL transaction shared by concurrent truncate and batch futures.
pub struct PostgresTransaction {
	tx: Mutex<Option<Transaction<'static, Postgres>>>,
	active: AtomicBool,
}

impl PostgresTransaction {
	fn new(tx: Transaction<'static, Postgres>) -> Self {
		Self {
			tx: Mutex::new(Some(tx)),
			active: AtomicBool::new(true),
		}
	}

	async fn run(&self, table: &str, sql: &str, payload: Option<Value>) -> FixtureResult<u64> {
		let mut guard = self.tx.lock().await;
		let tx = guard
			.as_mut()
			.ok_or_else(|| FixtureError::persist(table, "transaction already finished"))?;

		let mut query = sqlx::query(sql);
		if let Some(payload) = payload {
			query = query.bind(Json(payload));
		}
		let result = query
			.execute(&mut **tx)
			.await
			.map_err(|e| FixtureError::persist(table, e))?;
		Ok(result.rows_affected())
	}

	async fn finish(&self) -> FixtureResult<Transaction<'static, Postgres>> {
		self.active.store(false, Ordering::SeqCst);
		self.tx
			.lock()
			.await
			.take()
			.ok_or_else(|| FixtureError::Commit("transaction already finished".to_string()))
	}
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
	async fn execute(&self, sql: &str) -> FixtureResult<u64> {
		self.run("<statement>", sql, None).await
	}

	async fn truncate(&self, table: &str) -> FixtureResult<()> {
		let sql = DIALECT.truncate_sql(table);
		debug!(table, sql = %sql, "truncating");
		self.run(table, &sql, None).await?;
		Ok(())
	}

	async fn save_batch(&self, table: &str, entities: &[Entity]) -> FixtureResult<u64> {
		let columns = batch_columns(entities);
		if columns.is_empty() {
			let sql = DIALECT.insert_default_sql(table);
			let mut rows = 0;
			for _ in entities {
				rows += self.run(table, &sql, None).await?;
			}
			return Ok(rows);
		}

		let sql = DIALECT.insert_batch_sql(table, &columns);
		self.run(table, &sql, Some(batch_payload(entities, &columns)))
			.await
	}

	fn is_active(&self) -> bool {
		self.active.load(Ordering::SeqCst)
	}

	async fn commit(&self) -> FixtureResult<()> {
		self.finish()
			.await?
			.commit()
			.await
			.map_err(|e| FixtureError::Commit(e.to_string()))
	}

	async fn rollback(&self) -> FixtureResult<()> {
		self.finish()
			.await?
			.rollback()
			.await
			.map_err(|e| FixtureError::Connection(e.to_string()))
	}

	async fn release(self) {
		if self.tx.into_inner().is_some() {
			debug!("dropping unfinished transaction");
		}
	}
}
