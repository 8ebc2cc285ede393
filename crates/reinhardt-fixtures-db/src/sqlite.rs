//! SQLite fixture store.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use reinhardt_fixtures::{
	Entity, FixtureError, FixtureResult, FixtureStore, StoreTransaction, TableCatalog,
};
use sqlx::sqlite::{SqliteConnection, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::sync::Mutex;
use tracing::debug;

use crate::dialect::{Dialect, batch_columns, batch_payload};

const DIALECT: Dialect = Dialect::Sqlite;

/// Fixture store backed by a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
	pool: SqlitePool,
}

impl SqliteStore {
	/// Connects a pool of at most `max_connections` connections.
	///
	/// # Errors
	///
	/// Returns [`FixtureError::Connection`] if the database cannot be opened.
	pub async fn connect(url: &str, max_connections: u32) -> FixtureResult<Self> {
		let pool = SqlitePoolOptions::new()
			.max_connections(max_connections)
			.connect(url)
			.await
			.map_err(|e| FixtureError::Connection(e.to_string()))?;
		Ok(Self::from_pool(pool))
	}

	/// Wraps an existing pool.
	pub fn from_pool(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Returns the underlying pool.
	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}
}

#[async_trait]
impl FixtureStore for SqliteStore {
	type Transaction = SqliteTransaction;

	async fn begin(&self) -> FixtureResult<SqliteTransaction> {
		let mut tx = self
			.pool
			.begin()
			.await
			.map_err(|e| FixtureError::Connection(e.to_string()))?;

		// Foreign keys are checked at commit, so tables can be cleared and
		// filled in any order inside the transaction.
		sqlx::query("PRAGMA defer_foreign_keys = ON")
			.execute(&mut *tx)
			.await
			.map_err(|e| FixtureError::Connection(e.to_string()))?;

		Ok(SqliteTransaction::new(tx))
	}

	async fn close(&self) {
		self.pool.close().await;
	}
}

#[async_trait]
impl TableCatalog for SqliteStore {
	async fn table_exists(&self, table: &str) -> FixtureResult<bool> {
		sqlx::query_scalar::<_, bool>(DIALECT.table_exists_sql())
			.bind(bare_name(table))
			.fetch_one(&self.pool)
			.await
			.map_err(|e| FixtureError::Connection(e.to_string()))
	}
}

/// SQLite transaction shared by concurrent truncate and batch futures.
pub struct SqliteTransaction {
	tx: Mutex<Option<Transaction<'static, Sqlite>>>,
	active: AtomicBool,
}

impl SqliteTransaction {
	fn new(tx: Transaction<'static, Sqlite>) -> Self {
		Self {
			tx: Mutex::new(Some(tx)),
			active: AtomicBool::new(true),
		}
	}

	async fn run(&self, table: &str, sql: &str, payload: Option<String>) -> FixtureResult<u64> {
		let mut guard = self.tx.lock().await;
		let tx = guard
			.as_mut()
			.ok_or_else(|| FixtureError::persist(table, "transaction already finished"))?;

		let mut query = sqlx::query(sql);
		if let Some(payload) = payload {
			query = query.bind(payload);
		}
		let result = query
			.execute(&mut **tx)
			.await
			.map_err(|e| FixtureError::persist(table, e))?;
		Ok(result.rows_affected())
	}

	async fn finish(&self) -> FixtureResult<Transaction<'static, Sqlite>> {
		self.active.store(false, Ordering::SeqCst);
		self.tx
			.lock()
			.await
			.take()
			.ok_or_else(|| FixtureError::Commit("transaction already finished".to_string()))
	}
}

/// `table` followed by every table reaching it through foreign keys, in
/// discovery order.
async fn dependent_closure(
	conn: &mut SqliteConnection,
	table: &str,
) -> Result<Vec<String>, sqlx::Error> {
	let Some(sql) = DIALECT.dependent_tables_sql() else {
		return Ok(vec![table.to_string()]);
	};

	let mut tables = vec![table.to_string()];
	let mut seen = HashSet::from([bare_name(table).to_lowercase()]);
	let mut next = 0;
	while next < tables.len() {
		let parent = bare_name(&tables[next]).to_string();
		let children: Vec<String> = sqlx::query_scalar(sql)
			.bind(parent)
			.fetch_all(&mut *conn)
			.await?;
		for child in children {
			if seen.insert(child.to_lowercase()) {
				tables.push(child);
			}
		}
		next += 1;
	}
	Ok(tables)
}

fn bare_name(table: &str) -> &str {
	table.rsplit('.').next().unwrap_or(table)
}

#[async_trait]
impl StoreTransaction for SqliteTransaction {
	async fn execute(&self, sql: &str) -> FixtureResult<u64> {
		self.run("<statement>", sql, None).await
	}

	async fn truncate(&self, table: &str) -> FixtureResult<()> {
		let mut guard = self.tx.lock().await;
		let tx = guard
			.as_mut()
			.ok_or_else(|| FixtureError::persist(table, "transaction already finished"))?;

		let tables = dependent_closure(&mut **tx, table)
			.await
			.map_err(|e| FixtureError::persist(table, e))?;

		// Dependents before the tables they reference.
		for target in tables.iter().rev() {
			let sql = DIALECT.truncate_sql(target);
			debug!(table, target = %target, sql = %sql, "truncating");
			sqlx::query(&sql)
				.execute(&mut **tx)
				.await
				.map_err(|e| FixtureError::persist(table, e))?;
		}
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
		let payload = batch_payload(entities, &columns).to_string();
		self.run(table, &sql, Some(payload)).await
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
