//! Postgres table sink
//!
//! Inserts each batch inside a single transaction, so one failed row rolls
//! the whole batch back and the caller's retry re-inserts it cleanly.
//! Table creation is idempotent and runs once at connect time.

use contracts::{JointReading, PersistError, ReadingSink, JOINT_FIELDS};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info, instrument};

const SINK_NAME: &str = "postgres";
const MAX_CONNECTIONS: u32 = 5;

/// Relational sink over a shared connection pool
pub struct PostgresSink {
    pool: PgPool,
    table: String,
    insert_sql: String,
}

impl PostgresSink {
    /// Connect and ensure the target table exists
    pub async fn connect(database_url: &str, table: &str) -> Result<Self, PersistError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await
            .map_err(|e| PersistError::table(SINK_NAME, format!("connect: {e}")))?;

        let sink = Self::with_pool(pool, table);
        sink.ensure_table().await?;
        info!(table = %table, "postgres sink ready");
        Ok(sink)
    }

    /// Wrap an existing pool (table creation is the caller's concern)
    pub fn with_pool(pool: PgPool, table: &str) -> Self {
        Self {
            pool,
            table: table.to_string(),
            insert_sql: insert_sql(table),
        }
    }

    /// Create the target table if it does not exist
    pub async fn ensure_table(&self) -> Result<(), PersistError> {
        sqlx::query(&create_table_sql(&self.table))
            .execute(&self.pool)
            .await
            .map_err(|e| PersistError::table(SINK_NAME, format!("create table: {e}")))?;
        Ok(())
    }

    /// Target table name
    pub fn table(&self) -> &str {
        &self.table
    }
}

/// DDL for the readings table
///
/// `timestamp` is quoted: it is a reserved word used as a column name to
/// keep the table aligned with the CSV header.
pub fn create_table_sql(table: &str) -> String {
    let columns: Vec<String> = JOINT_FIELDS
        .iter()
        .map(|f| format!("{f} DOUBLE PRECISION NOT NULL"))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {table} ({}, \"timestamp\" TIMESTAMP NOT NULL)",
        columns.join(", ")
    )
}

fn insert_sql(table: &str) -> String {
    format!(
        "INSERT INTO {table} ({}, \"timestamp\") VALUES ($1, $2, $3, $4, $5, $6, $7)",
        JOINT_FIELDS.join(", ")
    )
}

impl ReadingSink for PostgresSink {
    fn name(&self) -> &str {
        SINK_NAME
    }

    #[instrument(skip_all, fields(batch_size = batch.len(), table = %self.table))]
    async fn persist(&mut self, batch: &[JointReading]) -> Result<(), PersistError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PersistError::table(SINK_NAME, format!("begin: {e}")))?;

        for reading in batch {
            let mut query = sqlx::query(&self.insert_sql);
            for angle in reading.angles() {
                query = query.bind(angle);
            }
            query
                .bind(reading.timestamp)
                .execute(&mut *tx)
                .await
                .map_err(|e| PersistError::table(SINK_NAME, format!("insert: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| PersistError::table(SINK_NAME, format!("commit: {e}")))?;

        debug!(rows = batch.len(), "batch committed");
        Ok(())
    }

    async fn close(&mut self) -> Result<(), PersistError> {
        self.pool.close().await;
        Ok(())
    }
}
