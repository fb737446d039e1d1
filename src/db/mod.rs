/// Database Module
///
/// This module handles all PostgreSQL database operations including:
/// - Connection pool management
/// - Schema migrations
/// - Insert-if-absent of transaction records
/// - Upserts of known account names
use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::etl::load::{StoreError, TransactionStore};
use crate::models::TransactionRecord;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL database")?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations; creates the tables if they are absent
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await.context("Failed to run database migrations")?;

        tracing::info!("Database migrations completed successfully");
        Ok(())
    }

    /// Test the database connection
    pub async fn test_connection(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await.context("Database connection test failed")?;

        Ok(())
    }

    /// Insert or rename known accounts in one transaction.
    ///
    /// Returns, per entry, whether the account was already known.
    pub async fn upsert_known_accounts(&self, accounts: &[(String, String)]) -> Result<Vec<bool>> {
        let mut tx = self.pool.begin().await?;
        let mut existed = Vec::with_capacity(accounts.len());

        for (account, name) in accounts {
            let was_known =
                sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM known_accounts WHERE account = $1)")
                    .bind(account)
                    .fetch_one(&mut *tx)
                    .await?;

            sqlx::query(
                r#"
                INSERT INTO known_accounts (account, name)
                VALUES ($1, $2)
                ON CONFLICT (account)
                DO UPDATE SET name = EXCLUDED.name
                "#,
            )
            .bind(account)
            .bind(name)
            .execute(&mut *tx)
            .await?;

            existed.push(was_known);
        }

        tx.commit().await.context("Failed to commit known accounts")?;
        Ok(existed)
    }
}

impl TransactionStore for Database {
    async fn insert_new(&self, records: &[TransactionRecord]) -> Result<Vec<bool>, StoreError> {
        // Start a database transaction
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(records.len());

        for record in records {
            let result = sqlx::query(
                r#"
                INSERT INTO transactions (hash, account, tx_type, amount, link, tstamp)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (hash) DO NOTHING
                "#,
            )
            .bind(&record.hash)
            .bind(record.account.as_str())
            .bind(record.tx_type.as_str())
            .bind(&record.amount)
            .bind(&record.link)
            .bind(record.tstamp)
            .execute(&mut *tx)
            .await?;

            inserted.push(result.rows_affected() == 1);
        }

        // Commit the transaction
        tx.commit().await?;

        Ok(inserted)
    }
}
