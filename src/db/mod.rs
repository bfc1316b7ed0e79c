//! Database module: connection management, migrations and repository operations.
//!
//! Operations are methods on [`DbPool`], grouped by entity in submodules. Every
//! mutation runs inside one transaction; operations that must serialize with
//! each other take a [`locks::WriteLocks`] guard before the transaction begins.

pub mod attachments;
pub mod catalog;
pub mod comments;
pub mod filters;
pub mod issues;
pub mod locks;
pub mod tags;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::config::DatabaseSettings;
use crate::error::{AppError, AppResult};
use crate::migration::Migrator;
use crate::services::test_case_id::TestCaseIdGenerator;

use locks::WriteLocks;

/// Database connection pool plus the process-wide write locks.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
    locks: Arc<WriteLocks>,
    ids: Arc<TestCaseIdGenerator>,
}

impl DbPool {
    /// Connect using the configured settings.
    pub async fn new(settings: &DatabaseSettings) -> AppResult<Self> {
        let mut options = ConnectOptions::new(settings.url.clone());
        options
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = Database::connect(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        info!(
            "Database pool ready (max_connections={})",
            settings.max_connections
        );

        Ok(Self::from_connection(conn))
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self {
            conn,
            locks: Arc::new(WriteLocks::default()),
            ids: Arc::new(TestCaseIdGenerator::default()),
        }
    }

    /// Replace the identifier generator (tests script the random suffix).
    pub fn with_id_generator(mut self, generator: TestCaseIdGenerator) -> Self {
        self.ids = Arc::new(generator);
        self
    }

    /// Get access to the connection for executing queries.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Apply all pending migrations.
    pub async fn run_migrations(&self) -> AppResult<()> {
        Migrator::up(&self.conn, None)
            .await
            .map_err(|e| AppError::Database(format!("Failed to run migrations: {}", e)))?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Round-trip to the database.
    pub async fn ping(&self) -> AppResult<()> {
        self.conn
            .ping()
            .await
            .map_err(|e| AppError::Database(format!("Database ping failed: {}", e)))
    }
}
