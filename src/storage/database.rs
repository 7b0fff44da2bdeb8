//! Database Layer with Connection Pooling and Safe Transactions
//!
//! Production-ready SQLite database layer featuring:
//! - Connection pooling via r2d2 for concurrent access
//! - Panic-safe transactions with automatic rollback
//! - Version-tracked migrations
//! - WAL mode for optimal read/write performance

use std::path::Path;
use std::sync::Arc;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde::Serialize;

use crate::constants;
use crate::types::{HubError, Result, ResultExt};

/// Shared database handle.
pub type SharedDatabase = Arc<Database>;

const SCHEMA: &str = include_str!("schema.sql");

/// Current schema version for migration tracking
const SCHEMA_VERSION: u32 = 3;

/// Migration definitions
struct Migration {
    version: u32,
    description: &'static str,
    up: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 2,
        description: "Add login streak tracking",
        up: "ALTER TABLE users ADD COLUMN login_streak INTEGER NOT NULL DEFAULT 0",
    },
    Migration {
        version: 3,
        description: "Track view quota apart from prompts",
        up: r#"
            CREATE TABLE IF NOT EXISTS view_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                own_prompt INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            );
        "#,
    },
];

/// Connection pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool
    pub max_size: u32,
    /// Minimum idle connections to keep ready
    pub min_idle: u32,
    /// Timeout for acquiring a connection (seconds)
    pub connection_timeout_secs: u64,
}

impl PoolConfig {
    /// Minimum pool size regardless of CPU count
    const MIN_POOL_SIZE: u32 = 2;

    /// Pool size based on available CPU cores, capped for a single-writer database
    pub fn optimal_pool_size() -> u32 {
        let cores = std::thread::available_parallelism()
            .map(|p| p.get() as u32)
            .unwrap_or(4);

        cores.clamp(Self::MIN_POOL_SIZE, constants::database::POOL_MAX_SIZE)
    }

    /// Create config with automatic pool sizing based on CPU cores
    pub fn auto() -> Self {
        let max_size = Self::optimal_pool_size();
        Self {
            max_size,
            min_idle: 1,
            connection_timeout_secs: constants::database::CONNECTION_TIMEOUT_SECS,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::auto()
    }
}

/// Row counts reported by `promptub status`
#[derive(Debug, Clone, Default, Serialize)]
pub struct DatabaseStats {
    pub schema_version: u32,
    pub users: u64,
    pub prompts: u64,
    pub comments: u64,
    pub interactions: u64,
    pub ledger_entries: u64,
    pub active_sessions: u64,
}

/// Thread-safe database with connection pooling.
///
/// Uses r2d2 connection pool for concurrent access with automatic
/// connection management and health checking.
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open database with connection pooling at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, PoolConfig::default())
    }

    /// Open database with custom pool configuration.
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: PoolConfig) -> Result<Self> {
        let manager =
            SqliteConnectionManager::file(path.as_ref()).with_init(Self::configure_connection);

        let pool = Pool::builder()
            .max_size(config.max_size)
            .min_idle(Some(config.min_idle))
            .connection_timeout(std::time::Duration::from_secs(
                config.connection_timeout_secs,
            ))
            .build(manager)
            .map_err(|e| HubError::Storage(format!("Failed to create connection pool: {}", e)))?;

        Ok(Self { pool })
    }

    /// Open an in-memory database for testing or temporary use.
    ///
    /// Every in-memory connection is its own database, so the pool holds one.
    pub fn open_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory().with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });

        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| HubError::Storage(format!("Failed to create in-memory pool: {}", e)))?;

        Ok(Self { pool })
    }

    /// Configure a new connection with production-ready settings.
    fn configure_connection(conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.execute_batch(&format!(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = {};
            "#,
            constants::database::BUSY_TIMEOUT_MS
        ))?;
        Ok(())
    }

    /// Get a connection from the pool.
    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| {
            HubError::Storage(format!("Failed to acquire database connection: {}", e))
        })
    }

    /// Initialize database schema.
    ///
    /// Fresh databases get the full schema at the current version; older
    /// databases are brought forward by the pending migrations.
    pub fn initialize(&self) -> Result<()> {
        let conn = self.conn()?;
        let current_version = Self::user_version(&conn);

        if current_version > 0 {
            Self::migrate(&conn, current_version)?;
        }

        conn.execute_batch(SCHEMA)
            .with_context("Failed to initialize database schema")?;

        if current_version < SCHEMA_VERSION {
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)
                .with_context("Failed to set schema version")?;
        }
        Ok(())
    }

    fn user_version(conn: &Connection) -> u32 {
        conn.pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap_or(0)
    }

    /// Run version-tracked migrations.
    fn migrate(conn: &Connection, current_version: u32) -> Result<()> {
        for migration in MIGRATIONS {
            if migration.version > current_version {
                conn.execute_batch(migration.up).with_context_fn(|| {
                    format!(
                        "Failed to apply migration {}: {}",
                        migration.version, migration.description
                    )
                })?;

                tracing::info!(
                    "Applied migration {}: {}",
                    migration.version,
                    migration.description
                );
            }
        }
        Ok(())
    }

    /// Get a raw connection for read operations.
    pub fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.conn()
    }

    /// Execute a single SQL statement.
    pub fn execute(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<usize> {
        let conn = self.conn()?;
        conn.execute(sql, params)
            .with_context("Failed to execute SQL")
    }

    /// Execute a function within a panic-safe database transaction.
    ///
    /// All operations within the closure are atomic. If the closure returns an
    /// error or panics, the transaction is rolled back; a panic is returned as
    /// an error instead of poisoning the connection pool.
    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
            .with_context("Failed to start transaction")?;

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(&tx)));

        match result {
            Ok(Ok(value)) => {
                tx.commit().with_context("Failed to commit transaction")?;
                Ok(value)
            }
            Ok(Err(e)) => {
                // Transaction will be rolled back on drop
                Err(e)
            }
            Err(panic_payload) => {
                // Transaction will be rolled back on drop
                let panic_msg = panic_payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic_payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "Unknown panic".to_string());

                tracing::error!("Transaction panicked: {}", panic_msg);
                Err(HubError::Storage(format!(
                    "Transaction panicked: {}",
                    panic_msg
                )))
            }
        }
    }

    /// Row counts of the main tables.
    pub fn stats(&self, now: i64) -> Result<DatabaseStats> {
        let conn = self.conn()?;
        let count = |sql: &str| -> Result<u64> {
            let n: i64 = conn
                .query_row(sql, [], |row| row.get(0))
                .with_context_fn(|| format!("Failed to run '{}'", sql))?;
            Ok(n.max(0) as u64)
        };

        let active_sessions: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sessions WHERE expires_at > ?1",
            [now],
            |row| row.get(0),
        )?;

        Ok(DatabaseStats {
            schema_version: Self::user_version(&conn),
            users: count("SELECT COUNT(*) FROM users")?,
            prompts: count("SELECT COUNT(*) FROM prompts")?,
            comments: count("SELECT COUNT(*) FROM comments")?,
            interactions: count("SELECT COUNT(*) FROM interactions")?,
            ledger_entries: count("SELECT COUNT(*) FROM point_ledger")?,
            active_sessions: active_sessions.max(0) as u64,
        })
    }
}
