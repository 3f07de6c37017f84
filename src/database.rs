//! Database file management and connection acquisition
//!
//! This module provides Diesel-based SQLite connectivity through an r2d2 pool.
//! A connection checked out of the pool goes back when it is dropped, which is
//! what scopes each [`OrdersContext`] to one phase.

use diesel::connection::{Instrumentation, InstrumentationEvent, SimpleConnection};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection};
use diesel::sql_types::Text;
use diesel::sqlite::SqliteConnection;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::context::OrdersContext;
use crate::error::Result;
use crate::mapping::Model;

pub type DbConnection = SqliteConnection;
pub type Pool = r2d2::Pool<ConnectionManager<DbConnection>>;
pub type PooledConnection = r2d2::PooledConnection<ConnectionManager<DbConnection>>;

/// Files SQLite may leave next to the database file
const COMPANION_SUFFIXES: [&str; 3] = ["-journal", "-wal", "-shm"];

/// Database configuration options
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_path: PathBuf,
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
    pub busy_timeout_ms: u64,
    pub enforce_foreign_keys: bool,
    pub log_statements: bool,
}

impl DatabaseConfig {
    /// Default options with the database file at `path`
    pub fn at(path: impl Into<PathBuf>) -> Self {
        DatabaseConfig {
            database_path: path.into(),
            ..DatabaseConfig::default()
        }
    }

    fn database_url(&self) -> String {
        self.database_path.to_string_lossy().into_owned()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            database_path: PathBuf::from("Demo.ViewTypes.db"),
            max_connections: 1,          // One phase at a time
            connection_timeout_secs: 30, // Wait up to 30s for connection
            busy_timeout_ms: 5000,
            enforce_foreign_keys: true,
            log_statements: true,
        }
    }
}

/// Per-connection setup run by the pool on every new connection
#[derive(Debug, Clone)]
struct ConnectionOptions {
    busy_timeout_ms: u64,
    enforce_foreign_keys: bool,
    log_statements: bool,
}

impl CustomizeConnection<DbConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut DbConnection) -> std::result::Result<(), diesel::r2d2::Error> {
        let mut pragmas = format!("PRAGMA busy_timeout = {};", self.busy_timeout_ms);
        if self.enforce_foreign_keys {
            pragmas.push_str(" PRAGMA foreign_keys = ON;");
        }
        conn.batch_execute(&pragmas)
            .map_err(diesel::r2d2::Error::QueryError)?;

        if self.log_statements {
            conn.set_instrumentation(StatementLogger);
        }
        Ok(())
    }
}

/// Logs every finished statement; connection events are left out
struct StatementLogger;

impl Instrumentation for StatementLogger {
    fn on_connection_event(&mut self, event: InstrumentationEvent<'_>) {
        if let InstrumentationEvent::FinishQuery { query, error, .. } = event {
            match error {
                Some(error) => warn!(%error, "Failed executing SQL: {}", query),
                None => info!("Executed SQL: {}", query),
            }
        }
    }
}

/// A schema object as listed in `sqlite_master`
#[derive(Debug, Clone, PartialEq, Eq, QueryableByName)]
pub struct SchemaObject {
    #[diesel(sql_type = Text)]
    pub name: String,
    #[diesel(sql_type = Text)]
    pub kind: String,
}

/// Connection pool over one SQLite database file
pub struct Database {
    pool: Pool,
    config: DatabaseConfig,
    model: Arc<Model>,
}

impl Database {
    /// Open (creating the file if missing) the database described by `config`
    ///
    /// # Example
    /// ```ignore
    /// let db = Database::open(DatabaseConfig::default(), orders_model()?)?;
    /// ```
    pub fn open(config: DatabaseConfig, model: Model) -> Result<Self> {
        let manager = ConnectionManager::<DbConnection>::new(config.database_url());
        let options = ConnectionOptions {
            busy_timeout_ms: config.busy_timeout_ms,
            enforce_foreign_keys: config.enforce_foreign_keys,
            log_statements: config.log_statements,
        };

        let pool = r2d2::Pool::builder()
            .max_size(config.max_connections)
            .min_idle(Some(0))
            .connection_timeout(Duration::from_secs(config.connection_timeout_secs))
            .connection_customizer(Box::new(options))
            .build(manager)?;

        debug!(path = %config.database_path.display(), "Opened database");

        Ok(Database {
            pool,
            config,
            model: Arc::new(model),
        })
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    /// Start a scoped context; the connection is released when it drops
    pub fn context(&self) -> Result<OrdersContext> {
        Ok(OrdersContext::new(
            self.get_connection()?,
            Arc::clone(&self.model),
        ))
    }

    /// Test database connectivity
    pub fn test_connection(&self) -> Result<()> {
        let mut conn = self.get_connection()?;
        diesel::sql_query("SELECT 1").execute(&mut conn)?;
        Ok(())
    }

    /// Create every mapped table unless the schema already exists.
    ///
    /// Returns `false` without touching anything when any mapped table is
    /// already present. Views are not created here.
    pub fn ensure_created(&self) -> Result<bool> {
        let mut conn = self.get_connection()?;

        let existing = schema_objects(&mut conn)?;
        let present = self.model.tables().any(|table| {
            existing
                .iter()
                .any(|object| object.name.eq_ignore_ascii_case(table.name))
        });
        if present {
            info!("Schema already exists");
            return Ok(false);
        }

        let statements = self.model.create_table_statements();
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            for statement in &statements {
                diesel::sql_query(statement.as_str()).execute(conn)?;
            }
            Ok(())
        })?;

        info!(tables = statements.len(), "Created schema");
        Ok(true)
    }

    /// Tables and views currently in the database, by name
    pub fn schema_objects(&self) -> Result<Vec<SchemaObject>> {
        let mut conn = self.get_connection()?;
        schema_objects(&mut conn)
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn model(&self) -> &Model {
        &self.model
    }
}

fn schema_objects(conn: &mut DbConnection) -> Result<Vec<SchemaObject>> {
    let objects = diesel::sql_query(
        "SELECT name, type AS kind FROM sqlite_master \
         WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' \
         ORDER BY name",
    )
    .load::<SchemaObject>(conn)?;
    Ok(objects)
}

/// Delete the database file and its companions.
///
/// Returns whether a database file existed. Must not be called while a
/// [`Database`] for the same path is open.
pub fn ensure_deleted(path: &Path) -> Result<bool> {
    let existed = remove_if_present(path)?;

    for suffix in COMPANION_SUFFIXES {
        let mut companion = path.as_os_str().to_owned();
        companion.push(suffix);
        remove_if_present(Path::new(&companion))?;
    }

    if existed {
        info!(path = %path.display(), "Deleted database");
    }
    Ok(existed)
}

fn remove_if_present(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DatabaseConfig::default();

        assert_eq!(config.database_path, PathBuf::from("Demo.ViewTypes.db"));
        assert_eq!(config.max_connections, 1);
        assert!(config.enforce_foreign_keys);
    }

    #[test]
    fn test_config_at_keeps_defaults() {
        let config = DatabaseConfig::at("/tmp/other.db");

        assert_eq!(config.database_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.busy_timeout_ms, 5000);
    }

    #[test]
    fn test_ensure_deleted_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.db");

        assert!(!ensure_deleted(&path).unwrap());
    }

    #[test]
    fn test_ensure_deleted_removes_companions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.db");
        fs::write(&path, b"").unwrap();
        fs::write(dir.path().join("demo.db-journal"), b"").unwrap();

        assert!(ensure_deleted(&path).unwrap());
        assert!(!path.exists());
        assert!(!dir.path().join("demo.db-journal").exists());
    }
}
