use rusqlite::Connection;
use std::path::PathBuf;
use anyhow::{Context, Result};
use crate::config::Config;
use crate::db::migrations::MigrationManager;

/// Database connection manager
pub struct DbConnection;

impl DbConnection {
    /// Get the user's home directory, preferring $HOME so tests can
    /// redirect it.
    fn home_dir() -> PathBuf {
        std::env::var("HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(dirs::home_dir)
            .expect("home directory not found")
    }

    /// Get the default database path
    pub fn default_path() -> PathBuf {
        Self::home_dir().join(".funil").join("crm.db")
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        Self::home_dir().join(".funil").join("rc")
    }

    /// Get database path from the configuration file or default
    pub fn resolve_path() -> Result<PathBuf> {
        let config = Config::load(&Self::config_path());
        match config.data_location {
            Some(path) => Ok(path),
            None => Ok(Self::default_path()),
        }
    }

    /// Connect to the database, creating it and parent directories if needed
    pub fn connect() -> Result<Connection> {
        let db_path = Self::resolve_path()?;

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        log::debug!("opening database at {}", db_path.display());
        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

        MigrationManager::initialize(&conn)
            .context("Failed to initialize database schema")?;

        Ok(conn)
    }

    /// Connect to an in-memory database (for testing)
    pub fn connect_in_memory() -> Result<Connection> {
        let conn = Connection::open_in_memory()
            .context("Failed to open in-memory database")?;

        MigrationManager::initialize(&conn)
            .context("Failed to initialize database schema")?;

        Ok(conn)
    }
}
