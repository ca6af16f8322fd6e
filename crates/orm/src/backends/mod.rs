//! Database Backend Abstractions
//!
//! This module provides the storage collaborator models run against, with
//! sqlx-backed implementations for PostgreSQL and SQLite.

pub mod core;
pub mod postgres;
pub mod sqlite;

// Re-export core traits and types
pub use core::*;
pub use postgres::{PostgresDatabase, PostgresTransaction};
pub use sqlite::{SqliteDatabase, SqliteTransaction};

/// Database backend type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseBackendType {
    PostgreSQL,
    SQLite,
}

impl DatabaseBackendType {
    /// Detect the backend from a connection URL scheme
    pub fn from_url(url: &str) -> Option<Self> {
        if url.starts_with("postgresql://") || url.starts_with("postgres://") {
            Some(DatabaseBackendType::PostgreSQL)
        } else if url.starts_with("sqlite:") {
            Some(DatabaseBackendType::SQLite)
        } else {
            None
        }
    }
}

impl std::fmt::Display for DatabaseBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseBackendType::PostgreSQL => write!(f, "postgresql"),
            DatabaseBackendType::SQLite => write!(f, "sqlite"),
        }
    }
}

impl std::str::FromStr for DatabaseBackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(DatabaseBackendType::PostgreSQL),
            "sqlite" => Ok(DatabaseBackendType::SQLite),
            _ => Err(format!("Unsupported database backend: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_detection_from_url() {
        assert_eq!(
            DatabaseBackendType::from_url("postgres://localhost/app"),
            Some(DatabaseBackendType::PostgreSQL)
        );
        assert_eq!(
            DatabaseBackendType::from_url("postgresql://u:p@db:5432/app"),
            Some(DatabaseBackendType::PostgreSQL)
        );
        assert_eq!(
            DatabaseBackendType::from_url("sqlite::memory:"),
            Some(DatabaseBackendType::SQLite)
        );
        assert_eq!(DatabaseBackendType::from_url("mysql://localhost/app"), None);
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("Postgres".parse::<DatabaseBackendType>(), Ok(DatabaseBackendType::PostgreSQL));
        assert!("oracle".parse::<DatabaseBackendType>().is_err());
    }
}
