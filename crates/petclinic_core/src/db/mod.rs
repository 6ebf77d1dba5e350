//! Clinic database: connections, schema and sample records.
//!
//! # Responsibility
//! - Hand out connections with foreign keys on and the clinic schema current.
//! - Load the demo clinic (vets, owners, pets, visits) into an empty store.
//! - Report storage failures as [`DbError`].
//!
//! # Invariants
//! - Repositories only receive connections that passed [`migrations::apply_migrations`].
//! - Sample records are written all-or-nothing and never over existing owners.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod fixtures;
pub mod migrations;
mod open;

pub use fixtures::seed_sample_data;
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
