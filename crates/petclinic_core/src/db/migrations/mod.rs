//! Clinic schema history.
//!
//! # Responsibility
//! - Define the owner/pet/visit/vet tables (step 1) and the surname
//!   lookup index used by owner search (step 2).
//! - Bring any older clinic database forward in a single transaction.
//!
//! # Invariants
//! - Step versions start at 1 and grow by one; `PRAGMA user_version` holds
//!   the last applied step.
//! - A database stamped with a version this build does not know is refused,
//!   never downgraded.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "clinic_tables",
        sql: include_str!("0001_init.sql"),
    },
    SchemaStep {
        version: 2,
        name: "owner_last_name_index",
        sql: include_str!("0002_search_indexes.sql"),
    },
];

/// Schema version a freshly migrated clinic database carries.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Upgrades `conn` to [`latest_version`], or fails without touching it.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let stamped = stamped_version(conn)?;
    let target = latest_version();
    if stamped > target {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: stamped,
            latest_supported: target,
        });
    }

    let steps: Vec<&SchemaStep> = pending(stamped).collect();
    if steps.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in steps {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        stamped, target
    );
    Ok(())
}

fn pending(stamped: u32) -> impl Iterator<Item = &'static SchemaStep> {
    SCHEMA_STEPS.iter().filter(move |step| step.version > stamped)
}

fn stamped_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?)
}

#[cfg(test)]
mod tests {
    use super::{latest_version, pending, SCHEMA_STEPS};

    #[test]
    fn step_versions_are_contiguous_from_one() {
        for (index, step) in SCHEMA_STEPS.iter().enumerate() {
            assert_eq!(step.version as usize, index + 1, "step {}", step.name);
        }
        assert_eq!(latest_version(), SCHEMA_STEPS.len() as u32);
    }

    #[test]
    fn pending_skips_already_applied_steps() {
        let names: Vec<&str> = pending(1).map(|step| step.name).collect();
        assert_eq!(names, vec!["owner_last_name_index"]);
        assert_eq!(pending(latest_version()).count(), 0);
    }
}
