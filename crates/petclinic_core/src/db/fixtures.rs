//! Sample clinic dataset used by demos and integration tests.
//!
//! # Invariants
//! - The dataset is loaded in one transaction or not at all.
//! - Seeding never touches a database that already holds owners.

use super::DbResult;
use log::info;
use rusqlite::{Connection, TransactionBehavior};

const SAMPLE_DATA_SQL: &str = include_str!("sample_data.sql");

/// Loads the sample vets, owners, pets and visits into an empty database.
///
/// Returns `true` when rows were inserted and `false` when the database
/// already contained owners and was left untouched.
pub fn seed_sample_data(conn: &mut Connection) -> DbResult<bool> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let has_owners: i64 =
        tx.query_row("SELECT EXISTS(SELECT 1 FROM owners);", [], |row| row.get(0))?;
    if has_owners == 1 {
        info!("event=db_seed module=db status=skipped reason=not_empty");
        return Ok(false);
    }

    tx.execute_batch(SAMPLE_DATA_SQL)?;
    tx.commit()?;

    info!("event=db_seed module=db status=ok");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::seed_sample_data;
    use crate::db::open_db_in_memory;

    fn count(conn: &rusqlite::Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
            row.get(0)
        })
        .unwrap()
    }

    #[test]
    fn seeding_twice_only_loads_once() {
        let mut conn = open_db_in_memory().unwrap();

        assert!(seed_sample_data(&mut conn).unwrap());
        assert!(!seed_sample_data(&mut conn).unwrap());

        assert_eq!(count(&conn, "owners"), 10);
        assert_eq!(count(&conn, "vets"), 6);
        assert_eq!(count(&conn, "visits"), 4);
    }

    #[test]
    fn seeded_references_satisfy_foreign_keys() {
        let mut conn = open_db_in_memory().unwrap();
        seed_sample_data(&mut conn).unwrap();

        let mut stmt = conn.prepare("PRAGMA foreign_key_check;").unwrap();
        let mut rows = stmt.query([]).unwrap();
        assert!(rows.next().unwrap().is_none());
    }
}
