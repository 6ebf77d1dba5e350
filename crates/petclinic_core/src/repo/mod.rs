//! Repository layer: the storage collaborator behind `ClinicService`.
//!
//! # Responsibility
//! - Define the data access contract used by the service layer.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Write paths validate model rules before any SQL mutation.
//! - Every write runs in exactly one transaction.
//! - Id lookups return `None` for absence; predicate lookups return empty
//!   collections.

pub mod clinic_repo;
