//! Core domain logic for the pet clinic.
//! This crate is the single source of truth for clinic data invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ClinicConfig, ConfigError, DatabaseLocation};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::owner::Owner;
pub use model::pet::{Pet, PetDetails, PetType};
pub use model::vet::{Specialty, Vet};
pub use model::visit::Visit;
pub use model::{find_by_id, Entity, EntityId, EntityKind, ValidationError};
pub use repo::clinic_repo::{
    ClinicRepository, LastNameMatch, RepoError, RepoResult, SqliteClinicRepository,
};
pub use service::clinic_service::{ClinicService, ClinicServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
