//! Clinic façade over the storage collaborator.
//!
//! # Responsibility
//! - Provide owner, pet, visit and vet lookups plus upserts.
//! - Translate storage outcomes into `NotFound` / validation / persistence
//!   failures for callers.
//!
//! # Invariants
//! - Id lookups fail fast with `NotFound`; predicate lookups never fail for
//!   absence and return empty collections instead.
//! - Every mutating call is one repository transaction.
//! - The service holds no state besides its repository and match mode.

use crate::config::ClinicConfig;
use crate::model::owner::Owner;
use crate::model::pet::{Pet, PetDetails, PetType};
use crate::model::vet::Vet;
use crate::model::visit::Visit;
use crate::model::{Entity, EntityId, EntityKind, ValidationError};
use crate::repo::clinic_repo::{ClinicRepository, LastNameMatch, RepoError};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ClinicServiceError>;

/// Errors surfaced by `ClinicService`.
#[derive(Debug)]
pub enum ClinicServiceError {
    /// Id lookup or referenced parent does not resolve.
    NotFound { entity: EntityKind, id: EntityId },
    /// Input violates a model rule; nothing was written.
    Validation(ValidationError),
    /// Storage failure; the unit of work was rolled back.
    Persistence(RepoError),
}

impl Display for ClinicServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ClinicServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound { .. } => None,
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<RepoError> for ClinicServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Persistence(other),
        }
    }
}

/// Single entry point for clinic use-cases.
pub struct ClinicService<R: ClinicRepository> {
    repo: R,
    last_name_match: LastNameMatch,
}

impl<R: ClinicRepository> ClinicService<R> {
    /// Creates a service with prefix surname matching.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            last_name_match: LastNameMatch::default(),
        }
    }

    /// Creates a service using settings from `config`.
    pub fn with_config(repo: R, config: &ClinicConfig) -> Self {
        Self {
            repo,
            last_name_match: config.last_name_match,
        }
    }

    pub fn last_name_match(&self) -> LastNameMatch {
        self.last_name_match
    }

    /// Finds owners by surname using the configured match mode.
    ///
    /// # Contract
    /// - No match yields an empty vec, never an error.
    /// - Each owner carries its pets, their types and visits.
    pub fn find_owner_by_last_name(&self, last_name: &str) -> ServiceResult<Vec<Owner>> {
        let owners = self
            .repo
            .find_owners_by_last_name(last_name, self.last_name_match)?;
        debug!(
            "event=owner_search module=service status=ok mode={} result_count={}",
            self.last_name_match.as_str(),
            owners.len()
        );
        Ok(owners)
    }

    /// Loads one owner with pets, types and visits.
    pub fn find_owner_by_id(&self, id: EntityId) -> ServiceResult<Owner> {
        self.repo
            .find_owner_by_id(id)?
            .ok_or_else(|| not_found(EntityKind::Owner, id))
    }

    /// Inserts or updates an owner, cascading to its pets and visits.
    ///
    /// On success `owner` and every cascaded entity carry their ids. On
    /// failure `owner` is left exactly as passed in.
    pub fn save_owner(&self, owner: &mut Owner) -> ServiceResult<EntityId> {
        let was_new = owner.is_new();
        let result: ServiceResult<EntityId> = self.repo.save_owner(owner).map_err(Into::into);
        log_save("owner_save", was_new, &result);
        result
    }

    /// Returns every pet type, ordered by name.
    pub fn find_pet_types(&self) -> ServiceResult<Vec<PetType>> {
        self.repo.find_pet_types().map_err(Into::into)
    }

    /// Loads one pet with type and visits, plus its owner.
    pub fn find_pet_by_id(&self, id: EntityId) -> ServiceResult<PetDetails> {
        let pet = self
            .repo
            .find_pet_by_id(id)?
            .ok_or_else(|| not_found(EntityKind::Pet, id))?;
        let owner_id = pet.owner_id.ok_or_else(|| {
            ClinicServiceError::Persistence(RepoError::InvalidData(format!(
                "pet {id} has no owner"
            )))
        })?;
        let owner = self.repo.find_owner_by_id(owner_id)?.ok_or_else(|| {
            ClinicServiceError::Persistence(RepoError::InvalidData(format!(
                "pet {id} references missing owner {owner_id}"
            )))
        })?;

        Ok(PetDetails { pet, owner })
    }

    /// Inserts or updates a pet of an existing owner, cascading to visits.
    pub fn save_pet(&self, pet: &mut Pet) -> ServiceResult<EntityId> {
        let was_new = pet.is_new();
        let result: ServiceResult<EntityId> = self.repo.save_pet(pet).map_err(Into::into);
        log_save("pet_save", was_new, &result);
        result
    }

    /// Inserts or updates a visit of an existing pet.
    pub fn save_visit(&self, visit: &mut Visit) -> ServiceResult<EntityId> {
        let was_new = visit.is_new();
        let result: ServiceResult<EntityId> = self.repo.save_visit(visit).map_err(Into::into);
        log_save("visit_save", was_new, &result);
        result
    }

    /// Lists visits of one pet, newest first. Unknown pets yield an empty vec.
    pub fn find_visits_by_pet_id(&self, pet_id: EntityId) -> ServiceResult<Vec<Visit>> {
        self.repo.find_visits_by_pet_id(pet_id).map_err(Into::into)
    }

    /// Returns all vets, each with specialties ordered by name.
    pub fn find_vets(&self) -> ServiceResult<Vec<Vet>> {
        self.repo.find_vets().map_err(Into::into)
    }
}

fn not_found(entity: EntityKind, id: EntityId) -> ClinicServiceError {
    debug!("event=lookup module=service status=not_found entity={entity} id={id}");
    ClinicServiceError::NotFound { entity, id }
}

fn log_save(event: &str, was_new: bool, result: &ServiceResult<EntityId>) {
    let op = if was_new { "insert" } else { "update" };
    match result {
        Ok(id) => info!("event={event} module=service status=ok op={op} id={id}"),
        Err(err) => warn!("event={event} module=service status=error op={op} error={err}"),
    }
}
