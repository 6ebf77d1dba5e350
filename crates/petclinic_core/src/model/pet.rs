//! Pets, pet types and the owner-resolved pet read model.

use super::owner::Owner;
use super::visit::Visit;
use super::{require_text, Entity, EntityId, EntityKind, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Reference data describing a kind of animal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetType {
    pub id: Option<EntityId>,
    pub name: String,
}

impl PetType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    pub fn with_id(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }

    /// Resolves a type by its display name among known types.
    ///
    /// Matching is exact after trimming, since type names are stored lowercase.
    pub fn parse<'a>(name: &str, types: &'a [PetType]) -> Option<&'a PetType> {
        let wanted = name.trim();
        types.iter().find(|pet_type| pet_type.name == wanted)
    }
}

impl Entity for PetType {
    fn id(&self) -> Option<EntityId> {
        self.id
    }
}

/// A pet belonging to exactly one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub id: Option<EntityId>,
    pub name: String,
    pub birth_date: NaiveDate,
    #[serde(rename = "type")]
    pub pet_type: PetType,
    /// Set by `Owner::add_pet`, or directly when saving a pet on its own.
    pub owner_id: Option<EntityId>,
    /// Newest visit first when loaded from storage.
    #[serde(default)]
    pub visits: Vec<Visit>,
}

impl Pet {
    /// Creates an unsaved pet without owner or visits.
    pub fn new(name: impl Into<String>, pet_type: PetType, birth_date: NaiveDate) -> Self {
        Self {
            id: None,
            name: name.into(),
            birth_date,
            pet_type,
            owner_id: None,
            visits: Vec::new(),
        }
    }

    /// Attaches a visit, linking it to this pet's id.
    pub fn add_visit(&mut self, mut visit: Visit) {
        visit.pet_id = self.id;
        self.visits.push(visit);
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(EntityKind::Pet, "name", &self.name)?;
        if self.pet_type.is_new() {
            return Err(ValidationError::UnsavedPetType(self.pet_type.name.clone()));
        }
        for visit in &self.visits {
            visit.validate()?;
        }
        Ok(())
    }
}

impl Entity for Pet {
    fn id(&self) -> Option<EntityId> {
        self.id
    }
}

/// Comparison key for pet names: trimmed, Unicode lowercase.
///
/// Two pets of one owner must not share a key.
pub fn pet_name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A pet together with its resolved owner.
///
/// The owner is loaded with its full pet list, so `owner.pets` contains a
/// second copy of `pet`. Save through `pet` (or through `owner`), not both
/// with diverging edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetDetails {
    pub pet: Pet,
    pub owner: Owner,
}
