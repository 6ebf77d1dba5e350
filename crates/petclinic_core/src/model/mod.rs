//! Clinic domain model.
//!
//! # Responsibility
//! - Define owners, pets, pet types, vets and visits as plain values.
//! - Provide validation rules enforced before any write reaches storage.
//!
//! # Invariants
//! - An entity with `id == None` has never been persisted.
//! - Ids are assigned by storage and never reused.

pub mod owner;
pub mod pet;
pub mod vet;
pub mod visit;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned primary key shared by every entity.
pub type EntityId = i64;

/// Entity categories, used to label lookups and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Owner,
    Pet,
    PetType,
    Specialty,
    Vet,
    Visit,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Owner => "owner",
            Self::Pet => "pet",
            Self::PetType => "pet type",
            Self::Specialty => "specialty",
            Self::Vet => "vet",
            Self::Visit => "visit",
        };
        f.write_str(label)
    }
}

/// Common identity accessors for persisted records.
pub trait Entity {
    /// Store-assigned id, `None` until the first successful save.
    fn id(&self) -> Option<EntityId>;

    /// Returns whether this value has never been persisted.
    fn is_new(&self) -> bool {
        self.id().is_none()
    }
}

/// Finds an entity by id in an already loaded collection.
pub fn find_by_id<T: Entity>(entities: &[T], id: EntityId) -> Option<&T> {
    entities.iter().find(|entity| entity.id() == Some(id))
}

/// Model rule violations detected before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty after trim.
    BlankField {
        entity: EntityKind,
        field: &'static str,
    },
    /// Telephone must be 1 to 10 ASCII digits.
    InvalidTelephone(String),
    /// Pet references a type that has no id yet.
    UnsavedPetType(String),
    /// Two pets of the same owner share a name (case-insensitive).
    DuplicatePetName(String),
    /// Child record is not attached to its required parent.
    Unassigned {
        entity: EntityKind,
        parent: EntityKind,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField { entity, field } => write!(f, "{entity} {field} must not be blank"),
            Self::InvalidTelephone(value) => write!(
                f,
                "invalid telephone `{value}`: expected up to 10 digits"
            ),
            Self::UnsavedPetType(name) => write!(f, "pet type `{name}` has not been saved"),
            Self::DuplicatePetName(name) => write!(f, "pet name `{name}` is already in use"),
            Self::Unassigned { entity, parent } => {
                write!(f, "{entity} is not assigned to an existing {parent}")
            }
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(
    entity: EntityKind,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField { entity, field });
    }
    Ok(())
}
