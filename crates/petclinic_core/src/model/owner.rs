//! Owner aggregate: contact details plus owned pets.
//!
//! # Invariants
//! - Pet names are unique per owner under [`pet_name_key`].
//! - `pets` is kept in storage order (name, then id) when loaded.

use super::pet::{pet_name_key, Pet};
use super::{require_text, Entity, EntityId, EntityKind, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

static TELEPHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{1,10}$").expect("valid telephone regex"));

/// Pet owner with contact details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: Option<EntityId>,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    /// Digits only, at most 10.
    pub telephone: String,
    #[serde(default)]
    pub pets: Vec<Pet>,
}

impl Owner {
    /// Creates an unsaved owner with no pets.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        address: impl Into<String>,
        city: impl Into<String>,
        telephone: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            address: address.into(),
            city: city.into(),
            telephone: telephone.into(),
            pets: Vec::new(),
        }
    }

    /// Attaches a pet to this owner.
    ///
    /// The pet's `owner_id` follows this owner's id, so pets added to an
    /// unsaved owner get linked when the owner is saved.
    pub fn add_pet(&mut self, mut pet: Pet) {
        pet.owner_id = self.id;
        self.pets.push(pet);
    }

    /// Looks up a pet by name, ignoring case and surrounding whitespace.
    ///
    /// With `ignore_new`, pets that were never saved are skipped.
    pub fn pet(&self, name: &str, ignore_new: bool) -> Option<&Pet> {
        let key = pet_name_key(name);
        self.pets
            .iter()
            .filter(|pet| !(ignore_new && pet.is_new()))
            .find(|pet| pet_name_key(&pet.name) == key)
    }

    /// Mutable variant of [`Owner::pet`] that considers every pet.
    pub fn pet_mut(&mut self, name: &str) -> Option<&mut Pet> {
        let key = pet_name_key(name);
        self.pets
            .iter_mut()
            .find(|pet| pet_name_key(&pet.name) == key)
    }

    /// Checks owner fields and every attached pet.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(EntityKind::Owner, "first name", &self.first_name)?;
        require_text(EntityKind::Owner, "last name", &self.last_name)?;
        require_text(EntityKind::Owner, "address", &self.address)?;
        require_text(EntityKind::Owner, "city", &self.city)?;
        if !TELEPHONE_RE.is_match(&self.telephone) {
            return Err(ValidationError::InvalidTelephone(self.telephone.clone()));
        }

        let mut seen = HashSet::new();
        for pet in &self.pets {
            pet.validate()?;
            if !seen.insert(pet_name_key(&pet.name)) {
                return Err(ValidationError::DuplicatePetName(pet.name.clone()));
            }
        }
        Ok(())
    }
}

impl Entity for Owner {
    fn id(&self) -> Option<EntityId> {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::Owner;
    use crate::model::pet::{Pet, PetType};
    use crate::model::ValidationError;
    use chrono::NaiveDate;

    fn owner() -> Owner {
        Owner::new("Sam", "Schultz", "4, Evans Street", "Wollongong", "4444444444")
    }

    fn pet(name: &str) -> Pet {
        Pet::new(
            name,
            PetType::with_id(2, "dog"),
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        )
    }

    #[test]
    fn add_pet_links_pet_to_owner_id() {
        let mut owner = owner();
        owner.id = Some(6);
        owner.add_pet(pet("bowser"));

        assert_eq!(owner.pets.len(), 1);
        assert_eq!(owner.pets[0].owner_id, Some(6));
    }

    #[test]
    fn pet_lookup_ignores_case_and_optionally_new_pets() {
        let mut owner = owner();
        let mut saved = pet("Leo");
        saved.id = Some(1);
        owner.add_pet(saved);
        owner.add_pet(pet("Bowser"));

        assert!(owner.pet("leo", true).is_some());
        assert!(owner.pet("bowser", false).is_some());
        assert!(owner.pet("bowser", true).is_none());

        owner.pet_mut("BOWSER").unwrap().name = "Bowser Jr".to_string();
        assert!(owner.pet("bowser jr", false).is_some());
    }

    #[test]
    fn validate_rejects_non_digit_or_long_telephone() {
        let mut owner = owner();
        owner.telephone = "555-1234".to_string();
        assert!(matches!(
            owner.validate(),
            Err(ValidationError::InvalidTelephone(_))
        ));

        owner.telephone = "12345678901".to_string();
        assert!(matches!(
            owner.validate(),
            Err(ValidationError::InvalidTelephone(_))
        ));
    }

    #[test]
    fn validate_rejects_duplicate_pet_names() {
        let mut owner = owner();
        owner.add_pet(pet("Max"));
        owner.add_pet(pet("max"));

        assert_eq!(
            owner.validate(),
            Err(ValidationError::DuplicatePetName("max".to_string()))
        );
    }

    #[test]
    fn lookup_and_validation_agree_on_non_ascii_names() {
        let mut owner = owner();
        let mut elan = pet("Élan");
        elan.id = Some(3);
        owner.add_pet(elan);

        assert!(owner.pet("élan", true).is_some());

        owner.add_pet(pet("élan"));
        assert_eq!(
            owner.validate(),
            Err(ValidationError::DuplicatePetName("élan".to_string()))
        );
    }

    #[test]
    fn validate_rejects_blank_city() {
        let mut owner = owner();
        owner.city = "   ".to_string();
        let err = owner.validate().unwrap_err();
        assert_eq!(err.to_string(), "owner city must not be blank");
    }
}
