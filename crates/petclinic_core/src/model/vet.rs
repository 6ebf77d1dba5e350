//! Veterinarians and their specialties.
//!
//! # Invariants
//! - A vet lists each specialty at most once.
//! - Specialties are ordered by name, then id.

use super::{Entity, EntityId};
use serde::{Deserialize, Deserializer, Serialize};

/// Medical specialty reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specialty {
    pub id: Option<EntityId>,
    pub name: String,
}

impl Specialty {
    pub fn with_id(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }
}

impl Entity for Specialty {
    fn id(&self) -> Option<EntityId> {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vet {
    pub id: Option<EntityId>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, deserialize_with = "deserialize_specialties")]
    specialties: Vec<Specialty>,
}

impl Vet {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            specialties: Vec::new(),
        }
    }

    /// Adds a specialty unless an equal one is already listed.
    ///
    /// Saved specialties compare by id, unsaved ones by name.
    pub fn add_specialty(&mut self, specialty: Specialty) {
        insert_specialty(&mut self.specialties, specialty);
    }

    pub fn specialties(&self) -> &[Specialty] {
        &self.specialties
    }

    pub fn nr_of_specialties(&self) -> usize {
        self.specialties.len()
    }
}

fn insert_specialty(specialties: &mut Vec<Specialty>, specialty: Specialty) {
    let duplicate = specialties.iter().any(|known| match (known.id, specialty.id) {
        (Some(left), Some(right)) => left == right,
        _ => known.name == specialty.name,
    });
    if duplicate {
        return;
    }

    specialties.push(specialty);
    specialties.sort_by(|left, right| left.name.cmp(&right.name).then(left.id.cmp(&right.id)));
}

// Incoming lists go through the same dedup and ordering as `add_specialty`.
fn deserialize_specialties<'de, D>(deserializer: D) -> Result<Vec<Specialty>, D::Error>
where
    D: Deserializer<'de>,
{
    let incoming = Vec::<Specialty>::deserialize(deserializer)?;
    let mut specialties = Vec::with_capacity(incoming.len());
    for specialty in incoming {
        insert_specialty(&mut specialties, specialty);
    }
    Ok(specialties)
}

impl Entity for Vet {
    fn id(&self) -> Option<EntityId> {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::{Specialty, Vet};

    #[test]
    fn specialties_are_sorted_and_deduplicated() {
        let mut vet = Vet::new("Linda", "Douglas");
        vet.add_specialty(Specialty::with_id(2, "surgery"));
        vet.add_specialty(Specialty::with_id(3, "dentistry"));
        vet.add_specialty(Specialty::with_id(2, "surgery"));

        let names: Vec<&str> = vet.specialties().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["dentistry", "surgery"]);
        assert_eq!(vet.nr_of_specialties(), 2);
    }

    #[test]
    fn vet_serializes_specialties() {
        let mut vet = Vet::new("Helen", "Leary");
        vet.id = Some(2);
        vet.add_specialty(Specialty::with_id(1, "radiology"));

        let json = serde_json::to_value(&vet).unwrap();
        assert_eq!(json["specialties"][0]["name"], "radiology");
    }

    #[test]
    fn deserialized_specialties_are_sorted_and_deduplicated() {
        let vet: Vet = serde_json::from_str(
            r#"{
                "id": 3,
                "first_name": "Linda",
                "last_name": "Douglas",
                "specialties": [
                    {"id": 2, "name": "surgery"},
                    {"id": 3, "name": "dentistry"},
                    {"id": 2, "name": "surgery"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(
            vet.specialties(),
            &[
                Specialty::with_id(3, "dentistry"),
                Specialty::with_id(2, "surgery"),
            ]
        );

        let bare: Vet =
            serde_json::from_str(r#"{"id": null, "first_name": "A", "last_name": "B"}"#).unwrap();
        assert_eq!(bare.nr_of_specialties(), 0);
    }
}
