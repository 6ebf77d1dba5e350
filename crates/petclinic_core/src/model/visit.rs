//! Visit records attached to pets.

use super::{require_text, Entity, EntityId, EntityKind, ValidationError};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// One appointment of a pet at the clinic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub id: Option<EntityId>,
    pub date: NaiveDate,
    pub description: String,
    pub pet_id: Option<EntityId>,
}

impl Visit {
    /// Creates an unsaved visit dated today (local time).
    pub fn new(description: impl Into<String>) -> Self {
        Self::on(Local::now().date_naive(), description)
    }

    /// Creates an unsaved visit on an explicit date.
    pub fn on(date: NaiveDate, description: impl Into<String>) -> Self {
        Self {
            id: None,
            date,
            description: description.into(),
            pet_id: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(EntityKind::Visit, "description", &self.description)
    }
}

impl Entity for Visit {
    fn id(&self) -> Option<EntityId> {
        self.id
    }
}
