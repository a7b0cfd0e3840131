//! Category domain model.
//!
//! # Invariants
//! - `name` is unique across categories, compared case-sensitively.
//! - `name` is non-empty; `description` is free text.

use super::validation::{check_length, require_id, require_text, ModelValidationError};
use serde::{Deserialize, Serialize};

/// Store-assigned category identifier.
pub type CategoryId = i64;

pub const CATEGORY_NAME_MAX_CHARS: usize = 100;
pub const CATEGORY_DESCRIPTION_MAX_CHARS: usize = 2_000;

/// Creation input for a category; the id is assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

impl NewCategory {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_fields(&self.name, self.description.as_deref())
    }

    /// Combines this input with the id the store generated for it.
    pub fn into_category(self, id: CategoryId) -> Category {
        Category {
            id,
            name: self.name,
            description: self.description,
        }
    }
}

/// Persisted category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

impl Category {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_id("id", self.id)?;
        validate_fields(&self.name, self.description.as_deref())
    }
}

fn validate_fields(name: &str, description: Option<&str>) -> Result<(), ModelValidationError> {
    require_text("name", name, CATEGORY_NAME_MAX_CHARS)?;
    if let Some(description) = description {
        check_length("description", description, CATEGORY_DESCRIPTION_MAX_CHARS)?;
    }
    Ok(())
}
