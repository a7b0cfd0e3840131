//! User domain model.
//!
//! # Invariants
//! - `email` is the natural lookup key and is unique across users.
//! - Emails are stored trimmed and lowercased.
//! - Users are edited in place and never hard-deleted.

use super::validation::{check_length, require_id, require_text, ModelValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Store-assigned user identifier.
pub type UserId = i64;

pub const EMAIL_MAX_CHARS: usize = 254;
pub const USERNAME_MAX_CHARS: usize = 64;
pub const BIO_MAX_CHARS: usize = 1_000;

/// Creation input for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    /// Opaque credential hash produced by the caller.
    pub password_hash: String,
    pub bio: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_profile(
            &self.email,
            &self.username,
            &self.password_hash,
            self.bio.as_deref(),
        )
    }

    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            email: self.email,
            username: self.username,
            password_hash: self.password_hash,
            bio: self.bio,
        }
    }
}

/// Persisted user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub bio: Option<String>,
}

impl User {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_id("id", self.id)?;
        validate_profile(
            &self.email,
            &self.username,
            &self.password_hash,
            self.bio.as_deref(),
        )
    }
}

/// Canonical form used for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_profile(
    email: &str,
    username: &str,
    password_hash: &str,
    bio: Option<&str>,
) -> Result<(), ModelValidationError> {
    require_text("email", email, EMAIL_MAX_CHARS)?;
    if !EMAIL_RE.is_match(email.trim()) {
        return Err(ModelValidationError::InvalidEmail);
    }
    require_text("username", username, USERNAME_MAX_CHARS)?;
    if password_hash.is_empty() {
        return Err(ModelValidationError::EmptyField("password_hash"));
    }
    if let Some(bio) = bio {
        check_length("bio", bio, BIO_MAX_CHARS)?;
    }
    Ok(())
}
