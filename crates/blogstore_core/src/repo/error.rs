//! Repository error taxonomy.
//!
//! # Responsibility
//! - Translate store faults and logical write outcomes into a small set of
//!   domain-meaningful kinds.
//!
//! # Invariants
//! - No raw `rusqlite::Error` crosses a repository boundary; it is wrapped
//!   in `StoreFailure` (source chain preserved) or classified.
//! - Zero affected rows on a conditional write is never reported as success.

use crate::db::DbError;
use crate::model::validation::ModelValidationError;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Entity named in repository errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Category,
    Post,
    Tag,
    PostTag,
    User,
}

impl Entity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Post => "post",
            Self::Tag => "tag",
            Self::PostTag => "post_tag",
            Self::User => "user",
        }
    }
}

impl Display for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a write or request was rejected as invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Field-level validation failed before touching the store.
    InvalidInput(ModelValidationError),
    /// Paging request with a zero limit.
    InvalidPage { limit: u32 },
    /// Conditional update matched no row with this id.
    TargetMissing { entity: Entity, id: i64 },
    /// Conditional update blocked because another row holds the unique key.
    KeyTaken { entity: Entity, field: &'static str },
}

impl Display for Rejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(err) => write!(f, "{err}"),
            Self::InvalidPage { limit } => write!(f, "page limit must be positive, got {limit}"),
            Self::TargetMissing { entity, id } => write!(f, "{entity} {id} does not exist"),
            Self::KeyTaken { entity, field } => {
                write!(f, "another {entity} already uses this {field}")
            }
        }
    }
}

/// Outcome kinds surfaced by every repository operation.
#[derive(Debug)]
pub enum RepoError {
    /// Unique key collision, detected before or after the write.
    AlreadyExists {
        entity: Entity,
        field: &'static str,
        value: String,
    },
    /// Input rejected, or a conditional update changed zero rows.
    ValidationFailure(Rejection),
    /// Delete blocked by rows still referencing the target.
    ReferentialConflict {
        entity: Entity,
        id: i64,
        dependent: Entity,
        dependents: i64,
    },
    /// Lookup found nothing.
    NotFound { entity: Entity, key: String },
    /// Any unexpected data-access fault.
    StoreFailure(DbError),
}

impl RepoError {
    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyExists { .. } => "already_exists",
            Self::ValidationFailure(_) => "validation_failure",
            Self::ReferentialConflict { .. } => "referential_conflict",
            Self::NotFound { .. } => "not_found",
            Self::StoreFailure(_) => "store_failure",
        }
    }

    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::StoreFailure(_))
    }

    pub(crate) fn not_found(entity: Entity, key: impl Display) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub(crate) fn already_exists(entity: Entity, field: &'static str, value: &str) -> Self {
        Self::AlreadyExists {
            entity,
            field,
            value: value.to_string(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyExists {
                entity,
                field,
                value,
            } => write!(f, "{entity} with {field} `{value}` already exists"),
            Self::ValidationFailure(rejection) => write!(f, "validation failed: {rejection}"),
            Self::ReferentialConflict {
                entity,
                id,
                dependent,
                dependents,
            } => write!(
                f,
                "{entity} {id} is still referenced by {dependents} {dependent} row(s)"
            ),
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::StoreFailure(err) => write!(f, "store failure: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StoreFailure(err) => Some(err),
            Self::ValidationFailure(Rejection::InvalidInput(err)) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::ValidationFailure(Rejection::InvalidInput(value))
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::StoreFailure(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::StoreFailure(DbError::Sqlite(value))
    }
}

/// Returns whether `err` is a UNIQUE or PRIMARY KEY constraint violation.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && (failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
        }
        _ => false,
    }
}

/// Maps the outcome of a conditional `INSERT ... RETURNING id`.
///
/// No returned row and a unique violation both mean another writer already
/// holds the key; `conflict` builds the error for that case.
pub(crate) fn conditional_insert_outcome(
    inserted: rusqlite::Result<Option<i64>>,
    conflict: impl FnOnce() -> RepoError,
) -> RepoResult<i64> {
    match inserted {
        Ok(Some(id)) => Ok(id),
        Ok(None) => Err(conflict()),
        Err(err) if is_unique_violation(&err) => Err(conflict()),
        Err(err) => Err(err.into()),
    }
}
