//! Blog domain model.
//!
//! # Responsibility
//! - Define plain data carriers read and written by repositories.
//! - Validate field-level rules before anything reaches the store.
//!
//! # Invariants
//! - Numeric ids are assigned by the store; creation inputs carry no id.
//! - Users are never hard-deleted; categories only when no post uses them.

pub mod category;
pub mod post;
pub mod post_tag;
pub mod user;
pub mod validation;
