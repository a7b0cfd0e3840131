//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per entity.
//! - Keep SQL details behind the repository boundary.
//!
//! # Invariants
//! - Every operation runs on its own leased connection via
//!   [`executor::StatementExecutor`].
//! - Repository APIs return semantic errors (`AlreadyExists`,
//!   `ValidationFailure`, `ReferentialConflict`, `NotFound`) in addition to
//!   `StoreFailure`.

pub mod category_repo;
pub mod error;
pub mod executor;
pub mod post_tag_repo;
pub mod user_repo;
