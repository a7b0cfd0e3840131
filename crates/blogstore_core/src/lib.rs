//! Blog data-access core.
//!
//! Repositories for categories, users and post/tag links over SQLite, with
//! conditional writes deciding uniqueness and referential outcomes.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use config::{ConfigError, StoreConfig};
pub use db::{
    ConnectionProvider, DbError, DbResult, FileConnectionProvider, MemoryConnectionProvider,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::category::{Category, CategoryId, NewCategory};
pub use model::post::{Post, PostId};
pub use model::post_tag::{PostTag, TagId};
pub use model::user::{NewUser, User, UserId};
pub use model::validation::ModelValidationError;
pub use repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
pub use repo::error::{Entity, Rejection, RepoError, RepoResult};
pub use repo::executor::{Session, StatementExecutor};
pub use repo::post_tag_repo::{PostTagRepository, SqlitePostTagRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
