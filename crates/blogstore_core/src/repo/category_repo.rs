//! Category repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Create, rename, list, look up and delete categories.
//! - Keep name uniqueness and post references enforced at write time.
//!
//! # Invariants
//! - Writes are conditional statements; the store evaluates the guard and
//!   the write atomically, so no in-process lock is involved.
//! - The pre-insert existence check is a fast path only. The outcome of an
//!   insert is decided by whether the store generated an id.
//! - A category referenced by any post is never deleted, and deletes never
//!   cascade.

use crate::db::ConnectionProvider;
use crate::model::category::{Category, CategoryId, NewCategory};
use crate::model::post::Post;
use crate::repo::error::{conditional_insert_outcome, Entity, Rejection, RepoError, RepoResult};
use crate::repo::executor::{Session, StatementExecutor};
use log::debug;
use rusqlite::{params, Row};

const CATEGORY_SELECT_SQL: &str = "SELECT id, name, description FROM category";
const POSTS_IN_CATEGORY_SQL: &str = "SELECT COUNT(*) FROM post WHERE category_id = ?1;";

/// Repository interface for category operations.
pub trait CategoryRepository {
    /// Inserts a category and returns it with its store-assigned id.
    fn add_category(&self, category: NewCategory) -> RepoResult<Category>;
    /// Rewrites name and description of an existing category.
    fn update_category(&self, category: &Category) -> RepoResult<Category>;
    /// Returns one page of categories in storage (id) order.
    fn list_all_categories(&self, offset: u32, limit: u32) -> RepoResult<Vec<Category>>;
    /// Returns the category a post belongs to.
    fn find_category_by_post(&self, post: &Post) -> RepoResult<Category>;
    /// Returns one category by id.
    fn find_category_by_id(&self, id: CategoryId) -> RepoResult<Category>;
    /// Deletes a category that no post references.
    fn delete_category(&self, category_id: CategoryId) -> RepoResult<()>;
}

/// SQLite-backed category repository.
pub struct SqliteCategoryRepository<P: ConnectionProvider> {
    executor: StatementExecutor<P>,
}

impl<P: ConnectionProvider> SqliteCategoryRepository<P> {
    pub fn new(provider: P) -> Self {
        Self {
            executor: StatementExecutor::new(provider),
        }
    }
}

impl<P: ConnectionProvider> CategoryRepository for SqliteCategoryRepository<P> {
    fn add_category(&self, category: NewCategory) -> RepoResult<Category> {
        category.validate()?;
        let name = category.name.as_str();

        let id = self.executor.run("category.add", |session| {
            if session.exists(
                "SELECT EXISTS(SELECT 1 FROM category WHERE name = ?1);",
                [name],
            )? {
                return Err(RepoError::already_exists(Entity::Category, "name", name));
            }

            insert_category(session, &category)
        })?;

        Ok(category.into_category(id))
    }

    fn update_category(&self, category: &Category) -> RepoResult<Category> {
        category.validate()?;

        self.executor.run("category.update", |session| {
            let changed = session.execute(
                "UPDATE category
                 SET name = ?1, description = ?2
                 WHERE id = ?3
                   AND NOT EXISTS (
                       SELECT 1 FROM category WHERE name = ?1 AND id != ?3
                   );",
                params![
                    category.name.as_str(),
                    category.description.as_deref(),
                    category.id
                ],
            )?;

            if changed == 0 {
                return Err(RepoError::ValidationFailure(classify_rejected_update(
                    session,
                    category.id,
                )?));
            }
            Ok(())
        })?;

        Ok(category.clone())
    }

    fn list_all_categories(&self, offset: u32, limit: u32) -> RepoResult<Vec<Category>> {
        if limit == 0 {
            return Err(RepoError::ValidationFailure(Rejection::InvalidPage { limit }));
        }

        self.executor.run("category.list", |session| {
            Ok(session.query_all(
                &format!("{CATEGORY_SELECT_SQL} ORDER BY id ASC LIMIT ?1 OFFSET ?2;"),
                params![i64::from(limit), i64::from(offset)],
                parse_category_row,
            )?)
        })
    }

    fn find_category_by_post(&self, post: &Post) -> RepoResult<Category> {
        self.executor.run("category.find_by_post", |session| {
            find_by_id(session, post.category_id)
        })
    }

    fn find_category_by_id(&self, id: CategoryId) -> RepoResult<Category> {
        self.executor
            .run("category.find_by_id", |session| find_by_id(session, id))
    }

    fn delete_category(&self, category_id: CategoryId) -> RepoResult<()> {
        self.executor.run("category.delete", |session| {
            let dependents = session.count(POSTS_IN_CATEGORY_SQL, [category_id])?;
            if dependents > 0 {
                return Err(referential_conflict(category_id, dependents));
            }

            let deleted = session.execute(
                "DELETE FROM category
                 WHERE id = ?1
                   AND NOT EXISTS (SELECT 1 FROM post WHERE category_id = ?1);",
                [category_id],
            )?;

            if deleted == 0 {
                // A post may have landed between the count and the delete.
                let dependents = session.count(POSTS_IN_CATEGORY_SQL, [category_id])?;
                if dependents > 0 {
                    return Err(referential_conflict(category_id, dependents));
                }
                debug!(
                    "event=category_delete module=repo status=noop category_id={category_id}"
                );
            }
            Ok(())
        })
    }
}

/// Inserts `category` unless its name is already taken.
///
/// This is the authoritative uniqueness check; it holds even when a
/// concurrent writer slipped in after the pre-check.
pub(crate) fn insert_category(
    session: &Session<'_>,
    category: &NewCategory,
) -> RepoResult<CategoryId> {
    let name = category.name.as_str();
    let inserted = session.insert_returning_id(
        "INSERT INTO category (name, description)
         SELECT ?1, ?2
         WHERE NOT EXISTS (SELECT 1 FROM category WHERE name = ?1)
         RETURNING id;",
        params![name, category.description.as_deref()],
    );
    conditional_insert_outcome(inserted, || {
        RepoError::already_exists(Entity::Category, "name", name)
    })
}

fn find_by_id(session: &Session<'_>, id: CategoryId) -> RepoResult<Category> {
    session
        .query_optional(
            &format!("{CATEGORY_SELECT_SQL} WHERE id = ?1;"),
            [id],
            parse_category_row,
        )?
        .ok_or_else(|| RepoError::not_found(Entity::Category, id))
}

fn classify_rejected_update(session: &Session<'_>, id: CategoryId) -> RepoResult<Rejection> {
    let exists = session.exists("SELECT EXISTS(SELECT 1 FROM category WHERE id = ?1);", [id])?;
    Ok(if exists {
        Rejection::KeyTaken {
            entity: Entity::Category,
            field: "name",
        }
    } else {
        Rejection::TargetMissing {
            entity: Entity::Category,
            id,
        }
    })
}

fn referential_conflict(category_id: CategoryId, dependents: i64) -> RepoError {
    RepoError::ReferentialConflict {
        entity: Entity::Category,
        id: category_id,
        dependent: Entity::Post,
        dependents,
    }
}

fn parse_category_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
    })
}
