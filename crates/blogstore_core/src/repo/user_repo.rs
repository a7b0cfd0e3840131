//! User repository contract and SQLite implementation.
//!
//! # Invariants
//! - Emails are normalized before every write and lookup.
//! - Email uniqueness is guarded by conditional statements the same way
//!   category names are.
//! - There is no delete path; users are only created and edited.

use crate::db::ConnectionProvider;
use crate::model::user::{normalize_email, NewUser, User};
use crate::repo::error::{conditional_insert_outcome, Entity, Rejection, RepoError, RepoResult};
use crate::repo::executor::{Session, StatementExecutor};
use rusqlite::{params, Row};

const USER_SELECT_SQL: &str = "SELECT id, email, username, password_hash, bio FROM user";

/// Repository interface for user operations.
pub trait UserRepository {
    fn add_user(&self, user: NewUser) -> RepoResult<User>;
    /// Replaces every editable field of the user with the given id.
    fn edit_user(&self, user: &User) -> RepoResult<User>;
    fn find_user_by_email(&self, email: &str) -> RepoResult<User>;
    fn list_all_users(&self, offset: u32, limit: u32) -> RepoResult<Vec<User>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<P: ConnectionProvider> {
    executor: StatementExecutor<P>,
}

impl<P: ConnectionProvider> SqliteUserRepository<P> {
    pub fn new(provider: P) -> Self {
        Self {
            executor: StatementExecutor::new(provider),
        }
    }
}

impl<P: ConnectionProvider> UserRepository for SqliteUserRepository<P> {
    fn add_user(&self, mut user: NewUser) -> RepoResult<User> {
        user.validate()?;
        user.email = normalize_email(&user.email);
        let email = user.email.as_str();

        let id = self.executor.run("user.add", |session| {
            if session.exists("SELECT EXISTS(SELECT 1 FROM user WHERE email = ?1);", [email])? {
                return Err(RepoError::already_exists(Entity::User, "email", email));
            }

            insert_user(session, &user)
        })?;

        Ok(user.into_user(id))
    }

    fn edit_user(&self, user: &User) -> RepoResult<User> {
        user.validate()?;
        let mut edited = user.clone();
        edited.email = normalize_email(&user.email);

        self.executor.run("user.edit", |session| {
            let changed = session.execute(
                "UPDATE user
                 SET
                    email = ?1,
                    username = ?2,
                    password_hash = ?3,
                    bio = ?4,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?5
                   AND NOT EXISTS (
                       SELECT 1 FROM user WHERE email = ?1 AND id != ?5
                   );",
                params![
                    edited.email.as_str(),
                    edited.username.as_str(),
                    edited.password_hash.as_str(),
                    edited.bio.as_deref(),
                    edited.id
                ],
            )?;

            if changed == 0 {
                return Err(RepoError::ValidationFailure(classify_rejected_edit(
                    session, edited.id,
                )?));
            }
            Ok(())
        })?;

        Ok(edited)
    }

    fn find_user_by_email(&self, email: &str) -> RepoResult<User> {
        let email = normalize_email(email);

        self.executor.run("user.find_by_email", |session| {
            session
                .query_optional(
                    &format!("{USER_SELECT_SQL} WHERE email = ?1;"),
                    [email.as_str()],
                    parse_user_row,
                )?
                .ok_or_else(|| RepoError::not_found(Entity::User, &email))
        })
    }

    fn list_all_users(&self, offset: u32, limit: u32) -> RepoResult<Vec<User>> {
        if limit == 0 {
            return Err(RepoError::ValidationFailure(Rejection::InvalidPage { limit }));
        }

        self.executor.run("user.list", |session| {
            Ok(session.query_all(
                &format!("{USER_SELECT_SQL} ORDER BY id ASC LIMIT ?1 OFFSET ?2;"),
                params![i64::from(limit), i64::from(offset)],
                parse_user_row,
            )?)
        })
    }
}

/// Inserts `user` unless its (already normalized) email is taken.
pub(crate) fn insert_user(session: &Session<'_>, user: &NewUser) -> RepoResult<i64> {
    let email = user.email.as_str();
    let inserted = session.insert_returning_id(
        "INSERT INTO user (email, username, password_hash, bio)
         SELECT ?1, ?2, ?3, ?4
         WHERE NOT EXISTS (SELECT 1 FROM user WHERE email = ?1)
         RETURNING id;",
        params![
            email,
            user.username.as_str(),
            user.password_hash.as_str(),
            user.bio.as_deref()
        ],
    );
    conditional_insert_outcome(inserted, || {
        RepoError::already_exists(Entity::User, "email", email)
    })
}

fn classify_rejected_edit(session: &Session<'_>, id: i64) -> RepoResult<Rejection> {
    let exists = session.exists("SELECT EXISTS(SELECT 1 FROM user WHERE id = ?1);", [id])?;
    Ok(if exists {
        Rejection::KeyTaken {
            entity: Entity::User,
            field: "email",
        }
    } else {
        Rejection::TargetMissing {
            entity: Entity::User,
            id,
        }
    })
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        email: row.get("email")?,
        username: row.get("username")?,
        password_hash: row.get("password_hash")?,
        bio: row.get("bio")?,
    })
}
