//! Post/tag association repository.
//!
//! # Invariants
//! - A `(post_id, tag_id)` link exists at most once; adding it again is
//!   rejected with `AlreadyExists` rather than silently accepted.
//! - Links are only created between an existing post and an existing tag.
//! - Removing a link that does not exist is a no-op.

use crate::db::ConnectionProvider;
use crate::model::post::PostId;
use crate::model::post_tag::{PostTag, TagId};
use crate::repo::error::{is_unique_violation, Entity, RepoError, RepoResult};
use crate::repo::executor::{Session, StatementExecutor};
use log::debug;
use rusqlite::params;

/// Repository interface for post/tag links.
pub trait PostTagRepository {
    fn add_post_tag(&self, post_id: PostId, tag_id: TagId) -> RepoResult<PostTag>;
    fn remove_post_from_tag(&self, post_id: PostId, tag_id: TagId) -> RepoResult<()>;
    /// Returns ids of tags linked to `post_id`, ascending.
    fn list_tags_for_post(&self, post_id: PostId) -> RepoResult<Vec<TagId>>;
}

/// SQLite-backed post/tag repository.
pub struct SqlitePostTagRepository<P: ConnectionProvider> {
    executor: StatementExecutor<P>,
}

impl<P: ConnectionProvider> SqlitePostTagRepository<P> {
    pub fn new(provider: P) -> Self {
        Self {
            executor: StatementExecutor::new(provider),
        }
    }
}

impl<P: ConnectionProvider> PostTagRepository for SqlitePostTagRepository<P> {
    fn add_post_tag(&self, post_id: PostId, tag_id: TagId) -> RepoResult<PostTag> {
        let link = PostTag { post_id, tag_id };

        self.executor.run("post_tag.add", |session| {
            let inserted = session.execute(
                "INSERT INTO post_tag (post_id, tag_id)
                 SELECT ?1, ?2
                 WHERE EXISTS (SELECT 1 FROM post WHERE id = ?1)
                   AND EXISTS (SELECT 1 FROM tag WHERE id = ?2)
                   AND NOT EXISTS (
                       SELECT 1 FROM post_tag WHERE post_id = ?1 AND tag_id = ?2
                   );",
                params![post_id, tag_id],
            );
            match inserted {
                Ok(0) => Err(classify_rejected_link(session, link)?),
                Ok(_) => Ok(link),
                Err(err) if is_unique_violation(&err) => Err(duplicate_link(link)),
                Err(err) => Err(err.into()),
            }
        })
    }

    fn remove_post_from_tag(&self, post_id: PostId, tag_id: TagId) -> RepoResult<()> {
        self.executor.run("post_tag.remove", |session| {
            let removed = session.execute(
                "DELETE FROM post_tag WHERE post_id = ?1 AND tag_id = ?2;",
                params![post_id, tag_id],
            )?;
            if removed == 0 {
                debug!(
                    "event=post_tag_remove module=repo status=noop post_id={post_id} tag_id={tag_id}"
                );
            }
            Ok(())
        })
    }

    fn list_tags_for_post(&self, post_id: PostId) -> RepoResult<Vec<TagId>> {
        self.executor.run("post_tag.list_for_post", |session| {
            Ok(session.query_all(
                "SELECT tag_id FROM post_tag WHERE post_id = ?1 ORDER BY tag_id ASC;",
                [post_id],
                |row| row.get(0),
            )?)
        })
    }
}

/// Explains why the guarded insert wrote nothing.
fn classify_rejected_link(session: &Session<'_>, link: PostTag) -> RepoResult<RepoError> {
    if session.exists(
        "SELECT EXISTS(SELECT 1 FROM post_tag WHERE post_id = ?1 AND tag_id = ?2);",
        params![link.post_id, link.tag_id],
    )? {
        return Ok(duplicate_link(link));
    }
    if !session.exists(
        "SELECT EXISTS(SELECT 1 FROM post WHERE id = ?1);",
        [link.post_id],
    )? {
        return Ok(RepoError::not_found(Entity::Post, link.post_id));
    }
    Ok(RepoError::not_found(Entity::Tag, link.tag_id))
}

fn duplicate_link(link: PostTag) -> RepoError {
    RepoError::already_exists(
        Entity::PostTag,
        "post_id,tag_id",
        &format!("{},{}", link.post_id, link.tag_id),
    )
}
