//! Post/tag association model.

use super::post::PostId;
use serde::{Deserialize, Serialize};

/// Store-assigned tag identifier.
pub type TagId = i64;

/// One row of the `post_tag` junction.
///
/// A link has no identity of its own beyond the `(post_id, tag_id)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostTag {
    pub post_id: PostId,
    pub tag_id: TagId,
}
