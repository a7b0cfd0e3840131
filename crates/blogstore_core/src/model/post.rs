//! Post domain model.
//!
//! Only the category dependency matters to this crate: posts pin their
//! category and block its deletion.

use super::category::CategoryId;
use serde::{Deserialize, Serialize};

/// Store-assigned post identifier.
pub type PostId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub category_id: CategoryId,
    pub title: String,
}
