use serde::{Deserialize, Serialize};

use super::{Post, UNSAVED_ID};

/// Tag entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub slug: String,
    pub title: String,
}

impl Tag {
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: UNSAVED_ID,
            slug: slug.into(),
            title: title.into(),
        }
    }
}

/// A tag with every post associated to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagWithPosts {
    pub tag: Tag,
    pub posts: Vec<Post>,
}
