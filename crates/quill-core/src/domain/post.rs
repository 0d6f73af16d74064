use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Category, Tag, UNSAVED_ID};

/// Post entity - a blog article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub published: bool,
    /// Publication time, seconds since the Unix epoch.
    pub unix_date: i64,
    pub main_category_id: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub main_category: Option<Category>,
    #[serde(default)]
    pub categories: Vec<PostCategory>,
    #[serde(default)]
    pub tags: Vec<PostTag>,
}

impl Post {
    /// Create a new, unsaved post.
    pub fn new(
        slug: impl Into<String>,
        title: impl Into<String>,
        main_category_id: i64,
        unix_date: i64,
    ) -> Self {
        Self {
            id: UNSAVED_ID,
            slug: slug.into(),
            title: title.into(),
            content: String::new(),
            published: false,
            unix_date,
            main_category_id,
            main_category: None,
            categories: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn published(mut self) -> Self {
        self.published = true;
        self
    }

    /// Whether the post has an identity assigned by the store.
    pub fn is_persisted(&self) -> bool {
        self.id != UNSAVED_ID
    }

    pub fn date(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.unix_date, 0)
    }

    /// Drop hydrated relations, keeping only the row itself.
    pub fn detached(&self) -> Self {
        Self {
            main_category: None,
            categories: Vec::new(),
            tags: Vec::new(),
            ..self.clone()
        }
    }
}

/// Join row between a post and one of its categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCategory {
    pub post_id: i64,
    pub category_id: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub category: Option<Category>,
}

/// Join row between a post and one of its tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostTag {
    pub post_id: i64,
    pub tag_id: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tag: Option<Tag>,
}
