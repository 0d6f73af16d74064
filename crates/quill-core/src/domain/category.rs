use serde::{Deserialize, Serialize};

use super::{Post, UNSAVED_ID};

/// Category entity - a node in the category hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub parent_id: Option<i64>,
    /// Hydrated parent chain, present only when the fetch plan asked for it.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent: Option<Box<Category>>,
}

impl Category {
    /// Create a new top-level category.
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: UNSAVED_ID,
            slug: slug.into(),
            title: title.into(),
            parent_id: None,
            parent: None,
        }
    }

    /// Create a new category below `parent`.
    pub fn child_of(parent: &Category, slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            parent_id: Some(parent.id),
            ..Self::new(slug, title)
        }
    }

    pub fn with_parent(mut self, parent: Category) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    /// Hydrated ancestors, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = &Category> {
        std::iter::successors(self.parent.as_deref(), |c| c.parent.as_deref())
    }

    /// Drop hydrated relations, keeping only the row itself.
    pub fn detached(&self) -> Self {
        Self {
            parent: None,
            ..self.clone()
        }
    }
}

/// A category with every post associated to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryWithPosts {
    pub category: Category,
    pub posts: Vec<Post>,
}
