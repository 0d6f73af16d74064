//! Domain entities - the content objects of the blog.

mod category;
mod post;
mod tag;

pub use category::{Category, CategoryWithPosts};
pub use post::{Post, PostCategory, PostTag};
pub use tag::{Tag, TagWithPosts};

/// Identity value of an entity that has not been persisted yet.
pub const UNSAVED_ID: i64 = 0;
