use async_trait::async_trait;

use crate::domain::{Category, Post, Tag};
use crate::error::RepoError;

use super::query::{PostFetchPlan, PostFilter, PostQuery};

/// Entity store accessor - queryable, persistent collections of posts,
/// categories, tags and their joins.
///
/// Every method is one round-trip to the store; no method caches.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Find a post by slug, hydrated according to `fetch`.
    async fn find_post(&self, slug: &str, fetch: PostFetchPlan) -> Result<Option<Post>, RepoError>;

    /// Find a category by slug, with its parent loaded.
    async fn find_category(&self, slug: &str) -> Result<Option<Category>, RepoError>;

    /// Find a tag by slug.
    async fn find_tag(&self, slug: &str) -> Result<Option<Tag>, RepoError>;

    /// Posts matching `query.filter`, newest first, paged and hydrated.
    async fn query_posts(&self, query: &PostQuery) -> Result<Vec<Post>, RepoError>;

    /// Number of posts matching `filter`, counted by the store.
    async fn count_posts(&self, filter: &PostFilter) -> Result<u64, RepoError>;

    /// All categories with their parent loaded, by title. When `in_use` is
    /// set, only categories joined to at least one post.
    async fn categories(&self, in_use: bool) -> Result<Vec<Category>, RepoError>;

    /// All tags by title. When `in_use` is set, only tags joined to at least
    /// one post.
    async fn tags(&self, in_use: bool) -> Result<Vec<Tag>, RepoError>;

    /// Categories whose id is in `ids`. Unknown ids are absent from the result.
    async fn categories_by_ids(&self, ids: &[i64]) -> Result<Vec<Category>, RepoError>;

    /// Tags whose id is in `ids`. Unknown ids are absent from the result.
    async fn tags_by_ids(&self, ids: &[i64]) -> Result<Vec<Tag>, RepoError>;

    /// In a single query: every category joined to any of `post_ids`, paired
    /// with the ids (from `post_ids`) of the posts it is joined to.
    async fn categories_joined_to(
        &self,
        post_ids: &[i64],
    ) -> Result<Vec<(Category, Vec<i64>)>, RepoError>;

    /// In a single query: every tag joined to any of `post_ids`, paired with
    /// the ids of the posts it is joined to.
    async fn tags_joined_to(&self, post_ids: &[i64]) -> Result<Vec<(Tag, Vec<i64>)>, RepoError>;

    /// Replace all category joins of a post with joins to `category_ids`, as
    /// one unit of work.
    async fn replace_post_categories(
        &self,
        post_id: i64,
        category_ids: &[i64],
    ) -> Result<(), RepoError>;

    /// Replace all tag joins of a post with joins to `tag_ids`, as one unit
    /// of work.
    async fn replace_post_tags(&self, post_id: i64, tag_ids: &[i64]) -> Result<(), RepoError>;
}
