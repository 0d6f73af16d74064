//! Content repository - lookups, listings, aggregation and join mutation
//! over a [`ContentStore`].

mod calendar;

pub use calendar::month_window;

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{Category, CategoryWithPosts, Post, Tag, TagWithPosts};
use crate::error::DomainError;
use crate::ports::{ContentStore, PostFetchPlan, PostFilter, PostQuery, PostScope};

/// Content repository.
///
/// Stateless: every call goes to the store, nothing is cached between calls.
#[derive(Clone)]
pub struct ContentRepository {
    store: Arc<dyn ContentStore>,
}

impl ContentRepository {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Post with its main category (and parent), categories and tags.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Post, DomainError> {
        self.store
            .find_post(slug, PostFetchPlan::FULL)
            .await?
            .ok_or_else(|| not_found("Post", slug))
    }

    /// Category with every post joined to it, newest first.
    pub async fn get_category(&self, slug: &str) -> Result<CategoryWithPosts, DomainError> {
        let category = self
            .store
            .find_category(slug)
            .await?
            .ok_or_else(|| not_found("Category", slug))?;

        let query = PostQuery::new(PostFilter::default().scoped(PostScope::Category(category.id)))
            .fetch(PostFetchPlan::LISTING);
        let posts = self.store.query_posts(&query).await?;

        Ok(CategoryWithPosts { category, posts })
    }

    /// Tag with every post joined to it, newest first.
    pub async fn get_tag(&self, slug: &str) -> Result<TagWithPosts, DomainError> {
        let tag = self
            .store
            .find_tag(slug)
            .await?
            .ok_or_else(|| not_found("Tag", slug))?;

        let query = PostQuery::new(PostFilter::default().scoped(PostScope::Tag(tag.id)))
            .fetch(PostFetchPlan::LISTING);
        let posts = self.store.query_posts(&query).await?;

        Ok(TagWithPosts { tag, posts })
    }

    /// Newest published posts.
    pub async fn latest_posts(&self, count: u64, offset: u64) -> Result<Vec<Post>, DomainError> {
        self.latest_posts_by_status(true, count, offset).await
    }

    /// Newest posts whose `published` flag equals `published`.
    pub async fn latest_posts_by_status(
        &self,
        published: bool,
        count: u64,
        offset: u64,
    ) -> Result<Vec<Post>, DomainError> {
        self.list_posts(PostFilter::published(published), count, offset)
            .await
    }

    /// Newest published posts joined to `category`.
    pub async fn latest_posts_in_category(
        &self,
        category: &Category,
        count: u64,
        offset: u64,
    ) -> Result<Vec<Post>, DomainError> {
        let filter = PostFilter::published(true).scoped(PostScope::Category(category.id));
        self.list_posts(filter, count, offset).await
    }

    /// Newest published posts joined to `tag`.
    pub async fn latest_posts_with_tag(
        &self,
        tag: &Tag,
        count: u64,
        offset: u64,
    ) -> Result<Vec<Post>, DomainError> {
        let filter = PostFilter::published(true).scoped(PostScope::Tag(tag.id));
        self.list_posts(filter, count, offset).await
    }

    /// Newest published posts of a calendar month. Only the main category is
    /// loaded, not its parent.
    pub async fn latest_posts_for_month(
        &self,
        year: i32,
        month: u32,
        count: u64,
        offset: u64,
    ) -> Result<Vec<Post>, DomainError> {
        let window = month_window(year, month)?;
        let query = PostQuery::new(PostFilter::published(true).within(window))
            .page(offset, count)
            .fetch(PostFetchPlan::MAIN_CATEGORY);

        tracing::debug!(year, month, count, offset, "Listing posts for month");
        Ok(self.store.query_posts(&query).await?)
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        count: u64,
        offset: u64,
    ) -> Result<Vec<Post>, DomainError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let query = PostQuery::new(filter)
            .page(offset, count)
            .fetch(PostFetchPlan::LISTING);

        tracing::debug!(?filter, count, offset, "Listing latest posts");
        Ok(self.store.query_posts(&query).await?)
    }

    /// Categories of every post in `posts`, keyed by post id, using a single
    /// store query. Unsaved posts are left out of the map.
    pub async fn categories_for_posts(
        &self,
        posts: &[Post],
    ) -> Result<HashMap<i64, Vec<Category>>, DomainError> {
        let post_ids = persisted_ids(posts);
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut joined = self.store.categories_joined_to(&post_ids).await?;
        joined.sort_by(|(a, _), (b, _)| a.title.cmp(&b.title));

        tracing::debug!(
            posts = post_ids.len(),
            categories = joined.len(),
            "Resolved categories for posts"
        );
        Ok(group_by_post(&post_ids, joined))
    }

    /// Tags of every post in `posts`, keyed by post id, using a single store
    /// query.
    pub async fn tags_for_posts(
        &self,
        posts: &[Post],
    ) -> Result<HashMap<i64, Vec<Tag>>, DomainError> {
        let post_ids = persisted_ids(posts);
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut joined = self.store.tags_joined_to(&post_ids).await?;
        joined.sort_by(|(a, _), (b, _)| a.title.cmp(&b.title));

        Ok(group_by_post(&post_ids, joined))
    }

    /// Categories of a single post. `None` or an unsaved post yields an empty
    /// list without touching the store.
    pub async fn categories_for_post(
        &self,
        post: Option<&Post>,
    ) -> Result<Vec<Category>, DomainError> {
        let Some(post) = post.filter(|p| p.is_persisted()) else {
            return Ok(Vec::new());
        };

        let mut by_post = self.categories_for_posts(std::slice::from_ref(post)).await?;
        Ok(by_post.remove(&post.id).unwrap_or_default())
    }

    /// Tags of a single post. `None` or an unsaved post yields an empty list.
    pub async fn tags_for_post(&self, post: Option<&Post>) -> Result<Vec<Tag>, DomainError> {
        let Some(post) = post.filter(|p| p.is_persisted()) else {
            return Ok(Vec::new());
        };

        let mut by_post = self.tags_for_posts(std::slice::from_ref(post)).await?;
        Ok(by_post.remove(&post.id).unwrap_or_default())
    }

    pub async fn published_count(&self) -> Result<u64, DomainError> {
        self.count(PostFilter::published(true)).await
    }

    pub async fn unpublished_count(&self) -> Result<u64, DomainError> {
        self.count(PostFilter::published(false)).await
    }

    pub async fn published_count_in_category(
        &self,
        category: &Category,
    ) -> Result<u64, DomainError> {
        self.count(PostFilter::published(true).scoped(PostScope::Category(category.id)))
            .await
    }

    pub async fn published_count_with_tag(&self, tag: &Tag) -> Result<u64, DomainError> {
        self.count(PostFilter::published(true).scoped(PostScope::Tag(tag.id)))
            .await
    }

    /// Published posts in the closed window of [`month_window`].
    pub async fn published_count_for_month(
        &self,
        year: i32,
        month: u32,
    ) -> Result<u64, DomainError> {
        let window = month_window(year, month)?;
        self.count(PostFilter::published(true).within(window)).await
    }

    async fn count(&self, filter: PostFilter) -> Result<u64, DomainError> {
        Ok(self.store.count_posts(&filter).await?)
    }

    /// All categories by title, parents loaded.
    pub async fn categories(&self) -> Result<Vec<Category>, DomainError> {
        Ok(sorted_by_title(self.store.categories(false).await?, |c| c.title.as_str()))
    }

    /// Categories joined to at least one post, by title.
    pub async fn categories_in_use(&self) -> Result<Vec<Category>, DomainError> {
        Ok(sorted_by_title(self.store.categories(true).await?, |c| c.title.as_str()))
    }

    /// All tags by title.
    pub async fn tags(&self) -> Result<Vec<Tag>, DomainError> {
        Ok(sorted_by_title(self.store.tags(false).await?, |t| t.title.as_str()))
    }

    /// Tags joined to at least one post, by title.
    pub async fn tags_in_use(&self) -> Result<Vec<Tag>, DomainError> {
        Ok(sorted_by_title(self.store.tags(true).await?, |t| t.title.as_str()))
    }

    /// Replace the categories of `post` with the categories whose id is in
    /// `category_ids`. Unknown ids are ignored. Returns the categories now
    /// joined to the post, by title.
    pub async fn set_categories(
        &self,
        post: &Post,
        category_ids: &[i64],
    ) -> Result<Vec<Category>, DomainError> {
        ensure_persisted(post)?;

        let ids = unique(category_ids);
        let found = if ids.is_empty() {
            Vec::new()
        } else {
            self.store.categories_by_ids(&ids).await?
        };
        let found_ids: Vec<i64> = found.iter().map(|c| c.id).collect();

        self.store
            .replace_post_categories(post.id, &found_ids)
            .await?;

        tracing::debug!(
            post_id = post.id,
            requested = ids.len(),
            applied = found_ids.len(),
            "Replaced post categories"
        );
        Ok(sorted_by_title(found, |c| c.title.as_str()))
    }

    /// Replace the tags of `post` with the tags whose id is in `tag_ids`.
    /// Unknown ids are ignored. Returns the tags now joined to the post.
    pub async fn set_tags(&self, post: &Post, tag_ids: &[i64]) -> Result<Vec<Tag>, DomainError> {
        ensure_persisted(post)?;

        let ids = unique(tag_ids);
        let found = if ids.is_empty() {
            Vec::new()
        } else {
            self.store.tags_by_ids(&ids).await?
        };
        let found_ids: Vec<i64> = found.iter().map(|t| t.id).collect();

        self.store.replace_post_tags(post.id, &found_ids).await?;

        tracing::debug!(
            post_id = post.id,
            requested = ids.len(),
            applied = found_ids.len(),
            "Replaced post tags"
        );
        Ok(sorted_by_title(found, |t| t.title.as_str()))
    }
}

fn not_found(entity_type: &'static str, slug: &str) -> DomainError {
    tracing::debug!(entity_type, slug, "Slug lookup missed");
    DomainError::not_found(entity_type, slug)
}

fn ensure_persisted(post: &Post) -> Result<(), DomainError> {
    if post.is_persisted() {
        Ok(())
    } else {
        Err(DomainError::Validation(format!(
            "post '{}' has not been saved",
            post.slug
        )))
    }
}

fn persisted_ids(posts: &[Post]) -> Vec<i64> {
    let ids: Vec<i64> = posts
        .iter()
        .filter(|p| p.is_persisted())
        .map(|p| p.id)
        .collect();
    unique(&ids)
}

/// Sorted, de-duplicated copy of `ids`.
fn unique(ids: &[i64]) -> Vec<i64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Invert `(entity, post ids)` rows into post id -> entities. Every id in
/// `post_ids` gets an entry; entity order within a list follows `joined`.
fn group_by_post<T: Clone>(post_ids: &[i64], joined: Vec<(T, Vec<i64>)>) -> HashMap<i64, Vec<T>> {
    let mut by_post: HashMap<i64, Vec<T>> =
        post_ids.iter().map(|&id| (id, Vec::new())).collect();

    for (entity, ids) in joined {
        for id in ids {
            if let Some(list) = by_post.get_mut(&id) {
                list.push(entity.clone());
            }
        }
    }

    by_post
}

fn sorted_by_title<T>(mut items: Vec<T>, title: impl Fn(&T) -> &str) -> Vec<T> {
    items.sort_by(|a, b| title(a).cmp(title(b)));
    items
}
