//! In-memory content store - used when no database is configured.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use quill_core::domain::{Category, Post, PostCategory, PostTag, Tag};
use quill_core::error::RepoError;
use quill_core::ports::{
    CategoryFetch, ContentStore, PostFetchPlan, PostFilter, PostQuery, PostScope,
};

#[derive(Default)]
struct Tables {
    /// Rows in insertion order, relations detached.
    posts: Vec<Post>,
    categories: Vec<Category>,
    tags: Vec<Tag>,
    /// (post_id, category_id)
    post_categories: Vec<(i64, i64)>,
    /// (post_id, tag_id)
    post_tags: Vec<(i64, i64)>,
    next_id: i64,
}

impl Tables {
    fn assign_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn category(&self, id: i64, with_parent: bool) -> Option<Category> {
        let found = self.categories.iter().find(|c| c.id == id)?.clone();
        if !with_parent {
            return Some(found);
        }

        // Inserts only accept existing parents, so the chain cannot loop.
        let parent = found.parent_id.and_then(|pid| self.category(pid, true));
        Some(match parent {
            Some(parent) => found.with_parent(parent),
            None => found,
        })
    }

    fn tag(&self, id: i64) -> Option<Tag> {
        self.tags.iter().find(|t| t.id == id).cloned()
    }

    fn in_scope(&self, post_id: i64, scope: PostScope) -> bool {
        match scope {
            PostScope::All => true,
            PostScope::Category(category_id) => {
                self.post_categories.contains(&(post_id, category_id))
            }
            PostScope::Tag(tag_id) => self.post_tags.contains(&(post_id, tag_id)),
        }
    }

    fn matching<'a>(&'a self, filter: &'a PostFilter) -> impl Iterator<Item = &'a Post> + 'a {
        self.posts.iter().filter(move |p| {
            filter.matches_row(p.published, p.unix_date) && self.in_scope(p.id, filter.scope)
        })
    }

    fn hydrate(&self, post: &Post, plan: PostFetchPlan) -> Post {
        let mut post = post.clone();

        post.main_category = match plan.main_category {
            CategoryFetch::Skip => None,
            CategoryFetch::Bare => self.category(post.main_category_id, false),
            CategoryFetch::WithParent => self.category(post.main_category_id, true),
        };

        if plan.categories {
            post.categories = self
                .post_categories
                .iter()
                .filter(|(pid, _)| *pid == post.id)
                .map(|&(post_id, category_id)| PostCategory {
                    post_id,
                    category_id,
                    category: self.category(category_id, false),
                })
                .collect();
        }

        if plan.tags {
            post.tags = self
                .post_tags
                .iter()
                .filter(|(pid, _)| *pid == post.id)
                .map(|&(post_id, tag_id)| PostTag {
                    post_id,
                    tag_id,
                    tag: self.tag(tag_id),
                })
                .collect();
        }

        post
    }

    fn ensure_post(&self, post_id: i64) -> Result<(), RepoError> {
        if self.posts.iter().any(|p| p.id == post_id) {
            Ok(())
        } else {
            Err(RepoError::Constraint(format!("post {post_id} does not exist")))
        }
    }
}

/// In-memory content store using plain vectors behind an async RwLock.
///
/// Every [`ContentStore`] call counts as one query, which lets tests check
/// round-trips. Data is lost on process restart.
pub struct InMemoryContentStore {
    tables: RwLock<Tables>,
    queries: AtomicUsize,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            queries: AtomicUsize::new(0),
        }
    }

    /// Number of store queries issued so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn reset_query_count(&self) {
        self.queries.store(0, Ordering::SeqCst);
    }

    fn record_query(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
    }

    /// Store a category, assigning its id. Relations on the value are dropped.
    pub async fn insert_category(&self, category: Category) -> Result<Category, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.categories.iter().any(|c| c.slug == category.slug) {
            return Err(RepoError::Constraint(format!(
                "category slug '{}' already exists",
                category.slug
            )));
        }
        if let Some(parent_id) = category.parent_id {
            if !tables.categories.iter().any(|c| c.id == parent_id) {
                return Err(RepoError::Constraint(format!(
                    "parent category {parent_id} does not exist"
                )));
            }
        }

        let mut row = category.detached();
        row.id = tables.assign_id();
        tables.categories.push(row.clone());
        Ok(row)
    }

    /// Store a tag, assigning its id.
    pub async fn insert_tag(&self, tag: Tag) -> Result<Tag, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.tags.iter().any(|t| t.slug == tag.slug) {
            return Err(RepoError::Constraint(format!(
                "tag slug '{}' already exists",
                tag.slug
            )));
        }

        let mut row = tag;
        row.id = tables.assign_id();
        tables.tags.push(row.clone());
        Ok(row)
    }

    /// Store a post, assigning its id. Relations on the value are dropped;
    /// joins are only created through the replace operations.
    pub async fn insert_post(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.posts.iter().any(|p| p.slug == post.slug) {
            return Err(RepoError::Constraint(format!(
                "post slug '{}' already exists",
                post.slug
            )));
        }
        if !tables.categories.iter().any(|c| c.id == post.main_category_id) {
            return Err(RepoError::Constraint(format!(
                "main category {} does not exist",
                post.main_category_id
            )));
        }

        let mut row = post.detached();
        row.id = tables.assign_id();
        tables.posts.push(row.clone());
        Ok(row)
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn find_post(&self, slug: &str, fetch: PostFetchPlan) -> Result<Option<Post>, RepoError> {
        self.record_query();
        let tables = self.tables.read().await;

        Ok(tables
            .posts
            .iter()
            .find(|p| p.slug == slug)
            .map(|p| tables.hydrate(p, fetch)))
    }

    async fn find_category(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        self.record_query();
        let tables = self.tables.read().await;

        Ok(tables
            .categories
            .iter()
            .find(|c| c.slug == slug)
            .and_then(|c| tables.category(c.id, true)))
    }

    async fn find_tag(&self, slug: &str) -> Result<Option<Tag>, RepoError> {
        self.record_query();
        let tables = self.tables.read().await;

        Ok(tables.tags.iter().find(|t| t.slug == slug).cloned())
    }

    async fn query_posts(&self, query: &PostQuery) -> Result<Vec<Post>, RepoError> {
        self.record_query();
        let tables = self.tables.read().await;

        let mut matching: Vec<&Post> = tables.matching(&query.filter).collect();
        // Stable sort: equal dates keep insertion order.
        matching.sort_by(|a, b| b.unix_date.cmp(&a.unix_date));

        let skip = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let take = query
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

        Ok(matching
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|p| tables.hydrate(p, query.fetch))
            .collect())
    }

    async fn count_posts(&self, filter: &PostFilter) -> Result<u64, RepoError> {
        self.record_query();
        let tables = self.tables.read().await;

        Ok(tables.matching(filter).count() as u64)
    }

    async fn categories(&self, in_use: bool) -> Result<Vec<Category>, RepoError> {
        self.record_query();
        let tables = self.tables.read().await;

        let mut categories: Vec<Category> = tables
            .categories
            .iter()
            .filter(|c| !in_use || tables.post_categories.iter().any(|(_, cid)| *cid == c.id))
            .filter_map(|c| tables.category(c.id, true))
            .collect();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }

    async fn tags(&self, in_use: bool) -> Result<Vec<Tag>, RepoError> {
        self.record_query();
        let tables = self.tables.read().await;

        let mut tags: Vec<Tag> = tables
            .tags
            .iter()
            .filter(|t| !in_use || tables.post_tags.iter().any(|(_, tid)| *tid == t.id))
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(tags)
    }

    async fn categories_by_ids(&self, ids: &[i64]) -> Result<Vec<Category>, RepoError> {
        self.record_query();
        let tables = self.tables.read().await;

        Ok(tables
            .categories
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect())
    }

    async fn tags_by_ids(&self, ids: &[i64]) -> Result<Vec<Tag>, RepoError> {
        self.record_query();
        let tables = self.tables.read().await;

        Ok(tables
            .tags
            .iter()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect())
    }

    async fn categories_joined_to(
        &self,
        post_ids: &[i64],
    ) -> Result<Vec<(Category, Vec<i64>)>, RepoError> {
        self.record_query();
        let tables = self.tables.read().await;

        let mut joined: HashMap<i64, Vec<i64>> = HashMap::new();
        for &(post_id, category_id) in &tables.post_categories {
            if post_ids.contains(&post_id) {
                joined.entry(category_id).or_default().push(post_id);
            }
        }

        Ok(tables
            .categories
            .iter()
            .filter_map(|c| joined.remove(&c.id).map(|ids| (c.clone(), ids)))
            .collect())
    }

    async fn tags_joined_to(&self, post_ids: &[i64]) -> Result<Vec<(Tag, Vec<i64>)>, RepoError> {
        self.record_query();
        let tables = self.tables.read().await;

        let mut joined: HashMap<i64, Vec<i64>> = HashMap::new();
        for &(post_id, tag_id) in &tables.post_tags {
            if post_ids.contains(&post_id) {
                joined.entry(tag_id).or_default().push(post_id);
            }
        }

        Ok(tables
            .tags
            .iter()
            .filter_map(|t| joined.remove(&t.id).map(|ids| (t.clone(), ids)))
            .collect())
    }

    async fn replace_post_categories(
        &self,
        post_id: i64,
        category_ids: &[i64],
    ) -> Result<(), RepoError> {
        self.record_query();
        // The write guard is the unit of work: validate, clear, insert.
        let mut tables = self.tables.write().await;

        tables.ensure_post(post_id)?;
        if let Some(missing) = category_ids
            .iter()
            .find(|id| !tables.categories.iter().any(|c| c.id == **id))
        {
            return Err(RepoError::Constraint(format!(
                "category {missing} does not exist"
            )));
        }

        tables.post_categories.retain(|(pid, _)| *pid != post_id);
        for &category_id in category_ids {
            if !tables.post_categories.contains(&(post_id, category_id)) {
                tables.post_categories.push((post_id, category_id));
            }
        }

        tracing::debug!(post_id, categories = category_ids.len(), "Post categories replaced");
        Ok(())
    }

    async fn replace_post_tags(&self, post_id: i64, tag_ids: &[i64]) -> Result<(), RepoError> {
        self.record_query();
        let mut tables = self.tables.write().await;

        tables.ensure_post(post_id)?;
        if let Some(missing) = tag_ids
            .iter()
            .find(|id| !tables.tags.iter().any(|t| t.id == **id))
        {
            return Err(RepoError::Constraint(format!("tag {missing} does not exist")));
        }

        tables.post_tags.retain(|(pid, _)| *pid != post_id);
        for &tag_id in tag_ids {
            if !tables.post_tags.contains(&(post_id, tag_id)) {
                tables.post_tags.push((post_id, tag_id));
            }
        }

        tracing::debug!(post_id, tags = tag_ids.len(), "Post tags replaced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quill_core::ContentRepository;
    use quill_core::DomainError;
    use quill_core::repository::month_window;

    use super::*;

    const FEB_2024: i64 = 1_706_745_600;
    const MAR_2024: i64 = 1_709_251_200;

    struct Blog {
        store: Arc<InMemoryContentStore>,
        repo: ContentRepository,
        tech: Category,
        rust: Category,
        travel: Category,
        async_tag: Tag,
        web_tag: Tag,
        posts: Vec<Post>,
    }

    async fn post(store: &InMemoryContentStore, slug: &str, main: &Category, at: i64, published: bool) -> Post {
        let mut post = Post::new(slug, slug.to_uppercase(), main.id, at).with_content("body");
        post.published = published;
        store.insert_post(post).await.unwrap()
    }

    /// Tech > Rust, Travel; six posts, one draft, two sharing a timestamp.
    async fn blog() -> Blog {
        let store = Arc::new(InMemoryContentStore::new());

        let tech = store.insert_category(Category::new("tech", "Tech")).await.unwrap();
        let rust = store
            .insert_category(Category::child_of(&tech, "rust", "Rust"))
            .await
            .unwrap();
        let travel = store.insert_category(Category::new("travel", "Travel")).await.unwrap();
        let web_tag = store.insert_tag(Tag::new("web", "Web")).await.unwrap();
        let async_tag = store.insert_tag(Tag::new("async", "Async")).await.unwrap();

        let posts = vec![
            post(&store, "jan-post", &rust, FEB_2024 - 1, true).await,
            post(&store, "feb-first", &rust, FEB_2024, true).await,
            post(&store, "feb-mid", &travel, FEB_2024 + 86_400, true).await,
            post(&store, "feb-mid-twin", &tech, FEB_2024 + 86_400, true).await,
            post(&store, "feb-draft", &tech, FEB_2024 + 2 * 86_400, false).await,
            post(&store, "march-boundary", &rust, MAR_2024, true).await,
        ];

        let repo = ContentRepository::new(store.clone());
        repo.set_categories(&posts[0], &[rust.id, tech.id]).await.unwrap();
        repo.set_categories(&posts[1], &[rust.id]).await.unwrap();
        repo.set_categories(&posts[2], &[travel.id]).await.unwrap();
        repo.set_categories(&posts[4], &[tech.id]).await.unwrap();
        repo.set_tags(&posts[0], &[async_tag.id, web_tag.id]).await.unwrap();
        repo.set_tags(&posts[5], &[async_tag.id]).await.unwrap();
        store.reset_query_count();

        Blog {
            store,
            repo,
            tech,
            rust,
            travel,
            async_tag,
            web_tag,
            posts,
        }
    }

    fn slugs(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.slug.as_str()).collect()
    }

    #[tokio::test]
    async fn test_get_by_slug_hydrates_full_graph() {
        let blog = blog().await;

        let post = blog.repo.get_by_slug("jan-post").await.unwrap();

        let main = post.main_category.expect("main category loaded");
        assert_eq!(main.slug, "rust");
        assert_eq!(main.parent.as_deref().map(|p| p.slug.as_str()), Some("tech"));

        let mut categories: Vec<_> = post
            .categories
            .iter()
            .map(|j| j.category.as_ref().unwrap().slug.as_str())
            .collect();
        categories.sort();
        assert_eq!(categories, vec!["rust", "tech"]);

        let mut tags: Vec<_> = post
            .tags
            .iter()
            .map(|j| j.tag.as_ref().unwrap().slug.as_str())
            .collect();
        tags.sort();
        assert_eq!(tags, vec!["async", "web"]);
    }

    #[tokio::test]
    async fn test_get_category_and_tag_include_posts_with_parent_chain() {
        let blog = blog().await;

        let tech = blog.repo.get_category("tech").await.unwrap();
        assert_eq!(tech.category, blog.tech);
        // Drafts are included.
        assert_eq!(slugs(&tech.posts), vec!["feb-draft", "jan-post"]);

        let rust = blog.repo.get_category("rust").await.unwrap();
        assert_eq!(rust.category.parent.as_deref(), Some(&blog.tech));

        let tagged = blog.repo.get_tag("async").await.unwrap();
        assert_eq!(tagged.tag, blog.async_tag);
        assert_eq!(slugs(&tagged.posts), vec!["march-boundary", "jan-post"]);
        for post in &tagged.posts {
            let main = post.main_category.as_ref().unwrap();
            assert_eq!(main.slug, "rust");
            assert_eq!(main.parent.as_deref(), Some(&blog.tech));
        }
    }

    #[tokio::test]
    async fn test_parent_chain_is_loaded_to_the_root() {
        let store = Arc::new(InMemoryContentStore::new());
        let tech = store.insert_category(Category::new("tech", "Tech")).await.unwrap();
        let lang = store
            .insert_category(Category::child_of(&tech, "lang", "Languages"))
            .await
            .unwrap();
        let rust = store
            .insert_category(Category::child_of(&lang, "rust", "Rust"))
            .await
            .unwrap();
        store
            .insert_post(Post::new("deep", "Deep", rust.id, FEB_2024))
            .await
            .unwrap();
        let repo = ContentRepository::new(store.clone());

        let chain = |category: &Category| -> Vec<String> {
            category.ancestors().map(|c| c.slug.clone()).collect()
        };

        let found = repo.get_category("rust").await.unwrap();
        assert_eq!(chain(&found.category), vec!["lang", "tech"]);

        let post = repo.get_by_slug("deep").await.unwrap();
        assert_eq!(chain(post.main_category.as_ref().unwrap()), vec!["lang", "tech"]);

        let listed = repo.categories().await.unwrap();
        let rust = listed.iter().find(|c| c.slug == "rust").unwrap();
        assert_eq!(chain(rust), vec!["lang", "tech"]);
    }

    #[tokio::test]
    async fn test_missing_slugs_fail_with_not_found() {
        let blog = blog().await;

        assert!(blog.repo.get_by_slug("missing").await.unwrap_err().is_not_found());
        assert!(blog.repo.get_category("missing").await.unwrap_err().is_not_found());
        assert!(blog.repo.get_tag("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_latest_posts_orders_and_pages() {
        let blog = blog().await;

        let page = blog.repo.latest_posts(3, 0).await.unwrap();
        assert_eq!(slugs(&page), vec!["march-boundary", "feb-mid", "feb-mid-twin"]);
        assert!(page.windows(2).all(|w| w[0].unix_date >= w[1].unix_date));
        assert!(page.iter().all(|p| p.published));

        let rest = blog.repo.latest_posts(3, 3).await.unwrap();
        assert_eq!(slugs(&rest), vec!["feb-first", "jan-post"]);

        assert!(blog.repo.latest_posts(3, 5).await.unwrap().is_empty());
        assert!(blog.repo.latest_posts(3, 500).await.unwrap().is_empty());

        let drafts = blog.repo.latest_posts_by_status(false, 10, 0).await.unwrap();
        assert_eq!(slugs(&drafts), vec!["feb-draft"]);
    }

    #[tokio::test]
    async fn test_listing_attaches_main_category_with_parent() {
        let blog = blog().await;

        let page = blog.repo.latest_posts(1, 0).await.unwrap();
        let main = page[0].main_category.as_ref().unwrap();
        assert_eq!(main, &blog.rust.clone().with_parent(blog.tech.clone()));
        assert!(page[0].categories.is_empty());
    }

    #[tokio::test]
    async fn test_scoped_listings_only_return_published_joined_posts() {
        let blog = blog().await;

        let tech = blog.repo.latest_posts_in_category(&blog.tech, 10, 0).await.unwrap();
        assert_eq!(slugs(&tech), vec!["jan-post"]);

        let rust = blog.repo.latest_posts_in_category(&blog.rust, 1, 1).await.unwrap();
        assert_eq!(slugs(&rust), vec!["jan-post"]);

        let web = blog.repo.latest_posts_with_tag(&blog.web_tag, 10, 0).await.unwrap();
        assert_eq!(slugs(&web), vec!["jan-post"]);
    }

    #[tokio::test]
    async fn test_month_listing_includes_next_month_boundary() {
        let blog = blog().await;

        // Known edge case: the window is closed on both ends, so a post at
        // exactly 2024-03-01T00:00:00Z is listed under February and March.
        let feb = blog.repo.latest_posts_for_month(2024, 2, 10, 0).await.unwrap();
        assert_eq!(
            slugs(&feb),
            vec!["march-boundary", "feb-mid", "feb-mid-twin", "feb-first"]
        );
        let main = feb[0].main_category.as_ref().unwrap();
        assert_eq!(main.slug, "rust");
        assert!(main.parent.is_none());

        let march = blog.repo.latest_posts_for_month(2024, 3, 10, 0).await.unwrap();
        assert_eq!(slugs(&march), vec!["march-boundary"]);

        assert_eq!(blog.repo.published_count_for_month(2024, 2).await.unwrap(), 4);
        assert_eq!(blog.repo.published_count_for_month(2024, 1).await.unwrap(), 2);

        let window = month_window(2024, 2).unwrap();
        assert_eq!((window.start, window.end), (FEB_2024, MAR_2024));
    }

    #[tokio::test]
    async fn test_counts_match_listings() {
        let blog = blog().await;

        assert_eq!(blog.repo.published_count().await.unwrap(), 5);
        assert_eq!(blog.repo.unpublished_count().await.unwrap(), 1);
        assert_eq!(blog.repo.published_count_in_category(&blog.rust).await.unwrap(), 2);
        assert_eq!(blog.repo.published_count_in_category(&blog.tech).await.unwrap(), 1);
        assert_eq!(blog.repo.published_count_with_tag(&blog.async_tag).await.unwrap(), 2);
        assert_eq!(blog.store.query_count(), 5);
    }

    #[tokio::test]
    async fn test_categories_for_posts_is_one_query_and_matches_single_lookup() {
        let blog = blog().await;

        let by_post = blog.repo.categories_for_posts(&blog.posts).await.unwrap();
        assert_eq!(blog.store.query_count(), 1);
        assert_eq!(by_post.len(), blog.posts.len());

        for post in &blog.posts {
            let single = blog.repo.categories_for_post(Some(post)).await.unwrap();
            assert_eq!(by_post[&post.id], single, "post {}", post.slug);
        }

        let titles: Vec<_> = by_post[&blog.posts[0].id].iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Rust", "Tech"]);
        assert!(by_post[&blog.posts[3].id].is_empty());
    }

    #[tokio::test]
    async fn test_empty_inputs_do_not_query() {
        let blog = blog().await;

        assert!(blog.repo.categories_for_posts(&[]).await.unwrap().is_empty());
        assert!(blog.repo.tags_for_posts(&[]).await.unwrap().is_empty());
        assert!(blog.repo.categories_for_post(None).await.unwrap().is_empty());
        let unsaved = Post::new("unsaved", "Unsaved", blog.tech.id, 0);
        assert!(blog.repo.tags_for_post(Some(&unsaved)).await.unwrap().is_empty());
        assert_eq!(blog.store.query_count(), 0);
    }

    #[tokio::test]
    async fn test_tags_for_posts_groups_by_post() {
        let blog = blog().await;

        let by_post = blog.repo.tags_for_posts(&blog.posts).await.unwrap();
        assert_eq!(blog.store.query_count(), 1);
        assert_eq!(
            by_post[&blog.posts[0].id],
            vec![blog.async_tag.clone(), blog.web_tag.clone()]
        );
        assert_eq!(by_post[&blog.posts[5].id], vec![blog.async_tag.clone()]);
        assert!(by_post[&blog.posts[1].id].is_empty());
    }

    #[tokio::test]
    async fn test_set_categories_replaces_whole_set() {
        let blog = blog().await;
        let post = &blog.posts[0];

        let applied = blog
            .repo
            .set_categories(post, &[blog.travel.id, 9_999, blog.travel.id])
            .await
            .unwrap();
        assert_eq!(applied, vec![blog.travel.clone()]);

        let now = blog.repo.categories_for_post(Some(post)).await.unwrap();
        assert_eq!(now, vec![blog.travel.clone()]);

        blog.repo.set_categories(post, &[]).await.unwrap();
        assert!(blog.repo.categories_for_post(Some(post)).await.unwrap().is_empty());
        // Main category is tracked independently of the join set.
        let reloaded = blog.repo.get_by_slug(&post.slug).await.unwrap();
        assert_eq!(reloaded.main_category_id, blog.rust.id);
    }

    #[tokio::test]
    async fn test_set_tags_replaces_whole_set() {
        let blog = blog().await;
        let post = &blog.posts[0];

        blog.repo.set_tags(post, &[blog.web_tag.id]).await.unwrap();
        let tags = blog.repo.tags_for_post(Some(post)).await.unwrap();
        assert_eq!(tags, vec![blog.web_tag.clone()]);
    }

    #[tokio::test]
    async fn test_set_categories_for_unknown_post_propagates_store_error() {
        let blog = blog().await;
        let mut ghost = Post::new("ghost", "Ghost", blog.tech.id, 0);
        ghost.id = 4_242;

        let err = blog.repo.set_categories(&ghost, &[blog.tech.id]).await.unwrap_err();
        assert!(matches!(err, DomainError::Store(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_enumerations_sorted_by_title() {
        let blog = blog().await;

        let titles: Vec<_> = blog
            .repo
            .categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["Rust", "Tech", "Travel"]);

        let tags: Vec<_> = blog.repo.tags().await.unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(tags, vec!["Async", "Web"]);
    }

    #[tokio::test]
    async fn test_in_use_enumerations_skip_unjoined_rows() {
        let blog = blog().await;
        blog.store
            .insert_category(Category::new("empty", "Empty"))
            .await
            .unwrap();
        blog.store.insert_tag(Tag::new("unused", "Unused")).await.unwrap();

        let in_use: Vec<_> = blog
            .repo
            .categories_in_use()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.slug)
            .collect();
        assert_eq!(in_use, vec!["rust", "tech", "travel"]);

        let rust = blog
            .repo
            .categories_in_use()
            .await
            .unwrap()
            .into_iter()
            .find(|c| c.slug == "rust")
            .unwrap();
        assert_eq!(rust.parent.as_deref(), Some(&blog.tech));

        let tags: Vec<_> = blog.repo.tags_in_use().await.unwrap().into_iter().map(|t| t.slug).collect();
        assert_eq!(tags, vec!["async", "web"]);
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_rejected() {
        let store = InMemoryContentStore::new();
        store.insert_tag(Tag::new("rust", "Rust")).await.unwrap();

        assert!(matches!(
            store.insert_tag(Tag::new("rust", "Rust again")).await,
            Err(RepoError::Constraint(_))
        ));
    }
}
