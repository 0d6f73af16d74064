//! PostgreSQL content store.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use sea_orm::sea_query::Query;
use sea_orm::{
    ColumnTrait, DbConn, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Select, TransactionTrait,
};

use quill_core::domain::{Category, Post, PostCategory, PostTag, Tag};
use quill_core::error::RepoError;
use quill_core::ports::{
    CategoryFetch, ContentStore, PostFetchPlan, PostFilter, PostQuery, PostScope,
};

use super::entity::{category, post, post_category, post_tag, tag};

/// PostgreSQL content store.
///
/// Each fetch-plan hop is one extra batched query over the whole page
/// (`WHERE id IN (...)`), never one query per row.
pub struct PostgresContentStore {
    pub(crate) db: DbConn,
}

impl PostgresContentStore {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// Posts matching `filter`, unordered and unpaged.
    fn filtered(filter: &PostFilter) -> Select<post::Entity> {
        let mut select = post::Entity::find();

        if let Some(published) = filter.published {
            select = select.filter(post::Column::Published.eq(published));
        }
        if let Some(window) = filter.window {
            select = select.filter(post::Column::UnixDate.between(window.start, window.end));
        }

        match filter.scope {
            PostScope::All => select,
            PostScope::Category(category_id) => select.filter(
                post::Column::Id.in_subquery(
                    Query::select()
                        .column(post_category::Column::PostId)
                        .from(post_category::Entity)
                        .and_where(post_category::Column::CategoryId.eq(category_id))
                        .to_owned(),
                ),
            ),
            PostScope::Tag(tag_id) => select.filter(
                post::Column::Id.in_subquery(
                    Query::select()
                        .column(post_tag::Column::PostId)
                        .from(post_tag::Entity)
                        .and_where(post_tag::Column::TagId.eq(tag_id))
                        .to_owned(),
                ),
            ),
        }
    }

    /// Attach the relations named by `plan` to `posts`.
    async fn hydrate(&self, models: Vec<post::Model>, plan: PostFetchPlan) -> Result<Vec<Post>, DbErr> {
        let mut posts: Vec<Post> = models.into_iter().map(Into::into).collect();
        if posts.is_empty() {
            return Ok(posts);
        }

        let with_parent = match plan.main_category {
            CategoryFetch::Skip => None,
            CategoryFetch::Bare => Some(false),
            CategoryFetch::WithParent => Some(true),
        };
        if let Some(with_parent) = with_parent {
            let ids = unique(posts.iter().map(|p| p.main_category_id));
            let categories = self.categories_by_id(&ids, with_parent).await?;
            for post in &mut posts {
                post.main_category = categories.get(&post.main_category_id).cloned();
            }
        }

        let post_ids: Vec<i64> = posts.iter().map(|p| p.id).collect();

        if plan.categories {
            let rows = post_category::Entity::find()
                .filter(post_category::Column::PostId.is_in(post_ids.iter().copied()))
                .find_also_related(category::Entity)
                .all(&self.db)
                .await?;

            let mut by_post: HashMap<i64, Vec<PostCategory>> = HashMap::new();
            for (join, category) in rows {
                by_post.entry(join.post_id).or_default().push(PostCategory {
                    post_id: join.post_id,
                    category_id: join.category_id,
                    category: category.map(Into::into),
                });
            }
            for post in &mut posts {
                post.categories = by_post.remove(&post.id).unwrap_or_default();
            }
        }

        if plan.tags {
            let rows = post_tag::Entity::find()
                .filter(post_tag::Column::PostId.is_in(post_ids.iter().copied()))
                .find_also_related(tag::Entity)
                .all(&self.db)
                .await?;

            let mut by_post: HashMap<i64, Vec<PostTag>> = HashMap::new();
            for (join, tag) in rows {
                by_post.entry(join.post_id).or_default().push(PostTag {
                    post_id: join.post_id,
                    tag_id: join.tag_id,
                    tag: tag.map(Into::into),
                });
            }
            for post in &mut posts {
                post.tags = by_post.remove(&post.id).unwrap_or_default();
            }
        }

        Ok(posts)
    }

    async fn categories_by_id(
        &self,
        ids: &[i64],
        with_parent: bool,
    ) -> Result<HashMap<i64, Category>, DbErr> {
        let mut categories: Vec<Category> = category::Entity::find()
            .filter(category::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        if with_parent {
            self.attach_parents(&mut categories).await?;
        }

        Ok(categories.into_iter().map(|c| (c.id, c)).collect())
    }

    /// Attach the full parent chain to each category, one batched query per
    /// level of the hierarchy.
    async fn attach_parents(&self, categories: &mut [Category]) -> Result<(), DbErr> {
        let mut known: HashMap<i64, Category> =
            categories.iter().map(|c| (c.id, c.clone())).collect();
        let mut requested: HashSet<i64> = HashSet::new();

        loop {
            let missing = unique(
                known
                    .values()
                    .filter_map(|c| c.parent_id)
                    .filter(|id| !known.contains_key(id) && !requested.contains(id)),
            );
            if missing.is_empty() {
                break;
            }
            requested.extend(missing.iter().copied());

            let parents = category::Entity::find()
                .filter(category::Column::Id.is_in(missing))
                .all(&self.db)
                .await?;
            known.extend(parents.into_iter().map(|m| (m.id, Category::from(m))));
        }

        for category in categories.iter_mut() {
            let mut visited = vec![category.id];
            category.parent = category
                .parent_id
                .and_then(|id| with_ancestors(id, &known, &mut visited))
                .map(Box::new);
        }
        Ok(())
    }
}

/// `id` with its parents linked from `known`, stopping at a repeated id.
fn with_ancestors(
    id: i64,
    known: &HashMap<i64, Category>,
    visited: &mut Vec<i64>,
) -> Option<Category> {
    if visited.contains(&id) {
        return None;
    }
    visited.push(id);

    let mut category = known.get(&id)?.clone();
    category.parent = category
        .parent_id
        .and_then(|pid| with_ancestors(pid, known, visited))
        .map(Box::new);
    Some(category)
}

#[async_trait]
impl ContentStore for PostgresContentStore {
    async fn find_post(&self, slug: &str, fetch: PostFetchPlan) -> Result<Option<Post>, RepoError> {
        tracing::debug!(slug, ?fetch, "Finding post by slug");

        let Some(model) = post::Entity::find()
            .filter(post::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?
        else {
            return Ok(None);
        };

        let mut posts = self.hydrate(vec![model], fetch).await.map_err(map_db_err)?;
        Ok(posts.pop())
    }

    async fn find_category(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        tracing::debug!(slug, "Finding category by slug");

        let Some(model) = category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?
        else {
            return Ok(None);
        };

        let mut found = [Category::from(model)];
        self.attach_parents(&mut found).await.map_err(map_db_err)?;
        let [category] = found;
        Ok(Some(category))
    }

    async fn find_tag(&self, slug: &str) -> Result<Option<Tag>, RepoError> {
        let result = tag::Entity::find()
            .filter(tag::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn query_posts(&self, query: &PostQuery) -> Result<Vec<Post>, RepoError> {
        tracing::debug!(?query, "Querying posts");

        let models = Self::filtered(&query.filter)
            .order_by_desc(post::Column::UnixDate)
            .order_by_asc(post::Column::Id)
            .offset(query.offset)
            .limit(query.limit)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        self.hydrate(models, query.fetch).await.map_err(map_db_err)
    }

    async fn count_posts(&self, filter: &PostFilter) -> Result<u64, RepoError> {
        Self::filtered(filter)
            .count(&self.db)
            .await
            .map_err(map_db_err)
    }

    async fn categories(&self, in_use: bool) -> Result<Vec<Category>, RepoError> {
        let mut select = category::Entity::find().order_by_asc(category::Column::Title);
        if in_use {
            select = select.filter(
                category::Column::Id.in_subquery(
                    Query::select()
                        .column(post_category::Column::CategoryId)
                        .from(post_category::Entity)
                        .to_owned(),
                ),
            );
        }

        let mut categories: Vec<Category> = select
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(Into::into)
            .collect();

        self.attach_parents(&mut categories)
            .await
            .map_err(map_db_err)?;
        Ok(categories)
    }

    async fn tags(&self, in_use: bool) -> Result<Vec<Tag>, RepoError> {
        let mut select = tag::Entity::find().order_by_asc(tag::Column::Title);
        if in_use {
            select = select.filter(
                tag::Column::Id.in_subquery(
                    Query::select()
                        .column(post_tag::Column::TagId)
                        .from(post_tag::Entity)
                        .to_owned(),
                ),
            );
        }

        let result = select.all(&self.db).await.map_err(map_db_err)?;
        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn categories_by_ids(&self, ids: &[i64]) -> Result<Vec<Category>, RepoError> {
        let result = category::Entity::find()
            .filter(category::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn tags_by_ids(&self, ids: &[i64]) -> Result<Vec<Tag>, RepoError> {
        let result = tag::Entity::find()
            .filter(tag::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn categories_joined_to(
        &self,
        post_ids: &[i64],
    ) -> Result<Vec<(Category, Vec<i64>)>, RepoError> {
        tracing::debug!(posts = post_ids.len(), "Loading categories joined to posts");

        // One SELECT ... JOIN post_categories; rows are folded per category.
        let rows = category::Entity::find()
            .find_with_related(post_category::Entity)
            .filter(post_category::Column::PostId.is_in(post_ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows
            .into_iter()
            .map(|(category, joins)| {
                let post_ids = joins.into_iter().map(|j| j.post_id).collect();
                (category.into(), post_ids)
            })
            .collect())
    }

    async fn tags_joined_to(&self, post_ids: &[i64]) -> Result<Vec<(Tag, Vec<i64>)>, RepoError> {
        let rows = tag::Entity::find()
            .find_with_related(post_tag::Entity)
            .filter(post_tag::Column::PostId.is_in(post_ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows
            .into_iter()
            .map(|(tag, joins)| {
                let post_ids = joins.into_iter().map(|j| j.post_id).collect();
                (tag.into(), post_ids)
            })
            .collect())
    }

    async fn replace_post_categories(
        &self,
        post_id: i64,
        category_ids: &[i64],
    ) -> Result<(), RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        post_category::Entity::delete_many()
            .filter(post_category::Column::PostId.eq(post_id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        if !category_ids.is_empty() {
            post_category::Entity::insert_many(
                category_ids
                    .iter()
                    .map(|&category_id| post_category::join(post_id, category_id)),
            )
            .exec_without_returning(&txn)
            .await
            .map_err(map_db_err)?;
        }

        txn.commit().await.map_err(map_db_err)?;

        tracing::debug!(post_id, categories = category_ids.len(), "Post categories replaced");
        Ok(())
    }

    async fn replace_post_tags(&self, post_id: i64, tag_ids: &[i64]) -> Result<(), RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        post_tag::Entity::delete_many()
            .filter(post_tag::Column::PostId.eq(post_id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        if !tag_ids.is_empty() {
            post_tag::Entity::insert_many(
                tag_ids.iter().map(|&tag_id| post_tag::join(post_id, tag_id)),
            )
            .exec_without_returning(&txn)
            .await
            .map_err(map_db_err)?;
        }

        txn.commit().await.map_err(map_db_err)?;

        tracing::debug!(post_id, tags = tag_ids.len(), "Post tags replaced");
        Ok(())
    }
}

fn unique(ids: impl Iterator<Item = i64>) -> Vec<i64> {
    let mut ids: Vec<i64> = ids.collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn map_db_err(err: DbErr) -> RepoError {
    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => RepoError::Connection(err.to_string()),
        _ => {
            let err_str = err.to_string();
            if err_str.contains("duplicate")
                || err_str.contains("unique")
                || err_str.contains("foreign key")
            {
                RepoError::Constraint(err_str)
            } else {
                RepoError::Query(err_str)
            }
        }
    }
}
