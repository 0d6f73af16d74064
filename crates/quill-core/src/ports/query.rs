//! Query vocabulary understood by a [`ContentStore`](super::ContentStore).
//!
//! Repositories describe *what* they want (filter, page, fetch plan); each
//! store decides how to execute it.

/// How far to hydrate a category reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFetch {
    /// Leave the reference unloaded.
    #[default]
    Skip,
    /// Load the category row only.
    Bare,
    /// Load the category and its parent.
    WithParent,
}

/// Which relations of a post to hydrate alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PostFetchPlan {
    pub main_category: CategoryFetch,
    /// Load every `PostCategory` join with its category.
    pub categories: bool,
    /// Load every `PostTag` join with its tag.
    pub tags: bool,
}

impl PostFetchPlan {
    /// Main category and its parent; used by listings.
    pub const LISTING: Self = Self {
        main_category: CategoryFetch::WithParent,
        categories: false,
        tags: false,
    };

    /// Main category row only.
    pub const MAIN_CATEGORY: Self = Self {
        main_category: CategoryFetch::Bare,
        categories: false,
        tags: false,
    };

    /// Everything a post page needs.
    pub const FULL: Self = Self {
        main_category: CategoryFetch::WithParent,
        categories: true,
        tags: true,
    };
}

/// Inclusive range of Unix timestamps. Both bounds match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    pub fn contains(&self, unix_date: i64) -> bool {
        unix_date >= self.start && unix_date <= self.end
    }
}

/// Which association a post listing is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostScope {
    #[default]
    All,
    /// Posts joined to the category with this id.
    Category(i64),
    /// Posts joined to the tag with this id.
    Tag(i64),
}

/// Row filter for posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PostFilter {
    /// `None` matches drafts and published posts alike.
    pub published: Option<bool>,
    pub scope: PostScope,
    pub window: Option<TimeWindow>,
}

impl PostFilter {
    pub fn published(published: bool) -> Self {
        Self {
            published: Some(published),
            ..Self::default()
        }
    }

    pub fn scoped(mut self, scope: PostScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn within(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Row-level predicate, excluding the scope (which needs join rows).
    pub fn matches_row(&self, published: bool, unix_date: i64) -> bool {
        self.published.is_none_or(|p| p == published)
            && self.window.is_none_or(|w| w.contains(unix_date))
    }
}

/// A post listing: filter, newest-first order, page and fetch plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PostQuery {
    pub filter: PostFilter,
    pub offset: u64,
    /// `None` means no limit.
    pub limit: Option<u64>,
    pub fetch: PostFetchPlan,
}

impl PostQuery {
    pub fn new(filter: PostFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn page(mut self, offset: u64, limit: u64) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    pub fn fetch(mut self, plan: PostFetchPlan) -> Self {
        self.fetch = plan;
        self
    }
}
