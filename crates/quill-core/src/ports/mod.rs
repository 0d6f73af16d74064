//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod query;
mod store;

pub use query::{CategoryFetch, PostFetchPlan, PostFilter, PostQuery, PostScope, TimeWindow};
pub use store::ContentStore;
