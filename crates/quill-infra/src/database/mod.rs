//! Content store adapters and database connection management.

mod config;
mod memory;

#[cfg(feature = "postgres")]
pub mod entity;
#[cfg(feature = "postgres")]
mod postgres_store;

pub use config::DatabaseConfig;
pub use memory::InMemoryContentStore;

#[cfg(feature = "postgres")]
pub use config::connect;
#[cfg(feature = "postgres")]
pub use postgres_store::PostgresContentStore;
