//! # Quill Infrastructure
//!
//! Concrete implementations of the [`ContentStore`](quill_core::ports::ContentStore)
//! port defined in `quill-core`, plus configuration and telemetry setup.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external database, in-memory store only
//! - `postgres` - PostgreSQL content store via SeaORM

pub mod bootstrap;
pub mod database;
pub mod telemetry;

pub use bootstrap::build_repository;
pub use database::{DatabaseConfig, InMemoryContentStore};
pub use telemetry::{TelemetryConfig, init_telemetry};

#[cfg(feature = "postgres")]
pub use database::PostgresContentStore;
