//! # Quill Core
//!
//! The content domain of the Quill blog: posts, categories, tags and the
//! joins between them.
//! This crate holds the query and aggregation logic; storage lives behind
//! the [`ports::ContentStore`] trait.

pub mod domain;
pub mod error;
pub mod ports;
pub mod repository;

pub use error::{DomainError, RepoError};
pub use repository::ContentRepository;
