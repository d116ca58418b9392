//! Database module for persisted track coordinates.
//!
//! Storage backends sit behind the [`CoordRepository`] trait so they can be
//! swapped without touching the HTTP or ingestion layers.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP handlers / ingestion services                     │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service layer (services.rs)                            │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  CoordRepository trait (repository/coords.rs)           │
//! └─────────┬─────────────────────────────────┬─────────────┘
//!           │                                 │
//! ┌─────────▼──────────┐            ┌─────────▼──────────┐
//! │ PostgresRepository │            │  LocalRepository   │
//! │  (diesel + r2d2)   │            │    (in-memory)     │
//! └────────────────────┘            └────────────────────┘
//! ```
//!
//! # Usage
//! ```ignore
//! use pomb_backend::db::{services, RepositoryFactory};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = RepositoryFactory::from_env().await?;
//!     let healthy = services::health_check(repo.as_ref()).await?;
//!     Ok(())
//! }
//! ```

// Feature flag priority: postgres > local
#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod models;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod services;

#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::PostgresConfig;
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use models::StoredCoord;
pub use repo_config::RepositoryConfig;
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{CoordRepository, ErrorContext, RepositoryError, RepositoryResult};

use anyhow::{Context, Result};
use std::sync::Arc;

/// Build the repository selected by `REPOSITORY_TYPE` and `DATABASE_URL`.
pub async fn init_repository() -> Result<Arc<dyn CoordRepository>> {
    RepositoryFactory::from_env()
        .await
        .map_err(|e| anyhow::Error::msg(e.to_string()))
        .context("Failed to initialize coordinate repository")
}
