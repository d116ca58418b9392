//! Repository trait definitions for database operations.
//!
//! - [`error`]: Error types for repository operations
//! - [`coords`]: Persisted track coordinates per juncture

pub mod coords;
pub mod error;

pub use coords::CoordRepository;
pub use error::{ErrorContext, RepositoryError, RepositoryResult};
