//! Dependency resolution engine: named configurations that extend each
//! other, a transitive graph walk with path-scoped exclusions and
//! highest-version conflict resolution, and memoized per-configuration
//! resolution state.

pub mod cache;
pub mod configuration;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod graph;
pub mod metadata;
pub mod result;
pub mod state;
pub mod version;

pub use configuration::{Configuration, ConfigurationContainer};
pub use engine::{Resolver, ResolverSettings};
pub use error::{ConfigurationError, ResolveError};
pub use result::ResolutionResult;
pub use state::ResolutionState;
