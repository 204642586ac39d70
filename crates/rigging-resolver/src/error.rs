//! Resolution and configuration errors.

use std::sync::Arc;
use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

use crate::metadata::{FetchError, MetadataError};

/// Why a configuration could not be resolved.
///
/// `path` fields read from the configuration down to the requester, e.g.
/// `configuration 'compile' -> org.a:a:1.0 -> org.b:b:2.0`.
#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    #[error("module `{module}` not found (required by {path})")]
    #[diagnostic(help("check the coordinate and that the repository contains it"))]
    ModuleNotFound { module: String, path: String },

    #[error("could not read metadata of `{module}` (required by {path}): {source}")]
    Metadata {
        module: String,
        path: String,
        #[source]
        source: MetadataError,
    },

    #[error("module `{module}` has no configuration `{configuration}` (required by {path})")]
    UnknownTargetConfiguration {
        module: String,
        configuration: String,
        path: String,
    },

    #[error("dependency cycle: {chain}")]
    Cycle { chain: String },

    #[error("version conflict on `{module}`: `{first}` vs `{second}` ({reason})")]
    #[diagnostic(help(
        "declare the wanted version with `force = true`, or use the `latest` conflict strategy"
    ))]
    Conflict {
        module: String,
        first: String,
        second: String,
        reason: String,
    },

    #[error("no version of `{module}` matches `{requested}` (required by {path})")]
    NoMatchingVersion {
        module: String,
        requested: String,
        path: String,
    },

    #[error("invalid version `{version}` of `{module}` (required by {path})")]
    InvalidVersion {
        module: String,
        version: String,
        path: String,
    },

    #[error("could not fetch artifact `{artifact}` of `{module}` (required by {path}): {source}")]
    ArtifactFetch {
        module: String,
        artifact: String,
        path: String,
        #[source]
        source: FetchError,
    },

    #[error("resolution of configuration `{configuration}` timed out after {elapsed:?}")]
    #[diagnostic(help("raise `resolution.timeout-secs` in ~/.rigging/config.toml"))]
    Timeout {
        configuration: String,
        elapsed: Duration,
    },

    #[error("configuration cycle: {chain}")]
    ConfigurationCycle { chain: String },

    #[error("configuration `{name}` does not exist")]
    UnknownConfiguration { name: String },

    #[error("resolution task failed: {message}")]
    Internal { message: String },
}

impl ResolveError {
    /// The coordinate the error is about, if it names one.
    pub fn module(&self) -> Option<&str> {
        match self {
            ResolveError::ModuleNotFound { module, .. }
            | ResolveError::Metadata { module, .. }
            | ResolveError::UnknownTargetConfiguration { module, .. }
            | ResolveError::Conflict { module, .. }
            | ResolveError::NoMatchingVersion { module, .. }
            | ResolveError::InvalidVersion { module, .. }
            | ResolveError::ArtifactFetch { module, .. } => Some(module),
            _ => None,
        }
    }
}

/// Errors from the configuration container.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigurationError {
    #[error("configuration name must not be blank")]
    InvalidName,

    #[error("configuration `{name}` already exists")]
    Duplicate { name: String },

    #[error("configuration `{name}` does not exist")]
    NotFound { name: String },

    #[error("configuration `{name}` extends `{parent}`, which does not exist")]
    UnknownParent { name: String, parent: String },

    #[error("configuration cycle: {chain}")]
    ExtendsCycle { chain: String },

    #[error("configuration `{name}` has already been resolved and can no longer be changed")]
    #[diagnostic(help("create a copy of the configuration to declare further dependencies"))]
    AlreadyResolved { name: String },

    #[error("configuration `{name}` has not been resolved")]
    NotResolved { name: String },

    #[error("could not resolve configuration `{name}`: {source}")]
    Unresolvable {
        name: String,
        #[source]
        source: Arc<ResolveError>,
    },
}

impl From<ConfigurationError> for ResolveError {
    fn from(err: ConfigurationError) -> Self {
        match err {
            ConfigurationError::ExtendsCycle { chain } => ResolveError::ConfigurationCycle { chain },
            ConfigurationError::NotFound { name } => ResolveError::UnknownConfiguration { name },
            ConfigurationError::UnknownParent { parent, .. } => {
                ResolveError::UnknownConfiguration { name: parent }
            }
            other => ResolveError::Internal {
                message: other.to_string(),
            },
        }
    }
}
