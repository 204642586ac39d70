use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for Rigging operations that are not tied to a single
/// dependency graph (loading files, parsing manifests, talking to repositories).
#[derive(Debug, Error, Diagnostic)]
pub enum RiggingError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed manifest (e.g. Rigging.toml).
    #[error("Manifest error: {message}")]
    #[diagnostic(help("Check your Rigging.toml for syntax errors"))]
    Manifest { message: String },

    /// Invalid global configuration (`~/.rigging/config.toml`).
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Dependency resolution failed (version conflicts, missing modules, etc.).
    #[error("Dependency resolution failed: {message}")]
    Resolution { message: String },

    /// A module repository could not serve a request.
    #[error("Repository error: {message}")]
    Repository { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type RiggingResult<T> = miette::Result<T>;
