//! Shared utilities for Rigging.
//!
//! This crate provides cross-cutting concerns used by all other Rigging crates:
//! the unified error type, filesystem helpers, SHA-256 hashing, and terminal
//! status lines.

pub mod errors;
pub mod fs;
pub mod hash;
pub mod progress;
