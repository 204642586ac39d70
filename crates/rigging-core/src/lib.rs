//! Core declaration model for the Rigging dependency resolver.
//!
//! This crate defines the values a build script (or a `Rigging.toml` manifest)
//! produces before resolution starts: module coordinates, dependency
//! declarations with their exclude rules and artifacts, the project manifest,
//! and the global user configuration.
//!
//! This crate is intentionally free of async code and I/O beyond reading
//! configuration files. Declarations are plain values mutated through
//! `&mut self`; they are built by a single writer and only shared once
//! resolution begins.

pub mod artifact;
pub mod config;
pub mod coordinate;
pub mod dependency;
pub mod error;
pub mod exclude;
pub mod manifest;
