//! The `Rigging.toml` project manifest.
//!
//! The manifest is the data-driven declaration layer: it names configurations,
//! their parents and their dependency declarations. Turning it into
//! [`Dependency`] values is synchronous and side-effect free.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::artifact::DependencyArtifact;
use crate::dependency::Dependency;
use crate::error::DeclarationError;
use crate::exclude::ExcludeRule;

/// File name of the project manifest.
pub const MANIFEST_FILE: &str = "Rigging.toml";

/// The parsed representation of a `Rigging.toml` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub project: ProjectMetadata,

    #[serde(default)]
    pub configurations: BTreeMap<String, ConfigurationDecl>,
}

/// Project identity from the `[project]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Module repository directory, relative to the project root.
    #[serde(default)]
    pub repository: Option<String>,
}

/// A configuration from `[configurations.<name>]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationDecl {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub extends: Vec<String>,
    #[serde(default = "default_true")]
    pub transitive: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,
}

fn default_true() -> bool {
    true
}

/// A dependency entry: either `"group:name:version"` notation or a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencySpec {
    Short(String),
    Detailed(DetailedDependency),
}

/// A dependency with explicit coordinates and resolution options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedDependency {
    #[serde(default)]
    pub group: Option<String>,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    /// Target configuration in the dependency module.
    #[serde(default)]
    pub configuration: Option<String>,
    #[serde(default)]
    pub exclude: Vec<ExcludeSpec>,
    #[serde(default)]
    pub artifacts: Vec<DependencyArtifact>,
    #[serde(default = "default_true")]
    pub transitive: bool,
    #[serde(default)]
    pub force: bool,
}

/// An exclusion in a detailed dependency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcludeSpec {
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub module: Option<String>,
}

impl DependencySpec {
    /// Build the declaration this entry describes.
    pub fn to_dependency(&self) -> Result<Dependency, DeclarationError> {
        match self {
            DependencySpec::Short(notation) => Dependency::parse(notation),
            DependencySpec::Detailed(d) => {
                let mut dep =
                    Dependency::new(d.group.as_deref(), &d.name, d.version.as_deref())?;
                if let Some(conf) = &d.configuration {
                    dep.set_target_configuration(conf)?;
                }
                for excl in &d.exclude {
                    dep.exclude(ExcludeRule::new(excl.group.as_deref(), excl.module.as_deref())?);
                }
                for artifact in &d.artifacts {
                    dep.add_artifact(artifact.clone());
                }
                dep.set_transitive(d.transitive).set_force(d.force);
                Ok(dep)
            }
        }
    }
}

impl ConfigurationDecl {
    /// All declarations of this configuration, in manifest order.
    pub fn dependencies(&self) -> Result<Vec<Dependency>, DeclarationError> {
        self.dependencies.iter().map(DependencySpec::to_dependency).collect()
    }
}

impl Manifest {
    /// Load and parse a `Rigging.toml` file from the given path.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            rigging_util::errors::RiggingError::Manifest {
                message: format!("Failed to read {}: {e}", path.display()),
            }
        })?;
        Self::parse_toml(&content)
    }

    /// Parse a `Rigging.toml` from a string.
    pub fn parse_toml(content: &str) -> miette::Result<Self> {
        toml::from_str(content).map_err(|e| {
            rigging_util::errors::RiggingError::Manifest {
                message: format!("Failed to parse {MANIFEST_FILE}: {e}"),
            }
            .into()
        })
    }
}
