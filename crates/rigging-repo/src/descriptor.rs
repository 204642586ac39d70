//! `module.toml`: what a module version declares about itself.
//!
//! ```toml
//! configurations = ["runtime", "test"]
//! dependencies = ["org.a:a:1.0"]
//!
//! [scoped-dependencies]
//! test = ["org.junit:junit:4.13"]
//!
//! [[artifacts]]
//! name = "lib"
//! configurations = ["runtime"]
//! ```
//!
//! `dependencies` apply to every configuration of the module;
//! `scoped-dependencies` only to the named one.

use std::collections::{BTreeMap, BTreeSet};

use miette::Diagnostic;
use rigging_core::artifact::ArtifactDescriptor;
use rigging_core::coordinate::ModuleVersionId;
use rigging_core::error::DeclarationError;
use rigging_core::manifest::DependencySpec;
use rigging_resolver::metadata::{ModuleDependency, ModuleMetadata};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DESCRIPTOR_FILE: &str = "module.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ModuleDescriptor {
    #[serde(default)]
    pub configurations: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactDescriptor>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scoped_dependencies: BTreeMap<String, Vec<DependencySpec>>,
}

#[derive(Debug, Error, Diagnostic)]
pub enum DescriptorError {
    #[error("invalid {DESCRIPTOR_FILE}: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("could not write {DESCRIPTOR_FILE}: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    #[error("dependencies scoped to `{configuration}`, which the module does not declare")]
    UndeclaredConfiguration { configuration: String },
}

impl ModuleDescriptor {
    pub fn parse(content: &str) -> Result<Self, DescriptorError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, DescriptorError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// A descriptor with plain dependency notations, for fixtures and tools.
    pub fn with_dependencies(notations: &[&str]) -> Self {
        Self {
            dependencies: notations
                .iter()
                .map(|n| DependencySpec::Short(n.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    /// Convert into the metadata the resolver consumes.
    pub fn into_metadata(self, id: ModuleVersionId) -> Result<ModuleMetadata, DescriptorError> {
        let mut dependencies = Vec::new();
        for spec in &self.dependencies {
            dependencies.push(ModuleDependency {
                configurations: BTreeSet::new(),
                dependency: spec.to_dependency()?,
            });
        }
        for (configuration, specs) in &self.scoped_dependencies {
            if !self.configurations.contains(configuration) {
                return Err(DescriptorError::UndeclaredConfiguration {
                    configuration: configuration.clone(),
                });
            }
            for spec in specs {
                dependencies.push(ModuleDependency {
                    configurations: BTreeSet::from([configuration.clone()]),
                    dependency: spec.to_dependency()?,
                });
            }
        }
        Ok(ModuleMetadata {
            id,
            configurations: self.configurations,
            dependencies,
            artifacts: self.artifacts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> ModuleVersionId {
        ModuleVersionId::parse("org.example:lib:1.0").unwrap()
    }

    #[test]
    fn parse_full_descriptor() {
        let toml = r#"
configurations = ["runtime", "test"]
dependencies = ["org.a:a:1.0", { group = "org.b", name = "b", version = "2.0", exclude = [{ group = "org.x" }] }]

[scoped-dependencies]
test = ["org.junit:junit:4.13"]

[[artifacts]]
name = "lib"
configurations = ["runtime"]

[[artifacts]]
name = "lib"
classifier = "sources"
"#;
        let metadata = ModuleDescriptor::parse(toml).unwrap().into_metadata(id()).unwrap();
        assert_eq!(metadata.configurations, ["runtime", "test"]);
        assert_eq!(metadata.dependencies.len(), 3);
        assert_eq!(metadata.dependencies[1].dependency.exclude_rules().len(), 1);
        assert!(metadata.dependencies[2].configurations.contains("test"));

        let runtime: Vec<_> = metadata.dependencies_for("runtime").map(|d| d.name()).collect();
        assert_eq!(runtime, ["a", "b"]);
        assert_eq!(metadata.default_artifacts("runtime").len(), 1);
        assert_eq!(metadata.artifacts[0].extension, "jar");
    }

    #[test]
    fn empty_descriptor_is_a_leaf() {
        let metadata = ModuleDescriptor::parse("").unwrap().into_metadata(id()).unwrap();
        assert!(metadata.dependencies.is_empty());
        assert_eq!(
            metadata.default_artifacts("default"),
            [ArtifactDescriptor::primary("lib")]
        );
    }

    #[test]
    fn scoped_dependencies_need_a_declared_configuration() {
        let toml = "[scoped-dependencies]\ntest = [\"org.junit:junit:4.13\"]\n";
        let err = ModuleDescriptor::parse(toml).unwrap().into_metadata(id()).unwrap_err();
        assert!(matches!(err, DescriptorError::UndeclaredConfiguration { ref configuration } if configuration == "test"));
    }

    #[test]
    fn invalid_notation_is_reported() {
        let err = ModuleDescriptor::with_dependencies(&["nonsense"])
            .into_metadata(id())
            .unwrap_err();
        assert!(matches!(err, DescriptorError::Declaration(_)));
    }

    #[test]
    fn serialized_descriptor_parses_back() {
        let mut descriptor = ModuleDescriptor::with_dependencies(&["org.a:a:1.0"]);
        descriptor.configurations.push("runtime".into());
        descriptor
            .scoped_dependencies
            .insert("runtime".into(), vec![DependencySpec::Short("org.r:r:1.0".into())]);
        let text = descriptor.to_toml().unwrap();
        let metadata = ModuleDescriptor::parse(&text).unwrap().into_metadata(id()).unwrap();
        assert_eq!(metadata.dependencies.len(), 2);
    }
}
