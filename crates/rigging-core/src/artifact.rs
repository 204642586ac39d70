//! Artifact declarations and descriptors.
//!
//! A [`DependencyArtifact`] is what a declaration explicitly asks for,
//! overriding the "one primary artifact per module" default. An
//! [`ArtifactDescriptor`] is what module metadata says a module publishes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Default artifact type and extension.
pub const DEFAULT_TYPE: &str = "jar";

/// An artifact explicitly requested on a dependency declaration.
///
/// Equality covers every field, so two declarations of the same file collapse
/// into one set entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DependencyArtifact {
    pub name: String,
    #[serde(default = "default_type", rename = "type")]
    pub kind: String,
    /// On-disk extension hint; falls back to `kind`.
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub classifier: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

fn default_type() -> String {
    DEFAULT_TYPE.to_string()
}

impl DependencyArtifact {
    pub fn new(name: &str, kind: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            extension: None,
            classifier: None,
            url: None,
        }
    }

    pub fn with_classifier(mut self, classifier: &str) -> Self {
        self.classifier = Some(classifier.to_string());
        self
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = Some(extension.to_string());
        self
    }

    pub fn extension(&self) -> &str {
        self.extension.as_deref().unwrap_or(&self.kind)
    }

    /// The descriptor handed to the materializer for this request.
    pub fn to_descriptor(&self) -> ArtifactDescriptor {
        ArtifactDescriptor {
            name: self.name.clone(),
            kind: self.kind.clone(),
            extension: self.extension().to_string(),
            classifier: self.classifier.clone(),
            configurations: BTreeSet::new(),
        }
    }
}

/// An artifact published by a module, as reported by module metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    pub name: String,
    #[serde(default = "default_type", rename = "type")]
    pub kind: String,
    #[serde(default = "default_type")]
    pub extension: String,
    #[serde(default)]
    pub classifier: Option<String>,
    /// Module configurations that publish this artifact. Empty means all.
    #[serde(default)]
    pub configurations: BTreeSet<String>,
}

impl ArtifactDescriptor {
    /// The conventional primary artifact: `<name>.jar`, no classifier.
    pub fn primary(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: DEFAULT_TYPE.to_string(),
            extension: DEFAULT_TYPE.to_string(),
            classifier: None,
            configurations: BTreeSet::new(),
        }
    }

    /// File name inside a module version directory:
    /// `name-version[-classifier].extension`.
    pub fn file_name(&self, version: &str) -> String {
        match &self.classifier {
            Some(c) => format!("{}-{version}-{c}.{}", self.name, self.extension),
            None => format!("{}-{version}.{}", self.name, self.extension),
        }
    }

    pub fn is_published_in(&self, configuration: &str) -> bool {
        self.configurations.is_empty() || self.configurations.contains(configuration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_falls_back_to_type() {
        let a = DependencyArtifact::new("lib", "aar");
        assert_eq!(a.extension(), "aar");
        assert_eq!(a.with_extension("zip").extension(), "zip");
    }

    #[test]
    fn file_name_with_and_without_classifier() {
        let primary = ArtifactDescriptor::primary("lib");
        assert_eq!(primary.file_name("1.0"), "lib-1.0.jar");
        let sources = DependencyArtifact::new("lib", "jar")
            .with_classifier("sources")
            .to_descriptor();
        assert_eq!(sources.file_name("1.0"), "lib-1.0-sources.jar");
    }

    #[test]
    fn empty_configurations_publish_everywhere() {
        let mut d = ArtifactDescriptor::primary("lib");
        assert!(d.is_published_in("runtime"));
        d.configurations.insert("compile".to_string());
        assert!(d.is_published_in("compile"));
        assert!(!d.is_published_in("runtime"));
    }

    #[test]
    fn deserialize_defaults() {
        let a: DependencyArtifact = toml::from_str("name = \"lib\"").unwrap();
        assert_eq!(a.kind, "jar");
        assert_eq!(a.extension(), "jar");
        assert!(a.classifier.is_none());
    }
}
