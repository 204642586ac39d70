//! Capabilities the resolver consumes: module metadata lookup and artifact
//! materialization.
//!
//! Both are injected as trait objects so the graph algorithm never touches a
//! network or filesystem on its own. [`InMemoryRepository`] is a
//! deterministic implementation of both, with call counters for tests.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use miette::Diagnostic;
use rigging_core::artifact::ArtifactDescriptor;
use rigging_core::coordinate::{ModuleId, ModuleVersionId};
use rigging_core::dependency::{Dependency, DEFAULT_CONFIGURATION};
use thiserror::Error;

/// What a module version declares about itself.
#[derive(Debug, Clone)]
pub struct ModuleMetadata {
    pub id: ModuleVersionId,
    /// Named configurations the module exposes. Empty means the module only
    /// has the implicit `default` configuration.
    pub configurations: Vec<String>,
    pub dependencies: Vec<ModuleDependency>,
    pub artifacts: Vec<ArtifactDescriptor>,
}

/// A dependency edge declared by a module, tagged with the module
/// configurations it belongs to (empty means all of them).
#[derive(Debug, Clone)]
pub struct ModuleDependency {
    pub configurations: BTreeSet<String>,
    pub dependency: Dependency,
}

impl ModuleMetadata {
    pub fn new(id: ModuleVersionId) -> Self {
        Self {
            id,
            configurations: Vec::new(),
            dependencies: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    pub fn with_configuration(mut self, name: &str) -> Self {
        self.configurations.push(name.to_string());
        self
    }

    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(ModuleDependency {
            configurations: BTreeSet::new(),
            dependency,
        });
        self
    }

    /// Add a dependency that only applies to one module configuration.
    pub fn with_dependency_in(mut self, configuration: &str, dependency: Dependency) -> Self {
        self.dependencies.push(ModuleDependency {
            configurations: BTreeSet::from([configuration.to_string()]),
            dependency,
        });
        self
    }

    pub fn with_artifact(mut self, artifact: ArtifactDescriptor) -> Self {
        self.artifacts.push(artifact);
        self
    }

    /// `default` always exists; other names must be declared.
    pub fn has_configuration(&self, configuration: &str) -> bool {
        configuration == DEFAULT_CONFIGURATION
            || self.configurations.iter().any(|c| c == configuration)
    }

    /// Dependencies visible through `configuration`.
    ///
    /// `default` sees every edge of the module; a named configuration sees
    /// untagged edges and edges tagged with its name.
    pub fn dependencies_for<'a>(
        &'a self,
        configuration: &'a str,
    ) -> impl Iterator<Item = &'a Dependency> + 'a {
        self.dependencies
            .iter()
            .filter(move |d| {
                configuration == DEFAULT_CONFIGURATION
                    || d.configurations.is_empty()
                    || d.configurations.contains(configuration)
            })
            .map(|d| &d.dependency)
    }

    /// Classifier-less artifacts published in `configuration`, or the
    /// conventional primary artifact when the module lists none.
    pub fn default_artifacts(&self, configuration: &str) -> Vec<ArtifactDescriptor> {
        let published: Vec<ArtifactDescriptor> = self
            .artifacts
            .iter()
            .filter(|a| a.classifier.is_none())
            .filter(|a| configuration == DEFAULT_CONFIGURATION || a.is_published_in(configuration))
            .cloned()
            .collect();
        if published.is_empty() && self.artifacts.is_empty() {
            vec![ArtifactDescriptor::primary(&self.id.name)]
        } else {
            published
        }
    }
}

/// A metadata source failed for a reason other than "not found".
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct MetadataError {
    pub message: String,
}

impl MetadataError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// An artifact could not be materialized.
#[derive(Debug, Error, Diagnostic)]
pub enum FetchError {
    #[error("artifact file `{file}` not found")]
    NotFound { file: String },

    #[error("checksum mismatch for `{file}`: expected {expected}, got {actual}")]
    #[diagnostic(help("the repository copy may be corrupt; remove it and publish again"))]
    Checksum {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("I/O error reading `{file}`: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

/// Answers "given a module coordinate, what does it depend on and publish?"
#[async_trait]
pub trait ModuleMetadataProvider: Send + Sync {
    /// `Ok(None)` means the module version does not exist.
    async fn lookup(&self, id: &ModuleVersionId) -> Result<Option<ModuleMetadata>, MetadataError>;

    /// Published versions of a module, used to pick a version for ranges and
    /// prefixes. Sources that cannot list versions return an empty list.
    async fn list_versions(&self, _module: &ModuleId) -> Result<Vec<String>, MetadataError> {
        Ok(Vec::new())
    }
}

/// Turns a resolved module artifact into a local file.
#[async_trait]
pub trait ArtifactMaterializer: Send + Sync {
    async fn fetch(
        &self,
        id: &ModuleVersionId,
        artifact: &ArtifactDescriptor,
    ) -> Result<PathBuf, FetchError>;
}

#[async_trait]
impl<T: ModuleMetadataProvider + ?Sized> ModuleMetadataProvider for Arc<T> {
    async fn lookup(&self, id: &ModuleVersionId) -> Result<Option<ModuleMetadata>, MetadataError> {
        (**self).lookup(id).await
    }

    async fn list_versions(&self, module: &ModuleId) -> Result<Vec<String>, MetadataError> {
        (**self).list_versions(module).await
    }
}

#[async_trait]
impl<T: ArtifactMaterializer + ?Sized> ArtifactMaterializer for Arc<T> {
    async fn fetch(
        &self,
        id: &ModuleVersionId,
        artifact: &ArtifactDescriptor,
    ) -> Result<PathBuf, FetchError> {
        (**self).fetch(id, artifact).await
    }
}

/// Deterministic in-memory module source.
///
/// Files are synthesized under `root` using the repository directory layout;
/// nothing is read from or written to disk.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    root: PathBuf,
    modules: HashMap<ModuleVersionId, ModuleMetadata>,
    unavailable: HashSet<(ModuleVersionId, String)>,
    lookup_delay: Option<Duration>,
    lookups: AtomicUsize,
    fetches: AtomicUsize,
    lookup_log: Mutex<Vec<ModuleVersionId>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("/repo"),
            ..Self::default()
        }
    }

    /// Register a module version.
    pub fn add(&mut self, metadata: ModuleMetadata) -> &mut Self {
        self.modules.insert(metadata.id.clone(), metadata);
        self
    }

    /// Register `group:name:version` depending on the given notations.
    ///
    /// Intended for fixtures: panics on an invalid coordinate or notation.
    pub fn module(&mut self, coordinate: &str, dependencies: &[&str]) -> &mut Self {
        let id = ModuleVersionId::parse(coordinate)
            .unwrap_or_else(|| panic!("invalid coordinate `{coordinate}`"));
        let metadata = dependencies.iter().fold(ModuleMetadata::new(id), |m, d| {
            m.with_dependency(
                Dependency::parse(d).unwrap_or_else(|e| panic!("invalid notation `{d}`: {e}")),
            )
        });
        self.add(metadata)
    }

    /// Make fetching `file_name` of `id` fail with [`FetchError::NotFound`].
    pub fn fail_fetch(&mut self, id: ModuleVersionId, file_name: &str) -> &mut Self {
        self.unavailable.insert((id, file_name.to_string()));
        self
    }

    /// Delay every lookup, to exercise timeouts and concurrent callers.
    pub fn with_lookup_delay(mut self, delay: Duration) -> Self {
        self.lookup_delay = Some(delay);
        self
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// How many times `id` was looked up.
    pub fn lookups_of(&self, id: &ModuleVersionId) -> usize {
        self.lookup_log
            .lock()
            .map(|log| log.iter().filter(|l| *l == id).count())
            .unwrap_or(0)
    }

    fn file_path(&self, id: &ModuleVersionId, artifact: &ArtifactDescriptor) -> PathBuf {
        let mut path = self.root.clone();
        if let Some(group) = &id.group {
            path.extend(group.split('.'));
        }
        path.join(&id.name)
            .join(&id.version)
            .join(artifact.file_name(&id.version))
    }
}

#[async_trait]
impl ModuleMetadataProvider for InMemoryRepository {
    async fn lookup(&self, id: &ModuleVersionId) -> Result<Option<ModuleMetadata>, MetadataError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut log) = self.lookup_log.lock() {
            log.push(id.clone());
        }
        if let Some(delay) = self.lookup_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.modules.get(id).cloned())
    }

    async fn list_versions(&self, module: &ModuleId) -> Result<Vec<String>, MetadataError> {
        let mut versions: Vec<String> = self
            .modules
            .keys()
            .filter(|id| id.group == module.group && id.name == module.name)
            .map(|id| id.version.clone())
            .collect();
        versions.sort();
        Ok(versions)
    }
}

#[async_trait]
impl ArtifactMaterializer for InMemoryRepository {
    async fn fetch(
        &self,
        id: &ModuleVersionId,
        artifact: &ArtifactDescriptor,
    ) -> Result<PathBuf, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let file = artifact.file_name(&id.version);
        if self.unavailable.contains(&(id.clone(), file.clone())) {
            return Err(FetchError::NotFound { file });
        }
        Ok(self.file_path(id, artifact))
    }
}
