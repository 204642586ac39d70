//! A loaded project: its manifest, configurations and resolver.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rigging_core::config::GlobalConfig;
use rigging_core::manifest::{Manifest, MANIFEST_FILE};
use rigging_repo::FileRepository;
use rigging_resolver::cache::CachingMetadataProvider;
use rigging_resolver::{ConfigurationContainer, ResolutionResult, Resolver, ResolverSettings};
use rigging_util::errors::RiggingError;
use tokio::task::JoinSet;

/// Configuration shown by `tree` when none is named.
pub const DEFAULT_TREE_CONFIGURATION: &str = "compile";

pub struct Project {
    pub root: PathBuf,
    pub manifest: Manifest,
    pub configurations: Arc<ConfigurationContainer>,
    pub resolver: Resolver,
}

impl Project {
    /// Find `Rigging.toml` in `start` or an ancestor and load it.
    pub fn discover(start: &Path, config: &GlobalConfig) -> miette::Result<Self> {
        let root = rigging_util::fs::find_ancestor_with(start, MANIFEST_FILE).ok_or_else(|| {
            RiggingError::Manifest {
                message: format!("could not find {MANIFEST_FILE} in {} or any parent", start.display()),
            }
        })?;
        Self::load(&root, config)
    }

    pub fn load(root: &Path, config: &GlobalConfig) -> miette::Result<Self> {
        let manifest = Manifest::from_path(&root.join(MANIFEST_FILE))?;
        let configurations = build_configurations(&manifest)?;

        let repository_dir = match &manifest.project.repository {
            Some(dir) => root.join(dir),
            None => config.repository_dir(),
        };
        tracing::debug!(
            "project {} with {} configurations, repository {}",
            manifest.project.name,
            configurations.len(),
            repository_dir.display()
        );
        let repository = Arc::new(FileRepository::new(repository_dir));
        let resolver = Resolver::new(
            Arc::new(CachingMetadataProvider::new(repository.clone())),
            repository,
        )
        .with_settings(ResolverSettings::from_config(&config.resolution));

        Ok(Self {
            root: root.to_path_buf(),
            manifest,
            configurations: Arc::new(configurations),
            resolver,
        })
    }

    /// `requested` if non-empty, otherwise every visible configuration.
    pub fn selected_configurations(&self, requested: &[String]) -> Vec<String> {
        if !requested.is_empty() {
            return requested.to_vec();
        }
        self.configurations
            .iter()
            .filter(|c| c.is_visible())
            .map(|c| c.name().to_string())
            .collect()
    }

    /// `requested`, else `compile` if declared, else the first configuration.
    pub fn tree_configuration(&self, requested: Option<&str>) -> miette::Result<String> {
        if let Some(name) = requested {
            return Ok(name.to_string());
        }
        if self.configurations.contains(DEFAULT_TREE_CONFIGURATION) {
            return Ok(DEFAULT_TREE_CONFIGURATION.to_string());
        }
        self.configurations
            .names()
            .next()
            .map(str::to_string)
            .ok_or_else(|| {
                RiggingError::Manifest {
                    message: format!("{MANIFEST_FILE} declares no configurations"),
                }
                .into()
            })
    }

    pub async fn resolve(&self, name: &str) -> miette::Result<Arc<ResolutionResult>> {
        rigging_util::progress::status("Resolving", name);
        let result = self.configurations.resolve(name, &self.resolver).await?;
        Ok(result)
    }

    /// Resolve several configurations concurrently. Results come back in the
    /// order of `names`; the first failure in that order is returned.
    pub async fn resolve_all(&self, names: &[String]) -> miette::Result<Vec<Arc<ResolutionResult>>> {
        let mut tasks = JoinSet::new();
        for (i, name) in names.iter().enumerate() {
            rigging_util::progress::status("Resolving", name);
            let configurations = Arc::clone(&self.configurations);
            let resolver = self.resolver.clone();
            let name = name.clone();
            tasks.spawn(async move { (i, configurations.resolve(&name, &resolver).await) });
        }

        let mut outcomes: Vec<_> = (0..names.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (i, outcome) = joined.map_err(|e| RiggingError::Generic {
                message: format!("resolution task failed: {e}"),
            })?;
            outcomes[i] = Some(outcome);
        }

        let mut results = Vec::with_capacity(names.len());
        for outcome in outcomes.into_iter().flatten() {
            results.push(outcome?);
        }
        Ok(results)
    }
}

/// Declare every configuration of the manifest. Parents are checked here so
/// a broken `extends` fails on load rather than on first resolve.
pub fn build_configurations(manifest: &Manifest) -> miette::Result<ConfigurationContainer> {
    let mut configurations = ConfigurationContainer::new();
    for (name, decl) in &manifest.configurations {
        let configuration = configurations.create(name)?;
        if let Some(description) = &decl.description {
            configuration.set_description(description);
        }
        configuration
            .set_visible(decl.visible)
            .set_transitive(decl.transitive);
        for parent in &decl.extends {
            configuration.extend_from(parent);
        }
        for dependency in decl.dependencies()? {
            configuration.add_dependency(dependency);
        }
    }
    for name in manifest.configurations.keys() {
        configurations.hierarchy(name)?;
    }
    Ok(configurations)
}
