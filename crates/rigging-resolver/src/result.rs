//! The immutable outcome of a successful resolution.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rigging_core::artifact::ArtifactDescriptor;
use rigging_core::coordinate::ModuleVersionId;
use rigging_core::dependency::Dependency;
use serde::Serialize;

use crate::conflict::ConflictReport;
use crate::graph::DependencyGraph;

/// A materialized artifact of a resolved module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedArtifact {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub extension: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    pub file: PathBuf,
}

impl ResolvedArtifact {
    pub fn new(descriptor: &ArtifactDescriptor, file: PathBuf) -> Self {
        Self {
            name: descriptor.name.clone(),
            kind: descriptor.kind.clone(),
            extension: descriptor.extension.clone(),
            classifier: descriptor.classifier.clone(),
            file,
        }
    }
}

/// The selected version of a module and its files.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedModule {
    pub id: ModuleVersionId,
    pub artifacts: Vec<ResolvedArtifact>,
}

/// A declaration of the configuration and the module version it resolved to.
#[derive(Debug, Clone)]
pub struct FirstLevelDependency {
    pub declaration: Dependency,
    pub selected: ModuleVersionId,
}

/// Resolved files, modules and graph of one configuration.
///
/// Built once by the engine and shared behind an `Arc`; never mutated.
#[derive(Debug)]
pub struct ResolutionResult {
    configuration: String,
    files: Vec<PathBuf>,
    modules: Vec<ResolvedModule>,
    first_level: Vec<FirstLevelDependency>,
    graph: DependencyGraph,
    conflicts: ConflictReport,
}

impl ResolutionResult {
    pub(crate) fn new(
        configuration: &str,
        modules: Vec<ResolvedModule>,
        first_level: Vec<FirstLevelDependency>,
        graph: DependencyGraph,
        conflicts: ConflictReport,
    ) -> Self {
        let files = collect_files(modules.iter());
        Self {
            configuration: configuration.to_string(),
            files,
            modules,
            first_level,
            graph,
            conflicts,
        }
    }

    pub fn configuration(&self) -> &str {
        &self.configuration
    }

    /// Every resolved file in discovery order, without duplicates.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn modules(&self) -> &[ResolvedModule] {
        &self.modules
    }

    pub fn module(&self, id: &ModuleVersionId) -> Option<&ResolvedModule> {
        self.modules.iter().find(|m| &m.id == id)
    }

    pub fn first_level_modules(&self) -> &[FirstLevelDependency] {
        &self.first_level
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn conflicts(&self) -> &ConflictReport {
        &self.conflicts
    }

    pub fn contains_file(&self, file: &Path) -> bool {
        self.files.iter().any(|f| f == file)
    }

    /// Files of the declarations matching `predicate` and everything they
    /// pull in.
    pub fn files_for<F>(&self, predicate: F) -> Vec<PathBuf>
    where
        F: Fn(&Dependency) -> bool,
    {
        let mut pending: Vec<_> = self
            .first_level
            .iter()
            .filter(|f| predicate(&f.declaration))
            .filter_map(|f| self.graph.find(&f.selected.module().to_string()))
            .collect();
        let mut reached = HashSet::new();
        while let Some(idx) = pending.pop() {
            if reached.insert(idx) {
                pending.extend(self.graph.dependencies_of(idx).into_iter().map(|(child, _)| child));
            }
        }
        let ids: HashSet<&ModuleVersionId> = reached
            .iter()
            .filter_map(|&idx| self.graph.node(idx).module())
            .collect();
        collect_files(self.modules.iter().filter(|m| ids.contains(&m.id)))
    }
}

fn collect_files<'a>(modules: impl Iterator<Item = &'a ResolvedModule>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    modules
        .flat_map(|m| m.artifacts.iter())
        .filter(|a| seen.insert(a.file.clone()))
        .map(|a| a.file.clone())
        .collect()
}
