//! Named configurations and the container that owns them.
//!
//! A [`Configuration`] is a named bucket of dependency declarations that may
//! extend other configurations. Declarations are added through `&mut`
//! access during the declare phase; resolution goes through `&self`, so a
//! container shared behind an `Arc` for concurrent resolution is frozen.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use rigging_core::dependency::Dependency;

use crate::engine::Resolver;
use crate::error::{ConfigurationError, ResolveError};
use crate::result::ResolutionResult;
use crate::state::{ResolutionCell, ResolutionState};

#[derive(Debug)]
pub struct Configuration {
    name: String,
    description: Option<String>,
    visible: bool,
    transitive: bool,
    extends_from: Vec<String>,
    dependencies: Vec<Dependency>,
    resolution: ResolutionCell,
}

impl Configuration {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            visible: true,
            transitive: true,
            extends_from: Vec::new(),
            dependencies: Vec::new(),
            resolution: ResolutionCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: &str) -> &mut Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) -> &mut Self {
        self.visible = visible;
        self
    }

    /// Whether declared modules pull in their own dependencies.
    pub fn is_transitive(&self) -> bool {
        self.transitive
    }

    pub fn set_transitive(&mut self, transitive: bool) -> &mut Self {
        self.transitive = transitive;
        self
    }

    /// Direct parents, in declaration order.
    pub fn extends_from(&self) -> &[String] {
        &self.extends_from
    }

    /// Inherit every declaration of `parent`. The parent only has to exist
    /// when the configuration is resolved.
    pub fn extend_from(&mut self, parent: &str) -> &mut Self {
        if !self.extends_from.iter().any(|p| p == parent) {
            self.extends_from.push(parent.to_string());
        }
        self
    }

    /// Own declarations, without inherited ones.
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Add a declaration. An equal declaration already present absorbs it.
    pub fn add_dependency(&mut self, dependency: Dependency) -> &mut Self {
        match self.dependencies.iter_mut().find(|d| **d == dependency) {
            Some(existing) => existing.merge(&dependency),
            None => self.dependencies.push(dependency),
        }
        self
    }

    pub fn state(&self) -> ResolutionState {
        self.resolution.state()
    }
}

/// Owns every configuration of a project, keyed and ordered by name.
#[derive(Debug, Default)]
pub struct ConfigurationContainer {
    configurations: BTreeMap<String, Configuration>,
}

impl ConfigurationContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, name: &str) -> Result<&mut Configuration, ConfigurationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ConfigurationError::InvalidName);
        }
        if self.configurations.contains_key(name) {
            return Err(ConfigurationError::Duplicate {
                name: name.to_string(),
            });
        }
        Ok(self
            .configurations
            .entry(name.to_string())
            .or_insert_with(|| Configuration::new(name)))
    }

    pub fn get(&self, name: &str) -> Option<&Configuration> {
        self.configurations.get(name)
    }

    /// Mutable access for declaring more dependencies.
    ///
    /// Refused once the configuration, or any configuration extending it, has
    /// been resolved: the resolved result would no longer match.
    pub fn get_mut(&mut self, name: &str) -> Result<&mut Configuration, ConfigurationError> {
        if !self.configurations.contains_key(name) {
            return Err(ConfigurationError::NotFound {
                name: name.to_string(),
            });
        }
        let frozen_by = self.configurations.values().find(|c| {
            c.resolution.is_terminal()
                && self
                    .hierarchy(&c.name)
                    .is_ok_and(|h| h.iter().any(|n| n == name))
        });
        if let Some(resolved) = frozen_by {
            tracing::warn!(
                "rejected change to configuration `{name}`: `{}` is already resolved",
                resolved.name
            );
            return Err(ConfigurationError::AlreadyResolved {
                name: name.to_string(),
            });
        }
        self.configurations
            .get_mut(name)
            .ok_or_else(|| ConfigurationError::NotFound {
                name: name.to_string(),
            })
    }

    /// A fresh, unresolved configuration with the own declarations, parents
    /// and flags of `name`.
    pub fn copy(&mut self, name: &str, new_name: &str) -> Result<&mut Configuration, ConfigurationError> {
        let source = self.get(name).ok_or_else(|| ConfigurationError::NotFound {
            name: name.to_string(),
        })?;
        let description = source.description.clone();
        let visible = source.visible;
        let transitive = source.transitive;
        let extends_from = source.extends_from.clone();
        let dependencies = source.dependencies.clone();

        let copy = self.create(new_name)?;
        copy.description = description;
        copy.visible = visible;
        copy.transitive = transitive;
        copy.extends_from = extends_from;
        copy.dependencies = dependencies;
        Ok(copy)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.configurations.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.configurations.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Configuration> {
        self.configurations.values()
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    /// `name` followed by all of its ancestors, depth-first in declaration
    /// order, each listed once.
    pub fn hierarchy(&self, name: &str) -> Result<Vec<String>, ConfigurationError> {
        if !self.contains(name) {
            return Err(ConfigurationError::NotFound {
                name: name.to_string(),
            });
        }
        let mut order = Vec::new();
        let mut path = Vec::new();
        self.collect_hierarchy(name, &mut path, &mut order)?;
        Ok(order)
    }

    fn collect_hierarchy(
        &self,
        name: &str,
        path: &mut Vec<String>,
        order: &mut Vec<String>,
    ) -> Result<(), ConfigurationError> {
        if let Some(start) = path.iter().position(|p| p == name) {
            let mut chain = path[start..].to_vec();
            chain.push(name.to_string());
            return Err(ConfigurationError::ExtendsCycle {
                chain: chain.join(" -> "),
            });
        }
        let configuration = match self.configurations.get(name) {
            Some(c) => c,
            None => {
                return Err(ConfigurationError::UnknownParent {
                    name: path.last().cloned().unwrap_or_default(),
                    parent: name.to_string(),
                })
            }
        };
        if !order.iter().any(|o| o == name) {
            order.push(name.to_string());
        }
        path.push(name.to_string());
        for parent in &configuration.extends_from {
            self.collect_hierarchy(parent, path, order)?;
        }
        path.pop();
        Ok(())
    }

    /// Own declarations followed by inherited ones, merged by value.
    ///
    /// Pure: recomputed on every call and never triggers resolution.
    pub fn all_dependencies(&self, name: &str) -> Result<Vec<Dependency>, ConfigurationError> {
        let mut merged: Vec<Dependency> = Vec::new();
        let mut index: HashMap<Dependency, usize> = HashMap::new();
        for configuration in self.hierarchy(name)? {
            let Some(configuration) = self.configurations.get(&configuration) else {
                continue;
            };
            for dependency in &configuration.dependencies {
                match index.get(dependency) {
                    Some(&i) => merged[i].merge(dependency),
                    None => {
                        index.insert(dependency.clone(), merged.len());
                        merged.push(dependency.clone());
                    }
                }
            }
        }
        Ok(merged)
    }

    /// Resolve `name`, at most once.
    ///
    /// Concurrent callers share one traversal and receive the same `Arc`.
    /// A failure is kept as the configuration's terminal state and returned
    /// to every later caller.
    pub async fn resolve(
        &self,
        name: &str,
        resolver: &Resolver,
    ) -> Result<Arc<ResolutionResult>, ConfigurationError> {
        let configuration = self.get(name).ok_or_else(|| ConfigurationError::NotFound {
            name: name.to_string(),
        })?;
        configuration
            .resolution
            .get_or_resolve(|| async move {
                let dependencies = self.all_dependencies(name).map_err(ResolveError::from)?;
                resolver
                    .resolve(name, &dependencies, configuration.transitive)
                    .await
            })
            .await
            .map_err(|source| ConfigurationError::Unresolvable {
                name: name.to_string(),
                source,
            })
    }

    pub fn state(&self, name: &str) -> Result<ResolutionState, ConfigurationError> {
        self.get(name)
            .map(Configuration::state)
            .ok_or_else(|| ConfigurationError::NotFound {
                name: name.to_string(),
            })
    }

    /// Files of an already resolved configuration. Never resolves.
    pub fn resolved_files(&self, name: &str) -> Result<Vec<PathBuf>, ConfigurationError> {
        match self.state(name)? {
            ResolutionState::Unresolved => Err(ConfigurationError::NotResolved {
                name: name.to_string(),
            }),
            ResolutionState::Resolved(result) => Ok(result.files().to_vec()),
            ResolutionState::Unresolvable(source) => Err(ConfigurationError::Unresolvable {
                name: name.to_string(),
                source,
            }),
        }
    }
}
