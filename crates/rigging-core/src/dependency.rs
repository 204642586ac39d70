//! Dependency declarations.
//!
//! A [`Dependency`] is a requested module coordinate plus the exclude rules,
//! explicit artifacts and target configuration that shape how it resolves.
//! Declarations are built up through `&mut self` mutators by a single writer
//! (the declaration layer) before resolution; mutators are additive only.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter;

use crate::artifact::{DependencyArtifact, DEFAULT_TYPE};
use crate::coordinate::{is_safe_segment, ModuleId};
use crate::error::DeclarationError;
use crate::exclude::ExcludeRule;

/// Configuration of the target module a dependency resolves against when the
/// declaration does not name one.
pub const DEFAULT_CONFIGURATION: &str = "default";

/// A single requested module.
///
/// Equality and hashing use only `(group, name, version)`, so two declarations
/// of the same coordinate are "the same requested module" regardless of their
/// exclude rules or artifacts.
#[derive(Debug, Clone)]
pub struct Dependency {
    group: Option<String>,
    name: String,
    version: Option<String>,
    target_configuration: String,
    exclude_rules: BTreeSet<ExcludeRule>,
    artifacts: BTreeSet<DependencyArtifact>,
    transitive: bool,
    force: bool,
}

impl Dependency {
    /// Create a declaration. Empty group or version strings are treated as absent.
    pub fn new(
        group: Option<&str>,
        name: &str,
        version: Option<&str>,
    ) -> Result<Self, DeclarationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DeclarationError::EmptyName);
        }
        let non_empty = |s: Option<&str>| {
            s.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let (group, version) = (non_empty(group), non_empty(version));
        if let Some(value) = iter::once(name)
            .chain(group.as_deref())
            .chain(version.as_deref())
            .find(|s| !is_safe_segment(s))
        {
            return Err(DeclarationError::UnsafeCoordinate {
                value: value.to_string(),
            });
        }
        Ok(Self {
            group,
            name: name.to_string(),
            version,
            target_configuration: DEFAULT_CONFIGURATION.to_string(),
            exclude_rules: BTreeSet::new(),
            artifacts: BTreeSet::new(),
            transitive: true,
            force: false,
        })
    }

    /// Parse `group:name[:version[:classifier]][@extension]`.
    ///
    /// A classifier or an `@extension` adds an explicit artifact. The
    /// `@extension` form is artifact-only: the declaration is non-transitive.
    pub fn parse(notation: &str) -> Result<Self, DeclarationError> {
        let invalid = || DeclarationError::InvalidNotation {
            notation: notation.to_string(),
        };
        let (coords, extension) = match notation.trim().split_once('@') {
            Some((coords, ext)) if !ext.is_empty() => (coords, Some(ext)),
            Some(_) => return Err(invalid()),
            None => (notation.trim(), None),
        };
        let parts: Vec<&str> = coords.split(':').collect();
        let (group, name, version, classifier) = match parts.as_slice() {
            [group, name] => (*group, *name, None, None),
            [group, name, version] => (*group, *name, Some(*version), None),
            [group, name, version, classifier] => (*group, *name, Some(*version), Some(*classifier)),
            _ => return Err(invalid()),
        };
        let mut dep = Self::new(Some(group), name, version).map_err(|err| match err {
            DeclarationError::UnsafeCoordinate { .. } => err,
            _ => invalid(),
        })?;
        if let Some(value) = classifier
            .into_iter()
            .chain(extension)
            .find(|s| !is_safe_segment(s))
        {
            return Err(DeclarationError::UnsafeCoordinate {
                value: value.to_string(),
            });
        }
        if classifier.is_some() || extension.is_some() {
            let mut artifact = DependencyArtifact::new(&dep.name, extension.unwrap_or(DEFAULT_TYPE));
            artifact.classifier = classifier.filter(|c| !c.is_empty()).map(str::to_string);
            dep.add_artifact(artifact);
        }
        if extension.is_some() {
            dep.transitive = false;
        }
        Ok(dep)
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn module(&self) -> ModuleId {
        ModuleId {
            group: self.group.clone(),
            name: self.name.clone(),
        }
    }

    pub fn target_configuration(&self) -> &str {
        &self.target_configuration
    }

    pub fn exclude_rules(&self) -> &BTreeSet<ExcludeRule> {
        &self.exclude_rules
    }

    pub fn artifacts(&self) -> &BTreeSet<DependencyArtifact> {
        &self.artifacts
    }

    pub fn is_transitive(&self) -> bool {
        self.transitive
    }

    pub fn is_force(&self) -> bool {
        self.force
    }

    /// Add an exclude rule. Adding an identical rule twice has no effect.
    pub fn exclude(&mut self, rule: ExcludeRule) -> &mut Self {
        self.exclude_rules.insert(rule);
        self
    }

    /// Add an exclude rule from group/module patterns.
    pub fn exclude_module(
        &mut self,
        group: Option<&str>,
        module: Option<&str>,
    ) -> Result<&mut Self, DeclarationError> {
        let rule = ExcludeRule::new(group, module)?;
        Ok(self.exclude(rule))
    }

    pub fn add_artifact(&mut self, artifact: DependencyArtifact) -> &mut Self {
        self.artifacts.insert(artifact);
        self
    }

    /// Replace the configuration this dependency resolves against in a
    /// multi-configuration module. Blank names are rejected and leave the
    /// previous value in place.
    pub fn set_target_configuration(
        &mut self,
        configuration: &str,
    ) -> Result<&mut Self, DeclarationError> {
        if configuration.trim().is_empty() {
            return Err(DeclarationError::EmptyTargetConfiguration {
                dependency: self.to_string(),
            });
        }
        self.target_configuration = configuration.to_string();
        Ok(self)
    }

    pub fn set_transitive(&mut self, transitive: bool) -> &mut Self {
        self.transitive = transitive;
        self
    }

    pub fn set_force(&mut self, force: bool) -> &mut Self {
        self.force = force;
        self
    }

    pub fn with_exclude(mut self, rule: ExcludeRule) -> Self {
        self.exclude(rule);
        self
    }

    pub fn with_artifact(mut self, artifact: DependencyArtifact) -> Self {
        self.add_artifact(artifact);
        self
    }

    pub fn with_target_configuration(mut self, configuration: &str) -> Result<Self, DeclarationError> {
        self.set_target_configuration(configuration)?;
        Ok(self)
    }

    pub fn with_transitive(mut self, transitive: bool) -> Self {
        self.transitive = transitive;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Whether any of this declaration's rules prunes `module`.
    pub fn excludes(&self, module: &ModuleId) -> bool {
        self.exclude_rules.iter().any(|rule| rule.matches(module))
    }

    /// Fold a duplicate declaration into this one.
    ///
    /// Exclude rules and artifacts are unioned and `transitive`/`force` are
    /// OR-ed. The target configuration of `self` is kept.
    pub fn merge(&mut self, other: &Dependency) {
        debug_assert_eq!(self, other);
        self.exclude_rules.extend(other.exclude_rules.iter().cloned());
        self.artifacts.extend(other.artifacts.iter().cloned());
        self.transitive |= other.transitive;
        self.force |= other.force;
    }
}

impl PartialEq for Dependency {
    fn eq(&self, other: &Self) -> bool {
        self.group == other.group && self.name == other.name && self.version == other.version
    }
}

impl Eq for Dependency {}

impl Hash for Dependency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.group.hash(state);
        self.name.hash(state);
        self.version.hash(state);
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.module())?;
        if let Some(version) = &self.version {
            write!(f, ":{version}")?;
        }
        Ok(())
    }
}
