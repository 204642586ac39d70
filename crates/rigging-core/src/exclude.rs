//! Exclude rules attached to dependency declarations.
//!
//! A rule prunes transitively discovered modules from the branch of the graph
//! reached through the declaring edge. Either side may be a wildcard; a side
//! containing glob metacharacters (`org.apache.*`) is matched with `globset`.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use globset::{Glob, GlobMatcher};

use crate::coordinate::ModuleId;
use crate::error::DeclarationError;

const WILDCARD: &str = "*";

/// A single group/module exclusion.
///
/// Identity is the pair of pattern strings, so adding the same rule twice to
/// a set has no effect.
#[derive(Debug, Clone)]
pub struct ExcludeRule {
    group: Option<Pattern>,
    module: Option<Pattern>,
}

#[derive(Debug, Clone)]
struct Pattern {
    source: String,
    glob: Option<GlobMatcher>,
}

impl Pattern {
    /// `None` for wildcards, which match everything.
    fn new(raw: Option<&str>) -> Result<Option<Self>, DeclarationError> {
        let raw = match raw.map(str::trim) {
            None | Some("") | Some(WILDCARD) => return Ok(None),
            Some(raw) => raw,
        };
        let glob = if raw.contains(['*', '?', '[', '{']) {
            let glob = Glob::new(raw).map_err(|e| DeclarationError::InvalidPattern {
                pattern: raw.to_string(),
                reason: e.kind().to_string(),
            })?;
            Some(glob.compile_matcher())
        } else {
            None
        };
        Ok(Some(Self {
            source: raw.to_string(),
            glob,
        }))
    }

    fn matches(&self, value: &str) -> bool {
        match &self.glob {
            Some(glob) => glob.is_match(value),
            None => self.source == value,
        }
    }
}

impl ExcludeRule {
    /// Build a rule from optional group and module patterns.
    ///
    /// Fails when both sides are wildcards, since such a rule would prune the
    /// entire subtree.
    pub fn new(group: Option<&str>, module: Option<&str>) -> Result<Self, DeclarationError> {
        let group = Pattern::new(group)?;
        let module = Pattern::new(module)?;
        if group.is_none() && module.is_none() {
            return Err(DeclarationError::EmptyExcludeRule);
        }
        Ok(Self { group, module })
    }

    /// Exclude every module of a group.
    pub fn group(group: &str) -> Result<Self, DeclarationError> {
        Self::new(Some(group), None)
    }

    /// Exclude a module name in any group.
    pub fn module(module: &str) -> Result<Self, DeclarationError> {
        Self::new(None, Some(module))
    }

    /// Parse `"group:module"`, `"group"` or `"*:module"`.
    pub fn parse(spec: &str) -> Result<Self, DeclarationError> {
        match spec.split_once(':') {
            Some((group, module)) => Self::new(Some(group), Some(module)),
            None => Self::group(spec),
        }
    }

    pub fn group_pattern(&self) -> Option<&str> {
        self.group.as_ref().map(|p| p.source.as_str())
    }

    pub fn module_pattern(&self) -> Option<&str> {
        self.module.as_ref().map(|p| p.source.as_str())
    }

    /// Whether `id` is pruned by this rule.
    ///
    /// A module without a group only matches a wildcard group pattern.
    pub fn matches(&self, id: &ModuleId) -> bool {
        let group_ok = match &self.group {
            None => true,
            Some(p) => id.group.as_deref().is_some_and(|g| p.matches(g)),
        };
        group_ok && self.module.as_ref().map_or(true, |p| p.matches(&id.name))
    }

    fn key(&self) -> (Option<&str>, Option<&str>) {
        (self.group_pattern(), self.module_pattern())
    }
}

impl PartialEq for ExcludeRule {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ExcludeRule {}

impl Hash for ExcludeRule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl Ord for ExcludeRule {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for ExcludeRule {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ExcludeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.group_pattern().unwrap_or(WILDCARD),
            self.module_pattern().unwrap_or(WILDCARD)
        )
    }
}
