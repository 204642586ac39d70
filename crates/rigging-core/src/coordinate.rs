//! Module coordinates: `group:name` and `group:name:version`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether `value` can name a group, module or version on disk: no path
/// separators and not a `.` or `..` directory.
pub fn is_safe_segment(value: &str) -> bool {
    !value.contains(['/', '\\']) && value != "." && value != ".."
}

/// A module identity without a version.
///
/// Conflict resolution works per `ModuleId`: at most one version of each
/// module survives in a resolved graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId {
    pub group: Option<String>,
    pub name: String,
}

impl ModuleId {
    pub fn new(group: Option<&str>, name: &str) -> Self {
        Self {
            group: group.map(str::to_string),
            name: name.to_string(),
        }
    }

    /// Parse `"group:name"` or a bare `"name"`.
    pub fn parse(s: &str) -> Option<Self> {
        if !s.split(':').all(is_safe_segment) {
            return None;
        }
        match s.split(':').collect::<Vec<_>>().as_slice() {
            [name] if !name.is_empty() => Some(Self::new(None, name)),
            [group, name] if !name.is_empty() => {
                Some(Self::new((!group.is_empty()).then_some(*group), name))
            }
            _ => None,
        }
    }

    pub fn with_version(&self, version: &str) -> ModuleVersionId {
        ModuleVersionId {
            group: self.group.clone(),
            name: self.name.clone(),
            version: version.to_string(),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.group {
            Some(group) => write!(f, "{group}:{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A concrete module version, the unit the metadata provider is asked about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleVersionId {
    pub group: Option<String>,
    pub name: String,
    pub version: String,
}

impl ModuleVersionId {
    pub fn new(group: Option<&str>, name: &str, version: &str) -> Self {
        Self {
            group: group.map(str::to_string),
            name: name.to_string(),
            version: version.to_string(),
        }
    }

    /// Parse `"group:name:version"`.
    pub fn parse(s: &str) -> Option<Self> {
        if !s.split(':').all(is_safe_segment) {
            return None;
        }
        match s.split(':').collect::<Vec<_>>().as_slice() {
            [group, name, version] if !name.is_empty() && !version.is_empty() => Some(Self::new(
                (!group.is_empty()).then_some(*group),
                name,
                version,
            )),
            _ => None,
        }
    }

    pub fn module(&self) -> ModuleId {
        ModuleId {
            group: self.group.clone(),
            name: self.name.clone(),
        }
    }
}

impl fmt::Display for ModuleVersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.group {
            Some(group) => write!(f, "{group}:{}:{}", self.name, self.version),
            None => write!(f, "{}:{}", self.name, self.version),
        }
    }
}
