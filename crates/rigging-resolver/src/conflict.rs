//! Version conflict reporting.

use std::fmt;

use rigging_core::coordinate::ModuleId;
use serde::Serialize;

/// Every request that was redirected to a different version.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConflictReport {
    pub conflicts: Vec<VersionConflict>,
}

/// A module requested at `requested` but resolved to `selected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionConflict {
    pub module: ModuleId,
    pub requested: String,
    pub selected: String,
    pub reason: ConflictReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictReason {
    /// Another path asked for a higher version.
    HighestWins,
    /// A forced declaration pinned the version.
    Forced,
    /// A range or prefix request settled on a concrete version.
    Dynamic,
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConflictReason::HighestWins => "highest version wins",
            ConflictReason::Forced => "forced",
            ConflictReason::Dynamic => "dynamic version",
        })
    }
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, conflict: VersionConflict) {
        if !self.conflicts.contains(&conflict) {
            self.conflicts.push(conflict);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    /// Redirects recorded for one module.
    pub fn for_module<'a>(&'a self, module: &'a ModuleId) -> impl Iterator<Item = &'a VersionConflict> {
        self.conflicts.iter().filter(move |c| &c.module == module)
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conflicts.is_empty() {
            return write!(f, "No version conflicts.");
        }
        writeln!(f, "Version conflicts ({}):", self.conflicts.len())?;
        for c in &self.conflicts {
            writeln!(
                f,
                "  {} requested {} but resolved {} ({})",
                c.module, c.requested, c.selected, c.reason
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for VersionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {} ({})",
            self.module, self.requested, self.selected, self.reason
        )
    }
}
