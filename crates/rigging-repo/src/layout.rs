//! Repository directory layout.
//!
//! `org.example:lib:1.0` lives in `<root>/org/example/lib/1.0/`, holding the
//! `module.toml` descriptor and the artifact files.

use std::iter;
use std::path::{Path, PathBuf};

use rigging_core::artifact::ArtifactDescriptor;
use rigging_core::coordinate::{is_safe_segment, ModuleId, ModuleVersionId};

use crate::descriptor::DESCRIPTOR_FILE;

#[derive(Debug, Clone)]
pub struct RepositoryLayout {
    root: PathBuf,
}

impl RepositoryLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the module's directory stays below the root.
    pub fn accepts_module(&self, module: &ModuleId) -> bool {
        module
            .group
            .iter()
            .chain(iter::once(&module.name))
            .all(|segment| is_safe_segment(segment))
    }

    pub fn accepts(&self, id: &ModuleVersionId) -> bool {
        self.accepts_module(&id.module()) && is_safe_segment(&id.version)
    }

    /// Directory holding every version of a module.
    ///
    /// Callers check [`accepts_module`](Self::accepts_module) first.
    pub fn module_dir(&self, module: &ModuleId) -> PathBuf {
        let mut dir = self.root.clone();
        if let Some(group) = &module.group {
            dir.extend(group.split('.'));
        }
        dir.join(&module.name)
    }

    pub fn version_dir(&self, id: &ModuleVersionId) -> PathBuf {
        self.module_dir(&id.module()).join(&id.version)
    }

    pub fn descriptor_path(&self, id: &ModuleVersionId) -> PathBuf {
        self.version_dir(id).join(DESCRIPTOR_FILE)
    }

    pub fn artifact_path(&self, id: &ModuleVersionId, artifact: &ArtifactDescriptor) -> PathBuf {
        self.version_dir(id).join(artifact.file_name(&id.version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_segments_become_directories() {
        let layout = RepositoryLayout::new("/repo");
        let id = ModuleVersionId::parse("org.jetbrains.kotlin:kotlin-stdlib:2.3.0").unwrap();
        assert_eq!(
            layout.descriptor_path(&id),
            PathBuf::from("/repo/org/jetbrains/kotlin/kotlin-stdlib/2.3.0/module.toml")
        );
        assert_eq!(
            layout.artifact_path(&id, &ArtifactDescriptor::primary("kotlin-stdlib")),
            PathBuf::from("/repo/org/jetbrains/kotlin/kotlin-stdlib/2.3.0/kotlin-stdlib-2.3.0.jar")
        );
    }

    #[test]
    fn traversing_coordinates_are_not_accepted() {
        let layout = RepositoryLayout::new("/repo");
        let escape = |group: Option<&str>, name: &str, version: &str| {
            ModuleVersionId::new(group, name, version)
        };
        assert!(!layout.accepts(&escape(Some("org"), "..", "1.0")));
        assert!(!layout.accepts(&escape(Some("org/../../etc"), "lib", "1.0")));
        assert!(!layout.accepts(&escape(Some("org"), "lib", "..")));
        assert!(!layout.accepts_module(&ModuleId::new(None, "a\\b")));
        assert!(layout.accepts(&escape(Some("org.a"), "lib", "1.0-rc.1")));
    }

    #[test]
    fn module_without_group_sits_at_the_root() {
        let layout = RepositoryLayout::new("/repo");
        assert_eq!(
            layout.module_dir(&ModuleId::new(None, "tool")),
            PathBuf::from("/repo/tool")
        );
    }
}
