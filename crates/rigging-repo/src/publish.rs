//! Installing module versions into a [`FileRepository`].

use std::path::PathBuf;

use rigging_core::artifact::ArtifactDescriptor;
use rigging_core::coordinate::{is_safe_segment, ModuleVersionId};
use rigging_util::errors::RiggingError;
use rigging_util::hash::sha256_bytes;

use crate::checksum::sidecar_path;
use crate::descriptor::{ModuleDescriptor, DESCRIPTOR_FILE};
use crate::repository::FileRepository;

impl FileRepository {
    /// Write a module version: its `module.toml`, each artifact file, and a
    /// `.sha256` sidecar per artifact. Artifacts are added to the descriptor
    /// if it does not already list them. Returns the artifact paths.
    pub fn install(
        &self,
        id: &ModuleVersionId,
        descriptor: &ModuleDescriptor,
        files: &[(ArtifactDescriptor, &[u8])],
    ) -> miette::Result<Vec<PathBuf>> {
        let unsafe_file = files
            .iter()
            .map(|(artifact, _)| artifact.file_name(&id.version))
            .find(|file| !is_safe_segment(file));
        if !self.layout().accepts(id) || unsafe_file.is_some() {
            return Err(RiggingError::Repository {
                message: format!("{id} can't be installed below {}", self.root().display()),
            }
            .into());
        }
        let dir = self.layout().version_dir(id);
        std::fs::create_dir_all(&dir).map_err(RiggingError::Io)?;

        let mut descriptor = descriptor.clone();
        let mut paths = Vec::with_capacity(files.len());
        for (artifact, bytes) in files {
            let path = self.layout().artifact_path(id, artifact);
            std::fs::write(&path, bytes).map_err(RiggingError::Io)?;
            std::fs::write(sidecar_path(&path), sha256_bytes(bytes)).map_err(RiggingError::Io)?;
            if !descriptor.artifacts.contains(artifact) {
                descriptor.artifacts.push(artifact.clone());
            }
            paths.push(path);
        }

        let toml = descriptor.to_toml().map_err(|e| RiggingError::Repository {
            message: format!("{id}: {e}"),
        })?;
        std::fs::write(dir.join(DESCRIPTOR_FILE), toml).map_err(RiggingError::Io)?;
        tracing::debug!("installed {id} into {}", self.root().display());
        Ok(paths)
    }
}
