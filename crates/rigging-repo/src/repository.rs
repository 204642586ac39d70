//! A module repository rooted at a local directory.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rigging_core::artifact::ArtifactDescriptor;
use rigging_core::coordinate::{is_safe_segment, ModuleId, ModuleVersionId};
use rigging_resolver::metadata::{
    ArtifactMaterializer, FetchError, MetadataError, ModuleMetadata, ModuleMetadataProvider,
};

use crate::checksum;
use crate::descriptor::{ModuleDescriptor, DESCRIPTOR_FILE};
use crate::layout::RepositoryLayout;

/// Serves module metadata from `module.toml` descriptors and artifacts from
/// the files next to them.
#[derive(Debug, Clone)]
pub struct FileRepository {
    layout: RepositoryLayout,
    verify_checksums: bool,
}

impl FileRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            layout: RepositoryLayout::new(root),
            verify_checksums: true,
        }
    }

    /// Skip `.sha256` sidecar checks when materializing artifacts.
    pub fn without_checksums(mut self) -> Self {
        self.verify_checksums = false;
        self
    }

    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    pub fn layout(&self) -> &RepositoryLayout {
        &self.layout
    }
}

#[async_trait]
impl ModuleMetadataProvider for FileRepository {
    async fn lookup(&self, id: &ModuleVersionId) -> Result<Option<ModuleMetadata>, MetadataError> {
        if !self.layout.accepts(id) {
            return Err(MetadataError::new(format!(
                "`{id}` can't be mapped into {}",
                self.root().display()
            )));
        }
        let path = self.layout.descriptor_path(id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("{id}: no {DESCRIPTOR_FILE} at {}", path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(MetadataError::new(format!(
                    "failed to read {}: {e}",
                    path.display()
                )))
            }
        };
        let metadata = ModuleDescriptor::parse(&content)
            .and_then(|descriptor| descriptor.into_metadata(id.clone()))
            .map_err(|e| MetadataError::new(format!("{}: {e}", path.display())))?;
        tracing::trace!(
            "{id}: {} dependencies, {} artifacts",
            metadata.dependencies.len(),
            metadata.artifacts.len()
        );
        Ok(Some(metadata))
    }

    async fn list_versions(&self, module: &ModuleId) -> Result<Vec<String>, MetadataError> {
        if !self.layout.accepts_module(module) {
            return Err(MetadataError::new(format!(
                "`{module}` can't be mapped into {}",
                self.root().display()
            )));
        }
        let dir = self.layout.module_dir(module);
        let read_error =
            |e: io::Error| MetadataError::new(format!("failed to list {}: {e}", dir.display()));
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(read_error(e)),
        };
        let mut versions = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
            let has_descriptor = tokio::fs::try_exists(entry.path().join(DESCRIPTOR_FILE))
                .await
                .unwrap_or(false);
            if let (true, Some(version)) = (has_descriptor, entry.file_name().to_str()) {
                versions.push(version.to_string());
            }
        }
        versions.sort();
        Ok(versions)
    }
}

#[async_trait]
impl ArtifactMaterializer for FileRepository {
    async fn fetch(
        &self,
        id: &ModuleVersionId,
        artifact: &ArtifactDescriptor,
    ) -> Result<PathBuf, FetchError> {
        let file = artifact.file_name(&id.version);
        if !self.layout.accepts(id) || !is_safe_segment(&file) {
            return Err(FetchError::NotFound { file });
        }
        let path = self.layout.artifact_path(id, artifact);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(FetchError::NotFound { file }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(FetchError::NotFound { file })
            }
            Err(source) => return Err(FetchError::Io { file, source }),
        }
        if self.verify_checksums {
            checksum::verify_sidecar(&path, &file).await?;
        }
        Ok(path)
    }
}
