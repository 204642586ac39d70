//! SHA-256 sidecar verification for repository artifacts.
//!
//! `lib-1.0.jar` may be accompanied by `lib-1.0.jar.sha256`. When the
//! sidecar exists the artifact must match it; when it does not, the artifact
//! is accepted as-is.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use rigging_resolver::metadata::FetchError;
use rigging_util::hash::{sha256_file, sidecar_digest};

pub const SIDECAR_EXTENSION: &str = "sha256";

/// `<path>.sha256`
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".");
    name.push(SIDECAR_EXTENSION);
    path.with_file_name(name)
}

/// Check `path` against its sidecar, if any. `file` names the artifact in errors.
pub async fn verify_sidecar(path: &Path, file: &str) -> Result<(), FetchError> {
    let io_error = |source: io::Error| FetchError::Io {
        file: file.to_string(),
        source,
    };
    let sidecar = sidecar_path(path);
    let content = match tokio::fs::read_to_string(&sidecar).await {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("no checksum sidecar for {file}");
            return Ok(());
        }
        Err(e) => return Err(io_error(e)),
    };

    let owned = path.to_path_buf();
    let actual = tokio::task::spawn_blocking(move || sha256_file(&owned))
        .await
        .map_err(|e| io_error(io::Error::other(e)))?
        .map_err(io_error)?;

    match sidecar_digest(&content) {
        Some(expected) if actual.eq_ignore_ascii_case(expected) => {
            tracing::trace!("checksum ok for {file}");
            Ok(())
        }
        expected => Err(FetchError::Checksum {
            file: file.to_string(),
            expected: expected.unwrap_or(content.trim()).to_string(),
            actual,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigging_util::hash::sha256_bytes;

    #[test]
    fn sidecar_sits_next_to_the_artifact() {
        assert_eq!(
            sidecar_path(Path::new("/repo/org/a/1.0/a-1.0.jar")),
            PathBuf::from("/repo/org/a/1.0/a-1.0.jar.sha256")
        );
    }

    #[tokio::test]
    async fn missing_sidecar_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("a-1.0.jar");
        std::fs::write(&jar, b"jar").unwrap();
        verify_sidecar(&jar, "a-1.0.jar").await.unwrap();
    }

    #[tokio::test]
    async fn sha256sum_style_sidecar_matches() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("a-1.0.jar");
        std::fs::write(&jar, b"jar").unwrap();
        std::fs::write(
            sidecar_path(&jar),
            format!("{}  a-1.0.jar\n", sha256_bytes(b"jar").to_uppercase()),
        )
        .unwrap();
        verify_sidecar(&jar, "a-1.0.jar").await.unwrap();
    }

    #[tokio::test]
    async fn mismatch_reports_both_digests() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("a-1.0.jar");
        std::fs::write(&jar, b"tampered").unwrap();
        std::fs::write(sidecar_path(&jar), sha256_bytes(b"jar")).unwrap();

        let err = verify_sidecar(&jar, "a-1.0.jar").await.unwrap_err();
        match err {
            FetchError::Checksum { expected, actual, .. } => {
                assert_eq!(expected, sha256_bytes(b"jar"));
                assert_eq!(actual, sha256_bytes(b"tampered"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn garbage_sidecar_is_a_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("a-1.0.jar");
        std::fs::write(&jar, b"jar").unwrap();
        std::fs::write(sidecar_path(&jar), "not-a-digest\n").unwrap();

        let err = verify_sidecar(&jar, "a-1.0.jar").await.unwrap_err();
        assert!(matches!(err, FetchError::Checksum { ref expected, .. } if expected == "not-a-digest"));
    }
}
