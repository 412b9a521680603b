//! # Media Host
//!
//! Cleanup of image files that a catalog change left unreferenced.
//!
//! The catalog returns the `public_id` of every replaced or deleted image.
//! The app hands those ids to a [`MediaHost`] after the change is stored.
//! Failures are logged and never fail the request that caused them.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use storefront_core::StoreError;

/// A place images are stored, addressed by `public_id`.
pub trait MediaHost: Send + Sync + std::fmt::Debug {
    /// Destroy every stored file of one asset. Returns how many were removed.
    fn destroy(&self, public_id: &str) -> Result<usize, StoreError>;
}

/// Media host used when no media directory is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledMediaHost;

impl MediaHost for DisabledMediaHost {
    fn destroy(&self, public_id: &str) -> Result<usize, StoreError> {
        tracing::debug!(public_id, "Media host disabled, keeping asset");
        Ok(0)
    }
}

/// Media stored as plain files below a root directory.
///
/// An asset `category/banner/summer` is any file in `<root>/category/banner`
/// whose name without extension is `summer`.
#[derive(Debug, Clone)]
pub struct DirectoryMediaHost {
    root: PathBuf,
}

impl DirectoryMediaHost {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Split a public id into its folder and file stem, rejecting anything that
/// could leave the media root.
fn split_public_id(public_id: &str) -> Result<(PathBuf, &str), StoreError> {
    let invalid = || StoreError::InvalidInput(format!("Invalid media public id '{public_id}'"));

    if public_id.is_empty() || public_id.contains('\\') || public_id.contains('\0') {
        return Err(invalid());
    }
    let path = Path::new(public_id);
    if !path.components().all(|c| matches!(c, Component::Normal(_))) {
        return Err(invalid());
    }

    let (folder, stem) = match public_id.rsplit_once('/') {
        Some((folder, stem)) => (PathBuf::from(folder), stem),
        None => (PathBuf::new(), public_id),
    };
    if stem.is_empty() {
        return Err(invalid());
    }
    Ok((folder, stem))
}

impl MediaHost for DirectoryMediaHost {
    fn destroy(&self, public_id: &str) -> Result<usize, StoreError> {
        let (folder, stem) = split_public_id(public_id)?;
        let dir = self.root.join(folder);

        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(StoreError::IoError(format!(
                    "Cannot read media directory '{}': {}",
                    dir.display(),
                    e
                )));
            }
        };

        let mut removed = 0;
        for entry in entries {
            let path = entry
                .map_err(|e| StoreError::IoError(format!("Media directory entry: {e}")))?
                .path();
            let matches = path.is_file()
                && path.file_stem().and_then(|s| s.to_str()) == Some(stem);
            if matches {
                std::fs::remove_file(&path).map_err(|e| {
                    StoreError::IoError(format!("Cannot remove '{}': {}", path.display(), e))
                })?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Build the media host for an optional root directory.
#[must_use]
pub fn media_host_for(media_dir: Option<&Path>) -> Arc<dyn MediaHost> {
    match media_dir {
        Some(dir) => {
            tracing::info!("Media cleanup enabled under {:?}", dir);
            Arc::new(DirectoryMediaHost::new(dir))
        }
        None => {
            tracing::info!("Media cleanup disabled (no media directory)");
            Arc::new(DisabledMediaHost)
        }
    }
}

/// Destroy a batch of assets off the async runtime.
///
/// Returns how many files were removed. Errors are logged per asset.
pub async fn destroy_all(host: Arc<dyn MediaHost>, public_ids: Vec<String>) -> usize {
    if public_ids.is_empty() {
        return 0;
    }

    let outcome = tokio::task::spawn_blocking(move || {
        public_ids
            .iter()
            .map(|public_id| match host.destroy(public_id) {
                Ok(removed) => {
                    tracing::info!(public_id = %public_id, removed, "Media asset destroyed");
                    removed
                }
                Err(e) => {
                    tracing::warn!(
                        event = "media_destroy_failed",
                        public_id = %public_id,
                        "Failed to destroy media asset: {}",
                        e
                    );
                    0
                }
            })
            .sum::<usize>()
    })
    .await;

    outcome.unwrap_or_else(|e| {
        tracing::warn!("Media cleanup task failed: {}", e);
        0
    })
}

// =============================================================================
// TESTS
// =============================================================================
