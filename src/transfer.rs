//! Upload, download, and delete orchestration.
//!
//! These flows tie the pieces together: fingerprint before transmitting,
//! warn on duplicate content, keep the registry in step with what the remote
//! acknowledged, and append to the activity feed. Local state only changes
//! after the remote confirms — a failed remote call leaves the registry
//! untouched.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::activity::{ActivityKind, ActivityLog};
use crate::digest;
use crate::reconcile::{self, DuplicateWarning};
use crate::registry::UploadRegistry;
use crate::remote::{format_bytes, RemoteStore};

/// One upload, fully specified.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub path: PathBuf,
    /// Name to store under; defaults to the file name on disk.
    pub display_name: Option<String>,
    pub uploader: String,
    /// Proceed even when identical content is already tracked under another
    /// name.
    pub confirm_duplicate: bool,
}

#[derive(Debug, Clone)]
pub enum UploadOutcome {
    Uploaded {
        remote_id: String,
        display_name: String,
        digest: String,
    },
    /// Nothing was transmitted; the caller decides whether to re-run with
    /// `confirm_duplicate`.
    DuplicateDetected(DuplicateWarning),
}

/// Upload a file, fingerprinting it first so duplicate content is caught
/// before any bytes cross the wire.
pub async fn upload(
    store: &dyn RemoteStore,
    registry: &mut UploadRegistry,
    activity: &mut ActivityLog,
    request: &UploadRequest,
) -> Result<UploadOutcome> {
    let display_name = match &request.display_name {
        Some(name) => name.clone(),
        None => request
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .with_context(|| format!("No usable file name in {}", request.path.display()))?,
    };

    let content_digest = digest::compute_digest(&request.path)?;
    if !request.confirm_duplicate {
        if let Some(warning) = reconcile::find_duplicate(registry, &content_digest, &display_name)
        {
            return Ok(UploadOutcome::DuplicateDetected(warning));
        }
    }

    let bytes = std::fs::read(&request.path)
        .with_context(|| format!("Failed to read {}", request.path.display()))?;
    let size = bytes.len() as u64;
    let remote_id = store
        .upload(bytes, &display_name, &request.uploader)
        .await?;

    registry.upsert(
        &display_name,
        &content_digest,
        Some(remote_id.clone()),
        &request.uploader,
    )?;
    activity.record(
        ActivityKind::Upload,
        &format!("File Uploaded: {}", display_name),
        &format_bytes(size),
        &request.uploader,
    )?;

    Ok(UploadOutcome::Uploaded {
        remote_id,
        display_name,
        digest: content_digest,
    })
}

/// Download a stored file to `dest`. Returns the byte count written.
pub async fn download(
    store: &dyn RemoteStore,
    activity: &mut ActivityLog,
    remote_id: &str,
    name: &str,
    dest: &Path,
) -> Result<u64> {
    let bytes = store.download(remote_id).await?;
    let size = bytes.len() as u64;
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(dest, &bytes)
        .with_context(|| format!("Failed to write {}", dest.display()))?;

    activity.record(
        ActivityKind::Download,
        &format!("File Downloaded: {}", name),
        &format_bytes(size),
        "System",
    )?;
    Ok(size)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Remote acknowledged the delete; the local record is gone too.
    Deleted,
    /// No remote id was known; the local record was dropped on explicit
    /// opt-in.
    RemovedLocally,
    /// No remote id is known and the caller has not opted in to a
    /// local-only removal. Nothing changed.
    NeedsLocalOptIn,
}

/// Delete a tracked file. The remote goes first: the registry entry is only
/// removed once the remote acknowledged, so a failed delete never orphans
/// remote content.
pub async fn delete(
    store: &dyn RemoteStore,
    registry: &mut UploadRegistry,
    activity: &mut ActivityLog,
    name: &str,
    local_only_opt_in: bool,
) -> Result<DeleteOutcome> {
    let remote_id = registry.get(name).and_then(|r| r.remote_id.clone());

    match remote_id {
        Some(remote_id) => {
            store.delete(&remote_id).await?;
            registry.remove(name)?;
            activity.record(
                ActivityKind::Delete,
                &format!("File Deleted: {}", name),
                "removed from remote store",
                "System",
            )?;
            Ok(DeleteOutcome::Deleted)
        }
        None if local_only_opt_in => {
            registry.remove(name)?;
            activity.record(
                ActivityKind::Delete,
                &format!("File Deleted: {}", name),
                "removed from local registry only",
                "System",
            )?;
            Ok(DeleteOutcome::RemovedLocally)
        }
        None => Ok(DeleteOutcome::NeedsLocalOptIn),
    }
}
