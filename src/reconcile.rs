//! Remote/local view reconciliation.
//!
//! The file view the user sees merges two sources: the authoritative remote
//! listing and the local upload registry. When the listing cannot be
//! obtained — the remote unreachable, or answering with a non-success
//! status — the view degrades to registry contents alone, clearly flagged
//! as offline, so the client stays useful without connectivity.
//!
//! Older store deployments embedded the uploader in the transmitted name as
//! `[user]_filename`; those names are split back apart on display.

use chrono::{DateTime, Utc};

use crate::error::RemoteError;
use crate::registry::UploadRegistry;
use crate::remote::RemoteEntry;

/// One row of the merged file view.
#[derive(Debug, Clone)]
pub struct ReconciledEntry {
    pub name: String,
    pub remote_id: Option<String>,
    pub size: Option<u64>,
    pub uploaded_by: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    /// Present on remote but never recorded locally.
    pub untracked: bool,
}

/// The merged view plus the connectivity state it was built under.
#[derive(Debug, Clone)]
pub struct ReconciledView {
    pub entries: Vec<ReconciledEntry>,
    /// True when the remote listing was unavailable and the view came from
    /// the registry alone.
    pub offline: bool,
}

/// Split a legacy `[user]_filename` transmitted name into its parts.
///
/// Returns the clean name and the embedded uploader, if any. Names without
/// the prefix come back unchanged.
pub fn strip_uploader_prefix(name: &str) -> (&str, Option<&str>) {
    if let Some(rest) = name.strip_prefix('[') {
        if let Some(close) = rest.find("]_") {
            let user = &rest[..close];
            let clean = &rest[close + 2..];
            if !user.is_empty() && !clean.is_empty() {
                return (clean, Some(user));
            }
        }
    }
    (name, None)
}

/// Build the merged file view from a listing attempt and the registry.
///
/// Any failed listing — unreachable remote or a non-success response —
/// degrades to the offline view; no error reaches the caller.
pub fn reconcile(
    listing: Result<Vec<RemoteEntry>, RemoteError>,
    registry: &UploadRegistry,
) -> ReconciledView {
    let listing = match listing {
        Ok(listing) => listing,
        Err(err) => {
            tracing::warn!(error = %err, "remote listing unavailable, using local registry");
            return offline_view(registry);
        }
    };

    let mut entries = Vec::with_capacity(listing.len());
    for remote in listing {
        let (clean_name, embedded_user) = strip_uploader_prefix(&remote.name);
        let record = registry.get(clean_name).or_else(|| registry.get(&remote.name));
        entries.push(ReconciledEntry {
            name: clean_name.to_string(),
            remote_id: Some(remote.remote_id),
            size: remote.size,
            uploaded_by: record
                .map(|r| r.uploaded_by.clone())
                .or_else(|| embedded_user.map(str::to_string)),
            created_at: remote.created_at,
            untracked: record.is_none(),
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    ReconciledView {
        entries,
        offline: false,
    }
}

fn offline_view(registry: &UploadRegistry) -> ReconciledView {
    let entries = registry
        .records()
        .map(|r| ReconciledEntry {
            name: r.display_name.clone(),
            remote_id: r.remote_id.clone(),
            size: None,
            uploaded_by: Some(r.uploaded_by.clone()),
            created_at: Some(r.first_seen_at),
            untracked: false,
        })
        .collect();
    ReconciledView {
        entries,
        offline: true,
    }
}

/// A prior upload of identical content found under a different name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateWarning {
    pub digest: String,
    pub existing_name: String,
    pub uploaded_by: String,
    pub last_seen_at: DateTime<Utc>,
}

/// Check whether `digest` was already uploaded under a name other than
/// `name`. Re-uploading the same file under the same name is a routine
/// refresh, not a duplicate.
pub fn find_duplicate(
    registry: &UploadRegistry,
    digest: &str,
    name: &str,
) -> Option<DuplicateWarning> {
    registry
        .find_by_digest(digest)
        .filter(|r| r.display_name != name)
        .map(|r| DuplicateWarning {
            digest: digest.to_string(),
            existing_name: r.display_name.clone(),
            uploaded_by: r.uploaded_by.clone(),
            last_seen_at: r.last_seen_at,
        })
}
