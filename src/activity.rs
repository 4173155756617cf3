//! Capped activity feed.
//!
//! Every user-visible operation (upload, download, delete) and system event
//! appends a typed entry here. The feed keeps the most recent entries,
//! persists on every append, and doubles as the unconditional last tier of
//! the notification chain: appending a line is the delivery that can always
//! succeed.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::store;

/// Only the most recent entries are retained.
const MAX_ENTRIES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Upload,
    Download,
    Delete,
    System,
    User,
}

impl ActivityKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActivityKind::Upload => "upload",
            ActivityKind::Download => "download",
            ActivityKind::Delete => "delete",
            ActivityKind::System => "system",
            ActivityKind::User => "user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub at: DateTime<Utc>,
    pub kind: ActivityKind,
    pub title: String,
    pub body: String,
    pub user: String,
}

pub struct ActivityLog {
    path: PathBuf,
    entries: Vec<ActivityEntry>,
}

impl ActivityLog {
    pub fn load(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            entries: store::load_or_default(path),
        }
    }

    /// Append an entry, trim to the cap, and flush.
    pub fn record(&mut self, kind: ActivityKind, title: &str, body: &str, user: &str) -> Result<()> {
        self.entries.push(ActivityEntry {
            at: Utc::now(),
            kind,
            title: title.to_string(),
            body: body.to_string(),
            user: user.to_string(),
        });
        if self.entries.len() > MAX_ENTRIES {
            let excess = self.entries.len() - MAX_ENTRIES;
            self.entries.drain(..excess);
        }
        store::save(&self.path, &self.entries)
    }

    pub fn entries(&self) -> &[ActivityEntry] {
        &self.entries
    }

    pub fn count_of(&self, kind: ActivityKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    /// Render the feed as plain text, oldest first.
    pub fn export_text(&self) -> String {
        let mut out = String::new();
        for e in &self.entries {
            out.push_str(&format!(
                "[{}] {} {}\n{}: {}\n\n",
                e.at.format("%Y-%m-%d %H:%M:%S"),
                e.kind.label().to_uppercase(),
                e.title,
                e.user,
                e.body
            ));
        }
        out
    }
}
