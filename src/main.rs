//! # Stowage CLI (`stow`)
//!
//! The `stow` binary is the interactive surface over the Stowage client
//! core: uploads with duplicate detection, a merged remote/local file view
//! that degrades gracefully offline, background health watching, assistant
//! chat, and activity statistics.
//!
//! ## Usage
//!
//! ```bash
//! stow --config ./config/stow.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `stow files` | Show the merged remote/local file view |
//! | `stow upload <path>` | Fingerprint and upload a file |
//! | `stow download <id> <dest>` | Download a stored file |
//! | `stow delete <name>...` | Delete stored files |
//! | `stow watch` | Probe backend health until interrupted |
//! | `stow ask "<question>"` | Ask the assistant about your files |
//! | `stow notify <title> <body>` | Send a notification through the tier chain |
//! | `stow stats` | Upload and activity statistics |
//! | `stow export-log <path>` | Export the activity feed as plain text |

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use stowage::activity::{ActivityKind, ActivityLog};
use stowage::assistant::{self, AssistantClient, ChatContext};
use stowage::config::{self, Config};
use stowage::health::{HealthMonitor, HealthProbe};
use stowage::notify::{DesktopBackend, Dispatcher, NotificationRequest, Urgency};
use stowage::reconcile;
use stowage::registry::UploadRegistry;
use stowage::remote::{format_bytes, HttpRemoteStore, RemoteStore};
use stowage::settings::SettingsStore;
use stowage::transfer::{self, DeleteOutcome, UploadOutcome, UploadRequest};

/// Stowage CLI — a client for a remote content store with duplicate
/// detection, offline degrade, and background health probing.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/stow.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "stow",
    about = "Stowage — remote content store client with duplicate detection and offline degrade",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/stow.toml`. Remote endpoints, storage paths,
    /// health cadences, and notification settings are read from this file.
    #[arg(long, global = true, default_value = "./config/stow.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Show the merged remote/local file view.
    ///
    /// Fetches the remote listing and merges it with the local upload
    /// registry. When the remote is unreachable the view falls back to
    /// local records and is marked offline.
    Files,

    /// Fingerprint and upload a file.
    ///
    /// The file is SHA-256 fingerprinted before any bytes are transmitted.
    /// If identical content is already tracked under a different name the
    /// upload stops with a warning; pass `--yes` to upload anyway.
    Upload {
        /// File to upload.
        path: PathBuf,

        /// Store under this name instead of the on-disk file name.
        #[arg(long)]
        name: Option<String>,

        /// Uploader attribution. Remembered for subsequent uploads.
        #[arg(long)]
        user: Option<String>,

        /// Proceed even when identical content is already tracked.
        #[arg(long)]
        yes: bool,
    },

    /// Download a stored file by its remote id.
    Download {
        /// Remote id, as shown by `stow files`.
        remote_id: String,

        /// Destination path to write.
        dest: PathBuf,
    },

    /// Delete stored files by display name.
    ///
    /// The remote copy is removed first; the local record only goes once
    /// the remote acknowledged. Records without a known remote id need
    /// `--local-only` to be dropped.
    Delete {
        /// Display names, as shown by `stow files`.
        names: Vec<String>,

        /// Allow dropping records that have no known remote id.
        #[arg(long)]
        local_only: bool,
    },

    /// Probe backend health on a cadence until interrupted.
    ///
    /// Spawns one probe worker per configured endpoint and prints every
    /// status change. Also keeps sleep-on-idle backends warm.
    Watch,

    /// Ask the assistant about your files.
    ///
    /// Sends the question together with a snapshot of tracked files and
    /// recent activity. Run without a question to see suggested starters.
    Ask {
        /// The question. Omit to list suggested questions.
        message: Option<String>,
    },

    /// Send a notification through the delivery tiers.
    Notify {
        title: String,
        body: String,
    },

    /// Show upload and activity statistics.
    Stats,

    /// Export the activity feed as plain text.
    ExportLog {
        /// Destination file.
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("stowage=info,stow=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Files => run_files(&cfg).await,
        Commands::Upload {
            path,
            name,
            user,
            yes,
        } => run_upload(&cfg, path, name, user, yes).await,
        Commands::Download { remote_id, dest } => run_download(&cfg, &remote_id, dest).await,
        Commands::Delete { names, local_only } => run_delete(&cfg, names, local_only).await,
        Commands::Watch => run_watch(&cfg).await,
        Commands::Ask { message } => run_ask(&cfg, message).await,
        Commands::Notify { title, body } => run_notify(&cfg, &title, &body),
        Commands::Stats => run_stats(&cfg),
        Commands::ExportLog { path } => run_export_log(&cfg, path),
    }
}

fn dispatcher(cfg: &Config) -> Dispatcher {
    let settings = SettingsStore::load(&cfg.settings_path());
    Dispatcher::new(
        &cfg.notify,
        settings.settings.notifications_enabled,
        Box::new(DesktopBackend),
        cfg.notification_log_path(),
    )
}

async fn run_files(cfg: &Config) -> Result<()> {
    let store = HttpRemoteStore::new(&cfg.remote)?;
    let registry = UploadRegistry::load(&cfg.history_path());

    let view = reconcile::reconcile(store.list().await, &registry);
    if view.offline {
        println!("Remote store unreachable — showing local records only.\n");
    }
    if view.entries.is_empty() {
        println!("No files tracked.");
        return Ok(());
    }

    println!(
        "{:<32} {:<14} {:>10}  {:<12} {}",
        "NAME", "REMOTE ID", "SIZE", "UPLOADED BY", "NOTE"
    );
    for entry in &view.entries {
        println!(
            "{:<32} {:<14} {:>10}  {:<12} {}",
            entry.name,
            entry.remote_id.as_deref().unwrap_or("-"),
            entry.size.map(format_bytes).unwrap_or_else(|| "-".into()),
            entry.uploaded_by.as_deref().unwrap_or("Unknown"),
            if entry.untracked { "untracked" } else { "" }
        );
    }
    println!(
        "\n{} file(s){}",
        view.entries.len(),
        if view.offline { " (offline view)" } else { "" }
    );
    Ok(())
}

async fn run_upload(
    cfg: &Config,
    path: PathBuf,
    name: Option<String>,
    user: Option<String>,
    yes: bool,
) -> Result<()> {
    let store = HttpRemoteStore::new(&cfg.remote)?;
    let mut registry = UploadRegistry::load(&cfg.history_path());
    let mut activity = ActivityLog::load(&cfg.activity_path());
    let mut settings = SettingsStore::load(&cfg.settings_path());

    let uploader = match user {
        Some(user) => {
            settings.set_user_name(&user)?;
            user
        }
        None => settings
            .settings
            .user_name
            .clone()
            .context("No uploader known yet; pass --user on the first upload")?,
    };

    let request = UploadRequest {
        path,
        display_name: name,
        uploader,
        confirm_duplicate: yes,
    };
    match transfer::upload(&store, &mut registry, &mut activity, &request).await? {
        UploadOutcome::Uploaded {
            remote_id,
            display_name,
            ..
        } => {
            println!("Uploaded {} (remote id {})", display_name, remote_id);
            dispatcher(cfg).show(&NotificationRequest::new(
                "File Uploaded",
                &display_name,
                Urgency::Normal,
            ));
        }
        UploadOutcome::DuplicateDetected(warning) => {
            println!(
                "Identical content already uploaded as '{}' by {} (last seen {}).",
                warning.existing_name,
                warning.uploaded_by,
                warning.last_seen_at.format("%Y-%m-%d %H:%M")
            );
            println!("Re-run with --yes to upload anyway.");
        }
    }
    Ok(())
}

async fn run_download(cfg: &Config, remote_id: &str, dest: PathBuf) -> Result<()> {
    let store = HttpRemoteStore::new(&cfg.remote)?;
    let mut activity = ActivityLog::load(&cfg.activity_path());

    let name = dest
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(remote_id)
        .to_string();
    let size = transfer::download(&store, &mut activity, remote_id, &name, &dest).await?;
    println!("Downloaded {} ({}) to {}", name, format_bytes(size), dest.display());
    Ok(())
}

async fn run_delete(cfg: &Config, names: Vec<String>, local_only: bool) -> Result<()> {
    if names.is_empty() {
        bail!("No file names given");
    }
    let store = HttpRemoteStore::new(&cfg.remote)?;
    let mut registry = UploadRegistry::load(&cfg.history_path());
    let mut activity = ActivityLog::load(&cfg.activity_path());

    let mut deleted = 0usize;
    for name in &names {
        if registry.get(name).is_none() {
            println!("{}: not tracked, skipping", name);
            continue;
        }
        match transfer::delete(&store, &mut registry, &mut activity, name, local_only).await? {
            DeleteOutcome::Deleted => {
                println!("{}: deleted", name);
                deleted += 1;
            }
            DeleteOutcome::RemovedLocally => {
                println!("{}: removed from local registry (no remote id)", name);
                deleted += 1;
            }
            DeleteOutcome::NeedsLocalOptIn => {
                println!(
                    "{}: no remote id known; re-run with --local-only to drop the local record",
                    name
                );
            }
        }
    }

    if deleted > 0 {
        dispatcher(cfg).show(&NotificationRequest::new(
            "Files Deleted",
            &format!("{} file(s) removed", deleted),
            Urgency::Normal,
        ));
    }
    Ok(())
}

async fn run_watch(cfg: &Config) -> Result<()> {
    let store = HttpRemoteStore::new(&cfg.remote)?;
    let mut probes: Vec<(Arc<dyn HealthProbe>, Duration)> = vec![(
        Arc::new(store),
        Duration::from_secs(cfg.health.store_interval_secs),
    )];
    if let Some(assistant_cfg) = &cfg.assistant {
        probes.push((
            Arc::new(AssistantClient::new(assistant_cfg)?),
            Duration::from_secs(cfg.health.assistant_interval_secs),
        ));
    }

    println!("Watching backend health; press Ctrl-C to stop.");
    let (monitor, mut events) = HealthMonitor::spawn(
        probes,
        Duration::from_secs(cfg.health.probe_timeout_secs),
    );

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                match event.detail {
                    Some(detail) => println!(
                        "[{}] {:<10} {:<9} {}",
                        event.checked_at.format("%H:%M:%S"),
                        event.endpoint,
                        event.status.label(),
                        detail
                    ),
                    None => println!(
                        "[{}] {:<10} {}",
                        event.checked_at.format("%H:%M:%S"),
                        event.endpoint,
                        event.status.label()
                    ),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    monitor.shutdown(Duration::from_secs(2)).await;
    println!("Stopped.");
    Ok(())
}

async fn run_ask(cfg: &Config, message: Option<String>) -> Result<()> {
    let Some(assistant_cfg) = &cfg.assistant else {
        bail!("No [assistant] section configured");
    };

    let Some(message) = message else {
        println!("Try asking:");
        for question in assistant::suggested_questions() {
            println!("  - {}", question);
        }
        return Ok(());
    };

    let registry = UploadRegistry::load(&cfg.history_path());
    let mut activity = ActivityLog::load(&cfg.activity_path());
    let recent = activity
        .entries()
        .iter()
        .rev()
        .take(10)
        .rev()
        .map(|e| e.title.clone())
        .collect();
    let context = ChatContext::new(registry.len(), recent);

    let client = AssistantClient::new(assistant_cfg)?;
    let reply = client.send(&message, &context).await?;
    println!("{}", reply);

    activity.record(ActivityKind::User, "Assistant Chat", &message, "User")?;
    Ok(())
}

fn run_notify(cfg: &Config, title: &str, body: &str) -> Result<()> {
    let via = dispatcher(cfg).show(&NotificationRequest::new(title, body, Urgency::Normal));
    println!("Delivered via {} tier.", via.label());
    Ok(())
}

fn run_stats(cfg: &Config) -> Result<()> {
    let registry = UploadRegistry::load(&cfg.history_path());
    let activity = ActivityLog::load(&cfg.activity_path());

    let total_uploads: u64 = registry.records().map(|r| r.upload_count).sum();
    println!("Tracked files:     {}", registry.len());
    println!("Total uploads:     {}", total_uploads);
    println!("Recent activity:   {} entries", activity.entries().len());
    println!("  uploads:         {}", activity.count_of(ActivityKind::Upload));
    println!("  downloads:       {}", activity.count_of(ActivityKind::Download));
    println!("  deletes:         {}", activity.count_of(ActivityKind::Delete));
    Ok(())
}

fn run_export_log(cfg: &Config, path: PathBuf) -> Result<()> {
    let activity = ActivityLog::load(&cfg.activity_path());
    std::fs::write(&path, activity.export_text())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!(
        "Exported {} entries to {}",
        activity.entries().len(),
        path.display()
    );
    Ok(())
}
