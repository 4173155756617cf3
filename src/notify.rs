//! Tiered notification dispatcher.
//!
//! Delivery walks a fallback chain until something works: the native desktop
//! backend first, then an in-app popup hook if the embedding layer installed
//! one, and finally an append to the notification log. The log tier cannot
//! be disabled and its own write failure falls back to structured logging,
//! so [`Dispatcher::show`] never fails and never returns an error.
//!
//! Native availability is probed once when the dispatcher is built; a
//! desktop session does not appear mid-run. The popup hook is re-checked on
//! every call because windows come and go.

use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::NotifyConfig;

/// Which tier actually delivered the notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveredVia {
    Native,
    Popup,
    Log,
}

impl DeliveredVia {
    pub fn label(&self) -> &'static str {
        match self {
            DeliveredVia::Native => "native",
            DeliveredVia::Popup => "popup",
            DeliveredVia::Log => "log",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Low,
    Normal,
    Critical,
}

impl Urgency {
    fn label(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Normal => "normal",
            Urgency::Critical => "critical",
        }
    }
}

/// One notification to deliver.
#[derive(Debug, Clone)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub urgency: Urgency,
    pub requested_at: DateTime<Utc>,
}

impl NotificationRequest {
    pub fn new(title: &str, body: &str, urgency: Urgency) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            urgency,
            requested_at: Utc::now(),
        }
    }
}

/// OS-level notification backend.
pub trait NativeBackend: Send + Sync {
    /// Whether the backend can deliver at all. Checked once at dispatcher
    /// construction.
    fn available(&self) -> bool;

    fn deliver(&self, request: &NotificationRequest, timeout_secs: u64) -> anyhow::Result<()>;
}

/// In-app popup installed by an interactive embedding layer.
pub trait PopupHook: Send + Sync {
    /// Whether a window is currently up to host the popup.
    fn available(&self) -> bool;

    fn show(&self, request: &NotificationRequest) -> anyhow::Result<()>;
}

/// Desktop notifications via the platform notification service.
pub struct DesktopBackend;

impl NativeBackend for DesktopBackend {
    #[cfg(all(unix, not(target_os = "macos")))]
    fn available(&self) -> bool {
        notify_rust::get_capabilities().is_ok()
    }

    #[cfg(not(all(unix, not(target_os = "macos"))))]
    fn available(&self) -> bool {
        true
    }

    fn deliver(&self, request: &NotificationRequest, timeout_secs: u64) -> anyhow::Result<()> {
        let mut notification = notify_rust::Notification::new();
        notification
            .summary(&request.title)
            .body(&request.body)
            .appname("stowage")
            .timeout(notify_rust::Timeout::Milliseconds(
                (timeout_secs * 1000) as u32,
            ));
        #[cfg(all(unix, not(target_os = "macos")))]
        notification.urgency(match request.urgency {
            Urgency::Low => notify_rust::Urgency::Low,
            Urgency::Normal => notify_rust::Urgency::Normal,
            Urgency::Critical => notify_rust::Urgency::Critical,
        });
        notification.show()?;
        Ok(())
    }
}

/// Walks the delivery tiers. Construct once and reuse.
pub struct Dispatcher {
    enabled: bool,
    timeout_secs: u64,
    native: Box<dyn NativeBackend>,
    native_available: bool,
    popup: Option<Box<dyn PopupHook>>,
    log_path: PathBuf,
}

impl Dispatcher {
    /// `user_enabled` is the per-user preference from the settings store; it
    /// overrides an enabled `[notify]` config but cannot re-enable a
    /// disabled one.
    pub fn new(
        config: &NotifyConfig,
        user_enabled: bool,
        native: Box<dyn NativeBackend>,
        log_path: PathBuf,
    ) -> Self {
        let enabled = config.enabled && user_enabled;
        let native_available = enabled && native.available();
        debug!(enabled, native_available, "notification dispatcher ready");
        Self {
            enabled,
            timeout_secs: config.timeout_secs,
            native,
            native_available,
            popup: None,
            log_path,
        }
    }

    /// Install the in-app popup tier.
    pub fn set_popup_hook(&mut self, hook: Box<dyn PopupHook>) {
        self.popup = Some(hook);
    }

    /// Deliver through the first tier that works. With notifications
    /// disabled, delivery goes straight to the log tier.
    pub fn show(&self, request: &NotificationRequest) -> DeliveredVia {
        if self.enabled {
            if self.native_available {
                match self.native.deliver(request, self.timeout_secs) {
                    Ok(()) => return DeliveredVia::Native,
                    Err(e) => debug!(error = %e, "native notification failed, falling back"),
                }
            }
            if let Some(popup) = &self.popup {
                if popup.available() {
                    match popup.show(request) {
                        Ok(()) => return DeliveredVia::Popup,
                        Err(e) => debug!(error = %e, "popup notification failed, falling back"),
                    }
                }
            }
        }
        self.append_log(request);
        DeliveredVia::Log
    }

    fn append_log(&self, request: &NotificationRequest) {
        let line = format!(
            "[{}] [{}] {}: {}\n",
            request.requested_at.format("%Y-%m-%d %H:%M:%S"),
            request.urgency.label(),
            request.title,
            request.body
        );
        let written = self
            .log_path
            .parent()
            .map(std::fs::create_dir_all)
            .transpose()
            .and_then(|_| {
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.log_path)
            })
            .and_then(|mut f| f.write_all(line.as_bytes()));
        // The log tier must always succeed; a failed write still lands in
        // the structured log.
        if let Err(e) = written {
            info!(title = %request.title, body = %request.body, error = %e, "notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeNative {
        available: bool,
        fail: bool,
        delivered: Arc<AtomicUsize>,
    }

    impl NativeBackend for FakeNative {
        fn available(&self) -> bool {
            self.available
        }

        fn deliver(&self, _request: &NotificationRequest, _timeout_secs: u64) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("backend exploded");
            }
            self.delivered.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FakePopup {
        available: bool,
        fail: bool,
    }

    impl PopupHook for FakePopup {
        fn available(&self) -> bool {
            self.available
        }

        fn show(&self, _request: &NotificationRequest) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("no window");
            }
            Ok(())
        }
    }

    fn request() -> NotificationRequest {
        NotificationRequest::new("File Uploaded", "report.pdf", Urgency::Normal)
    }

    fn config(enabled: bool) -> NotifyConfig {
        NotifyConfig {
            enabled,
            timeout_secs: 3,
        }
    }

    fn dispatcher(native: FakeNative, dir: &tempfile::TempDir) -> Dispatcher {
        Dispatcher::new(
            &config(true),
            true,
            Box::new(native),
            dir.path().join("notifications.log"),
        )
    }

    #[test]
    fn native_tier_wins_when_available() {
        let dir = tempfile::tempdir().unwrap();
        let delivered = Arc::new(AtomicUsize::new(0));
        let d = dispatcher(
            FakeNative {
                available: true,
                fail: false,
                delivered: delivered.clone(),
            },
            &dir,
        );
        assert_eq!(d.show(&request()), DeliveredVia::Native);
        assert_eq!(delivered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn native_failure_falls_back_to_popup() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = dispatcher(
            FakeNative {
                available: true,
                fail: true,
                delivered: Arc::new(AtomicUsize::new(0)),
            },
            &dir,
        );
        d.set_popup_hook(Box::new(FakePopup {
            available: true,
            fail: false,
        }));
        assert_eq!(d.show(&request()), DeliveredVia::Popup);
    }

    #[test]
    fn all_tiers_failing_lands_in_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = dispatcher(
            FakeNative {
                available: true,
                fail: true,
                delivered: Arc::new(AtomicUsize::new(0)),
            },
            &dir,
        );
        d.set_popup_hook(Box::new(FakePopup {
            available: true,
            fail: true,
        }));

        assert_eq!(d.show(&request()), DeliveredVia::Log);
        let log = std::fs::read_to_string(dir.path().join("notifications.log")).unwrap();
        assert!(log.contains("File Uploaded"));
        assert!(log.contains("report.pdf"));
    }

    #[test]
    fn unavailable_popup_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = dispatcher(
            FakeNative {
                available: false,
                fail: false,
                delivered: Arc::new(AtomicUsize::new(0)),
            },
            &dir,
        );
        d.set_popup_hook(Box::new(FakePopup {
            available: false,
            fail: false,
        }));
        assert_eq!(d.show(&request()), DeliveredVia::Log);
    }

    #[test]
    fn disabled_goes_straight_to_log() {
        let dir = tempfile::tempdir().unwrap();
        let delivered = Arc::new(AtomicUsize::new(0));
        let d = Dispatcher::new(
            &config(false),
            true,
            Box::new(FakeNative {
                available: true,
                fail: false,
                delivered: delivered.clone(),
            }),
            dir.path().join("notifications.log"),
        );
        assert_eq!(d.show(&request()), DeliveredVia::Log);
        assert_eq!(delivered.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn user_opt_out_overrides_enabled_config() {
        let dir = tempfile::tempdir().unwrap();
        let delivered = Arc::new(AtomicUsize::new(0));
        let d = Dispatcher::new(
            &config(true),
            false,
            Box::new(FakeNative {
                available: true,
                fail: false,
                delivered: delivered.clone(),
            }),
            dir.path().join("notifications.log"),
        );
        assert_eq!(d.show(&request()), DeliveredVia::Log);
        assert_eq!(delivered.load(Ordering::SeqCst), 0);
        let log = std::fs::read_to_string(dir.path().join("notifications.log")).unwrap();
        assert!(log.contains("File Uploaded"));
    }
}
