//! Desktop notifications.
//!
//! The watcher only sees the [`Notifier`] trait so its handlers can be driven
//! with a recording fake in tests.

use notify_rust::{Notification, Timeout};

use crate::utils::APP_NAME;

/// How long a notification stays on screen.
const NOTIFICATION_TIMEOUT_MS: u32 = 5_000;

/// Best-effort notification sink. Implementations must never panic or block
/// for long; delivery failures are theirs to swallow.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Notifier backed by the OS notification service.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, message: &str) {
        tracing::info!(title, message, "Notification");

        let result = Notification::new()
            .appname(APP_NAME)
            .summary(title)
            .body(message)
            .timeout(Timeout::Milliseconds(NOTIFICATION_TIMEOUT_MS))
            .show();

        if let Err(e) = result {
            tracing::warn!("Could not show notification: {}", e);
        }
    }
}
