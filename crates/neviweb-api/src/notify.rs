// User-facing notification hook
//
// Some vendor errors (bad login, too many sessions, device offline) need a
// human to act. The client and the controller hand those to a `Notifier`;
// `NotifyMode` decides whether they also go to the log.

use std::str::FromStr;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Receiver for user-facing notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Default notifier: emits a `warn!` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, title: &str, message: &str) {
        warn!(target: "neviweb::notification", title, "{message}");
    }
}

/// Notifier that keeps every message in memory.
///
/// Handy for embedding applications that poll for pending notifications,
/// and for tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the recorded `(title, message)` pairs.
    pub fn take(&self) -> Vec<(String, String)> {
        self.messages
            .lock()
            .map(|mut m| std::mem::take(&mut *m))
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) {
        if let Ok(mut m) = self.messages.lock() {
            m.push((title.to_owned(), message.to_owned()));
        }
    }
}

/// Which channels a notification-worthy event is surfaced on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyMode {
    /// Drop it.
    Nothing,
    /// Log only.
    Logging,
    /// Notifier only.
    Notification,
    /// Log and notifier.
    #[default]
    Both,
}

impl NotifyMode {
    pub fn logs(self) -> bool {
        matches!(self, Self::Logging | Self::Both)
    }

    pub fn notifies(self) -> bool {
        matches!(self, Self::Notification | Self::Both)
    }

    /// Route one message according to this mode.
    pub fn emit(self, notifier: &dyn Notifier, title: &str, message: &str) {
        if self.logs() {
            warn!(title, "{message}");
        }
        if self.notifies() {
            notifier.notify(title, message);
        }
    }
}

impl FromStr for NotifyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nothing" => Ok(Self::Nothing),
            "logging" => Ok(Self::Logging),
            "notification" => Ok(Self::Notification),
            "both" => Ok(Self::Both),
            other => Err(format!(
                "expected 'nothing', 'logging', 'notification', or 'both', got '{other}'"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_routes_to_notifier() {
        let rec = RecordingNotifier::new();
        NotifyMode::Notification.emit(&rec, "Neviweb", "hello");
        NotifyMode::Logging.emit(&rec, "Neviweb", "log only");
        NotifyMode::Nothing.emit(&rec, "Neviweb", "dropped");
        assert_eq!(rec.take(), vec![("Neviweb".to_owned(), "hello".to_owned())]);
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("BOTH".parse::<NotifyMode>(), Ok(NotifyMode::Both));
        assert!("sometimes".parse::<NotifyMode>().is_err());
    }
}
