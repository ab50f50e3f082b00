use strum::{AsRefStr, Display, EnumString};
use time::{Duration, OffsetDateTime};

pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::seconds(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub shown_at: OffsetDateTime,
}

/// Holds at most one visible notification.
#[derive(Debug, Clone)]
pub struct Notifier {
    current: Option<Notification>,
    duration: Duration,
}

impl Notifier {
    pub fn new(duration: Duration) -> Self {
        Self {
            current: None,
            duration,
        }
    }

    pub fn show(&mut self, kind: NotificationKind, message: impl Into<String>, now: OffsetDateTime) {
        let message = message.into();
        match kind {
            NotificationKind::Error => tracing::warn!(%message, "notification"),
            _ => tracing::debug!(%kind, %message, "notification"),
        }
        self.current = Some(Notification {
            kind,
            message,
            shown_at: now,
        });
    }

    /// The current notification, if it has not yet auto-dismissed.
    pub fn visible(&self, now: OffsetDateTime) -> Option<&Notification> {
        self.current
            .as_ref()
            .filter(|note| now - note.shown_at < self.duration)
    }

    /// Last notification shown, regardless of expiry.
    pub fn latest(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    pub fn dismiss_expired(&mut self, now: OffsetDateTime) {
        if self.visible(now).is_none() {
            self.current = None;
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_DURATION)
    }
}
