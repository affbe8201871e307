use std::{
    collections::VecDeque,
    fmt,
    time::{Duration, Instant},
};

pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationKind {
    pub fn icon(self) -> &'static str {
        match self {
            NotificationKind::Success => "✔",
            NotificationKind::Error => "✖",
            NotificationKind::Warning => "⚠",
            NotificationKind::Info => "ℹ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(pub u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub message: String,
    pub expires_at: Instant,
}

/// Transient, non-blocking messages. Each one is dismissed automatically
/// once its lifetime has passed.
#[derive(Debug)]
pub struct NotificationCenter {
    ttl: Duration,
    next_id: u64,
    active: VecDeque<Notification>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_TTL)
    }
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            next_id: 1,
            active: VecDeque::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn push(
        &mut self,
        kind: NotificationKind,
        message: impl Into<String>,
        now: Instant,
    ) -> Notification {
        let notification = Notification {
            id: NotificationId(self.next_id),
            kind,
            message: message.into(),
            expires_at: now + self.ttl,
        };
        self.next_id += 1;
        self.active.push_back(notification.clone());
        notification
    }

    pub fn dismiss(&mut self, id: NotificationId) -> Option<Notification> {
        let index = self.active.iter().position(|n| n.id == id)?;
        self.active.remove(index)
    }

    /// Drops everything whose deadline has passed and returns the ids.
    pub fn expire(&mut self, now: Instant) -> Vec<NotificationId> {
        let mut expired = Vec::new();
        self.active.retain(|notification| {
            if notification.expires_at <= now {
                expired.push(notification.id);
                false
            } else {
                true
            }
        });
        expired
    }

    pub fn active(&self) -> impl Iterator<Item = &Notification> {
        self.active.iter()
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.active.back()
    }
}
