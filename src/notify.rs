use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Notification, NotificationKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadStatus {
    #[default]
    All,
    Read,
    Unread,
}

/// Feed query; absent kind means all kinds. AND semantics.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedQuery {
    pub kind: Option<NotificationKind>,
    pub status: ReadStatus,
}

/// Single owner of the notification collection. Mutations go through the
/// feed; reads never cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationFeed {
    notifications: Vec<Notification>,
}

impl NotificationFeed {
    pub fn new(notifications: Vec<Notification>) -> Self {
        Self { notifications }
    }

    pub fn push(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    pub fn all(&self) -> &[Notification] {
        &self.notifications
    }

    /// Stable filter over kind and read status.
    pub fn filter(&self, query: &FeedQuery) -> Vec<&Notification> {
        self.notifications
            .iter()
            .filter(|n| {
                let kind_ok = query.kind.map_or(true, |k| n.kind == k);
                let status_ok = match query.status {
                    ReadStatus::All => true,
                    ReadStatus::Read => n.is_read,
                    ReadStatus::Unread => !n.is_read,
                };
                kind_ok && status_ok
            })
            .collect()
    }

    /// Read state only ever moves false to true. An absent id is a harmless
    /// no-op; the UI may race a delete against this.
    pub fn mark_read(&mut self, id: Uuid) {
        if let Some(n) = self.notifications.iter_mut().find(|n| n.id == id) {
            n.is_read = true;
        }
    }

    /// Marks everything present right now; later arrivals start unread.
    pub fn mark_all_read(&mut self) {
        for n in &mut self.notifications {
            n.is_read = true;
        }
    }

    /// Permanent removal, no undo. Absent id is a no-op.
    pub fn delete(&mut self, id: Uuid) {
        self.notifications.retain(|n| n.id != id);
    }

    /// Always recomputed; never cached across mutations.
    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.is_read).count()
    }
}

/// Compact recency label. Exactly 1h reads "1h ago", exactly 24h reads
/// "1d ago"; a week or older falls back to the absolute date.
pub fn relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now - timestamp;
    if elapsed < Duration::hours(1) {
        return "Just now".to_string();
    }
    let hours = elapsed.num_hours();
    if hours < 24 {
        return format!("{hours}h ago");
    }
    let days = elapsed.num_days();
    if days < 7 {
        return format!("{days}d ago");
    }
    timestamp.date_naive().to_string()
}
