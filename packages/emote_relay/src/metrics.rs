//! Relay metrics for observability

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Relay-wide counters, shared by every session context
#[derive(Debug, Default)]
pub struct RelayMetrics {
    // Session metrics
    /// Currently registered sessions
    pub active_sessions: AtomicU64,
    /// Sessions opened since start
    pub total_sessions: AtomicU64,

    // Emote metrics
    /// Emote packets received from clients
    pub emotes_received: AtomicU64,
    /// Emotes stopped by a veto hook
    pub emotes_vetoed: AtomicU64,
    /// Offhand swaps requested by the workaround
    pub auxiliary_triggered: AtomicU64,

    // Delivery metrics
    /// Deliveries handed to a target context
    pub deliveries_submitted: AtomicU64,
    /// Deliveries served on the caller's own context
    pub deliveries_inline: AtomicU64,
    /// Emote packets actually sent to a client
    pub deliveries_completed: AtomicU64,
    /// Targets skipped because their closed flag was set
    pub targets_skipped_closed: AtomicU64,
    /// Targets that closed before delivery
    pub targets_stale: AtomicU64,
    /// Deliveries dropped because the target could not resolve the emitter
    pub emitters_unresolved: AtomicU64,

    // Menu metrics
    pub menus_shown: AtomicU64,
    pub menu_selections: AtomicU64,
    /// Menu actions refused by the permission check
    pub permission_denied: AtomicU64,

    /// Start time (for uptime calculation)
    start_time: Option<Instant>,
}

impl RelayMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    // Session tracking
    pub fn session_opened(&self) {
        self.active_sessions.fetch_add(1, Ordering::Relaxed);
        self.total_sessions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_closed(&self) {
        self.active_sessions.fetch_sub(1, Ordering::Relaxed);
    }

    // Emote tracking
    pub fn emote_received(&self) {
        self.emotes_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn emote_vetoed(&self) {
        self.emotes_vetoed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn auxiliary_triggered(&self) {
        self.auxiliary_triggered.fetch_add(1, Ordering::Relaxed);
    }

    // Delivery tracking
    pub fn delivery_submitted(&self) {
        self.deliveries_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn delivery_inline(&self) {
        self.deliveries_inline.fetch_add(1, Ordering::Relaxed);
    }

    pub fn delivery_completed(&self) {
        self.deliveries_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn target_skipped_closed(&self) {
        self.targets_skipped_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn target_stale(&self) {
        self.targets_stale.fetch_add(1, Ordering::Relaxed);
    }

    pub fn emitter_unresolved(&self) {
        self.emitters_unresolved.fetch_add(1, Ordering::Relaxed);
    }

    // Menu tracking
    pub fn menu_shown(&self) {
        self.menus_shown.fetch_add(1, Ordering::Relaxed);
    }

    pub fn menu_selection(&self) {
        self.menu_selections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn permission_denied(&self) {
        self.permission_denied.fetch_add(1, Ordering::Relaxed);
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0)
    }

    /// Create a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.uptime_secs(),
            sessions: SessionMetrics {
                active: self.active_sessions.load(Ordering::Relaxed),
                total: self.total_sessions.load(Ordering::Relaxed),
            },
            emotes: EmoteMetrics {
                received: self.emotes_received.load(Ordering::Relaxed),
                vetoed: self.emotes_vetoed.load(Ordering::Relaxed),
                auxiliary_triggered: self.auxiliary_triggered.load(Ordering::Relaxed),
            },
            deliveries: DeliveryMetrics {
                submitted: self.deliveries_submitted.load(Ordering::Relaxed),
                inline: self.deliveries_inline.load(Ordering::Relaxed),
                completed: self.deliveries_completed.load(Ordering::Relaxed),
                skipped_closed: self.targets_skipped_closed.load(Ordering::Relaxed),
                stale: self.targets_stale.load(Ordering::Relaxed),
                emitters_unresolved: self.emitters_unresolved.load(Ordering::Relaxed),
            },
            menus: MenuMetrics {
                shown: self.menus_shown.load(Ordering::Relaxed),
                selections: self.menu_selections.load(Ordering::Relaxed),
                permission_denied: self.permission_denied.load(Ordering::Relaxed),
            },
        }
    }
}

/// Serializable snapshot of metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub sessions: SessionMetrics,
    pub emotes: EmoteMetrics,
    pub deliveries: DeliveryMetrics,
    pub menus: MenuMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub active: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmoteMetrics {
    pub received: u64,
    pub vetoed: u64,
    pub auxiliary_triggered: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryMetrics {
    pub submitted: u64,
    pub inline: u64,
    pub completed: u64,
    pub skipped_closed: u64,
    pub stale: u64,
    pub emitters_unresolved: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuMetrics {
    pub shown: u64,
    pub selections: u64,
    pub permission_denied: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_tracking() {
        let metrics = RelayMetrics::new();

        metrics.session_opened();
        metrics.session_opened();
        assert_eq!(metrics.active_sessions.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.total_sessions.load(Ordering::Relaxed), 2);

        metrics.session_closed();
        assert_eq!(metrics.active_sessions.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.total_sessions.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_snapshot() {
        let metrics = RelayMetrics::new();
        metrics.session_opened();
        metrics.emote_received();
        metrics.emote_vetoed();
        metrics.delivery_submitted();
        metrics.delivery_submitted();
        metrics.permission_denied();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.sessions.active, 1);
        assert_eq!(snapshot.emotes.received, 1);
        assert_eq!(snapshot.emotes.vetoed, 1);
        assert_eq!(snapshot.deliveries.submitted, 2);
        assert_eq!(snapshot.menus.permission_denied, 1);
    }
}
