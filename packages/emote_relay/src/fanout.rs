//! Emote fan-out across sessions.
//!
//! The emitter's context never touches another session's state. For every
//! other live session it either delivers inline (only when the caller is
//! already running on that session's context) or queues an
//! [`EmoteDelivery`] on that session's unbounded delivery lane and moves on.
//! Resolving the emitter's entity happens at delivery time, on the target's
//! context, against the target's own entity index.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::emote::EmoteSignal;
use crate::entity::JavaEntityId;
use crate::metrics::RelayMetrics;
use crate::protocol::{EmotePacket, UpstreamPacket};
use crate::registry::SessionRegistry;
use crate::session::SessionContext;

/// Addressing data for showing one emote on one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmoteDelivery {
    pub emitter_java_id: JavaEntityId,
    pub emitter_xuid: String,
    pub emote_id: String,
}

impl From<&EmoteSignal> for EmoteDelivery {
    fn from(signal: &EmoteSignal) -> Self {
        Self {
            emitter_java_id: signal.emitter_java_id,
            emitter_xuid: signal.emitter_xuid.clone(),
            emote_id: signal.emote_id.clone(),
        }
    }
}

/// What one fan-out did, per target outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanoutReport {
    pub delivered_inline: usize,
    pub submitted: usize,
    pub skipped_closed: usize,
    pub skipped_stale: usize,
}

#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<SessionRegistry>,
    metrics: Arc<RelayMetrics>,
}

impl Broadcaster {
    pub fn new(registry: Arc<SessionRegistry>, metrics: Arc<RelayMetrics>) -> Self {
        Self { registry, metrics }
    }

    /// Show `signal` to every open session except its emitter.
    ///
    /// `current` is the context the caller is running on, if it is a session
    /// context; a target matching it is served inline. Never waits on a
    /// target, and a busy target only delays its delivery.
    pub async fn propagate(
        &self,
        signal: &EmoteSignal,
        mut current: Option<&mut SessionContext>,
    ) -> FanoutReport {
        let delivery = EmoteDelivery::from(signal);
        let mut report = FanoutReport::default();

        for target in self.registry.snapshot().await {
            let target_id = target.id();
            if target_id == signal.emitter {
                continue;
            }

            if target.is_closed() {
                trace!(target = %target_id, "Skipping closed session");
                self.metrics.target_skipped_closed();
                report.skipped_closed += 1;
                continue;
            }

            if let Some(ctx) = current.as_deref_mut() {
                if ctx.id() == target_id {
                    play_emote(ctx, &delivery, &self.metrics);
                    self.metrics.delivery_inline();
                    report.delivered_inline += 1;
                    continue;
                }
            }

            match target.deliver(delivery.clone()) {
                Ok(()) => {
                    self.metrics.delivery_submitted();
                    report.submitted += 1;
                }
                Err(e) => {
                    debug!(target = %target_id, "Skipping emote delivery: {}", e);
                    self.metrics.target_stale();
                    report.skipped_stale += 1;
                }
            }
        }

        report
    }
}

/// Show an emote to `ctx`'s client. Must run on `ctx`'s own context.
///
/// Returns `false` when the emitter is unknown to this session or is not a
/// player, e.g. it left between fan-out and delivery.
pub fn play_emote(ctx: &SessionContext, delivery: &EmoteDelivery, metrics: &RelayMetrics) -> bool {
    ctx.assert_on_context();

    let runtime_entity_id = match ctx.entities().get_by_java_id(delivery.emitter_java_id) {
        Some(entity) if entity.is_player() => entity.runtime_id,
        _ => {
            trace!(
                session = %ctx.id(),
                java_id = delivery.emitter_java_id,
                "Emitter not resolvable as a player; dropping emote"
            );
            metrics.emitter_unresolved();
            return false;
        }
    };

    ctx.send_upstream(UpstreamPacket::Emote(EmotePacket {
        runtime_entity_id,
        xuid: delivery.emitter_xuid.clone(),
        platform_id: String::new(),
        emote_id: delivery.emote_id.clone(),
    }));
    metrics.delivery_completed();
    true
}
