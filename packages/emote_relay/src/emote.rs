//! Inbound emote translation.
//!
//! Runs on the emitter's own context: applies the workaround policy, then
//! (when the emote is to be shown) asks the veto hooks and fans out.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::JavaEntityId;
use crate::hooks::HookOutcome;
use crate::menu;
use crate::relay::Relay;
use crate::session::{SessionContext, SessionId};
use crate::workaround::{self, WorkaroundAction};

/// One emote performed by one client. Consumed once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmoteSignal {
    pub emitter: SessionId,
    pub emitter_java_id: JavaEntityId,
    pub emitter_xuid: String,
    pub emote_id: String,
}

/// Handle an emote packet from `ctx`'s client.
pub async fn translate(relay: &Relay, ctx: &mut SessionContext, emote_id: String) {
    relay.metrics().emote_received();
    let signal = ctx.emote_signal(emote_id);
    let mode = relay.config().workaround;

    match workaround::decide(mode) {
        WorkaroundAction::ShowMenu => {
            menu::show_emote_menu(relay, ctx, signal);
        }
        WorkaroundAction::TriggerAuxiliaryAndStop => {
            request_offhand_swap(relay, ctx);
        }
        WorkaroundAction::TriggerAuxiliaryAndContinue => {
            request_offhand_swap(relay, ctx);
            process_emote(relay, ctx, signal).await;
        }
        WorkaroundAction::ContinueOnly => {
            process_emote(relay, ctx, signal).await;
        }
    }
}

/// Let the veto hooks look at the emote, then show it to every other session.
pub async fn process_emote(relay: &Relay, ctx: &mut SessionContext, signal: EmoteSignal) {
    if relay.hooks().evaluate(&signal) == HookOutcome::Veto {
        relay.metrics().emote_vetoed();
        return;
    }

    let report = relay.broadcaster().propagate(&signal, Some(ctx)).await;
    debug!(
        session = %signal.emitter,
        emote = %signal.emote_id,
        ?report,
        "Emote propagated"
    );
}

fn request_offhand_swap(relay: &Relay, ctx: &mut SessionContext) {
    debug!(session = %ctx.id(), "Emote triggered offhand swap");
    relay.metrics().auxiliary_triggered();
    relay.services().request_offhand_swap(ctx);
}
