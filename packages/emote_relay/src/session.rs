use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::emote::{self, EmoteSignal};
use crate::entity::{Entity, EntityIndex, JavaEntityId, RuntimeEntityId};
use crate::error::RelayError;
use crate::fanout::{self, EmoteDelivery};
use crate::form::{Form, FormId, FormResponse, PendingForm};
use crate::menu;
use crate::protocol::{ClientPacket, UpstreamPacket};
use crate::relay::Relay;

/// Unique identifier for a client session
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

tokio::task_local! {
    static CURRENT_SESSION: SessionId;
}

/// The session whose execution context the caller is running on, if any.
pub fn current_session() -> Option<SessionId> {
    CURRENT_SESSION.try_with(|id| *id).ok()
}

/// Run `fut` as part of `id`'s execution context.
pub(crate) async fn on_context<F: Future>(id: SessionId, fut: F) -> F::Output {
    CURRENT_SESSION.scope(id, fut).await
}

/// What a freshly accepted connection knows about its player.
#[derive(Clone, Debug)]
pub struct SessionInit {
    pub xuid: String,
    /// The player's own entity id on the downstream server.
    pub java_entity_id: JavaEntityId,
    /// The player's own entity id on its client.
    pub runtime_entity_id: RuntimeEntityId,
    pub locale: String,
}

impl SessionInit {
    pub fn new(
        xuid: impl Into<String>,
        java_entity_id: JavaEntityId,
        runtime_entity_id: RuntimeEntityId,
    ) -> Self {
        Self {
            xuid: xuid.into(),
            java_entity_id,
            runtime_entity_id,
            locale: "en_us".to_string(),
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }
}

/// Serializable view of a session's state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: SessionId,
    pub xuid: String,
    pub locale: String,
    pub advanced_tooltips: bool,
    pub known_entities: usize,
    pub pending_forms: usize,
}

/// State owned by a session's execution context.
///
/// Only the session actor holds one, so every mutation happens on that
/// session's own task.
pub struct SessionContext {
    id: SessionId,
    closed: Arc<AtomicBool>,
    xuid: String,
    java_entity_id: JavaEntityId,
    runtime_entity_id: RuntimeEntityId,
    locale: String,
    advanced_tooltips: bool,
    entities: EntityIndex,
    pending_forms: HashMap<FormId, PendingForm>,
    next_form_id: FormId,
    upstream: mpsc::UnboundedSender<UpstreamPacket>,
}

impl SessionContext {
    pub(crate) fn new(
        id: SessionId,
        init: SessionInit,
        closed: Arc<AtomicBool>,
        upstream: mpsc::UnboundedSender<UpstreamPacket>,
    ) -> Self {
        Self {
            id,
            closed,
            xuid: init.xuid,
            java_entity_id: init.java_entity_id,
            runtime_entity_id: init.runtime_entity_id,
            locale: init.locale,
            advanced_tooltips: false,
            entities: EntityIndex::new(),
            pending_forms: HashMap::new(),
            next_form_id: 1,
            upstream,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn xuid(&self) -> &str {
        &self.xuid
    }

    pub fn java_entity_id(&self) -> JavaEntityId {
        self.java_entity_id
    }

    pub fn runtime_entity_id(&self) -> RuntimeEntityId {
        self.runtime_entity_id
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn advanced_tooltips(&self) -> bool {
        self.advanced_tooltips
    }

    pub fn set_advanced_tooltips(&mut self, enabled: bool) {
        self.advanced_tooltips = enabled;
    }

    pub fn entities(&self) -> &EntityIndex {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut EntityIndex {
        &mut self.entities
    }

    pub fn pending_form_count(&self) -> usize {
        self.pending_forms.len()
    }

    /// Build the signal for an emote this session's player just performed.
    pub fn emote_signal(&self, emote_id: impl Into<String>) -> EmoteSignal {
        EmoteSignal {
            emitter: self.id,
            emitter_java_id: self.java_entity_id,
            emitter_xuid: self.xuid.clone(),
            emote_id: emote_id.into(),
        }
    }

    /// Queue a packet for this session's client.
    pub fn send_upstream(&self, packet: UpstreamPacket) {
        if self.upstream.send(packet).is_err() {
            trace!(session = %self.id, "Client writer gone; dropping packet");
        }
    }

    /// Show `form` to the client and park what its answer should act on.
    ///
    /// A client shows one modal form at a time, so a new form supersedes any
    /// form still waiting for an answer; a late answer to the old id is ignored.
    pub(crate) fn send_form(&mut self, form: Form, pending: PendingForm) -> Option<FormId> {
        let form_data = match form.to_json() {
            Ok(data) => data,
            Err(e) => {
                warn!(session = %self.id, "Failed to serialize form '{}': {}", form.title(), e);
                return None;
            }
        };

        if !self.pending_forms.is_empty() {
            trace!(
                session = %self.id,
                superseded = self.pending_forms.len(),
                "Unanswered form replaced"
            );
            self.pending_forms.clear();
        }

        let form_id = self.next_form_id;
        self.next_form_id = self.next_form_id.wrapping_add(1);
        self.pending_forms.insert(form_id, pending);
        self.send_upstream(UpstreamPacket::ModalForm { form_id, form_data });
        Some(form_id)
    }

    pub(crate) fn take_pending_form(&mut self, form_id: FormId) -> Option<PendingForm> {
        self.pending_forms.remove(&form_id)
    }

    /// Debug check that the caller is on this session's own context.
    pub fn assert_on_context(&self) {
        debug_assert_eq!(
            current_session(),
            Some(self.id),
            "session state touched from outside its execution context"
        );
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id,
            xuid: self.xuid.clone(),
            locale: self.locale.clone(),
            advanced_tooltips: self.advanced_tooltips,
            known_entities: self.entities.len(),
            pending_forms: self.pending_forms.len(),
        }
    }
}

/// Commands executed on a session's context
#[derive(Debug)]
pub enum SessionCommand {
    /// A packet from this session's client.
    Inbound(ClientPacket),
    SpawnEntity(Entity),
    RemoveEntity(JavaEntityId),
    GetInfo {
        respond_to: oneshot::Sender<SessionInfo>,
    },
    Close,
}

/// Handle to a session's execution context
///
/// Client commands travel on a bounded channel. Emote deliveries from other
/// sessions travel on their own unbounded lane so a busy target delays them
/// instead of losing them, and the emitter never waits.
#[derive(Clone)]
pub struct SessionHandle {
    id: SessionId,
    closed: Arc<AtomicBool>,
    sender: mpsc::Sender<SessionCommand>,
    deliveries: mpsc::UnboundedSender<EmoteDelivery>,
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Enqueue a command without waiting.
    pub fn submit(&self, cmd: SessionCommand) -> Result<(), RelayError> {
        if self.is_closed() {
            return Err(RelayError::SessionClosed(self.id));
        }
        self.sender.try_send(cmd).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => RelayError::ChannelFull(self.id),
            mpsc::error::TrySendError::Closed(_) => RelayError::ChannelClosed(self.id),
        })
    }

    /// Queue another player's emote for this session's client. Never waits
    /// and never fails for lack of capacity.
    pub fn deliver(&self, delivery: EmoteDelivery) -> Result<(), RelayError> {
        if self.is_closed() {
            return Err(RelayError::SessionClosed(self.id));
        }
        self.deliveries
            .send(delivery)
            .map_err(|_| RelayError::ChannelClosed(self.id))
    }

    /// Enqueue a command, waiting for channel capacity.
    pub async fn send(&self, cmd: SessionCommand) -> Result<(), RelayError> {
        if self.is_closed() {
            return Err(RelayError::SessionClosed(self.id));
        }
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RelayError::ChannelClosed(self.id))
    }

    /// The client performed an emote.
    pub async fn emote(&self, emote_id: impl Into<String>) -> Result<(), RelayError> {
        self.send(SessionCommand::Inbound(ClientPacket::Emote {
            emote_id: emote_id.into(),
        }))
        .await
    }

    /// The client answered (or dismissed) a form.
    pub async fn form_response(
        &self,
        form_id: FormId,
        response: FormResponse,
    ) -> Result<(), RelayError> {
        self.send(SessionCommand::Inbound(ClientPacket::FormResponse {
            form_id,
            response,
        }))
        .await
    }

    pub async fn spawn_entity(&self, entity: Entity) -> Result<(), RelayError> {
        self.send(SessionCommand::SpawnEntity(entity)).await
    }

    pub async fn remove_entity(&self, java_id: JavaEntityId) -> Result<(), RelayError> {
        self.send(SessionCommand::RemoveEntity(java_id)).await
    }

    /// Snapshot the session's state. Because commands run in order, this also
    /// waits for everything queued before it.
    pub async fn info(&self) -> Result<SessionInfo, RelayError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::GetInfo { respond_to: tx }).await?;
        rx.await.map_err(|_| RelayError::ChannelClosed(self.id))
    }

    /// Ask the context to stop after draining what is already queued.
    pub(crate) async fn close(&self) {
        self.mark_closed();
        // Bypasses the closed check in `send`.
        let _ = self.sender.send(SessionCommand::Close).await;
    }
}

/// The actor that owns one session's context
pub(crate) struct SessionActor {
    ctx: SessionContext,
    receiver: mpsc::Receiver<SessionCommand>,
    deliveries: mpsc::UnboundedReceiver<EmoteDelivery>,
    relay: Relay,
}

impl SessionActor {
    /// Spawn a session context and return its handle plus the receiving end
    /// of the client's upstream packets.
    pub(crate) fn spawn(
        id: SessionId,
        init: SessionInit,
        relay: Relay,
    ) -> (SessionHandle, mpsc::UnboundedReceiver<UpstreamPacket>) {
        let (sender, receiver) = mpsc::channel(relay.config().command_capacity.max(1));
        let (delivery_tx, delivery_rx) = mpsc::unbounded_channel();
        let (upstream_tx, upstream_rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));

        let actor = SessionActor {
            ctx: SessionContext::new(id, init, closed.clone(), upstream_tx),
            receiver,
            deliveries: delivery_rx,
            relay,
        };

        tokio::spawn(on_context(id, actor.run()));

        (
            SessionHandle {
                id,
                closed,
                sender,
                deliveries: delivery_tx,
            },
            upstream_rx,
        )
    }

    async fn run(mut self) {
        let id = self.ctx.id();
        debug!(session = %id, "Session context started");

        loop {
            // Deliveries first: anything queued before a command runs before it.
            let cmd = tokio::select! {
                biased;
                Some(delivery) = self.deliveries.recv() => {
                    fanout::play_emote(&self.ctx, &delivery, self.relay.metrics());
                    continue;
                }
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => cmd,
                    None => break,
                },
            };

            match cmd {
                SessionCommand::Inbound(packet) => self.handle_inbound(packet).await,

                SessionCommand::SpawnEntity(entity) => {
                    trace!(session = %id, java_id = entity.java_id, "Entity spawned");
                    self.ctx.entities_mut().insert(entity);
                }

                SessionCommand::RemoveEntity(java_id) => {
                    trace!(session = %id, java_id, "Entity removed");
                    self.ctx.entities_mut().remove(java_id);
                }

                SessionCommand::GetInfo { respond_to } => {
                    let _ = respond_to.send(self.ctx.info());
                }

                SessionCommand::Close => {
                    debug!(session = %id, "Closing session context");
                    break;
                }
            }
        }

        self.ctx.closed.store(true, Ordering::Release);
        debug!(session = %id, "Session context stopped");
    }

    async fn handle_inbound(&mut self, packet: ClientPacket) {
        match packet {
            ClientPacket::Emote { emote_id } => {
                emote::translate(&self.relay, &mut self.ctx, emote_id).await;
            }
            ClientPacket::FormResponse { form_id, response } => {
                menu::handle_form_response(&self.relay, &mut self.ctx, form_id, response).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::TestBed;
    use crate::workaround::WorkaroundMode;

    #[test]
    fn session_id_display() {
        assert_eq!(SessionId(7).to_string(), "session-7");
    }

    #[test]
    fn no_current_session_outside_a_context() {
        assert_eq!(current_session(), None);
    }

    #[tokio::test]
    async fn on_context_sets_current_session() {
        let seen = on_context(SessionId(3), async { current_session() }).await;
        assert_eq!(seen, Some(SessionId(3)));
        assert_eq!(current_session(), None);
    }

    #[tokio::test]
    async fn form_ids_are_tracked_until_taken() {
        let bed = TestBed::new(WorkaroundMode::Menu);
        let (mut ctx, mut rx) = bed.detached_context(1);
        let signal = ctx.emote_signal("wave");

        let id = ctx
            .send_form(
                Form::simple("Emote Menu", ["Send Emote"]),
                PendingForm::EmoteMenu(signal.clone()),
            )
            .unwrap();

        assert!(matches!(
            rx.try_recv(),
            Ok(UpstreamPacket::ModalForm { form_id, .. }) if form_id == id
        ));
        assert_eq!(ctx.pending_form_count(), 1);
        assert_eq!(
            ctx.take_pending_form(id),
            Some(PendingForm::EmoteMenu(signal))
        );
        assert!(ctx.take_pending_form(id).is_none());
    }

    #[tokio::test]
    async fn new_form_supersedes_unanswered_one() {
        let bed = TestBed::new(WorkaroundMode::Menu);
        let (mut ctx, _rx) = bed.detached_context(1);

        let wave = ctx.emote_signal("wave");
        let old = ctx
            .send_form(
                Form::simple("Emote Menu", ["Send Emote"]),
                PendingForm::EmoteMenu(wave),
            )
            .unwrap();
        let dance = ctx.emote_signal("dance");
        let new = ctx
            .send_form(
                Form::simple("Emote Menu", ["Send Emote"]),
                PendingForm::EmoteMenu(dance),
            )
            .unwrap();

        assert_ne!(old, new);
        assert_eq!(ctx.pending_form_count(), 1);
        assert!(ctx.take_pending_form(old).is_none());
        assert!(matches!(
            ctx.take_pending_form(new),
            Some(PendingForm::EmoteMenu(s)) if s.emote_id == "dance"
        ));
    }

    #[tokio::test]
    async fn unanswered_menus_do_not_pile_up() {
        let bed = TestBed::new(WorkaroundMode::Menu);
        let conn = bed.relay.connect(SessionInit::new("xuid-1", 1, 1)).await;

        for _ in 0..200 {
            conn.handle.emote("wave").await.unwrap();
        }

        let info = conn.handle.info().await.unwrap();
        assert_eq!(info.pending_forms, 1);
        assert_eq!(bed.relay.metrics().snapshot().menus.shown, 200);
    }

    #[tokio::test]
    async fn actor_applies_entity_commands_in_order() {
        let bed = TestBed::new(WorkaroundMode::Disabled);
        let conn = bed.relay.connect(SessionInit::new("xuid-1", 1, 1)).await;

        conn.handle.spawn_entity(Entity::player(5, 50)).await.unwrap();
        conn.handle.spawn_entity(Entity::player(6, 60)).await.unwrap();
        conn.handle.remove_entity(5).await.unwrap();

        let info = conn.handle.info().await.unwrap();
        assert_eq!(info.known_entities, 1);
        assert_eq!(info.xuid, "xuid-1");
        assert!(!info.advanced_tooltips);
    }

    #[tokio::test]
    async fn closed_handle_rejects_commands() {
        let bed = TestBed::new(WorkaroundMode::Disabled);
        let conn = bed.relay.connect(SessionInit::new("xuid-1", 1, 1)).await;
        let id = conn.handle.id();

        assert!(bed.relay.disconnect(id).await);
        assert!(conn.handle.is_closed());
        assert_eq!(
            conn.handle.emote("wave").await,
            Err(RelayError::SessionClosed(id))
        );
        assert_eq!(
            conn.handle.submit(SessionCommand::RemoveEntity(1)),
            Err(RelayError::SessionClosed(id))
        );
    }
}
