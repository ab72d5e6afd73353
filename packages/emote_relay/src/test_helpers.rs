//! Shared fixtures for unit tests.

use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::config::{PlatformType, RelayConfig};
use crate::entity::{Entity, JavaEntityId, RuntimeEntityId};
use crate::protocol::UpstreamPacket;
use crate::relay::Relay;
use crate::services::SessionServices;
use crate::session::{SessionContext, SessionHandle, SessionId, SessionInit};
use crate::workaround::WorkaroundMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    OffhandSwap(SessionId),
    UpdateInventory(SessionId),
    ShowAdvancements(SessionId),
    RequestStatistics(SessionId),
    ShowSettings(SessionId),
    Command(SessionId, String),
}

/// Records every request; grants only permissions handed out with [`grant`](Self::grant).
/// Translations come back as `<key>`.
#[derive(Default)]
pub struct RecordingServices {
    calls: Mutex<Vec<ServiceCall>>,
    granted: Mutex<HashSet<String>>,
}

impl RecordingServices {
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn grant(&self, permission: &str) {
        self.granted.lock().unwrap().insert(permission.to_string());
    }

    fn record(&self, call: ServiceCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl SessionServices for RecordingServices {
    fn request_offhand_swap(&self, session: &mut SessionContext) {
        self.record(ServiceCall::OffhandSwap(session.id()));
    }

    fn translate(&self, key: &str, _locale: &str) -> String {
        format!("<{key}>")
    }

    fn update_inventory(&self, session: &mut SessionContext) {
        self.record(ServiceCall::UpdateInventory(session.id()));
    }

    fn show_advancements(&self, session: &mut SessionContext) {
        self.record(ServiceCall::ShowAdvancements(session.id()));
    }

    fn request_statistics(&self, session: &mut SessionContext) {
        self.record(ServiceCall::RequestStatistics(session.id()));
    }

    fn show_settings(&self, session: &mut SessionContext) {
        self.record(ServiceCall::ShowSettings(session.id()));
    }

    fn send_command(&self, session: &mut SessionContext, command: &str) {
        self.record(ServiceCall::Command(session.id(), command.to_string()));
    }

    fn has_permission(&self, _session: &SessionContext, permission: &str) -> bool {
        self.granted.lock().unwrap().contains(permission)
    }
}

pub struct TestBed {
    pub relay: Relay,
    pub services: Arc<RecordingServices>,
}

impl TestBed {
    pub fn new(mode: WorkaroundMode) -> Self {
        Self::with_config(RelayConfig::default().with_workaround(mode))
    }

    pub fn with_platform(mode: WorkaroundMode, platform: PlatformType) -> Self {
        Self::with_config(
            RelayConfig::default()
                .with_workaround(mode)
                .with_platform(platform),
        )
    }

    pub fn with_config(config: RelayConfig) -> Self {
        let services = Arc::new(RecordingServices::default());
        let relay = Relay::new(config, services.clone());
        Self { relay, services }
    }

    /// A session context that is not registered and runs on no task.
    /// Stands in for "the context the test is pretending to run on".
    pub fn detached_context(
        &self,
        java_id: JavaEntityId,
    ) -> (SessionContext, mpsc::UnboundedReceiver<UpstreamPacket>) {
        self.detached_context_with_id(self.relay.allocate_id(), java_id)
    }

    pub fn detached_context_with_id(
        &self,
        id: SessionId,
        java_id: JavaEntityId,
    ) -> (SessionContext, mpsc::UnboundedReceiver<UpstreamPacket>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let init = SessionInit::new(format!("xuid-{java_id}"), java_id, 1);
        let ctx = SessionContext::new(id, init, Arc::new(AtomicBool::new(false)), tx);
        (ctx, rx)
    }

    /// Connect a session whose client already knows `emitter` as a player.
    pub async fn connect_viewer(
        &self,
        java_id: JavaEntityId,
        emitter: &SessionContext,
    ) -> TestViewer {
        self.connect_viewer_of(java_id, emitter.java_entity_id(), 100 + java_id as u64)
            .await
    }

    /// Connect a session whose client knows a player `emitter_java_id` as
    /// `emitter_runtime_id`.
    pub async fn connect_viewer_of(
        &self,
        java_id: JavaEntityId,
        emitter_java_id: JavaEntityId,
        emitter_runtime_id: RuntimeEntityId,
    ) -> TestViewer {
        let conn = self
            .relay
            .connect(SessionInit::new(format!("xuid-{java_id}"), java_id, 1))
            .await;
        conn.handle
            .spawn_entity(Entity::player(emitter_java_id, emitter_runtime_id))
            .await
            .unwrap();
        TestViewer {
            handle: conn.handle,
            upstream: conn.upstream,
        }
    }
}

pub struct TestViewer {
    pub handle: SessionHandle,
    pub upstream: mpsc::UnboundedReceiver<UpstreamPacket>,
}

impl TestViewer {
    /// Wait until everything queued on the viewer's context so far has run.
    pub async fn flush(&mut self) {
        self.handle.info().await.unwrap();
    }

    pub fn drain(&mut self) -> Vec<UpstreamPacket> {
        let mut packets = Vec::new();
        while let Ok(packet) = self.upstream.try_recv() {
            packets.push(packet);
        }
        packets
    }
}
