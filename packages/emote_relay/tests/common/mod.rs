#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use emote_relay::{
    Connection, Entity, Relay, RelayConfig, SessionContext, SessionId, SessionInit,
    SessionServices, UpstreamPacket, WorkaroundMode,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    OffhandSwap(SessionId),
    UpdateInventory(SessionId),
    Advancements(SessionId),
    Statistics(SessionId),
    Settings(SessionId),
    Command(SessionId, String),
}

#[derive(Default)]
pub struct Recorder {
    calls: Mutex<Vec<Call>>,
    granted: Mutex<HashSet<String>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn grant(&self, permission: &str) {
        self.granted.lock().unwrap().insert(permission.to_string());
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl SessionServices for Recorder {
    fn request_offhand_swap(&self, session: &mut SessionContext) {
        self.push(Call::OffhandSwap(session.id()));
    }

    fn translate(&self, key: &str, _locale: &str) -> String {
        key.to_string()
    }

    fn update_inventory(&self, session: &mut SessionContext) {
        self.push(Call::UpdateInventory(session.id()));
    }

    fn show_advancements(&self, session: &mut SessionContext) {
        self.push(Call::Advancements(session.id()));
    }

    fn request_statistics(&self, session: &mut SessionContext) {
        self.push(Call::Statistics(session.id()));
    }

    fn show_settings(&self, session: &mut SessionContext) {
        self.push(Call::Settings(session.id()));
    }

    fn send_command(&self, session: &mut SessionContext, command: &str) {
        self.push(Call::Command(session.id(), command.to_string()));
    }

    fn has_permission(&self, _session: &SessionContext, permission: &str) -> bool {
        self.granted.lock().unwrap().contains(permission)
    }
}

pub fn start_relay(mode: WorkaroundMode) -> (Relay, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let relay = Relay::new(
        RelayConfig::default().with_workaround(mode),
        recorder.clone(),
    );
    (relay, recorder)
}

/// Connect one player per java id; every client learns every other player as
/// runtime entity `100 * viewer + emitter`.
pub async fn connect_all(relay: &Relay, java_ids: &[i32]) -> Vec<Connection> {
    let mut conns = Vec::new();
    for &java_id in java_ids {
        let conn = relay
            .connect(SessionInit::new(format!("xuid-{java_id}"), java_id, 1))
            .await;
        conns.push(conn);
    }
    for (conn, &viewer) in conns.iter().zip(java_ids) {
        for &other in java_ids.iter().filter(|&&id| id != viewer) {
            conn.handle
                .spawn_entity(Entity::player(other, runtime_id(viewer, other)))
                .await
                .unwrap();
        }
    }
    conns
}

pub fn runtime_id(viewer: i32, emitter: i32) -> u64 {
    (100 * viewer + emitter) as u64
}

/// Wait for everything queued on `conn` so far, then take what its client got.
pub async fn settle(conn: &mut Connection) -> Vec<UpstreamPacket> {
    if !conn.handle.is_closed() {
        conn.handle.info().await.unwrap();
    }
    let mut packets = Vec::new();
    while let Ok(packet) = conn.upstream.try_recv() {
        packets.push(packet);
    }
    packets
}
