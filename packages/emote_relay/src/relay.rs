use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tracing::info;

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::fanout::Broadcaster;
use crate::hooks::HookChain;
use crate::metrics::RelayMetrics;
use crate::protocol::UpstreamPacket;
use crate::registry::SessionRegistry;
use crate::services::SessionServices;
use crate::session::{SessionActor, SessionHandle, SessionId, SessionInit};

/// A freshly connected session: its handle plus everything its client
/// should be sent.
pub struct Connection {
    pub handle: SessionHandle,
    pub upstream: mpsc::UnboundedReceiver<UpstreamPacket>,
}

/// Everything the session contexts share. Cheap to clone.
#[derive(Clone)]
pub struct Relay {
    config: Arc<RelayConfig>,
    registry: Arc<SessionRegistry>,
    hooks: Arc<HookChain>,
    services: Arc<dyn SessionServices>,
    metrics: Arc<RelayMetrics>,
    next_id: Arc<AtomicU64>,
}

impl Relay {
    pub fn new(config: RelayConfig, services: Arc<dyn SessionServices>) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(SessionRegistry::new()),
            hooks: Arc::new(HookChain::new()),
            services,
            metrics: Arc::new(RelayMetrics::new()),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Veto hooks consulted before every propagation. Register at any time.
    pub fn hooks(&self) -> &HookChain {
        &self.hooks
    }

    pub fn services(&self) -> &dyn SessionServices {
        self.services.as_ref()
    }

    pub fn metrics(&self) -> &RelayMetrics {
        &self.metrics
    }

    pub fn broadcaster(&self) -> Broadcaster {
        Broadcaster::new(self.registry.clone(), self.metrics.clone())
    }

    pub(crate) fn allocate_id(&self) -> SessionId {
        SessionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Start a session context for a new client and register it.
    pub async fn connect(&self, init: SessionInit) -> Connection {
        let id = self.allocate_id();
        let xuid = init.xuid.clone();
        let (handle, upstream) = SessionActor::spawn(id, init, self.clone());

        self.registry.insert(handle.clone()).await;
        self.metrics.session_opened();
        info!(session = %id, xuid = %xuid, "Session connected");

        Connection { handle, upstream }
    }

    /// Unregister a session and stop its context once its queue drains.
    ///
    /// Returns `false` if the session was not registered.
    pub async fn disconnect(&self, id: SessionId) -> bool {
        let Some(handle) = self.registry.remove(id).await else {
            return false;
        };

        handle.close().await;
        self.metrics.session_closed();
        info!(session = %id, "Session disconnected");
        true
    }

    pub async fn session(&self, id: SessionId) -> Result<SessionHandle, RelayError> {
        self.registry
            .get(id)
            .await
            .ok_or(RelayError::SessionNotFound(id))
    }

    /// Disconnect every registered session.
    pub async fn shutdown(&self) {
        for id in self.registry.ids().await {
            self.disconnect(id).await;
        }
    }
}
