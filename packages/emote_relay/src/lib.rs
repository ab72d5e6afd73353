//! Emote relay - emote workaround, veto and fan-out core for a Bedrock client bridge
//!
//! Every connected client owns a [`SessionContext`] that lives inside a single
//! tokio task (its execution context). Inbound packets, entity-index updates and
//! cross-session emote deliveries are all commands on that task's channel, so a
//! session's state is only ever touched from its own context.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use emote_relay::{LoggingServices, Relay, RelayConfig, SessionInit};
//!
//! #[tokio::main]
//! async fn main() {
//!     let relay = Relay::new(RelayConfig::default(), Arc::new(LoggingServices));
//!
//!     let alice = relay.connect(SessionInit::new("alice-xuid", 1, 1)).await;
//!     let mut bob = relay.connect(SessionInit::new("bob-xuid", 2, 1)).await;
//!
//!     // Bob's client knows Alice as runtime entity 7
//!     bob.handle
//!         .spawn_entity(emote_relay::Entity::player(1, 7))
//!         .await
//!         .unwrap();
//!
//!     alice.handle.emote("wave").await.unwrap();
//!
//!     while let Some(packet) = bob.upstream.recv().await {
//!         println!("bob <- {:?}", packet);
//!     }
//! }
//! ```

pub mod config;
pub mod emote;
pub mod entity;
mod error;
pub mod fanout;
pub mod form;
pub mod hooks;
pub mod menu;
pub mod metrics;
pub mod protocol;
pub mod registry;
mod relay;
pub mod services;
pub mod session;
#[cfg(test)]
mod test_helpers;
pub mod workaround;

pub use config::{FileConfig, PlatformType, RelayConfig};
pub use emote::EmoteSignal;
pub use entity::{Entity, EntityIndex, EntityKind};
pub use error::RelayError;
pub use fanout::{Broadcaster, EmoteDelivery, FanoutReport};
pub use form::{Form, FormId, FormResponse};
pub use hooks::{EmoteHook, FnHook, HookChain, HookOutcome};
pub use menu::{MenuAction, MenuEntry, MenuLayout, MenuSelection};
pub use metrics::{MetricsSnapshot, RelayMetrics};
pub use protocol::{ClientPacket, EmotePacket, UpstreamPacket};
pub use registry::SessionRegistry;
pub use relay::{Connection, Relay};
pub use services::{LoggingServices, SessionServices};
pub use session::{SessionContext, SessionHandle, SessionId, SessionInfo, SessionInit, current_session};
pub use workaround::{WorkaroundAction, WorkaroundMode};
