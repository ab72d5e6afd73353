//! Logical packet shapes on the client-facing leg.
//!
//! Byte-level framing belongs to the outer codec; these are the fields this
//! crate reads and writes.

use serde::{Deserialize, Serialize};

use crate::entity::RuntimeEntityId;
use crate::form::{FormId, FormResponse};

/// Packets a client sends that this crate handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientPacket {
    Emote {
        emote_id: String,
    },
    FormResponse {
        form_id: FormId,
        response: FormResponse,
    },
}

/// Emote notification addressed to one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotePacket {
    /// The emitter as the receiving client knows it.
    pub runtime_entity_id: RuntimeEntityId,
    pub xuid: String,
    /// Always empty; dedicated servers send it empty too.
    pub platform_id: String,
    pub emote_id: String,
}

/// Packets sent to a session's client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpstreamPacket {
    Emote(EmotePacket),
    Text { message: String },
    ModalForm { form_id: FormId, form_data: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emote_packet_field_names() {
        let packet = EmotePacket {
            runtime_entity_id: 42,
            xuid: "2535".to_string(),
            platform_id: String::new(),
            emote_id: "wave".to_string(),
        };
        let json: serde_json::Value = serde_json::to_value(&packet).unwrap();

        assert_eq!(json["runtimeEntityId"], 42);
        assert_eq!(json["xuid"], "2535");
        assert_eq!(json["platformId"], "");
        assert_eq!(json["emoteId"], "wave");
    }

    #[test]
    fn client_packet_from_json() {
        let packet: ClientPacket =
            serde_json::from_str(r#"{"type":"emote","emote_id":"wave"}"#).unwrap();
        assert_eq!(
            packet,
            ClientPacket::Emote {
                emote_id: "wave".to_string()
            }
        );

        let packet: ClientPacket = serde_json::from_str(
            r#"{"type":"form_response","form_id":3,"response":{"kind":"button","value":1}}"#,
        )
        .unwrap();
        assert_eq!(
            packet,
            ClientPacket::FormResponse {
                form_id: 3,
                response: FormResponse::Button(1)
            }
        );
    }
}
