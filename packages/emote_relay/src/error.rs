use crate::session::SessionId;

/// Errors surfaced at the session API boundary.
///
/// The emote path itself never fails: vetoes, stale targets, permission
/// denials and unanswered menus all degrade to "do nothing". These errors only
/// reach callers that drive a session handle directly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("session closed: {0}")]
    SessionClosed(SessionId),

    #[error("command channel full: {0}")]
    ChannelFull(SessionId),

    #[error("session context is gone: {0}")]
    ChannelClosed(SessionId),
}

impl RelayError {
    pub fn error_code(&self) -> &str {
        match self {
            Self::SessionNotFound(_) => "session_not_found",
            Self::SessionClosed(_) => "session_closed",
            Self::ChannelFull(_) => "channel_full",
            Self::ChannelClosed(_) => "channel_closed",
        }
    }

    /// The session the error is about.
    pub fn session(&self) -> SessionId {
        match self {
            Self::SessionNotFound(id)
            | Self::SessionClosed(id)
            | Self::ChannelFull(id)
            | Self::ChannelClosed(id) => *id,
        }
    }
}
