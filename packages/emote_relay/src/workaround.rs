//! Offhand workaround policy.
//!
//! Bedrock clients have no key for swapping items into the offhand, so the
//! emote gesture can be repurposed to request the swap. [`decide`] maps the
//! configured [`WorkaroundMode`] to what should happen with one emote; it does
//! nothing itself; the caller executes the returned [`WorkaroundAction`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// How emotes are reinterpreted to compensate for the missing offhand key.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum WorkaroundMode {
    /// Emotes are emotes.
    #[default]
    Disabled,
    /// Every emote swaps the offhand and is swallowed.
    NoEmotes,
    /// Every emote swaps the offhand and is still shown to other players.
    EmotesAndOffhand,
    /// Every emote opens a menu; the player picks what it means.
    Menu,
}

impl fmt::Display for WorkaroundMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::NoEmotes => write!(f, "no_emotes"),
            Self::EmotesAndOffhand => write!(f, "emotes_and_offhand"),
            Self::Menu => write!(f, "menu"),
        }
    }
}

/// What to do with a single inbound emote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkaroundAction {
    /// Show the emote menu; propagation waits for the player's answer.
    ShowMenu,
    /// Request the offhand swap and drop the emote.
    TriggerAuxiliaryAndStop,
    /// Request the offhand swap, then propagate the emote.
    TriggerAuxiliaryAndContinue,
    /// Propagate the emote.
    ContinueOnly,
}

impl WorkaroundAction {
    pub fn triggers_auxiliary(self) -> bool {
        matches!(
            self,
            Self::TriggerAuxiliaryAndStop | Self::TriggerAuxiliaryAndContinue
        )
    }

    /// Whether the raw emote goes straight to the veto hooks and fan-out.
    pub fn propagates_directly(self) -> bool {
        matches!(self, Self::TriggerAuxiliaryAndContinue | Self::ContinueOnly)
    }
}

pub fn decide(mode: WorkaroundMode) -> WorkaroundAction {
    match mode {
        WorkaroundMode::Disabled => WorkaroundAction::ContinueOnly,
        WorkaroundMode::Menu => WorkaroundAction::ShowMenu,
        WorkaroundMode::NoEmotes => WorkaroundAction::TriggerAuxiliaryAndStop,
        WorkaroundMode::EmotesAndOffhand => WorkaroundAction::TriggerAuxiliaryAndContinue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_only_continues() {
        let action = decide(WorkaroundMode::Disabled);
        assert_eq!(action, WorkaroundAction::ContinueOnly);
        assert!(!action.triggers_auxiliary());
        assert!(action.propagates_directly());
    }

    #[test]
    fn menu_defers_propagation() {
        let action = decide(WorkaroundMode::Menu);
        assert_eq!(action, WorkaroundAction::ShowMenu);
        assert!(!action.triggers_auxiliary());
        assert!(!action.propagates_directly());
    }

    #[test]
    fn no_emotes_swaps_and_stops() {
        let action = decide(WorkaroundMode::NoEmotes);
        assert!(action.triggers_auxiliary());
        assert!(!action.propagates_directly());
    }

    #[test]
    fn emotes_and_offhand_swaps_and_continues() {
        let action = decide(WorkaroundMode::EmotesAndOffhand);
        assert!(action.triggers_auxiliary());
        assert!(action.propagates_directly());
    }

    #[test]
    fn serde_names() {
        assert_eq!(
            serde_json::to_string(&WorkaroundMode::EmotesAndOffhand).unwrap(),
            "\"emotes_and_offhand\""
        );
        let mode: WorkaroundMode = serde_json::from_str("\"no_emotes\"").unwrap();
        assert_eq!(mode, WorkaroundMode::NoEmotes);
        assert_eq!(WorkaroundMode::Menu.to_string(), "menu");
    }
}
