use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::menu::{MenuEntry, MenuLayout};
use crate::workaround::WorkaroundMode;

// =============================================================================
// File config (figment-deserialized from defaults / emote_relay.toml / env vars)
// =============================================================================
//
//   emote_relay.toml:  [emote]
//                      offhand_workaround = "menu"
//
//   env var:           EMOTE_RELAY_EMOTE__OFFHAND_WORKAROUND=menu

/// How the relay is deployed.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PlatformType {
    /// Runs on its own; there is no permission backend, every menu action is allowed.
    Standalone,
    /// Hosted inside a server; menu actions go through permission checks.
    #[default]
    Plugin,
}

/// Top-level tunable configuration, deserialized by figment.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub platform: PlatformType,
    #[serde(default)]
    pub emote: EmoteFileConfig,
    #[serde(default)]
    pub menu: MenuFileConfig,
    #[serde(default)]
    pub session: SessionFileConfig,
}

/// Emote tunables (lives under `[emote]`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EmoteFileConfig {
    #[serde(default)]
    pub offhand_workaround: WorkaroundMode,
}

/// Emote menu tunables (lives under `[menu]`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MenuFileConfig {
    /// Buttons in display order.
    #[serde(default = "default_menu_entries")]
    pub entries: Vec<MenuEntry>,
}

impl Default for MenuFileConfig {
    fn default() -> Self {
        Self {
            entries: default_menu_entries(),
        }
    }
}

/// Per-session tunables (lives under `[session]`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionFileConfig {
    /// Client commands a session context may have queued. Emote deliveries
    /// use their own lane and are not bounded by this.
    #[serde(default = "default_command_capacity")]
    pub command_capacity: usize,
}

impl Default for SessionFileConfig {
    fn default() -> Self {
        Self {
            command_capacity: default_command_capacity(),
        }
    }
}

fn default_menu_entries() -> Vec<MenuEntry> {
    MenuEntry::ALL.to_vec()
}
fn default_command_capacity() -> usize {
    256
}

/// Build a figment that layers: defaults → emote_relay.toml → EMOTE_RELAY_* env vars.
///
/// A missing file is not an error; its layer is simply empty.
pub fn load_config(path: Option<&Path>) -> figment::Figment {
    use figment::{
        Figment,
        providers::{Env, Format, Serialized, Toml},
    };

    let mut figment = Figment::from(Serialized::defaults(FileConfig::default()));
    if let Some(path) = path {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(Env::prefixed("EMOTE_RELAY_").split("__"))
}

// =============================================================================
// Runtime config (derived from FileConfig, shared by every session context)
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayConfig {
    pub platform: PlatformType,
    pub workaround: WorkaroundMode,
    pub menu: MenuLayout,
    /// Capacity of each session's command channel (at least 1)
    pub command_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::from_file(&FileConfig::default())
    }
}

impl RelayConfig {
    pub fn from_file(fc: &FileConfig) -> Self {
        Self {
            platform: fc.platform,
            workaround: fc.emote.offhand_workaround,
            menu: MenuLayout::new(fc.menu.entries.iter().copied()),
            command_capacity: fc.session.command_capacity.max(1),
        }
    }

    pub fn with_workaround(mut self, workaround: WorkaroundMode) -> Self {
        self.workaround = workaround;
        self
    }

    pub fn with_platform(mut self, platform: PlatformType) -> Self {
        self.platform = platform;
        self
    }

    pub fn is_standalone(&self) -> bool {
        self.platform == PlatformType::Standalone
    }
}
