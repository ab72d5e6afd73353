//! Collaborators outside this crate's scope.
//!
//! Inventory sync, advancements, statistics, the settings form, command
//! execution, locale strings and permissions all live elsewhere in the bridge.
//! The emote path reaches them only through [`SessionServices`]; every method
//! is called on the session's own context.

use tracing::info;

use crate::session::SessionContext;

pub trait SessionServices: Send + Sync {
    /// Ask the downstream server to swap the player's main hand and offhand.
    fn request_offhand_swap(&self, session: &mut SessionContext);

    /// Look up a translation key in `locale`.
    fn translate(&self, key: &str, locale: &str) -> String;

    /// Re-send the player's inventory, e.g. after tooltips changed.
    fn update_inventory(&self, session: &mut SessionContext);

    fn show_advancements(&self, session: &mut SessionContext);

    /// Request the player's statistics from the downstream server.
    fn request_statistics(&self, session: &mut SessionContext);

    fn show_settings(&self, session: &mut SessionContext);

    /// Run a chat command as the player.
    fn send_command(&self, session: &mut SessionContext, command: &str);

    fn has_permission(&self, session: &SessionContext, permission: &str) -> bool;
}

/// Services that log each request and grant no permissions.
///
/// Stands in for the real bridge when running the relay on its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingServices;

impl SessionServices for LoggingServices {
    fn request_offhand_swap(&self, session: &mut SessionContext) {
        info!(session = %session.id(), "Offhand swap requested");
    }

    fn translate(&self, key: &str, _locale: &str) -> String {
        match key {
            "debug.prefix" => "[Debug]:".to_string(),
            "debug.advanced_tooltips.on" => "Advanced tooltips: shown".to_string(),
            "debug.advanced_tooltips.off" => "Advanced tooltips: hidden".to_string(),
            other => other.to_string(),
        }
    }

    fn update_inventory(&self, session: &mut SessionContext) {
        info!(session = %session.id(), "Inventory resync requested");
    }

    fn show_advancements(&self, session: &mut SessionContext) {
        info!(session = %session.id(), "Advancements requested");
    }

    fn request_statistics(&self, session: &mut SessionContext) {
        info!(session = %session.id(), "Statistics requested");
    }

    fn show_settings(&self, session: &mut SessionContext) {
        info!(session = %session.id(), "Settings requested");
    }

    fn send_command(&self, session: &mut SessionContext, command: &str) {
        info!(session = %session.id(), command, "Command requested");
    }

    fn has_permission(&self, _session: &SessionContext, _permission: &str) -> bool {
        false
    }
}
