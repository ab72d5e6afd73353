//! The emote menu.
//!
//! With the `menu` workaround an emote opens a button list instead of playing.
//! The emote itself travels with the pending form so the "send emote" answer,
//! and any answer that does not name an entry, can still propagate it.
//!
//! ```text
//! emote ──► Emote Menu ──► Button(i) ──► MenuLayout::entry_at(i)
//!              │                          ├─► SendEmote / unmatched ──► veto hooks ──► fan-out
//!              │                          ├─► gated side effects (offhand, tooltips, ...)
//!              │                          └─► ExecuteCommand ──► command form
//!              │                                                   ├─► Inputs ──► send_command
//!              │                                                   └─► Closed ──► Emote Menu again
//!              └─► Closed ──► nothing
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::emote::{self, EmoteSignal};
use crate::form::{Form, FormElement, FormId, FormResponse, PendingForm};
use crate::protocol::UpstreamPacket;
use crate::relay::Relay;
use crate::session::SessionContext;

pub const EMOTE_MENU_TITLE: &str = "Emote Menu";
pub const COMMAND_FORM_TITLE: &str = "Emote Menu - Execute Command";

/// One button of the emote menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuEntry {
    SendEmote,
    SwapOffhand,
    ToggleTooltips,
    Advancements,
    Statistics,
    ExecuteCommand,
    Settings,
}

impl MenuEntry {
    /// Every entry, in canonical menu order.
    pub const ALL: [MenuEntry; 7] = [
        MenuEntry::SendEmote,
        MenuEntry::SwapOffhand,
        MenuEntry::ToggleTooltips,
        MenuEntry::Advancements,
        MenuEntry::Statistics,
        MenuEntry::ExecuteCommand,
        MenuEntry::Settings,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::SendEmote => "Send Emote",
            Self::SwapOffhand => "Swap Offhand",
            Self::ToggleTooltips => "Toggle Advanced Tooltips",
            Self::Advancements => "Advancements",
            Self::Statistics => "Statistics",
            Self::ExecuteCommand => "Execute Command",
            Self::Settings => "Settings",
        }
    }

    /// Permission required outside standalone deployments.
    pub fn permission(self) -> Option<&'static str> {
        match self {
            Self::SendEmote | Self::ExecuteCommand => None,
            Self::SwapOffhand => Some("relay.command.offhand"),
            Self::ToggleTooltips => Some("relay.command.tooltips"),
            Self::Advancements => Some("relay.command.advancements"),
            Self::Statistics => Some("relay.command.statistics"),
            Self::Settings => Some("relay.command.settings"),
        }
    }
}

/// Which entries the menu shows, in button order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuLayout(Vec<MenuEntry>);

impl Default for MenuLayout {
    fn default() -> Self {
        Self::full()
    }
}

impl MenuLayout {
    pub fn full() -> Self {
        Self(MenuEntry::ALL.to_vec())
    }

    /// A layout with the given entries; duplicates after the first are dropped.
    pub fn new(entries: impl IntoIterator<Item = MenuEntry>) -> Self {
        let mut layout = Vec::new();
        for entry in entries {
            if !layout.contains(&entry) {
                layout.push(entry);
            }
        }
        Self(layout)
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.0
    }

    pub fn entry_at(&self, index: usize) -> Option<MenuEntry> {
        self.0.get(index).copied()
    }
}

/// A button press on the emote menu, with the emote that opened it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuSelection {
    pub index: usize,
    pub signal: EmoteSignal,
}

impl MenuSelection {
    /// Resolve against `layout`. Indices that name no entry send the emote.
    pub fn resolve(self, layout: &MenuLayout) -> MenuAction {
        match layout.entry_at(self.index) {
            Some(MenuEntry::SwapOffhand) => MenuAction::SwapOffhand,
            Some(MenuEntry::ToggleTooltips) => MenuAction::ToggleTooltips,
            Some(MenuEntry::Advancements) => MenuAction::Advancements,
            Some(MenuEntry::Statistics) => MenuAction::Statistics,
            Some(MenuEntry::ExecuteCommand) => MenuAction::ExecuteCommand(self.signal),
            Some(MenuEntry::Settings) => MenuAction::Settings,
            Some(MenuEntry::SendEmote) | None => MenuAction::SendEmote(self.signal),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    SendEmote(EmoteSignal),
    SwapOffhand,
    ToggleTooltips,
    Advancements,
    Statistics,
    /// Opens the command form; closing it comes back to the menu for this emote.
    ExecuteCommand(EmoteSignal),
    Settings,
}

impl MenuAction {
    pub fn entry(&self) -> MenuEntry {
        match self {
            Self::SendEmote(_) => MenuEntry::SendEmote,
            Self::SwapOffhand => MenuEntry::SwapOffhand,
            Self::ToggleTooltips => MenuEntry::ToggleTooltips,
            Self::Advancements => MenuEntry::Advancements,
            Self::Statistics => MenuEntry::Statistics,
            Self::ExecuteCommand(_) => MenuEntry::ExecuteCommand,
            Self::Settings => MenuEntry::Settings,
        }
    }
}

pub fn build_emote_menu(layout: &MenuLayout) -> Form {
    Form::simple(
        EMOTE_MENU_TITLE,
        layout.entries().iter().map(|entry| entry.label()),
    )
}

pub fn build_command_form() -> Form {
    Form::Custom {
        title: COMMAND_FORM_TITLE.to_string(),
        content: vec![FormElement::Input {
            text: "Command".to_string(),
            placeholder: "Enter a command".to_string(),
            default: String::new(),
        }],
    }
}

/// Show the emote menu for `signal` to `ctx`'s client.
pub fn show_emote_menu(relay: &Relay, ctx: &mut SessionContext, signal: EmoteSignal) {
    let form = build_emote_menu(&relay.config().menu);
    match ctx.send_form(form, PendingForm::EmoteMenu(signal)) {
        Some(_) => relay.metrics().menu_shown(),
        None => debug!(session = %ctx.id(), "Emote menu not shown"),
    }
}

/// Route a form answer to whatever was waiting on it.
pub async fn handle_form_response(
    relay: &Relay,
    ctx: &mut SessionContext,
    form_id: FormId,
    response: FormResponse,
) {
    let Some(pending) = ctx.take_pending_form(form_id) else {
        debug!(session = %ctx.id(), form_id, "Response for unknown form; ignoring");
        return;
    };

    match (pending, response) {
        (PendingForm::EmoteMenu(signal), FormResponse::Closed) => {
            on_closed_without_selection(ctx, signal);
        }
        (PendingForm::EmoteMenu(signal), FormResponse::Button(index)) => {
            on_selection(relay, ctx, MenuSelection { index, signal }).await;
        }
        (PendingForm::CommandEntry(signal), FormResponse::Closed) => {
            show_emote_menu(relay, ctx, signal);
        }
        (PendingForm::CommandEntry(_), FormResponse::Inputs(values)) => {
            match values.first().map(|v| v.trim()).filter(|v| !v.is_empty()) {
                Some(command) => relay.services().send_command(ctx, command),
                None => debug!(session = %ctx.id(), "Empty command submitted; ignoring"),
            }
        }
        (pending, response) => {
            debug!(
                session = %ctx.id(),
                ?pending,
                ?response,
                "Form response does not fit its form; ignoring"
            );
        }
    }
}

/// The player picked a button on the emote menu.
pub async fn on_selection(relay: &Relay, ctx: &mut SessionContext, selection: MenuSelection) {
    relay.metrics().menu_selection();
    let action = selection.resolve(&relay.config().menu);

    if let Some(permission) = action.entry().permission() {
        if !permitted(relay, ctx, permission) {
            return;
        }
    }

    match action {
        MenuAction::SendEmote(signal) => emote::process_emote(relay, ctx, signal).await,
        MenuAction::SwapOffhand => {
            relay.metrics().auxiliary_triggered();
            relay.services().request_offhand_swap(ctx);
        }
        MenuAction::ToggleTooltips => toggle_advanced_tooltips(relay, ctx),
        MenuAction::Advancements => relay.services().show_advancements(ctx),
        MenuAction::Statistics => relay.services().request_statistics(ctx),
        MenuAction::ExecuteCommand(signal) => {
            if ctx
                .send_form(build_command_form(), PendingForm::CommandEntry(signal))
                .is_none()
            {
                debug!(session = %ctx.id(), "Command form not shown");
            }
        }
        MenuAction::Settings => relay.services().show_settings(ctx),
    }
}

/// The player dismissed the emote menu. The emote is dropped.
pub fn on_closed_without_selection(ctx: &SessionContext, signal: EmoteSignal) {
    debug!(
        session = %ctx.id(),
        emote = %signal.emote_id,
        "Emote menu closed without a selection"
    );
}

fn permitted(relay: &Relay, ctx: &SessionContext, permission: &str) -> bool {
    if relay.config().is_standalone() || relay.services().has_permission(ctx, permission) {
        return true;
    }

    debug!(session = %ctx.id(), permission, "Menu action not permitted");
    relay.metrics().permission_denied();
    false
}

fn toggle_advanced_tooltips(relay: &Relay, ctx: &mut SessionContext) {
    let enabled = !ctx.advanced_tooltips();
    ctx.set_advanced_tooltips(enabled);

    let services = relay.services();
    let on_or_off = if enabled { "on" } else { "off" };
    let prefix = services.translate("debug.prefix", ctx.locale());
    let state = services.translate(&format!("debug.advanced_tooltips.{on_or_off}"), ctx.locale());
    ctx.send_upstream(UpstreamPacket::Text {
        message: format!("§l§e{prefix} §r{state}"),
    });

    services.update_inventory(ctx);
}
