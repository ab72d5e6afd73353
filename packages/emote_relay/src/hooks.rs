//! Veto hooks consulted before an emote is fanned out.
//!
//! Hooks run synchronously on the emitter's context, in registration order.
//! The first [`HookOutcome::Veto`] ends evaluation; later hooks are not asked,
//! so nothing downstream can overturn a veto. A veto is a normal outcome, not
//! an error.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::emote::EmoteSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    Proceed,
    Veto,
}

/// External policy over emote propagation.
pub trait EmoteHook: Send + Sync {
    /// Unique hook name. Registering a second hook with the same name
    /// replaces the first.
    fn name(&self) -> &str;

    fn evaluate(&self, signal: &EmoteSignal) -> HookOutcome;
}

/// Hook backed by a closure.
pub struct FnHook<F> {
    name: String,
    f: F,
}

impl<F> FnHook<F>
where
    F: Fn(&EmoteSignal) -> HookOutcome + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> EmoteHook for FnHook<F>
where
    F: Fn(&EmoteSignal) -> HookOutcome + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, signal: &EmoteSignal) -> HookOutcome {
        (self.f)(signal)
    }
}

#[derive(Default)]
pub struct HookChain {
    hooks: RwLock<Vec<Arc<dyn EmoteHook>>>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook, or replace the hook with the same name in place.
    pub fn register(&self, hook: impl EmoteHook + 'static) {
        let hook: Arc<dyn EmoteHook> = Arc::new(hook);
        let mut hooks = self.hooks.write().unwrap_or_else(PoisonError::into_inner);

        debug!(name = %hook.name(), "Registering emote hook");
        match hooks.iter().position(|h| h.name() == hook.name()) {
            Some(idx) => hooks[idx] = hook,
            None => hooks.push(hook),
        }
    }

    /// Remove a hook by name. Returns `true` if one was removed.
    pub fn unregister(&self, name: &str) -> bool {
        let mut hooks = self.hooks.write().unwrap_or_else(PoisonError::into_inner);
        let before = hooks.len();
        hooks.retain(|h| h.name() != name);
        hooks.len() < before
    }

    pub fn names(&self) -> Vec<String> {
        self.snapshot().iter().map(|h| h.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ask each hook in order whether `signal` may propagate.
    pub fn evaluate(&self, signal: &EmoteSignal) -> HookOutcome {
        // Hooks run outside the lock so they may register or unregister hooks.
        for hook in self.snapshot() {
            if hook.evaluate(signal) == HookOutcome::Veto {
                debug!(
                    hook = %hook.name(),
                    session = %signal.emitter,
                    emote = %signal.emote_id,
                    "Emote vetoed"
                );
                return HookOutcome::Veto;
            }
        }
        HookOutcome::Proceed
    }

    fn snapshot(&self) -> Vec<Arc<dyn EmoteHook>> {
        self.hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
