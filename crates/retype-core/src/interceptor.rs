use crate::app_profile::AppStateMemory;
use crate::context::{HookContext, Notification, ShortcutSettings};
use crate::engine::{EngineResult, TransformationEngine};
use crate::error::EngineError;
use crate::injector::{InputSink, TextInjector};
use crate::keymap::{self, VK_CONTROL, VK_LWIN, VK_MENU, VK_RWIN, VK_SHIFT};
use crate::types::{KeyAction, KeyEvent, Modifiers, Vk};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Live keyboard state as the OS sees it at the time of the callback.
///
/// Inside a low-level hook the key being reported is not yet reflected here.
pub trait KeyboardState: Send {
    fn is_pressed(&self, vk: Vk) -> bool;
    fn caps_lock(&self) -> bool;

    fn win_held(&self) -> bool {
        self.is_pressed(VK_LWIN) || self.is_pressed(VK_RWIN)
    }

    fn modifiers(&self) -> Modifiers {
        Modifiers::new(
            self.is_pressed(VK_CONTROL),
            self.is_pressed(VK_MENU),
            self.is_pressed(VK_SHIFT),
        )
    }
}

/// Tracks an armed modifier-only shortcut between key-down and release.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierShortcutState {
    pub pending: bool,
    pub other_key_intervened: bool,
}

impl ModifierShortcutState {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Clears the busy flag when dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Decides, for every physical key event, whether it passes through, is
/// blocked, or is forwarded to the engine and replaced by injected text.
pub struct KeyInterceptor {
    ctx: Arc<HookContext>,
    engine: Box<dyn TransformationEngine>,
    keyboard: Box<dyn KeyboardState>,
    sink: Box<dyn InputSink>,
    injector: TextInjector,
    modifier_state: ModifierShortcutState,
    seen_generation: u64,
    busy: Arc<AtomicBool>,
    enabled: bool,
    per_app_memory: bool,
    app_memory: AppStateMemory,
}

impl KeyInterceptor {
    pub fn new(
        ctx: Arc<HookContext>,
        engine: Box<dyn TransformationEngine>,
        keyboard: Box<dyn KeyboardState>,
        sink: Box<dyn InputSink>,
    ) -> Self {
        let injector = TextInjector::new(ctx.marker());
        let seen_generation = ctx.generation();
        Self {
            ctx,
            engine,
            keyboard,
            sink,
            injector,
            modifier_state: ModifierShortcutState::default(),
            seen_generation,
            busy: Arc::new(AtomicBool::new(false)),
            enabled: true,
            per_app_memory: false,
            app_memory: AppStateMemory::default(),
        }
    }

    pub fn with_per_app_memory(mut self, on: bool) -> Self {
        self.per_app_memory = on;
        self
    }

    pub fn context(&self) -> &Arc<HookContext> {
        &self.ctx
    }

    pub fn engine_mut(&mut self) -> &mut dyn TransformationEngine {
        self.engine.as_mut()
    }

    /// Set while an engine call or injection is in flight.
    pub fn busy_flag(&self) -> Arc<AtomicBool> {
        self.busy.clone()
    }

    pub fn modifier_state(&self) -> ModifierShortcutState {
        self.modifier_state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_per_app_memory(&mut self, on: bool) {
        self.per_app_memory = on;
        if !on {
            self.app_memory.clear();
        }
    }

    /// Enables or disables transformation and remembers the choice for the
    /// current foreground app.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.per_app_memory {
            if let Some(app) = self.ctx.selector().current_process() {
                self.app_memory.remember(&app, enabled);
            }
        }
        if self.enabled == enabled {
            return;
        }
        self.apply_enabled(enabled);
    }

    fn apply_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.engine.set_enabled(enabled);
        self.engine.clear();
        info!("Transformation enabled: {}", enabled);
    }

    /// Called when the foreground window changes.
    pub fn on_foreground_changed(&mut self) {
        self.ctx.take_foreground_change();
        let selector = self.ctx.selector();
        selector.invalidate();
        self.engine.clear();
        self.modifier_state.reset();

        if !self.per_app_memory {
            return;
        }
        let Some(app) = selector.current_process() else {
            return;
        };
        debug!(%app, "Foreground changed");
        if let Some(enabled) = self.app_memory.recall(&app) {
            if enabled != self.enabled {
                self.apply_enabled(enabled);
                self.ctx
                    .notifier()
                    .emit(Notification::PerAppStateRestored { app, enabled });
            }
        }
    }

    pub fn handle(&mut self, event: &KeyEvent) -> KeyAction {
        // Our own output coming back around.
        if event.injected || event.extra_info == self.ctx.marker() {
            return KeyAction::Pass;
        }
        if self.busy.load(Ordering::Acquire) {
            trace!(vk = event.vk, "Busy, passing nested event");
            return KeyAction::Pass;
        }

        if self.ctx.take_foreground_change() {
            self.on_foreground_changed();
        }

        let generation = self.ctx.generation();
        if generation != self.seen_generation {
            self.seen_generation = generation;
            self.modifier_state.reset();
        }
        let shortcuts = self.ctx.shortcuts();
        let vk = event.vk;

        if shortcuts.toggle.is_modifier_only() && self.track_modifier_only(event, &shortcuts) {
            return KeyAction::Pass;
        }

        if event.is_up() {
            return KeyAction::Pass;
        }

        let mods = self.keyboard.modifiers();

        if shortcuts.toggle.matches(vk, mods.ctrl, mods.alt, mods.shift) {
            debug!(shortcut = %shortcuts.toggle, "Toggle shortcut");
            self.ctx.notifier().emit(Notification::ToggleRequested);
            return KeyAction::Block;
        }

        if shortcuts.restore_enabled && shortcuts.restore.matches(vk, mods.ctrl, mods.alt, mods.shift)
        {
            debug!(shortcut = %shortcuts.restore, "Restore shortcut");
            self.ctx.notifier().emit(Notification::RestoreRequested);
            return KeyAction::Pass;
        }

        if keymap::breaks_buffer(vk) {
            trace!(vk, "Buffer break key");
            self.engine.clear();
            return KeyAction::Pass;
        }

        // System shortcuts belong to the OS.
        if self.keyboard.win_held() {
            self.engine.clear();
            return KeyAction::Pass;
        }

        if mods.ctrl || mods.alt {
            if mods.ctrl {
                self.engine.clear();
            }
            return KeyAction::Pass;
        }

        if !self.enabled || !keymap::is_relevant(vk) {
            return KeyAction::Pass;
        }

        self.forward(vk, mods.shift)
    }

    /// Returns true when the event was fully handled as part of a
    /// modifier-only shortcut.
    fn track_modifier_only(&mut self, event: &KeyEvent, shortcuts: &ShortcutSettings) -> bool {
        let vk = event.vk;
        let is_modifier = keymap::is_modifier(vk);

        if event.is_down() {
            if is_modifier {
                let pressed = self.keyboard.modifiers().union(keymap::modifier_of(vk));
                if pressed == shortcuts.toggle.modifiers() {
                    self.modifier_state = ModifierShortcutState {
                        pending: true,
                        other_key_intervened: false,
                    };
                    trace!("Modifier-only shortcut armed");
                } else {
                    self.modifier_state.pending = false;
                }
            } else {
                self.modifier_state.pending = false;
                self.modifier_state.other_key_intervened = true;
            }
            return false;
        }

        if is_modifier {
            let state = self.modifier_state;
            self.modifier_state.reset();
            if state.pending && !state.other_key_intervened {
                debug!(shortcut = %shortcuts.toggle, "Modifier-only toggle shortcut");
                self.ctx.notifier().emit(Notification::ToggleRequested);
                return true;
            }
        }
        false
    }

    fn forward(&mut self, vk: Vk, shift: bool) -> KeyAction {
        let Some(key) = keymap::to_engine_key(vk) else {
            return KeyAction::Pass;
        };
        let caps = self.keyboard.caps_lock();

        let busy = self.busy.clone();
        let Some(_guard) = BusyGuard::acquire(&busy) else {
            return KeyAction::Pass;
        };

        let result = match self.call_engine(key, shift, caps) {
            Ok(result) => result,
            Err(e) => {
                warn!(vk, error = %e, "Engine call failed, passing key through");
                return KeyAction::Pass;
            }
        };

        if !result.is_replacement() {
            return KeyAction::Pass;
        }

        let text = result.text();
        let profile = self.ctx.selector().detect();
        trace!(
            vk,
            backspaces = result.backspace_count,
            chars = text.chars().count(),
            method = ?profile.method,
            "Injecting replacement"
        );
        self.injector.inject(
            self.sink.as_mut(),
            &text,
            u32::from(result.backspace_count),
            &profile,
        );
        KeyAction::Block
    }

    fn call_engine(&mut self, key: u16, shift: bool, caps: bool) -> Result<EngineResult, EngineError> {
        let engine = &mut self.engine;
        match catch_unwind(AssertUnwindSafe(|| engine.process_key(key, shift, caps))) {
            Ok(result) => result,
            Err(_) => Err(EngineError::Panicked),
        }
    }
}
