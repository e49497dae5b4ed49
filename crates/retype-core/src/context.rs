use crate::app_profile::{AppProfileSelector, ForegroundProbe};
use crate::keymap::{VK_ESCAPE, VK_SPACE};
use crate::shortcut::Shortcut;
use crate::types::Modifiers;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, info};

/// Tag stamped on every synthetic key event (`dwExtraInfo`).
pub const INJECTED_MARKER: usize = 0x5254_5950;

/// Side-channel events for the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    ToggleRequested,
    RestoreRequested,
    PerAppStateRestored { app: String, enabled: bool },
}

/// Fan-out of notifications to any number of subscribers.
#[derive(Default)]
pub struct Notifier {
    subscribers: Mutex<Vec<Sender<Notification>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<Notification> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Never blocks; subscribers whose receiver is gone are dropped.
    pub fn emit(&self, notification: Notification) {
        debug!(?notification, "Emitting notification");
        self.subscribers
            .lock()
            .retain(|tx| tx.send(notification.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

/// The shortcut part of the configuration, swapped as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortcutSettings {
    pub toggle: Shortcut,
    pub restore: Shortcut,
    pub restore_enabled: bool,
}

impl Default for ShortcutSettings {
    fn default() -> Self {
        Self {
            toggle: Shortcut::new(VK_SPACE, Modifiers::new(true, false, false)),
            restore: Shortcut::new(VK_ESCAPE, Modifiers::none()),
            restore_enabled: true,
        }
    }
}

/// State shared between the hook thread and whoever configures it: the
/// injected-key marker, the shortcuts, the foreground profile selector and
/// the notification hub.
pub struct HookContext {
    marker: usize,
    shortcuts: RwLock<ShortcutSettings>,
    generation: AtomicU64,
    foreground_pending: AtomicBool,
    selector: AppProfileSelector,
    notifier: Notifier,
}

impl HookContext {
    pub fn new(probe: Box<dyn ForegroundProbe>) -> Self {
        Self::with_selector(AppProfileSelector::new(probe))
    }

    pub fn with_selector(selector: AppProfileSelector) -> Self {
        Self {
            marker: INJECTED_MARKER,
            shortcuts: RwLock::new(ShortcutSettings::default()),
            generation: AtomicU64::new(0),
            foreground_pending: AtomicBool::new(false),
            selector,
            notifier: Notifier::new(),
        }
    }

    pub fn marker(&self) -> usize {
        self.marker
    }

    pub fn shortcuts(&self) -> ShortcutSettings {
        *self.shortcuts.read()
    }

    /// Replaces all shortcut settings; takes effect on the next keystroke.
    pub fn apply_shortcuts(&self, settings: ShortcutSettings) {
        let mut current = self.shortcuts.write();
        if *current == settings {
            return;
        }
        if settings.toggle == settings.restore && settings.restore_enabled {
            debug!("Toggle and restore shortcuts overlap; toggle wins");
        }
        *current = settings;
        self.generation.fetch_add(1, Ordering::AcqRel);
        info!(
            toggle = %settings.toggle,
            restore = %settings.restore,
            restore_enabled = settings.restore_enabled,
            "Shortcut settings applied"
        );
    }

    /// Bumped every time the shortcut settings change.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Records a foreground change that could not reach the interceptor.
    /// The profile cache is dropped now; the rest is handled on the next
    /// keystroke.
    pub fn defer_foreground_change(&self) {
        self.selector.invalidate();
        self.foreground_pending.store(true, Ordering::Release);
    }

    pub(crate) fn take_foreground_change(&self) -> bool {
        self.foreground_pending.swap(false, Ordering::AcqRel)
    }

    pub fn selector(&self) -> &AppProfileSelector {
        &self.selector
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn subscribe(&self) -> Receiver<Notification> {
        self.notifier.subscribe()
    }
}
