use serde::{Deserialize, Serialize};

/// Native virtual-key code as reported by the platform hook.
pub type Vk = u16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEdge {
    Down,
    Up,
}

/// One physical key event as seen by the hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub vk: Vk,
    pub edge: KeyEdge,
    /// Platform-level "injected" flag (e.g. `LLKHF_INJECTED`).
    pub injected: bool,
    /// Opaque per-event tag (`dwExtraInfo` on Windows).
    pub extra_info: usize,
}

impl KeyEvent {
    pub const fn down(vk: Vk) -> Self {
        Self {
            vk,
            edge: KeyEdge::Down,
            injected: false,
            extra_info: 0,
        }
    }

    pub const fn up(vk: Vk) -> Self {
        Self {
            vk,
            edge: KeyEdge::Up,
            injected: false,
            extra_info: 0,
        }
    }

    pub const fn with_extra_info(mut self, extra_info: usize) -> Self {
        self.extra_info = extra_info;
        self
    }

    pub const fn with_injected(mut self, injected: bool) -> Self {
        self.injected = injected;
        self
    }

    pub fn is_down(&self) -> bool {
        self.edge == KeyEdge::Down
    }

    pub fn is_up(&self) -> bool {
        self.edge == KeyEdge::Up
    }
}

/// Decision returned to the OS for a physical key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Pass,
    Block,
}

impl KeyAction {
    pub fn is_consumed(self) -> bool {
        matches!(self, KeyAction::Block)
    }
}

/// Modifier keys relevant to shortcut matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const fn none() -> Self {
        Self {
            ctrl: false,
            alt: false,
            shift: false,
        }
    }

    pub const fn new(ctrl: bool, alt: bool, shift: bool) -> Self {
        Self { ctrl, alt, shift }
    }

    pub const fn count(self) -> u8 {
        self.ctrl as u8 + self.alt as u8 + self.shift as u8
    }

    pub const fn union(self, other: Modifiers) -> Self {
        Self {
            ctrl: self.ctrl || other.ctrl,
            alt: self.alt || other.alt,
            shift: self.shift || other.shift,
        }
    }
}

/// What a synthetic key event carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPayload {
    /// Raw scan code, sent without a virtual-key mapping.
    ScanCode(u16),
    /// Virtual key, optionally flagged as an extended key.
    VirtualKey { vk: Vk, extended: bool },
    /// One UTF-16 code unit through the platform's Unicode input path.
    Unicode(u16),
}

/// A single synthetic key-down or key-up descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticKey {
    pub payload: KeyPayload,
    pub up: bool,
    /// Stamped with the injected-key marker so the hook can ignore it on re-entry.
    pub tag: usize,
}

impl SyntheticKey {
    pub const fn scan_code(sc: u16, up: bool, tag: usize) -> Self {
        Self {
            payload: KeyPayload::ScanCode(sc),
            up,
            tag,
        }
    }

    pub const fn virtual_key(vk: Vk, extended: bool, up: bool, tag: usize) -> Self {
        Self {
            payload: KeyPayload::VirtualKey { vk, extended },
            up,
            tag,
        }
    }

    pub const fn unicode(unit: u16, up: bool, tag: usize) -> Self {
        Self {
            payload: KeyPayload::Unicode(unit),
            up,
            tag,
        }
    }
}
