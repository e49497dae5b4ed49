use crate::error::ShortcutError;
use crate::keymap;
use crate::types::{Modifiers, Vk};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A configurable shortcut: a main key plus an exact modifier set, or a
/// modifier-only combination of at least two modifiers.
///
/// Modifier-only shortcuts never match through [`Shortcut::matches`]; they are
/// resolved on key release by the interceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Shortcut {
    key: Option<Vk>,
    modifiers: Modifiers,
}

impl Shortcut {
    pub const fn new(key: Vk, modifiers: Modifiers) -> Self {
        Self {
            key: Some(key),
            modifiers,
        }
    }

    pub fn modifier_only(modifiers: Modifiers) -> Result<Self, ShortcutError> {
        if modifiers.count() < 2 {
            return Err(ShortcutError::TooFewModifiers);
        }
        Ok(Self {
            key: None,
            modifiers,
        })
    }

    pub fn key(&self) -> Option<Vk> {
        self.key
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn is_modifier_only(&self) -> bool {
        self.key.is_none()
    }

    /// Exact match: same main key and exactly the configured modifiers.
    pub fn matches(&self, pressed: Vk, ctrl: bool, alt: bool, shift: bool) -> bool {
        match self.key {
            Some(key) => key == pressed && self.modifiers == Modifiers::new(ctrl, alt, shift),
            None => false,
        }
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::with_capacity(4);
        if self.modifiers.ctrl {
            parts.push("Ctrl".into());
        }
        if self.modifiers.alt {
            parts.push("Alt".into());
        }
        if self.modifiers.shift {
            parts.push("Shift".into());
        }
        if let Some(key) = self.key {
            match keymap::key_name(key) {
                Some(name) => parts.push(name.to_string()),
                None => parts.push(format!("0x{:02X}", key)),
            }
        }
        write!(f, "{}", parts.join("+"))
    }
}

impl FromStr for Shortcut {
    type Err = ShortcutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ShortcutError::Empty);
        }

        let mut modifiers = Modifiers::none();
        let mut key = None;
        for token in s.split('+').map(str::trim) {
            if token.is_empty() {
                return Err(ShortcutError::UnknownToken(s.to_string()));
            }
            match token.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => modifiers.ctrl = true,
                "alt" | "menu" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                _ => {
                    let vk = keymap::key_from_name(token)
                        .or_else(|| parse_hex_vk(token))
                        .ok_or_else(|| ShortcutError::UnknownToken(token.to_string()))?;
                    if key.replace(vk).is_some() {
                        return Err(ShortcutError::DuplicateKey);
                    }
                }
            }
        }

        match key {
            Some(vk) => Ok(Shortcut::new(vk, modifiers)),
            None => Shortcut::modifier_only(modifiers),
        }
    }
}

fn parse_hex_vk(token: &str) -> Option<Vk> {
    let hex = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))?;
    let vk = u16::from_str_radix(hex, 16).ok()?;
    if keymap::is_modifier(vk) {
        return None;
    }
    Some(vk)
}

impl TryFrom<String> for Shortcut {
    type Error = ShortcutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Shortcut> for String {
    fn from(value: Shortcut) -> Self {
        value.to_string()
    }
}
