use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Maximum number of code points a single engine result may carry.
pub const MAX_RESULT_CHARS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputMethod {
    #[default]
    Telex,
    Vni,
}

impl InputMethod {
    pub fn as_raw(self) -> u8 {
        match self {
            InputMethod::Telex => 0,
            InputMethod::Vni => 1,
        }
    }
}

/// Boolean engine options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineOption {
    BracketShortcut,
    EscRestore,
    EnglishAutoRestore,
    AutoCapitalize,
}

impl EngineOption {
    pub const ALL: [EngineOption; 4] = [
        EngineOption::BracketShortcut,
        EngineOption::EscRestore,
        EngineOption::EnglishAutoRestore,
        EngineOption::AutoCapitalize,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EngineOption::BracketShortcut => "bracket_shortcut",
            EngineOption::EscRestore => "esc_restore",
            EngineOption::EnglishAutoRestore => "english_auto_restore",
            EngineOption::AutoCapitalize => "auto_capitalize",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineAction {
    #[default]
    None,
    Send,
    Restore,
}

impl EngineAction {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => EngineAction::Send,
            2 => EngineAction::Restore,
            _ => EngineAction::None,
        }
    }
}

/// Result of one `process_key` call. Owned by the caller and dropped after use.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngineResult {
    pub action: EngineAction,
    pub backspace_count: u8,
    pub codepoints: Vec<u32>,
}

impl EngineResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn send(backspace_count: u8, text: &str) -> Self {
        Self {
            action: EngineAction::Send,
            backspace_count,
            codepoints: text.chars().map(u32::from).collect(),
        }
    }

    pub fn restore(backspace_count: u8, text: &str) -> Self {
        Self {
            action: EngineAction::Restore,
            ..Self::send(backspace_count, text)
        }
    }

    /// True when the engine asks for the physical key to be replaced.
    pub fn is_replacement(&self) -> bool {
        self.action != EngineAction::None
            && (self.backspace_count > 0 || !self.codepoints.is_empty())
    }

    /// Decodes the code points, dropping anything that is not a Unicode
    /// scalar value.
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.codepoints.len());
        for &cp in self.codepoints.iter().take(MAX_RESULT_CHARS) {
            match char::from_u32(cp) {
                Some(c) => out.push(c),
                None => warn!("Dropping invalid code point from engine: 0x{:X}", cp),
            }
        }
        out
    }
}

/// The opaque text-transformation engine.
///
/// Key numbers use the engine's own numbering; see [`crate::keymap::to_engine_key`].
pub trait TransformationEngine: Send {
    fn init(&mut self);
    fn clear(&mut self);
    fn set_method(&mut self, method: InputMethod);
    fn set_enabled(&mut self, enabled: bool);
    fn set_tone_style(&mut self, modern: bool);
    fn set_option(&mut self, option: EngineOption, value: bool);
    fn process_key(
        &mut self,
        key: u16,
        shift: bool,
        caps_lock: bool,
    ) -> Result<EngineResult, EngineError>;
}

/// Engine that never transforms anything. Used when no native engine is linked.
#[derive(Debug, Default)]
pub struct NullEngine;

impl TransformationEngine for NullEngine {
    fn init(&mut self) {}
    fn clear(&mut self) {}
    fn set_method(&mut self, _method: InputMethod) {}
    fn set_enabled(&mut self, _enabled: bool) {}
    fn set_tone_style(&mut self, _modern: bool) {}
    fn set_option(&mut self, _option: EngineOption, _value: bool) {}

    fn process_key(&mut self, _key: u16, _shift: bool, _caps: bool) -> Result<EngineResult, EngineError> {
        Ok(EngineResult::none())
    }
}

#[cfg(feature = "native-engine")]
pub mod native {
    //! Binding to the native engine's C ABI.

    use super::*;

    #[repr(C)]
    pub struct ImeResult {
        pub chars: [u32; MAX_RESULT_CHARS],
        pub action: u8,
        pub backspace: u8,
        pub count: u8,
        pub _pad: u8,
    }

    #[link(name = "ime_core")]
    extern "C" {
        fn ime_init();
        fn ime_clear();
        fn ime_method(method: u8);
        fn ime_enabled(enabled: bool);
        fn ime_modern(modern: bool);
        fn ime_bracket_shortcut(enabled: bool);
        fn ime_esc_restore(enabled: bool);
        fn ime_english_auto_restore(enabled: bool);
        fn ime_auto_capitalize(enabled: bool);
        fn ime_key_ext(key: u16, caps: bool, ctrl: bool, shift: bool) -> *mut ImeResult;
        fn ime_free(result: *mut ImeResult);
    }

    /// The engine library keeps process-global state, so only one of these
    /// should exist.
    #[derive(Debug, Default)]
    pub struct NativeEngine {
        _private: (),
    }

    impl NativeEngine {
        pub fn new() -> Self {
            Self { _private: () }
        }
    }

    impl TransformationEngine for NativeEngine {
        fn init(&mut self) {
            unsafe { ime_init() }
        }

        fn clear(&mut self) {
            unsafe { ime_clear() }
        }

        fn set_method(&mut self, method: InputMethod) {
            unsafe { ime_method(method.as_raw()) }
        }

        fn set_enabled(&mut self, enabled: bool) {
            unsafe { ime_enabled(enabled) }
        }

        fn set_tone_style(&mut self, modern: bool) {
            unsafe { ime_modern(modern) }
        }

        fn set_option(&mut self, option: EngineOption, value: bool) {
            unsafe {
                match option {
                    EngineOption::BracketShortcut => ime_bracket_shortcut(value),
                    EngineOption::EscRestore => ime_esc_restore(value),
                    EngineOption::EnglishAutoRestore => ime_english_auto_restore(value),
                    EngineOption::AutoCapitalize => ime_auto_capitalize(value),
                }
            }
        }

        fn process_key(
            &mut self,
            key: u16,
            shift: bool,
            caps_lock: bool,
        ) -> Result<EngineResult, EngineError> {
            let ptr = unsafe { ime_key_ext(key, caps_lock, false, shift) };
            if ptr.is_null() {
                return Err(EngineError::Call("ime_key_ext returned null".into()));
            }

            // SAFETY: non-null pointers from ime_key_ext stay valid until ime_free.
            let result = unsafe {
                let raw = &*ptr;
                let count = (raw.count as usize).min(MAX_RESULT_CHARS);
                EngineResult {
                    action: EngineAction::from_raw(raw.action),
                    backspace_count: raw.backspace,
                    codepoints: raw.chars[..count].to_vec(),
                }
            };
            unsafe { ime_free(ptr) };
            Ok(result)
        }
    }
}
