use crate::app_profile::{AppProfileSelector, DelayMs, InjectionMethod};
use crate::context::ShortcutSettings;
use crate::engine::{EngineOption, InputMethod, TransformationEngine};
use crate::shortcut::Shortcut;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub bracket_shortcut: bool,
    pub esc_restore: bool,
    pub english_auto_restore: bool,
    pub auto_capitalize: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            bracket_shortcut: false,
            esc_restore: true,
            english_auto_restore: false,
            auto_capitalize: false,
        }
    }
}

impl EngineOptions {
    pub fn get(&self, option: EngineOption) -> bool {
        match option {
            EngineOption::BracketShortcut => self.bracket_shortcut,
            EngineOption::EscRestore => self.esc_restore,
            EngineOption::EnglishAutoRestore => self.english_auto_restore,
            EngineOption::AutoCapitalize => self.auto_capitalize,
        }
    }
}

/// User settings that drive the hook. Stored as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub enabled: bool,
    pub input_method: InputMethod,
    pub modern_tone: bool,
    pub toggle_shortcut: Shortcut,
    pub restore_shortcut: Shortcut,
    pub restore_enabled: bool,
    pub options: EngineOptions,
    pub per_app_memory: bool,
    pub app_overrides: HashMap<String, InjectionMethod>,
    pub delays: HashMap<InjectionMethod, DelayMs>,
}

impl Default for Settings {
    fn default() -> Self {
        let shortcuts = ShortcutSettings::default();
        Self {
            enabled: true,
            input_method: InputMethod::Telex,
            modern_tone: false,
            toggle_shortcut: shortcuts.toggle,
            restore_shortcut: shortcuts.restore,
            restore_enabled: shortcuts.restore_enabled,
            options: EngineOptions::default(),
            per_app_memory: true,
            app_overrides: HashMap::new(),
            delays: HashMap::new(),
        }
    }
}

impl Settings {
    /// `<config dir>/retype/settings.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("retype").join("settings.json"))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        let settings = Self::from_json(&content)
            .with_context(|| format!("parsing settings in {}", path.display()))?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Missing file means defaults; a malformed file is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    pub fn shortcut_settings(&self) -> ShortcutSettings {
        ShortcutSettings {
            toggle: self.toggle_shortcut,
            restore: self.restore_shortcut,
            restore_enabled: self.restore_enabled,
        }
    }

    pub fn configure_engine(&self, engine: &mut dyn TransformationEngine) {
        engine.set_method(self.input_method);
        engine.set_tone_style(self.modern_tone);
        for option in EngineOption::ALL {
            engine.set_option(option, self.options.get(option));
        }
        engine.set_enabled(self.enabled);
        engine.clear();
    }

    pub fn configure_selector(&self, selector: &AppProfileSelector) {
        selector.set_app_overrides(&self.app_overrides);
        selector.set_delay_overrides(&self.delays);
    }
}
