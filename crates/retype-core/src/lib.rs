pub mod app_profile;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod injector;
pub mod interceptor;
pub mod keymap;
pub mod shortcut;
pub mod types;

#[cfg(windows)]
pub mod foreground;
#[cfg(windows)]
pub mod keyboard_hook;

pub use app_profile::{AppProfileSelector, ForegroundProbe, InjectionMethod, InjectionProfile};
pub use context::{HookContext, Notification, ShortcutSettings, INJECTED_MARKER};
pub use engine::{EngineAction, EngineResult, TransformationEngine};
pub use injector::{InputSink, TextInjector};
pub use interceptor::{KeyInterceptor, KeyboardState};
pub use shortcut::Shortcut;
pub use types::{KeyAction, KeyEvent, Modifiers, SyntheticKey};
