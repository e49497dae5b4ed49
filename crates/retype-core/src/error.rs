use thiserror::Error;

/// Failures installing or removing the OS hooks. Fatal at start-up.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("failed to install keyboard hook: {0}")]
    InstallFailed(String),

    #[error("failed to install foreground-change hook: {0}")]
    ForegroundHook(String),

    #[error("global keyboard hook is not supported on this platform")]
    Unsupported,
}

/// Failures from a single call into the transformation engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("engine call failed: {0}")]
    Call(String),

    #[error("engine panicked during process_key")]
    Panicked,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShortcutError {
    #[error("shortcut is empty")]
    Empty,

    #[error("unknown key in shortcut: {0:?}")]
    UnknownToken(String),

    #[error("shortcut names more than one main key")]
    DuplicateKey,

    #[error("a modifier-only shortcut needs at least two modifiers")]
    TooFewModifiers,
}
