use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// How long a foreground detection stays valid.
pub const PROFILE_CACHE_TTL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InjectionMethod {
    /// One batched send per phase, no pacing.
    #[default]
    Fast,
    /// Terminals and Electron apps with asynchronous input queues.
    Slow,
    /// Browsers: select-left and overwrite instead of backspacing.
    Selection,
    /// Apps that drop batched synthetic input.
    CharByChar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectionProfile {
    pub method: InjectionMethod,
    pub backspace_delay: Duration,
    pub inter_delay: Duration,
    pub text_delay: Duration,
}

impl InjectionProfile {
    pub const fn new(
        method: InjectionMethod,
        backspace_ms: u64,
        inter_ms: u64,
        text_ms: u64,
    ) -> Self {
        Self {
            method,
            backspace_delay: Duration::from_millis(backspace_ms),
            inter_delay: Duration::from_millis(inter_ms),
            text_delay: Duration::from_millis(text_ms),
        }
    }

    pub const fn for_method(method: InjectionMethod) -> Self {
        match method {
            InjectionMethod::Fast => Self::new(method, 0, 0, 0),
            InjectionMethod::Slow => Self::new(method, 3, 8, 3),
            InjectionMethod::Selection => Self::new(method, 0, 5, 0),
            InjectionMethod::CharByChar => Self::new(method, 2, 5, 2),
        }
    }
}

impl Default for InjectionProfile {
    fn default() -> Self {
        Self::for_method(InjectionMethod::Fast)
    }
}

/// Delay overrides for one injection method, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayMs {
    pub backspace_ms: u64,
    pub inter_ms: u64,
    pub text_ms: u64,
}

/// Process names (lowercase, without extension) with a known-good method.
pub const APP_METHODS: &[(&str, InjectionMethod)] = &[
    // Terminals
    ("windowsterminal", InjectionMethod::Slow),
    ("wt", InjectionMethod::Slow),
    ("cmd", InjectionMethod::Slow),
    ("conhost", InjectionMethod::Slow),
    ("powershell", InjectionMethod::Slow),
    ("pwsh", InjectionMethod::Slow),
    ("mintty", InjectionMethod::Slow),
    ("alacritty", InjectionMethod::Slow),
    ("wezterm-gui", InjectionMethod::Slow),
    // Electron editors and chat apps
    ("code", InjectionMethod::Slow),
    ("code - insiders", InjectionMethod::Slow),
    ("cursor", InjectionMethod::Slow),
    ("windsurf", InjectionMethod::Slow),
    ("slack", InjectionMethod::Slow),
    ("discord", InjectionMethod::Slow),
    ("teams", InjectionMethod::Slow),
    ("ms-teams", InjectionMethod::Slow),
    ("notion", InjectionMethod::Slow),
    ("obsidian", InjectionMethod::Slow),
    ("zalo", InjectionMethod::Slow),
    ("messenger", InjectionMethod::Slow),
    ("whatsapp", InjectionMethod::Slow),
    ("figma", InjectionMethod::Slow),
    ("postman", InjectionMethod::Slow),
    // Browsers
    ("chrome", InjectionMethod::Selection),
    ("msedge", InjectionMethod::Selection),
    ("firefox", InjectionMethod::Selection),
    ("brave", InjectionMethod::Selection),
    ("opera", InjectionMethod::Selection),
    ("vivaldi", InjectionMethod::Selection),
    ("arc", InjectionMethod::Selection),
    ("browser", InjectionMethod::Selection), // Coc Coc
    // Remote consoles
    ("mstsc", InjectionMethod::CharByChar),
    ("vmconnect", InjectionMethod::CharByChar),
];

/// Normalises a process name or image path to a lowercase stem.
pub fn normalize_process_name(name: &str) -> String {
    let file = name.rsplit(['\\', '/']).next().unwrap_or(name);
    let lower = file.trim().to_lowercase();
    match lower.strip_suffix(".exe") {
        Some(stem) => stem.to_string(),
        None => lower,
    }
}

pub fn classify_builtin(process: &str) -> InjectionMethod {
    let name = normalize_process_name(process);
    APP_METHODS
        .iter()
        .find(|(app, _)| *app == name)
        .map(|(_, method)| *method)
        .unwrap_or_default()
}

/// Source of the foreground application's process name.
pub trait ForegroundProbe: Send + Sync {
    /// `None` when the foreground window or its process cannot be resolved.
    fn foreground_process(&self) -> Option<String>;
}

/// Probe that never resolves anything; every app gets the default profile.
#[derive(Debug, Default)]
pub struct NoForeground;

impl ForegroundProbe for NoForeground {
    fn foreground_process(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone)]
struct CachedProfile {
    process: Option<String>,
    profile: InjectionProfile,
    at: Instant,
}

/// Maps the foreground application to an injection profile, with a short
/// time-to-live cache. Safe to call from the hook thread and from the
/// foreground-change path at the same time.
pub struct AppProfileSelector {
    probe: Box<dyn ForegroundProbe>,
    ttl: Duration,
    app_overrides: RwLock<HashMap<String, InjectionMethod>>,
    delay_overrides: RwLock<HashMap<InjectionMethod, DelayMs>>,
    cache: Mutex<Option<CachedProfile>>,
}

impl AppProfileSelector {
    pub fn new(probe: Box<dyn ForegroundProbe>) -> Self {
        Self::with_ttl(probe, PROFILE_CACHE_TTL)
    }

    pub fn with_ttl(probe: Box<dyn ForegroundProbe>, ttl: Duration) -> Self {
        Self {
            probe,
            ttl,
            app_overrides: RwLock::new(HashMap::new()),
            delay_overrides: RwLock::new(HashMap::new()),
            cache: Mutex::new(None),
        }
    }

    /// Replaces the user's per-app method table.
    pub fn set_app_overrides(&self, overrides: &HashMap<String, InjectionMethod>) {
        *self.app_overrides.write() = overrides
            .iter()
            .map(|(app, method)| (normalize_process_name(app), *method))
            .collect();
        self.invalidate();
    }

    pub fn set_delay_overrides(&self, overrides: &HashMap<InjectionMethod, DelayMs>) {
        *self.delay_overrides.write() = overrides.clone();
        self.invalidate();
    }

    pub fn classify(&self, process: &str) -> InjectionMethod {
        let name = normalize_process_name(process);
        if let Some(method) = self.app_overrides.read().get(&name) {
            return *method;
        }
        classify_builtin(&name)
    }

    pub fn profile_for(&self, method: InjectionMethod) -> InjectionProfile {
        match self.delay_overrides.read().get(&method) {
            Some(d) => InjectionProfile::new(method, d.backspace_ms, d.inter_ms, d.text_ms),
            None => InjectionProfile::for_method(method),
        }
    }

    pub fn detect(&self) -> InjectionProfile {
        self.detect_at(Instant::now())
    }

    pub fn detect_at(&self, now: Instant) -> InjectionProfile {
        self.refresh(now).profile
    }

    /// Process name from the last detection (refreshing it if stale).
    pub fn current_process(&self) -> Option<String> {
        self.refresh(Instant::now()).process
    }

    pub fn invalidate(&self) {
        *self.cache.lock() = None;
    }

    fn refresh(&self, now: Instant) -> CachedProfile {
        let mut cache = self.cache.lock();
        if let Some(cached) = cache.as_ref() {
            if now.saturating_duration_since(cached.at) < self.ttl {
                return cached.clone();
            }
        }

        let process = self
            .probe
            .foreground_process()
            .map(|p| normalize_process_name(&p));
        let method = match &process {
            Some(name) => self.classify(name),
            None => InjectionMethod::Fast,
        };
        let profile = self.profile_for(method);
        debug!(?process, ?method, "Foreground profile detected");

        let fresh = CachedProfile {
            process,
            profile,
            at: now,
        };
        *cache = Some(fresh.clone());
        fresh
    }
}

/// Remembers the enabled state per application.
#[derive(Debug, Default, Clone)]
pub struct AppStateMemory {
    states: HashMap<String, bool>,
}

impl AppStateMemory {
    pub fn remember(&mut self, process: &str, enabled: bool) {
        self.states.insert(normalize_process_name(process), enabled);
    }

    pub fn recall(&self, process: &str) -> Option<bool> {
        self.states.get(&normalize_process_name(process)).copied()
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingProbe {
        name: Arc<Mutex<Option<String>>>,
        calls: Arc<AtomicUsize>,
    }

    impl ForegroundProbe for CountingProbe {
        fn foreground_process(&self) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.name.lock().clone()
        }
    }

    fn selector(name: &str) -> (AppProfileSelector, Arc<Mutex<Option<String>>>, Arc<AtomicUsize>) {
        let name = Arc::new(Mutex::new(Some(name.to_string())));
        let calls = Arc::new(AtomicUsize::new(0));
        let probe = CountingProbe {
            name: name.clone(),
            calls: calls.clone(),
        };
        (AppProfileSelector::new(Box::new(probe)), name, calls)
    }

    #[test]
    fn test_normalize_process_name() {
        assert_eq!(
            normalize_process_name(r"C:\Program Files\Google\Chrome\Application\CHROME.EXE"),
            "chrome"
        );
        assert_eq!(normalize_process_name("WindowsTerminal.exe"), "windowsterminal");
        assert_eq!(normalize_process_name("/usr/bin/alacritty"), "alacritty");
    }

    #[test]
    fn test_builtin_classification() {
        assert_eq!(classify_builtin("Code.exe"), InjectionMethod::Slow);
        assert_eq!(classify_builtin("msedge.exe"), InjectionMethod::Selection);
        assert_eq!(classify_builtin("mstsc.exe"), InjectionMethod::CharByChar);
        assert_eq!(classify_builtin("notepad.exe"), InjectionMethod::Fast);
    }

    #[test]
    fn test_cache_respects_ttl() {
        let (sel, name, calls) = selector("chrome.exe");
        let t0 = Instant::now();

        assert_eq!(sel.detect_at(t0).method, InjectionMethod::Selection);
        *name.lock() = Some("code.exe".into());
        assert_eq!(
            sel.detect_at(t0 + Duration::from_millis(499)).method,
            InjectionMethod::Selection
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(
            sel.detect_at(t0 + Duration::from_millis(500)).method,
            InjectionMethod::Slow
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_invalidate_forces_requery() {
        let (sel, name, calls) = selector("chrome.exe");
        let t0 = Instant::now();
        sel.detect_at(t0);
        *name.lock() = Some("cmd.exe".into());
        sel.invalidate();
        assert_eq!(sel.detect_at(t0).method, InjectionMethod::Slow);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_detection_failure_falls_back_to_fast() {
        let sel = AppProfileSelector::new(Box::new(NoForeground));
        assert_eq!(sel.detect(), InjectionProfile::for_method(InjectionMethod::Fast));
        assert_eq!(sel.current_process(), None);
    }

    #[test]
    fn test_overrides() {
        let (sel, _, _) = selector("Notepad.exe");
        let mut apps = HashMap::new();
        apps.insert("NOTEPAD.exe".to_string(), InjectionMethod::CharByChar);
        sel.set_app_overrides(&apps);

        let mut delays = HashMap::new();
        delays.insert(
            InjectionMethod::CharByChar,
            DelayMs {
                backspace_ms: 7,
                inter_ms: 11,
                text_ms: 13,
            },
        );
        sel.set_delay_overrides(&delays);

        let p = sel.detect();
        assert_eq!(p.method, InjectionMethod::CharByChar);
        assert_eq!(p.backspace_delay, Duration::from_millis(7));
        assert_eq!(p.inter_delay, Duration::from_millis(11));
        assert_eq!(p.text_delay, Duration::from_millis(13));
    }

    #[test]
    fn test_app_state_memory() {
        let mut mem = AppStateMemory::default();
        assert_eq!(mem.recall("code"), None);
        mem.remember("Code.exe", false);
        assert_eq!(mem.recall("code"), Some(false));
        mem.remember("code", true);
        assert_eq!(mem.recall("CODE.EXE"), Some(true));
    }
}
