#![allow(dead_code)]

use parking_lot::Mutex;
use retype_core::app_profile::ForegroundProbe;
use retype_core::context::HookContext;
use retype_core::engine::{EngineOption, EngineResult, InputMethod, TransformationEngine};
use retype_core::error::EngineError;
use retype_core::injector::{InputSink, Step};
use retype_core::interceptor::{KeyInterceptor, KeyboardState};
use retype_core::keymap;
use retype_core::types::{KeyAction, KeyEvent, SyntheticKey, Vk};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Clear,
    Enabled(bool),
    Key { key: u16, shift: bool, caps: bool },
}

/// Engine returning queued results and recording every call.
#[derive(Clone, Default)]
pub struct ScriptedEngine {
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub results: Arc<Mutex<VecDeque<Result<EngineResult, EngineError>>>>,
    /// When set, records whether this flag was raised during each key call.
    pub busy_probe: Arc<Mutex<Option<(Arc<AtomicBool>, Vec<bool>)>>>,
}

impl ScriptedEngine {
    pub fn push(&self, result: EngineResult) {
        self.results.lock().push_back(Ok(result));
    }

    pub fn push_err(&self, err: EngineError) {
        self.results.lock().push_back(Err(err));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn key_calls(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, Call::Key { .. }))
            .count()
    }

    pub fn clears(&self) -> usize {
        self.calls.lock().iter().filter(|c| **c == Call::Clear).count()
    }
}

impl TransformationEngine for ScriptedEngine {
    fn init(&mut self) {}

    fn clear(&mut self) {
        self.calls.lock().push(Call::Clear);
    }

    fn set_method(&mut self, _method: InputMethod) {}

    fn set_enabled(&mut self, enabled: bool) {
        self.calls.lock().push(Call::Enabled(enabled));
    }

    fn set_tone_style(&mut self, _modern: bool) {}

    fn set_option(&mut self, _option: EngineOption, _value: bool) {}

    fn process_key(&mut self, key: u16, shift: bool, caps: bool) -> Result<EngineResult, EngineError> {
        self.calls.lock().push(Call::Key { key, shift, caps });
        if let Some((flag, seen)) = self.busy_probe.lock().as_mut() {
            seen.push(flag.load(Ordering::SeqCst));
        }
        self.results
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(EngineResult::none()))
    }
}

/// Keyboard whose pressed set lags one event behind, like `GetAsyncKeyState`
/// inside a low-level hook.
#[derive(Clone, Default)]
pub struct FakeKeyboard {
    pub pressed: Arc<Mutex<HashSet<Vk>>>,
    pub caps: Arc<AtomicBool>,
}

impl FakeKeyboard {
    pub fn apply(&self, event: &KeyEvent) {
        let mut pressed = self.pressed.lock();
        if event.is_down() {
            pressed.insert(event.vk);
        } else {
            pressed.remove(&event.vk);
        }
    }
}

impl KeyboardState for FakeKeyboard {
    fn is_pressed(&self, vk: Vk) -> bool {
        let pressed = self.pressed.lock();
        match vk {
            keymap::VK_CONTROL => pressed.iter().any(|&k| keymap::is_ctrl(k)),
            keymap::VK_MENU => pressed.iter().any(|&k| keymap::is_alt(k)),
            keymap::VK_SHIFT => pressed.iter().any(|&k| keymap::is_shift(k)),
            _ => pressed.contains(&vk),
        }
    }

    fn caps_lock(&self) -> bool {
        self.caps.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Default)]
pub struct RecordingSink {
    pub steps: Arc<Mutex<Vec<Step>>>,
}

impl RecordingSink {
    pub fn steps(&self) -> Vec<Step> {
        self.steps.lock().clone()
    }

    pub fn events(&self) -> Vec<SyntheticKey> {
        self.steps
            .lock()
            .iter()
            .filter_map(|s| match s {
                Step::Send(batch) => Some(batch.clone()),
                Step::Pause(_) => None,
            })
            .flatten()
            .collect()
    }
}

impl InputSink for RecordingSink {
    fn send(&mut self, batch: &[SyntheticKey]) {
        self.steps.lock().push(Step::Send(batch.to_vec()));
    }

    fn pause(&mut self, duration: Duration) {
        self.steps.lock().push(Step::Pause(duration));
    }
}

#[derive(Clone, Default)]
pub struct FakeProbe {
    pub name: Arc<Mutex<Option<String>>>,
}

impl FakeProbe {
    pub fn set(&self, name: &str) {
        *self.name.lock() = Some(name.to_string());
    }
}

impl ForegroundProbe for FakeProbe {
    fn foreground_process(&self) -> Option<String> {
        self.name.lock().clone()
    }
}

pub struct Harness {
    pub interceptor: KeyInterceptor,
    pub engine: ScriptedEngine,
    pub keyboard: FakeKeyboard,
    pub sink: RecordingSink,
    pub probe: FakeProbe,
    pub ctx: Arc<HookContext>,
}

impl Harness {
    pub fn new() -> Self {
        let engine = ScriptedEngine::default();
        let keyboard = FakeKeyboard::default();
        let sink = RecordingSink::default();
        let probe = FakeProbe::default();
        let ctx = Arc::new(HookContext::new(Box::new(probe.clone())));
        let interceptor = KeyInterceptor::new(
            ctx.clone(),
            Box::new(engine.clone()),
            Box::new(keyboard.clone()),
            Box::new(sink.clone()),
        );
        Self {
            interceptor,
            engine,
            keyboard,
            sink,
            probe,
            ctx,
        }
    }

    /// Feeds one event, then updates the fake keyboard state.
    pub fn feed(&mut self, event: KeyEvent) -> KeyAction {
        let action = self.interceptor.handle(&event);
        self.keyboard.apply(&event);
        action
    }

    pub fn down(&mut self, vk: Vk) -> KeyAction {
        self.feed(KeyEvent::down(vk))
    }

    pub fn up(&mut self, vk: Vk) -> KeyAction {
        self.feed(KeyEvent::up(vk))
    }

    pub fn tap(&mut self, vk: Vk) -> KeyAction {
        let action = self.down(vk);
        self.up(vk);
        action
    }
}
