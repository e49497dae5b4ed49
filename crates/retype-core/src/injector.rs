use crate::app_profile::{InjectionMethod, InjectionProfile};
use crate::keymap::{self, SC_BACKSPACE, VK_LEFT, VK_RETURN, VK_SHIFT};
use crate::types::SyntheticKey;
use std::time::Duration;
use tracing::trace;
use unicode_segmentation::UnicodeSegmentation;

/// Destination for synthetic key events.
pub trait InputSink: Send {
    /// Sends one batch in a single OS call. Failures are not reported.
    fn send(&mut self, batch: &[SyntheticKey]);

    fn pause(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// One step of an injection plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Send(Vec<SyntheticKey>),
    Pause(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Deleting,
    Waiting,
    Typing,
    TrailingNewline,
}

/// Splits a supplementary-plane code point into its UTF-16 surrogate pair.
/// Code points in the BMP come back as a single unit.
pub fn utf16_units(cp: u32) -> ([u16; 2], usize) {
    if cp <= 0xFFFF {
        return ([cp as u16, 0], 1);
    }
    let v = cp - 0x10000;
    let high = 0xD800 + (v >> 10) as u16;
    let low = 0xDC00 + (v & 0x3FF) as u16;
    ([high, low], 2)
}

/// Splits off one trailing line break (`\r\n`, `\n` or `\r`).
fn split_trailing_newline(text: &str) -> (&str, bool) {
    for suffix in ["\r\n", "\n", "\r"] {
        if let Some(body) = text.strip_suffix(suffix) {
            return (body, true);
        }
    }
    (text, false)
}

struct Planner {
    steps: Vec<Step>,
    pending: Vec<SyntheticKey>,
    phase: Phase,
}

impl Planner {
    fn new() -> Self {
        Self {
            steps: Vec::new(),
            pending: Vec::new(),
            phase: Phase::Idle,
        }
    }

    fn enter(&mut self, phase: Phase) {
        trace!(from = ?self.phase, to = ?phase, "Injection phase");
        self.phase = phase;
    }

    fn push(&mut self, key: SyntheticKey) {
        self.pending.push(key);
    }

    fn flush(&mut self) {
        if !self.pending.is_empty() {
            self.steps.push(Step::Send(std::mem::take(&mut self.pending)));
        }
    }

    fn pause(&mut self, d: Duration) {
        self.flush();
        if !d.is_zero() {
            self.steps.push(Step::Pause(d));
        }
    }

    fn finish(mut self) -> Vec<Step> {
        self.flush();
        self.enter(Phase::Idle);
        self.steps
    }
}

/// Builds and delivers the corrected keystroke sequence: deletions, an
/// optional wait, the replacement text, and a trailing line break.
#[derive(Debug, Clone, Copy)]
pub struct TextInjector {
    marker: usize,
}

impl TextInjector {
    pub const fn new(marker: usize) -> Self {
        Self { marker }
    }

    pub fn marker(&self) -> usize {
        self.marker
    }

    pub fn inject(
        &self,
        sink: &mut dyn InputSink,
        text: &str,
        backspace_count: u32,
        profile: &InjectionProfile,
    ) {
        for step in self.plan(text, backspace_count, profile) {
            match step {
                Step::Send(batch) => sink.send(&batch),
                Step::Pause(d) => sink.pause(d),
            }
        }
    }

    pub fn plan(&self, text: &str, backspace_count: u32, profile: &InjectionProfile) -> Vec<Step> {
        let mut p = Planner::new();
        let per_key = profile.method == InjectionMethod::CharByChar;
        let (body, newline) = split_trailing_newline(text);
        let text_follows = !body.is_empty() || newline;

        if backspace_count > 0 {
            p.enter(Phase::Deleting);
            for i in 0..backspace_count {
                match profile.method {
                    InjectionMethod::Selection => self.push_select_left(&mut p),
                    _ => self.push_delete(&mut p),
                }
                let last = i + 1 == backspace_count;
                if per_key {
                    p.flush();
                }
                if !last && !profile.backspace_delay.is_zero() {
                    p.pause(profile.backspace_delay);
                }
            }

            // A selection only goes away once something is typed over it.
            if profile.method == InjectionMethod::Selection && !text_follows {
                self.push_delete(&mut p);
            }

            if text_follows && !profile.inter_delay.is_zero() {
                p.enter(Phase::Waiting);
                p.pause(profile.inter_delay);
            }
        }

        if !body.is_empty() {
            p.enter(Phase::Typing);
            let clusters: Vec<&str> = body.graphemes(true).collect();
            for (i, cluster) in clusters.iter().enumerate() {
                self.push_cluster(&mut p, cluster);
                let last = i + 1 == clusters.len();
                if per_key {
                    p.flush();
                }
                if !last && !profile.text_delay.is_zero() {
                    p.pause(profile.text_delay);
                }
            }
        }

        if newline {
            // Sent on its own, right after the text, never paced.
            p.flush();
            p.enter(Phase::TrailingNewline);
            let ext = keymap::is_extended(VK_RETURN);
            p.push(SyntheticKey::virtual_key(VK_RETURN, ext, false, self.marker));
            p.push(SyntheticKey::virtual_key(VK_RETURN, ext, true, self.marker));
        }

        p.finish()
    }

    fn push_delete(&self, p: &mut Planner) {
        p.push(SyntheticKey::scan_code(SC_BACKSPACE, false, self.marker));
        p.push(SyntheticKey::scan_code(SC_BACKSPACE, true, self.marker));
    }

    fn push_select_left(&self, p: &mut Planner) {
        let shift_ext = keymap::is_extended(VK_SHIFT);
        let left_ext = keymap::is_extended(VK_LEFT);
        p.push(SyntheticKey::virtual_key(VK_SHIFT, shift_ext, false, self.marker));
        p.push(SyntheticKey::virtual_key(VK_LEFT, left_ext, false, self.marker));
        p.push(SyntheticKey::virtual_key(VK_LEFT, left_ext, true, self.marker));
        p.push(SyntheticKey::virtual_key(VK_SHIFT, shift_ext, true, self.marker));
    }

    fn push_cluster(&self, p: &mut Planner, cluster: &str) {
        for c in cluster.chars() {
            let (units, len) = utf16_units(u32::from(c));
            for &unit in &units[..len] {
                p.push(SyntheticKey::unicode(unit, false, self.marker));
                p.push(SyntheticKey::unicode(unit, true, self.marker));
            }
        }
    }
}
