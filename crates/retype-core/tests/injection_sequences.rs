mod common;

use common::Harness;
use retype_core::app_profile::{InjectionMethod, InjectionProfile};
use retype_core::context::INJECTED_MARKER;
use retype_core::engine::EngineResult;
use retype_core::injector::{Step, TextInjector};
use retype_core::keymap::{SC_BACKSPACE, VK_RETURN};
use retype_core::types::{KeyAction, KeyPayload, SyntheticKey};
use std::time::Duration;

const VK_A: u16 = 0x41;

fn unicode_pair(unit: u16) -> [SyntheticKey; 2] {
    [
        SyntheticKey::unicode(unit, false, INJECTED_MARKER),
        SyntheticKey::unicode(unit, true, INJECTED_MARKER),
    ]
}

fn delete_pair() -> [SyntheticKey; 2] {
    [
        SyntheticKey::scan_code(SC_BACKSPACE, false, INJECTED_MARKER),
        SyntheticKey::scan_code(SC_BACKSPACE, true, INJECTED_MARKER),
    ]
}

fn enter_pair() -> [SyntheticKey; 2] {
    [
        SyntheticKey::virtual_key(VK_RETURN, false, false, INJECTED_MARKER),
        SyntheticKey::virtual_key(VK_RETURN, false, true, INJECTED_MARKER),
    ]
}

#[test]
fn fast_replacement_is_one_batch() {
    let mut h = Harness::new();
    h.probe.set("notepad.exe");
    h.engine.push(EngineResult::send(2, "abc"));

    assert_eq!(h.down(VK_A), KeyAction::Block);

    let steps = h.sink.steps();
    assert_eq!(steps.len(), 1);
    let mut expected = Vec::new();
    expected.extend(delete_pair());
    expected.extend(delete_pair());
    for c in "abc".encode_utf16() {
        expected.extend(unicode_pair(c));
    }
    assert_eq!(steps[0], Step::Send(expected));
}

#[test]
fn supplementary_plane_is_sent_as_surrogates() {
    let mut h = Harness::new();
    h.engine.push(EngineResult::send(0, "\u{1F600}"));

    assert_eq!(h.down(VK_A), KeyAction::Block);

    let mut expected = Vec::new();
    expected.extend(unicode_pair(0xD83D));
    expected.extend(unicode_pair(0xDE00));
    assert_eq!(h.sink.events(), expected);
}

#[test]
fn combining_cluster_keeps_every_code_point() {
    let mut h = Harness::new();
    // a + combining circumflex + combining acute: one cluster.
    h.engine.push(EngineResult::send(1, "a\u{0302}\u{0301}"));
    h.down(VK_A);

    let units: Vec<u16> = h
        .sink
        .events()
        .iter()
        .filter_map(|k| match k.payload {
            KeyPayload::Unicode(u) if !k.up => Some(u),
            _ => None,
        })
        .collect();
    assert_eq!(units, vec![0x61, 0x0302, 0x0301]);
}

#[test]
fn slow_profile_paces_text_and_sends_newline_alone() {
    let mut h = Harness::new();
    h.probe.set("cmd.exe");
    h.engine.push(EngineResult::send(0, "ok\n"));

    assert_eq!(h.down(VK_RETURN), KeyAction::Block);

    let text_delay = InjectionProfile::for_method(InjectionMethod::Slow).text_delay;
    assert_eq!(
        h.sink.steps(),
        vec![
            Step::Send(unicode_pair(u16::from(b'o')).to_vec()),
            Step::Pause(text_delay),
            Step::Send(unicode_pair(u16::from(b'k')).to_vec()),
            Step::Send(enter_pair().to_vec()),
        ]
    );
}

#[test]
fn slow_profile_waits_between_deletes_and_text() {
    let mut h = Harness::new();
    h.probe.set("WindowsTerminal.exe");
    h.engine.push(EngineResult::send(2, "ê"));
    h.down(VK_A);

    let slow = InjectionProfile::for_method(InjectionMethod::Slow);
    assert_eq!(
        h.sink.steps(),
        vec![
            Step::Send(delete_pair().to_vec()),
            Step::Pause(slow.backspace_delay),
            Step::Send(delete_pair().to_vec()),
            Step::Pause(slow.inter_delay),
            Step::Send(unicode_pair(0xEA).to_vec()),
        ]
    );
}

#[test]
fn char_by_char_sends_each_unit_separately() {
    let injector = TextInjector::new(INJECTED_MARKER);
    let profile = InjectionProfile::new(InjectionMethod::CharByChar, 0, 0, 0);
    let steps = injector.plan("xy", 1, &profile);

    assert_eq!(
        steps,
        vec![
            Step::Send(delete_pair().to_vec()),
            Step::Send(unicode_pair(u16::from(b'x')).to_vec()),
            Step::Send(unicode_pair(u16::from(b'y')).to_vec()),
        ]
    );
}

#[test]
fn deletion_only_result_sends_no_text() {
    let mut h = Harness::new();
    h.engine.push(EngineResult::restore(3, ""));
    assert_eq!(h.down(VK_A), KeyAction::Block);
    let events = h.sink.events();
    assert_eq!(events.len(), 6);
    assert!(events
        .iter()
        .all(|k| k.payload == KeyPayload::ScanCode(SC_BACKSPACE)));
}

#[test]
fn browser_deletion_only_clears_the_selection() {
    let mut h = Harness::new();
    h.probe.set("msedge.exe");
    h.engine.push(EngineResult::restore(2, ""));
    assert_eq!(h.down(VK_A), KeyAction::Block);

    let steps = h.sink.steps();
    assert!(matches!(steps.last(), Some(Step::Send(_))));
    let events = h.sink.events();
    assert_eq!(events.len(), 2 * 4 + 2);
    assert_eq!(&events[8..], &delete_pair());
}

#[test]
fn empty_result_leaves_key_alone() {
    let mut h = Harness::new();
    h.engine.push(EngineResult::send(0, ""));
    assert_eq!(h.down(VK_A), KeyAction::Pass);
    assert!(h.sink.steps().is_empty());
}

#[test]
fn pauses_never_trail_the_last_step() {
    let injector = TextInjector::new(INJECTED_MARKER);
    let profile = InjectionProfile::new(InjectionMethod::Slow, 4, 0, 4);
    let steps = injector.plan("ab", 2, &profile);

    assert!(matches!(steps.last(), Some(Step::Send(_))));
    let pauses: Vec<_> = steps
        .iter()
        .filter_map(|s| match s {
            Step::Pause(d) => Some(*d),
            _ => None,
        })
        .collect();
    assert_eq!(pauses, vec![Duration::from_millis(4), Duration::from_millis(4)]);
}
