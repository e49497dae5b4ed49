use crate::context::HookContext;
use crate::error::HookError;
use crate::foreground;
use crate::injector::InputSink;
use crate::interceptor::{KeyInterceptor, KeyboardState};
use crate::keymap::VK_CAPITAL;
use crate::types::{KeyAction, KeyEdge, KeyEvent, KeyPayload, SyntheticKey, Vk};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, trace};
use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Accessibility::HWINEVENTHOOK;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, GetKeyState, SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT,
    KEYBD_EVENT_FLAGS, KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, KEYEVENTF_SCANCODE,
    KEYEVENTF_UNICODE, VIRTUAL_KEY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PeekMessageW, PostThreadMessageW,
    SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx, HHOOK, KBDLLHOOKSTRUCT,
    LLKHF_INJECTED, MSG, PEEK_MESSAGE_REMOVE_TYPE, WH_KEYBOARD_LL, WM_KEYUP, WM_QUIT,
    WM_SYSKEYUP,
};

lazy_static::lazy_static! {
    static ref INTERCEPTOR: Mutex<Option<KeyInterceptor>> = Mutex::new(None);
    static ref CONTEXT: Mutex<Option<Arc<HookContext>>> = Mutex::new(None);
}

struct Hooks {
    keyboard: HHOOK,
    foreground: HWINEVENTHOOK,
}

static HOOKS: Mutex<Option<Hooks>> = Mutex::new(None);

/// Installs the keyboard and foreground hooks on the calling thread, which
/// must pump messages (see [`run_event_loop`]).
///
/// Calling this while already installed only swaps in the new interceptor.
pub fn start(interceptor: KeyInterceptor) -> Result<(), HookError> {
    start_with(interceptor, install_hooks)
}

fn start_with(
    interceptor: KeyInterceptor,
    install: impl FnOnce() -> Result<Hooks, HookError>,
) -> Result<(), HookError> {
    let mut hooks = HOOKS.lock();
    match hooks.as_ref() {
        Some(_) => debug!("Hooks already installed, interceptor replaced"),
        None => *hooks = Some(install()?),
    }

    *CONTEXT.lock() = Some(interceptor.context().clone());
    *INTERCEPTOR.lock() = Some(interceptor);
    Ok(())
}

fn install_hooks() -> Result<Hooks, HookError> {
    info!("Installing keyboard hook...");
    // Low-level hooks take a null module handle with thread id 0.
    let keyboard =
        unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(hook_proc), HINSTANCE::default(), 0) }
            .map_err(|e| HookError::InstallFailed(e.to_string()))?;
    if keyboard.is_invalid() {
        return Err(HookError::InstallFailed("invalid hook handle".into()));
    }

    let foreground = match foreground::install_foreground_hook() {
        Ok(h) => h,
        Err(e) => {
            unsafe {
                let _ = UnhookWindowsHookEx(keyboard);
            }
            error!("Foreground hook failed: {}", e);
            return Err(e);
        }
    };

    info!("Keyboard hook installed. Handle: {:?}", keyboard);
    Ok(Hooks {
        keyboard,
        foreground,
    })
}

/// Removes both hooks and drops the interceptor. Does nothing if not installed.
pub fn stop() {
    if let Some(hooks) = HOOKS.lock().take() {
        unsafe {
            let _ = UnhookWindowsHookEx(hooks.keyboard);
        }
        foreground::uninstall_foreground_hook(hooks.foreground);
        info!("Keyboard hook uninstalled.");
    }
    *INTERCEPTOR.lock() = None;
    *CONTEXT.lock() = None;
}

pub fn is_running() -> bool {
    HOOKS.lock().is_some()
}

/// Runs `f` against the installed interceptor, blocking until the hook
/// thread is done with it.
pub fn with_interceptor<R>(f: impl FnOnce(&mut KeyInterceptor) -> R) -> Option<R> {
    INTERCEPTOR.lock().as_mut().map(f)
}

/// Foreground-change callback path. When the interceptor is in use the
/// change is parked on the context and picked up by the next keystroke.
pub(crate) fn dispatch_foreground_change() {
    if let Some(mut guard) = INTERCEPTOR.try_lock() {
        if let Some(interceptor) = guard.as_mut() {
            interceptor.on_foreground_changed();
        }
        return;
    }
    trace!("Interceptor busy, deferring foreground change");
    if let Some(ctx) = CONTEXT.lock().as_ref() {
        ctx.defer_foreground_change();
    }
}

pub fn current_thread_id() -> u32 {
    unsafe { GetCurrentThreadId() }
}

/// Asks the message loop running on `thread_id` to exit.
pub fn request_quit(thread_id: u32) {
    unsafe {
        let _ = PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
    }
}

/// Blocking message loop for the hook thread.
pub fn run_event_loop() {
    info!("Starting message loop...");
    let mut msg = MSG::default();
    unsafe {
        // Force message queue creation
        let _ = PeekMessageW(&mut msg, None, 0, 0, PEEK_MESSAGE_REMOVE_TYPE(0));

        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
    info!("Message loop exited.");
}

unsafe extern "system" fn hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code < 0 {
        return CallNextHookEx(None, code, wparam, lparam);
    }

    let kbd = &*(lparam.0 as *const KBDLLHOOKSTRUCT);
    let msg = wparam.0 as u32;
    let up = msg == WM_KEYUP || msg == WM_SYSKEYUP;
    let event = KeyEvent {
        vk: kbd.vkCode as Vk,
        edge: if up { KeyEdge::Up } else { KeyEdge::Down },
        injected: (kbd.flags.0 & LLKHF_INJECTED.0) != 0,
        extra_info: kbd.dwExtraInfo,
    };

    // A held lock means this callback re-entered from our own call stack.
    let action = match INTERCEPTOR.try_lock() {
        Some(mut guard) => match guard.as_mut() {
            Some(interceptor) => catch_unwind(AssertUnwindSafe(|| interceptor.handle(&event)))
                .unwrap_or_else(|_| {
                    error!("Interceptor panicked on vk={:X}", event.vk);
                    KeyAction::Pass
                }),
            None => KeyAction::Pass,
        },
        None => {
            trace!("Hook re-entered, passing vk={:X}", event.vk);
            KeyAction::Pass
        }
    };

    if action.is_consumed() {
        LRESULT(1)
    } else {
        CallNextHookEx(None, code, wparam, lparam)
    }
}

/// [`KeyboardState`] backed by `GetAsyncKeyState`.
#[derive(Debug, Default)]
pub struct AsyncKeyState;

impl KeyboardState for AsyncKeyState {
    fn is_pressed(&self, vk: Vk) -> bool {
        unsafe { GetAsyncKeyState(vk as i32) as u16 & 0x8000 != 0 }
    }

    fn caps_lock(&self) -> bool {
        unsafe { GetKeyState(VK_CAPITAL as i32) & 1 != 0 }
    }
}

/// [`InputSink`] that delivers each batch with a single `SendInput` call.
#[derive(Debug, Default)]
pub struct SendInputSink;

impl InputSink for SendInputSink {
    fn send(&mut self, batch: &[SyntheticKey]) {
        if batch.is_empty() {
            return;
        }
        let inputs: Vec<INPUT> = batch.iter().map(to_input).collect();
        let sent = unsafe { SendInput(&inputs, std::mem::size_of::<INPUT>() as i32) };
        if sent as usize != inputs.len() {
            trace!("SendInput accepted {} of {} events", sent, inputs.len());
        }
    }
}

fn to_input(key: &SyntheticKey) -> INPUT {
    let mut flags = KEYBD_EVENT_FLAGS(0);
    let (vk, scan) = match key.payload {
        KeyPayload::ScanCode(sc) => {
            flags |= KEYEVENTF_SCANCODE;
            (0, sc)
        }
        KeyPayload::VirtualKey { vk, extended } => {
            if extended {
                flags |= KEYEVENTF_EXTENDEDKEY;
            }
            (vk, 0)
        }
        KeyPayload::Unicode(unit) => {
            flags |= KEYEVENTF_UNICODE;
            (0, unit)
        }
    };
    if key.up {
        flags |= KEYEVENTF_KEYUP;
    }

    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(vk),
                wScan: scan,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: key.tag,
            },
        },
    }
}
