use crate::app_profile::ForegroundProbe;
use crate::error::HookError;
use windows::core::PWSTR;
use windows::Win32::Foundation::{CloseHandle, HMODULE, HWND};
use windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_FORMAT,
    PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::UI::Accessibility::{SetWinEventHook, UnhookWinEvent, HWINEVENTHOOK};
use windows::Win32::UI::WindowsAndMessaging::{
    GetForegroundWindow, GetWindowThreadProcessId, EVENT_SYSTEM_FOREGROUND,
    WINEVENT_OUTOFCONTEXT, WINEVENT_SKIPOWNPROCESS,
};

/// Resolves the image name of the process owning the foreground window.
#[derive(Debug, Default)]
pub struct ProcessProbe;

impl ForegroundProbe for ProcessProbe {
    fn foreground_process(&self) -> Option<String> {
        unsafe { foreground_image_path() }
    }
}

unsafe fn foreground_image_path() -> Option<String> {
    let hwnd = GetForegroundWindow();
    if hwnd.0 == 0 {
        return None;
    }

    let mut pid = 0u32;
    GetWindowThreadProcessId(hwnd, Some(&mut pid));
    if pid == 0 {
        return None;
    }

    let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid).ok()?;
    let mut buf = [0u16; 260];
    let mut len = buf.len() as u32;
    let ok = QueryFullProcessImageNameW(
        handle,
        PROCESS_NAME_FORMAT(0),
        PWSTR(buf.as_mut_ptr()),
        &mut len,
    );
    let _ = CloseHandle(handle);
    ok.ok()?;

    Some(String::from_utf16_lossy(&buf[..len as usize]))
}

pub(crate) fn install_foreground_hook() -> Result<HWINEVENTHOOK, HookError> {
    let hook = unsafe {
        SetWinEventHook(
            EVENT_SYSTEM_FOREGROUND,
            EVENT_SYSTEM_FOREGROUND,
            HMODULE::default(),
            Some(win_event_proc),
            0,
            0,
            WINEVENT_OUTOFCONTEXT | WINEVENT_SKIPOWNPROCESS,
        )
    };
    if hook.is_invalid() {
        return Err(HookError::ForegroundHook("SetWinEventHook failed".into()));
    }
    Ok(hook)
}

pub(crate) fn uninstall_foreground_hook(hook: HWINEVENTHOOK) {
    unsafe {
        let _ = UnhookWinEvent(hook);
    }
}

unsafe extern "system" fn win_event_proc(
    _hook: HWINEVENTHOOK,
    event: u32,
    _hwnd: HWND,
    _id_object: i32,
    _id_child: i32,
    _thread: u32,
    _time: u32,
) {
    if event == EVENT_SYSTEM_FOREGROUND {
        crate::keyboard_hook::dispatch_foreground_change();
    }
}
