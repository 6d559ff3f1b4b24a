//! [`WindowService`] backed by user32, DWM and `IVirtualDesktopManager`.

use super::keys::{is_extended, stroke_key, HELD_MODIFIER_KEYS};
use super::{handle, hwnd, Win32Error};
use crate::dispatcher::SYSTEM_BORDER_COLOR;
use crate::geometry::Rect;
use crate::keycombo::{KeyEvent, KeyStroke, Modifiers};
use crate::traits::{DesktopId, WindowHandle, WindowService};
use log::{debug, trace};
use std::ffi::c_void;
use std::mem::size_of;
use windows::core::{BOOL, GUID};
use windows::Win32::Foundation::{CloseHandle, HWND, LPARAM, RECT, WPARAM};
use windows::Win32::Graphics::Dwm::{
    DwmGetWindowAttribute, DwmSetWindowAttribute, DWMWA_BORDER_COLOR, DWMWA_COLOR_DEFAULT,
    DWMWA_EXTENDED_FRAME_BOUNDS, DWMWA_WINDOW_CORNER_PREFERENCE, DWMWCP_DEFAULT,
    DWMWCP_DONOTROUND, DWM_WINDOW_CORNER_PREFERENCE,
};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CLSCTX_ALL, COINIT_APARTMENTTHREADED,
};
use windows::Win32::System::Threading::{OpenProcess, TerminateProcess, PROCESS_TERMINATE};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP,
};
use windows::Win32::UI::Shell::{IVirtualDesktopManager, VirtualDesktopManager};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetForegroundWindow, GetWindowRect, GetWindowTextLengthW, GetWindowTextW,
    GetWindowThreadProcessId, IsIconic, IsWindowVisible, IsZoomed, PostMessageW,
    SetForegroundWindow, SetWindowPos, ShowWindow, SystemParametersInfoW, SPIF_SENDCHANGE,
    SPI_SETDROPSHADOW, SWP_NOACTIVATE, SWP_NOZORDER, SW_RESTORE, WM_CLOSE,
};

/// Live Win32 window service.
///
/// Holds the shell's virtual desktop manager, so it lives on the thread
/// that created it.
pub struct Win32WindowService {
    desktops: IVirtualDesktopManager,
}

impl Win32WindowService {
    /// Initialise COM for the calling thread and connect to the shell's
    /// virtual desktop manager.
    pub fn new() -> Result<Self, Win32Error> {
        unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) }
            .ok()
            .map_err(Win32Error::api("CoInitializeEx"))?;
        let desktops: IVirtualDesktopManager =
            unsafe { CoCreateInstance(&VirtualDesktopManager, None, CLSCTX_ALL) }
                .map_err(Win32Error::api("CoCreateInstance(VirtualDesktopManager)"))?;
        debug!("Connected to the virtual desktop manager");
        Ok(Self { desktops })
    }

    fn window_rect(&self, window: WindowHandle) -> Result<Rect, Win32Error> {
        let mut r = RECT::default();
        unsafe { GetWindowRect(hwnd(window), &mut r) }.map_err(Win32Error::api("GetWindowRect"))?;
        Ok(to_rect(r))
    }
}

fn to_rect(r: RECT) -> Rect {
    Rect::from_edges(r.left as f32, r.top as f32, r.right as f32, r.bottom as f32)
}

/// `0xRRGGBB` to a `COLORREF` value (`0x00BBGGRR`).
fn colorref(color: u32) -> u32 {
    if color == SYSTEM_BORDER_COLOR {
        return DWMWA_COLOR_DEFAULT;
    }
    let r = (color >> 16) & 0xff;
    let g = (color >> 8) & 0xff;
    let b = color & 0xff;
    (b << 16) | (g << 8) | r
}

unsafe extern "system" fn collect_window(window: HWND, lparam: LPARAM) -> BOOL {
    let out = unsafe { &mut *(lparam.0 as *mut Vec<WindowHandle>) };
    out.push(handle(window));
    BOOL(1)
}

/// The `INPUT` for one key event.
///
/// Fails for keys the active layout cannot produce, so a combo is never
/// replayed with its key missing.
fn keyboard_input(event: &KeyEvent) -> Result<INPUT, Win32Error> {
    let vk = stroke_key(event.stroke).ok_or_else(|| Win32Error::UnmappedKey(stroke_name(event.stroke)))?;
    let mut flags = KEYBD_EVENT_FLAGS(0);
    if !event.pressed {
        flags |= KEYEVENTF_KEYUP;
    }
    if is_extended(vk) {
        flags |= KEYEVENTF_EXTENDEDKEY;
    }
    Ok(INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: vk,
                wScan: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    })
}

fn stroke_name(stroke: KeyStroke) -> String {
    match stroke {
        KeyStroke::Modifier(m) => format!("{:?}", m),
        KeyStroke::Key(k) => k.to_string(),
    }
}

impl WindowService for Win32WindowService {
    type Error = Win32Error;

    fn enumerate_windows(&self) -> Vec<WindowHandle> {
        let mut windows: Vec<WindowHandle> = Vec::new();
        let lparam = LPARAM(&mut windows as *mut Vec<WindowHandle> as isize);
        if let Err(e) = unsafe { EnumWindows(Some(collect_window), lparam) } {
            debug!("EnumWindows stopped early: {}", e);
        }
        windows
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        let window = unsafe { GetForegroundWindow() };
        (!window.is_invalid()).then(|| handle(window))
    }

    fn title(&self, window: WindowHandle) -> Result<String, Win32Error> {
        let len = unsafe { GetWindowTextLengthW(hwnd(window)) };
        if len <= 0 {
            return Ok(String::new());
        }
        let mut buf = vec![0u16; len as usize + 1];
        let copied = unsafe { GetWindowTextW(hwnd(window), &mut buf) };
        buf.truncate(copied.max(0) as usize);
        Ok(String::from_utf16_lossy(&buf))
    }

    fn frame_rect(&self, window: WindowHandle) -> Result<Rect, Win32Error> {
        let mut r = RECT::default();
        unsafe {
            DwmGetWindowAttribute(
                hwnd(window),
                DWMWA_EXTENDED_FRAME_BOUNDS,
                &mut r as *mut RECT as *mut c_void,
                size_of::<RECT>() as u32,
            )
        }
        .map_err(Win32Error::api("DwmGetWindowAttribute(EXTENDED_FRAME_BOUNDS)"))?;
        Ok(to_rect(r))
    }

    fn set_frame_rect(&self, window: WindowHandle, rect: Rect) -> Result<(), Win32Error> {
        if unsafe { IsZoomed(hwnd(window)) }.as_bool() {
            let _ = unsafe { ShowWindow(hwnd(window), SW_RESTORE) };
        }
        // SetWindowPos works on the outer rect, which includes the
        // invisible resize borders around the visible frame.
        let outer = self.window_rect(window)?;
        let frame = self.frame_rect(window)?;
        let target = Rect::new(
            rect.top_left - (frame.top_left - outer.top_left),
            rect.bottom_right + (outer.bottom_right - frame.bottom_right),
        );
        let size = target.size();
        trace!("SetWindowPos({}) -> {}", window, target);
        unsafe {
            SetWindowPos(
                hwnd(window),
                None,
                target.top_left.x.round() as i32,
                target.top_left.y.round() as i32,
                size.x.round() as i32,
                size.y.round() as i32,
                SWP_NOZORDER | SWP_NOACTIVATE,
            )
        }
        .map_err(Win32Error::api("SetWindowPos"))
    }

    fn is_minimized(&self, window: WindowHandle) -> bool {
        unsafe { IsIconic(hwnd(window)) }.as_bool()
    }

    fn is_visible(&self, window: WindowHandle) -> bool {
        unsafe { IsWindowVisible(hwnd(window)) }.as_bool()
    }

    fn desktop_id(&self, window: WindowHandle) -> Result<Option<DesktopId>, Win32Error> {
        let guid = unsafe { self.desktops.GetWindowDesktopId(hwnd(window)) }
            .map_err(Win32Error::api("GetWindowDesktopId"))?;
        Ok((guid != GUID::zeroed()).then(|| DesktopId(guid.to_u128())))
    }

    fn is_on_current_desktop(&self, window: WindowHandle) -> bool {
        match unsafe { self.desktops.IsWindowOnCurrentVirtualDesktop(hwnd(window)) } {
            Ok(on) => on.as_bool(),
            Err(e) => {
                trace!("IsWindowOnCurrentVirtualDesktop({}) failed: {}", window, e);
                false
            }
        }
    }

    fn move_to_desktop(&self, window: WindowHandle, desktop: DesktopId) -> Result<(), Win32Error> {
        let guid = GUID::from_u128(desktop.0);
        unsafe { self.desktops.MoveWindowToDesktop(hwnd(window), &guid) }
            .map_err(Win32Error::api("MoveWindowToDesktop"))
    }

    fn focus(&self, window: WindowHandle) -> Result<(), Win32Error> {
        if unsafe { SetForegroundWindow(hwnd(window)) }.as_bool() {
            Ok(())
        } else {
            Err(Win32Error::Refused {
                call: "SetForegroundWindow",
                window,
            })
        }
    }

    fn close(&self, window: WindowHandle) -> Result<(), Win32Error> {
        unsafe { PostMessageW(Some(hwnd(window)), WM_CLOSE, WPARAM(0), LPARAM(0)) }
            .map_err(Win32Error::api("PostMessageW(WM_CLOSE)"))
    }

    fn terminate(&self, window: WindowHandle) -> Result<(), Win32Error> {
        let mut pid = 0u32;
        unsafe { GetWindowThreadProcessId(hwnd(window), Some(&mut pid)) };
        if pid == 0 {
            return Err(Win32Error::Refused {
                call: "GetWindowThreadProcessId",
                window,
            });
        }
        let process = unsafe { OpenProcess(PROCESS_TERMINATE, false, pid) }
            .map_err(Win32Error::api("OpenProcess"))?;
        let result = unsafe { TerminateProcess(process, 1) }.map_err(Win32Error::api("TerminateProcess"));
        let _ = unsafe { CloseHandle(process) };
        result
    }

    fn held_modifiers(&self) -> Modifiers {
        HELD_MODIFIER_KEYS
            .iter()
            .filter(|(vk, _)| unsafe { GetAsyncKeyState(vk.0 as i32) } as u16 & 0x8000 != 0)
            .fold(Modifiers::empty(), |acc, (_, m)| acc | *m)
    }

    fn send_input(&self, events: &[KeyEvent]) -> Result<(), Win32Error> {
        let inputs = events
            .iter()
            .map(keyboard_input)
            .collect::<Result<Vec<INPUT>, _>>()?;
        if inputs.is_empty() {
            return Ok(());
        }
        let sent = unsafe { SendInput(&inputs, size_of::<INPUT>() as i32) };
        if sent as usize == inputs.len() {
            Ok(())
        } else {
            Err(Win32Error::PartialInput {
                sent,
                expected: inputs.len(),
            })
        }
    }

    fn set_system_drop_shadow(&self, enabled: bool) -> Result<(), Win32Error> {
        // SPI_SETDROPSHADOW takes the flag itself in the pointer argument.
        unsafe {
            SystemParametersInfoW(
                SPI_SETDROPSHADOW,
                0,
                Some(enabled as usize as *mut c_void),
                SPIF_SENDCHANGE,
            )
        }
        .map_err(Win32Error::api("SystemParametersInfoW(SPI_SETDROPSHADOW)"))
    }

    fn set_rounded_corners(&self, window: WindowHandle, enabled: bool) -> Result<(), Win32Error> {
        let preference: DWM_WINDOW_CORNER_PREFERENCE = if enabled {
            DWMWCP_DEFAULT
        } else {
            DWMWCP_DONOTROUND
        };
        unsafe {
            DwmSetWindowAttribute(
                hwnd(window),
                DWMWA_WINDOW_CORNER_PREFERENCE,
                &preference as *const DWM_WINDOW_CORNER_PREFERENCE as *const c_void,
                size_of::<DWM_WINDOW_CORNER_PREFERENCE>() as u32,
            )
        }
        .map_err(Win32Error::api("DwmSetWindowAttribute(WINDOW_CORNER_PREFERENCE)"))
    }

    fn set_border_color(&self, window: WindowHandle, color: u32) -> Result<(), Win32Error> {
        let value = colorref(color);
        unsafe {
            DwmSetWindowAttribute(
                hwnd(window),
                DWMWA_BORDER_COLOR,
                &value as *const u32 as *const c_void,
                size_of::<u32>() as u32,
            )
        }
        .map_err(Win32Error::api("DwmSetWindowAttribute(BORDER_COLOR)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colorref_swaps_red_and_blue() {
        assert_eq!(colorref(0x112233), 0x332211);
        assert_eq!(colorref(SYSTEM_BORDER_COLOR), DWMWA_COLOR_DEFAULT);
    }

    #[test]
    fn unmappable_key_fails_instead_of_being_dropped() {
        use crate::keycombo::Key;

        let event = KeyEvent::press(KeyStroke::Key(Key::Char('\u{1D11E}')));
        assert!(matches!(keyboard_input(&event), Err(Win32Error::UnmappedKey(_))));

        let win_tap = [
            KeyEvent::press(KeyStroke::Modifier(Modifiers::WIN)),
            event,
            KeyEvent::release(KeyStroke::Modifier(Modifiers::WIN)),
        ];
        let collected = win_tap
            .iter()
            .map(keyboard_input)
            .collect::<Result<Vec<INPUT>, _>>();
        assert!(collected.is_err());
    }

    #[test]
    fn mappable_keys_become_keyboard_input() {
        use crate::keycombo::Key;

        let input = keyboard_input(&KeyEvent::release(KeyStroke::Key(Key::Right))).unwrap();
        assert_eq!(input.r#type, INPUT_KEYBOARD);
        let flags = unsafe { input.Anonymous.ki.dwFlags };
        assert_eq!(flags, KEYEVENTF_KEYUP | KEYEVENTF_EXTENDEDKEY);
    }
}
