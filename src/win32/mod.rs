//! Win32 implementation of the platform traits.
//!
//! * [`Win32WindowService`] talks to user32, DWM and the shell's
//!   `IVirtualDesktopManager`.
//! * [`Win32Hotkeys`] registers thread hotkeys with `RegisterHotKey` and
//!   drains `WM_HOTKEY` from the calling thread's message queue.
//!
//! Both must be created and used on the thread that runs the scheduler.

pub mod hotkeys;
mod keys;
pub mod wm;

pub use hotkeys::Win32Hotkeys;
pub use wm::Win32WindowService;

use crate::traits::WindowHandle;
use std::ffi::c_void;
use windows::Win32::Foundation::HWND;

/// Possible errors from the Win32 backend.
#[derive(Debug, thiserror::Error)]
pub enum Win32Error {
    /// A Win32 or COM call returned an error.
    #[error("{call} failed: {source}")]
    Api {
        call: &'static str,
        #[source]
        source: windows::core::Error,
    },

    /// A call reported failure without an error code.
    #[error("{call} refused for window {window}")]
    Refused {
        call: &'static str,
        window: WindowHandle,
    },

    /// `SendInput` injected fewer events than requested.
    #[error("SendInput injected {sent} of {expected} events")]
    PartialInput { sent: u32, expected: usize },

    /// The key cannot be expressed as a virtual-key code.
    #[error("no virtual key for {0}")]
    UnmappedKey(String),
}

impl Win32Error {
    fn api(call: &'static str) -> impl FnOnce(windows::core::Error) -> Win32Error {
        move |source| Win32Error::Api { call, source }
    }
}

fn hwnd(handle: WindowHandle) -> HWND {
    HWND(handle.0 as *mut c_void)
}

fn handle(hwnd: HWND) -> WindowHandle {
    WindowHandle(hwnd.0 as isize)
}
