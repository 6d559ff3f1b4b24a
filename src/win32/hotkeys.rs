//! System-wide hotkeys through `RegisterHotKey`.

use super::keys::{hotkey_modifiers, virtual_key};
use super::Win32Error;
use crate::keycombo::KeyCombo;
use crate::traits::{HotkeyId, HotkeyRegistrar, Trigger, TriggerSource};
use log::trace;
use std::marker::PhantomData;
use windows::Win32::UI::Input::KeyboardAndMouse::{RegisterHotKey, UnregisterHotKey, MOD_NOREPEAT};
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, PeekMessageW, TranslateMessage, MSG, PM_REMOVE, WM_HOTKEY, WM_QUIT,
};

/// Hotkeys bound to the calling thread's message queue.
///
/// Not `Send`: `WM_HOTKEY` is only delivered to the thread that registered
/// the hotkey.
#[derive(Debug, Default)]
pub struct Win32Hotkeys {
    _thread_bound: PhantomData<*const ()>,
}

impl Win32Hotkeys {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HotkeyRegistrar for Win32Hotkeys {
    type Error = Win32Error;

    fn register(&mut self, id: HotkeyId, combo: &KeyCombo) -> Result<(), Win32Error> {
        let vk = virtual_key(combo.key).ok_or_else(|| Win32Error::UnmappedKey(combo.to_string()))?;
        let modifiers = hotkey_modifiers(combo.modifiers) | MOD_NOREPEAT;
        unsafe { RegisterHotKey(None, id, modifiers, vk.0 as u32) }
            .map_err(Win32Error::api("RegisterHotKey"))
    }

    fn unregister(&mut self, id: HotkeyId) {
        if let Err(e) = unsafe { UnregisterHotKey(None, id) } {
            trace!("UnregisterHotKey({}) failed: {}", id, e);
        }
    }
}

impl TriggerSource for Win32Hotkeys {
    type Error = Win32Error;

    /// Drain the thread's message queue without blocking.
    fn poll_triggers(&mut self) -> Result<Vec<Trigger>, Win32Error> {
        let mut triggers = Vec::new();
        let mut msg = MSG::default();
        while unsafe { PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE) }.as_bool() {
            match msg.message {
                WM_HOTKEY => triggers.push(Trigger::Hotkey(msg.wParam.0 as HotkeyId)),
                WM_QUIT => triggers.push(Trigger::Quit),
                _ => unsafe {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                },
            }
        }
        Ok(triggers)
    }
}
