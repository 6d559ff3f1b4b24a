//! Core traits that decouple twm from any specific windowing platform.
//!
//! Every concrete backend (Win32, a test harness, …) implements these
//! traits.  The [`WindowManagerState`](crate::desktop::WindowManagerState),
//! the [`Dispatcher`](crate::dispatcher::Dispatcher) and the
//! [`Scheduler`](crate::scheduler::Scheduler) only depend on these
//! abstractions.

use crate::geometry::Rect;
use crate::keycombo::{KeyCombo, KeyEvent, Modifiers};
use std::fmt;
use std::sync::mpsc;

/// Opaque platform handle of a top-level window.
///
/// Stable for the lifetime of the window and owned by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowHandle(pub isize);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Platform-assigned identifier of a virtual desktop (a GUID on Windows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DesktopId(pub u128);

impl fmt::Display for DesktopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        write!(
            f,
            "{{{:08x}-{:04x}-{:04x}-{:04x}-{:012x}}}",
            (v >> 96) as u32,
            (v >> 80) as u16,
            (v >> 64) as u16,
            (v >> 48) as u16,
            v & 0xffff_ffff_ffff
        )
    }
}

/// Identifier of a registered hotkey binding.
pub type HotkeyId = i32;

/// Abstraction over the platform's window and virtual-desktop services.
///
/// Query methods may fail for individual windows (the window vanished, the
/// process is elevated, …); callers treat such failures as "this window
/// cannot be managed right now".  Mutating methods report failure through
/// `Err` and are never retried.
pub trait WindowService {
    /// The error type produced by this backend.
    type Error: std::error::Error + Send + 'static;

    /// All top-level windows, in the platform's enumeration order.
    fn enumerate_windows(&self) -> Vec<WindowHandle>;

    /// The window that currently has keyboard focus, if any.
    fn foreground_window(&self) -> Option<WindowHandle>;

    /// Title text; empty for untitled windows.
    fn title(&self, window: WindowHandle) -> Result<String, Self::Error>;

    /// Visible frame rectangle, excluding shadows and invisible borders.
    fn frame_rect(&self, window: WindowHandle) -> Result<Rect, Self::Error>;

    /// Move and resize `window` so its visible frame matches `rect`.
    fn set_frame_rect(&self, window: WindowHandle, rect: Rect) -> Result<(), Self::Error>;

    fn is_minimized(&self, window: WindowHandle) -> bool;

    fn is_visible(&self, window: WindowHandle) -> bool;

    /// The virtual desktop `window` lives on, or `None` for desktop-less
    /// windows (shell surfaces, some system windows).
    fn desktop_id(&self, window: WindowHandle) -> Result<Option<DesktopId>, Self::Error>;

    /// Whether `window` is on the virtual desktop the user is looking at.
    fn is_on_current_desktop(&self, window: WindowHandle) -> bool;

    fn move_to_desktop(&self, window: WindowHandle, desktop: DesktopId) -> Result<(), Self::Error>;

    /// Bring `window` to the foreground.
    fn focus(&self, window: WindowHandle) -> Result<(), Self::Error>;

    /// Ask `window` to close itself.
    fn close(&self, window: WindowHandle) -> Result<(), Self::Error>;

    /// Kill the process owning `window`.
    fn terminate(&self, window: WindowHandle) -> Result<(), Self::Error>;

    /// Modifier keys the user is physically holding right now.
    fn held_modifiers(&self) -> Modifiers;

    /// Inject raw key events into the system input stream, in order.
    fn send_input(&self, events: &[KeyEvent]) -> Result<(), Self::Error>;

    //  Cosmetics

    /// Enable or disable drop shadows system-wide.
    fn set_system_drop_shadow(&self, enabled: bool) -> Result<(), Self::Error>;

    fn set_rounded_corners(&self, window: WindowHandle, enabled: bool) -> Result<(), Self::Error>;

    /// Paint the border of `window` in `color` (`0xRRGGBB`).
    fn set_border_color(&self, window: WindowHandle, color: u32) -> Result<(), Self::Error>;
}

/// Registers system-wide hotkeys with the platform.
pub trait HotkeyRegistrar {
    /// The error type produced by this registrar.
    type Error: std::error::Error + Send + 'static;

    /// Bind `combo` so that triggering it delivers [`Trigger::Hotkey`]`(id)`.
    ///
    /// Fails if the platform refuses the binding, e.g. because another
    /// process already owns it.
    fn register(&mut self, id: HotkeyId, combo: &KeyCombo) -> Result<(), Self::Error>;

    /// Release binding `id`.  Failures are not reported.
    fn unregister(&mut self, id: HotkeyId);
}

/// Something that happened outside the scheduler loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Hotkey `id` was pressed.
    Hotkey(HotkeyId),
    /// The platform asked the process to exit.
    Quit,
}

/// A source of pending [`Trigger`]s.
///
/// # Contract
///
/// * [`poll_triggers`](TriggerSource::poll_triggers) **never blocks**.
/// * It returns everything delivered since the previous call, in delivery
///   order, so that nothing queues up between scheduler ticks.
pub trait TriggerSource {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    fn poll_triggers(&mut self) -> Result<Vec<Trigger>, Self::Error>;
}

/// Triggers produced on another thread and handed over through a channel.
impl TriggerSource for mpsc::Receiver<Trigger> {
    type Error = std::convert::Infallible;

    fn poll_triggers(&mut self) -> Result<Vec<Trigger>, Self::Error> {
        Ok(self.try_iter().collect())
    }
}
