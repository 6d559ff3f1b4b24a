//! Executes [`Action`]s against the registry.
//!
//! [`Dispatcher`] owns the [`WindowManagerState`] and the platform backend.
//! It resolves the target of an action (usually the focused window and its
//! neighbour), issues calls to the [`WindowService`] trait and keeps the
//! cached registry in line with what it just changed.

use crate::command::{Action, Direction};
use crate::desktop::{RefreshSummary, WindowManagerState};
use crate::hotkey::send_to_system;
use crate::keycombo::{Key, KeyCombo, Modifiers, SendMode};
use crate::traits::{WindowHandle, WindowService};
use log::{debug, info, trace, warn};
use std::time::Instant;

/// Border color value that restores the system default border.
pub const SYSTEM_BORDER_COLOR: u32 = 0xFFFF_FFFF;

/// Possible errors from the dispatcher.
///
/// None of these are fatal: the action is abandoned and the registry is
/// left as accurate as the platform allowed.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// A mutating platform call failed.
    #[error("{operation} failed: {reason}")]
    PlatformCommand { operation: String, reason: String },

    /// Only one of the two windows of a swap could be moved.
    #[error("swap of {first} and {second} only half applied: {reason}")]
    PartialSwap {
        first: WindowHandle,
        second: WindowHandle,
        reason: String,
    },
}

fn command_failed<E: std::error::Error>(operation: String) -> impl FnOnce(E) -> DispatchError {
    move |e| DispatchError::PlatformCommand {
        operation,
        reason: e.to_string(),
    }
}

/// What the caller still has to do after an action ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    Done,
    /// The configuration should be reloaded; the dispatcher does not own it.
    ReloadRequested,
}

/// The operating system's own shortcuts for switching virtual desktops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopSwitch {
    pub left: KeyCombo,
    pub right: KeyCombo,
}

impl DesktopSwitch {
    fn combo(&self, direction: Direction) -> Option<&KeyCombo> {
        match direction {
            Direction::Left => Some(&self.left),
            Direction::Right => Some(&self.right),
            Direction::Up | Direction::Down => None,
        }
    }
}

impl Default for DesktopSwitch {
    /// `ctrl+win+left` / `ctrl+win+right`, the Windows defaults.
    fn default() -> Self {
        Self {
            left: KeyCombo::new(Modifiers::CTRL | Modifiers::WIN, Key::Left),
            right: KeyCombo::new(Modifiers::CTRL | Modifiers::WIN, Key::Right),
        }
    }
}

/// Cosmetic tweaks applied to the desktop and to managed windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySettings {
    pub disable_drop_shadows: bool,
    pub disable_rounded_corners: bool,
    pub draw_focus_border: bool,
    /// `0xRRGGBB`
    pub focused_border_color: u32,
    /// `0xRRGGBB`
    pub unfocused_border_color: u32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            disable_drop_shadows: false,
            disable_rounded_corners: false,
            draw_focus_border: false,
            focused_border_color: 0x999999,
            unfocused_border_color: 0x333333,
        }
    }
}

/// Resolves and executes actions.
///
/// The dispatcher is generic over any [`WindowService`] implementation.
///
/// # Typical usage
///
/// ```ignore
/// let mut dispatcher = Dispatcher::new(Win32WindowService::new()?);
/// dispatcher.refresh();
/// dispatcher.handle(Action::FocusWindow(Direction::Left))?;
/// ```
pub struct Dispatcher<P: WindowService> {
    platform: P,
    state: WindowManagerState,
    desktop_switch: DesktopSwitch,
    display: DisplaySettings,

    // What we changed on the system, so a reload can undo it.
    drop_shadows_disabled: bool,
    corners_disabled: bool,
    borders_drawn: bool,
    painted_focus: Option<WindowHandle>,
}

impl<P: WindowService> Dispatcher<P> {
    /// Create a dispatcher with an empty registry and default settings.
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            state: WindowManagerState::new(),
            desktop_switch: DesktopSwitch::default(),
            display: DisplaySettings::default(),
            drop_shadows_disabled: false,
            corners_disabled: false,
            borders_drawn: false,
            painted_focus: None,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn state(&self) -> &WindowManagerState {
        &self.state
    }

    pub fn set_desktop_switch(&mut self, desktop_switch: DesktopSwitch) {
        self.desktop_switch = desktop_switch;
    }

    /// Replace the display settings.  Call
    /// [`apply_display_settings`](Dispatcher::apply_display_settings) to
    /// push them to the system.
    pub fn set_display_settings(&mut self, display: DisplaySettings) {
        self.display = display;
    }

    /// Re-derive the registry and decorate windows that showed up or
    /// changed focus.
    pub fn refresh(&mut self) -> RefreshSummary {
        let summary = self.state.refresh(&self.platform, Instant::now());

        if self.display.disable_rounded_corners {
            for &handle in &summary.added {
                self.set_rounded_corners(handle, false);
            }
        }
        if self.display.draw_focus_border
            && (!summary.added.is_empty() || self.painted_focus != self.state.focused_window())
        {
            self.paint_borders();
        }

        summary
    }

    /// Push the current [`DisplaySettings`] to the system, undoing tweaks
    /// that were turned off since the last call.
    pub fn apply_display_settings(&mut self) {
        let disable = self.display.disable_drop_shadows;
        if disable || self.drop_shadows_disabled {
            match self.platform.set_system_drop_shadow(!disable) {
                Ok(()) => self.drop_shadows_disabled = disable,
                Err(e) => warn!("could not change drop shadows: {}", e),
            }
        }

        let disable = self.display.disable_rounded_corners;
        if disable || self.corners_disabled {
            for handle in self.all_windows() {
                self.set_rounded_corners(handle, !disable);
            }
            self.corners_disabled = disable;
        }

        if self.display.draw_focus_border {
            self.paint_borders();
        } else if self.borders_drawn {
            for handle in self.all_windows() {
                if let Err(e) = self.platform.set_border_color(handle, SYSTEM_BORDER_COLOR) {
                    trace!("window {}: could not reset border: {}", handle, e);
                }
            }
            self.borders_drawn = false;
            self.painted_focus = None;
        }
    }

    /// Execute a single [`Action`].
    ///
    /// Acts on the registry as of the last [`refresh`](Dispatcher::refresh);
    /// callers that care about staleness refresh first.
    pub fn handle(&mut self, action: Action) -> Result<Dispatched, DispatchError> {
        debug!("dispatch {}", action);
        match action {
            Action::FocusWindow(dir) => self.focus_window(dir)?,
            Action::SwapWindow(dir) => self.swap_window(dir)?,
            Action::FocusDesktop(dir) => self.focus_desktop(dir)?,
            Action::MoveWindowToDesktop(dir) => self.move_window_to_desktop(dir)?,
            Action::CloseWindow => {
                if let Some(handle) = self.state.focused_window() {
                    info!("close window {}", handle);
                    self.platform
                        .close(handle)
                        .map_err(command_failed(format!("close window {}", handle)))?;
                } else {
                    debug!("close: nothing focused");
                }
            }
            Action::TerminateWindow => {
                if let Some(handle) = self.state.focused_window() {
                    info!("terminate window {}", handle);
                    self.platform
                        .terminate(handle)
                        .map_err(command_failed(format!("terminate window {}", handle)))?;
                } else {
                    debug!("terminate: nothing focused");
                }
            }
            Action::Reload => return Ok(Dispatched::ReloadRequested),
        }
        Ok(Dispatched::Done)
    }

    //  Actions

    fn focus_window(&mut self, dir: Direction) -> Result<(), DispatchError> {
        let adjacent = self
            .state
            .focused_window()
            .and_then(|focused| self.state.adjacent_window(focused, dir));

        let target = adjacent.or_else(|| {
            let desktop = self.state.current_desktop()?;
            desktop.focused().or_else(|| desktop.first_window())
        });

        let Some(target) = target else {
            debug!("focus {}: no window to focus", dir);
            return Ok(());
        };

        self.platform
            .focus(target)
            .map_err(command_failed(format!("focus window {}", target)))?;
        self.state.record_focus(target, Instant::now());
        Ok(())
    }

    fn swap_window(&mut self, dir: Direction) -> Result<(), DispatchError> {
        let Some(first) = self.state.focused_window() else {
            debug!("swap {}: nothing focused", dir);
            return Ok(());
        };
        let Some(second) = self.state.adjacent_window(first, dir) else {
            debug!("swap {}: no neighbour", dir);
            return Ok(());
        };
        let (Some(first_rect), Some(second_rect)) = (
            self.state.window(first).map(|w| w.rect),
            self.state.window(second).map(|w| w.rect),
        ) else {
            return Ok(());
        };

        let now = Instant::now();
        let mut failures = Vec::new();
        for (handle, rect) in [(first, second_rect), (second, first_rect)] {
            match self.platform.set_frame_rect(handle, rect) {
                Ok(()) => {
                    if let Some(window) = self.state.window_mut(handle) {
                        window.rect = rect;
                    }
                }
                Err(e) => failures.push(format!("window {}: {}", handle, e)),
            }
            if let Some(window) = self.state.window_mut(handle) {
                window.touch(now);
            }
        }

        match failures.len() {
            0 => Ok(()),
            1 => Err(DispatchError::PartialSwap {
                first,
                second,
                reason: failures.remove(0),
            }),
            _ => Err(DispatchError::PlatformCommand {
                operation: format!("swap windows {} and {}", first, second),
                reason: failures.join("; "),
            }),
        }
    }

    fn focus_desktop(&mut self, dir: Direction) -> Result<(), DispatchError> {
        let Some(combo) = self.desktop_switch.combo(dir) else {
            debug!("focus desktop {}: desktops only switch left or right", dir);
            return Ok(());
        };
        send_to_system(&self.platform, combo, SendMode::PressAndRelease)
            .map_err(command_failed(format!("replay {}", combo)))?;
        self.refresh();
        Ok(())
    }

    fn move_window_to_desktop(&mut self, dir: Direction) -> Result<(), DispatchError> {
        let window = self.state.focused_window();
        let source = window.and_then(|w| self.state.locate(w));

        self.focus_desktop(dir)?;

        let Some(window) = window else {
            debug!("move to desktop {}: nothing focused", dir);
            return Ok(());
        };
        let Some(target) = self.state.current_desktop_id() else {
            warn!(
                "move to desktop {}: target desktop has no windows to identify it by, leaving {} in place",
                dir, window
            );
            return Ok(());
        };
        if source == Some(target) {
            debug!("move to desktop {}: already on {}", dir, target);
            return Ok(());
        }

        info!("move window {} to desktop {}", window, target);
        self.platform
            .move_to_desktop(window, target)
            .map_err(command_failed(format!("move window {} to desktop {}", window, target)))?;
        self.platform
            .focus(window)
            .map_err(command_failed(format!("focus window {}", window)))?;
        self.refresh();
        self.state.record_focus(window, Instant::now());
        Ok(())
    }

    //  Decorations

    fn all_windows(&self) -> Vec<WindowHandle> {
        self.state
            .desktops()
            .flat_map(|(_, d)| d.windows().map(|w| w.handle))
            .collect()
    }

    fn set_rounded_corners(&self, handle: WindowHandle, enabled: bool) {
        if let Err(e) = self.platform.set_rounded_corners(handle, enabled) {
            trace!("window {}: could not set corners: {}", handle, e);
        }
    }

    fn paint_borders(&mut self) {
        let focused = self.state.focused_window();
        for handle in self.all_windows() {
            let color = if Some(handle) == focused {
                self.display.focused_border_color
            } else {
                self.display.unfocused_border_color
            };
            if let Err(e) = self.platform.set_border_color(handle, color) {
                trace!("window {}: could not paint border: {}", handle, e);
            }
        }
        self.borders_drawn = true;
        self.painted_focus = focused;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keycombo::{KeyEvent, KeyStroke};
    use crate::testing::{rect, FakePlatform, D1, D2};

    /// Four windows on D1 in a 2×2 grid, `top_left` focused, plus one on D2.
    ///
    /// ```text
    /// 1 2
    /// 3 4
    /// ```
    fn grid() -> Dispatcher<FakePlatform> {
        let p = FakePlatform::new();
        p.add(1, "top_left", rect(0.0, 0.0, 100.0, 100.0), D1);
        p.add(2, "top_right", rect(100.0, 0.0, 100.0, 100.0), D1);
        p.add(3, "bottom_left", rect(0.0, 100.0, 100.0, 100.0), D1);
        p.add(4, "bottom_right", rect(100.0, 100.0, 100.0, 100.0), D1);
        p.add(5, "elsewhere", rect(0.0, 0.0, 200.0, 200.0), D2);
        p.set_foreground(Some(WindowHandle(1)));
        let mut d = Dispatcher::new(p);
        d.refresh();
        d
    }

    fn focused(d: &Dispatcher<FakePlatform>) -> Option<WindowHandle> {
        d.platform().foreground.get()
    }

    #[test]
    fn focus_moves_between_neighbours() {
        let mut d = grid();
        d.handle(Action::FocusWindow(Direction::Right)).unwrap();
        assert_eq!(focused(&d), Some(WindowHandle(2)));
        d.handle(Action::FocusWindow(Direction::Down)).unwrap();
        assert_eq!(focused(&d), Some(WindowHandle(4)));
        d.handle(Action::FocusWindow(Direction::Left)).unwrap();
        assert_eq!(focused(&d), Some(WindowHandle(3)));
        d.handle(Action::FocusWindow(Direction::Up)).unwrap();
        assert_eq!(focused(&d), Some(WindowHandle(1)));
    }

    #[test]
    fn focus_without_neighbour_keeps_last_focused() {
        let mut d = grid();
        d.handle(Action::FocusWindow(Direction::Left)).unwrap();
        assert_eq!(focused(&d), Some(WindowHandle(1)));
    }

    #[test]
    fn focus_without_foreground_picks_desktop_focus_then_first_window() {
        let mut d = grid();
        d.platform().set_foreground(None);
        d.refresh();
        d.handle(Action::FocusWindow(Direction::Right)).unwrap();
        assert_eq!(focused(&d), Some(WindowHandle(1)), "last focused window on the desktop");

        let p = FakePlatform::new();
        p.add(7, "b", rect(100.0, 0.0, 100.0, 100.0), D1);
        p.add(3, "a", rect(0.0, 0.0, 100.0, 100.0), D1);
        let mut d = Dispatcher::new(p);
        d.refresh();
        d.handle(Action::FocusWindow(Direction::Up)).unwrap();
        assert_eq!(focused(&d), Some(WindowHandle(7)), "earliest observed window");
    }

    #[test]
    fn focus_on_empty_desktop_is_a_noop() {
        let mut d = Dispatcher::new(FakePlatform::new());
        d.refresh();
        d.handle(Action::FocusWindow(Direction::Left)).unwrap();
        assert!(d.platform().focused.borrow().is_empty());
    }

    #[test]
    fn swap_exchanges_rects_and_keeps_focus() {
        let mut d = grid();
        d.handle(Action::SwapWindow(Direction::Right)).unwrap();

        let p = d.platform();
        assert_eq!(p.rect_of(WindowHandle(1)), Some(rect(100.0, 0.0, 100.0, 100.0)));
        assert_eq!(p.rect_of(WindowHandle(2)), Some(rect(0.0, 0.0, 100.0, 100.0)));
        assert_eq!(focused(&d), Some(WindowHandle(1)));

        let cached = d.state().window(WindowHandle(1)).unwrap();
        assert_eq!(cached.rect, rect(100.0, 0.0, 100.0, 100.0));
        assert!(d.state().window(WindowHandle(2)).unwrap().last_interaction.is_some());
    }

    #[test]
    fn swapping_twice_restores_both_rects() {
        let mut d = grid();
        d.handle(Action::SwapWindow(Direction::Down)).unwrap();
        d.refresh();
        d.handle(Action::SwapWindow(Direction::Up)).unwrap();

        let p = d.platform();
        assert_eq!(p.rect_of(WindowHandle(1)), Some(rect(0.0, 0.0, 100.0, 100.0)));
        assert_eq!(p.rect_of(WindowHandle(3)), Some(rect(0.0, 100.0, 100.0, 100.0)));
    }

    #[test]
    fn half_failed_swap_is_reported_and_not_rolled_back() {
        let mut d = grid();
        d.platform().fail_set_rect.borrow_mut().insert(WindowHandle(2));

        let err = d.handle(Action::SwapWindow(Direction::Right)).unwrap_err();
        assert!(matches!(err, DispatchError::PartialSwap { .. }), "got {err:?}");

        let p = d.platform();
        assert_eq!(p.rect_of(WindowHandle(1)), Some(rect(100.0, 0.0, 100.0, 100.0)));
        assert_eq!(p.rect_of(WindowHandle(2)), Some(rect(100.0, 0.0, 100.0, 100.0)));
    }

    #[test]
    fn swap_without_neighbour_is_a_noop() {
        let mut d = grid();
        d.handle(Action::SwapWindow(Direction::Up)).unwrap();
        assert!(d.platform().rects_set.borrow().is_empty());
    }

    #[test]
    fn focus_desktop_replays_the_switch_combo() {
        let mut d = grid();
        d.platform().held.set(Modifiers::ALT);
        d.handle(Action::FocusDesktop(Direction::Right)).unwrap();

        let sent = d.platform().sent.borrow();
        assert_eq!(sent.first(), Some(&KeyEvent::release(KeyStroke::Modifier(Modifiers::ALT))));
        assert_eq!(sent.last(), Some(&KeyEvent::press(KeyStroke::Modifier(Modifiers::ALT))));
        assert!(sent.contains(&KeyEvent::press(KeyStroke::Key(Key::Right))));
        drop(sent);

        assert_eq!(d.state().current_desktop_id(), Some(D2));
    }

    #[test]
    fn move_to_desktop_takes_the_focused_window_along() {
        let mut d = grid();
        d.handle(Action::MoveWindowToDesktop(Direction::Right)).unwrap();

        let p = d.platform();
        assert_eq!(p.desktop_of(WindowHandle(1)), Some(D2));
        assert_eq!(focused(&d), Some(WindowHandle(1)));
        assert_eq!(d.state().locate(WindowHandle(1)), Some(D2));
        assert_eq!(d.state().current_desktop_id(), Some(D2));
    }

    #[test]
    fn refused_desktop_move_leaves_window_in_place() {
        let mut d = grid();
        d.platform().refuse_moves.set(true);
        assert!(d.handle(Action::MoveWindowToDesktop(Direction::Right)).is_err());
        assert_eq!(d.platform().desktop_of(WindowHandle(1)), Some(D1));
    }

    #[test]
    fn move_to_desktop_past_the_last_one_stays_put() {
        let mut d = grid();
        d.handle(Action::MoveWindowToDesktop(Direction::Left)).unwrap();
        assert!(d.platform().moved.borrow().is_empty());
        assert_eq!(d.platform().desktop_of(WindowHandle(1)), Some(D1));
    }

    #[test]
    fn close_and_terminate_hit_the_focused_window() {
        let mut d = grid();
        d.handle(Action::CloseWindow).unwrap();
        assert_eq!(*d.platform().closed.borrow(), vec![WindowHandle(1)]);

        d.platform().set_foreground(Some(WindowHandle(4)));
        d.refresh();
        d.handle(Action::TerminateWindow).unwrap();
        assert_eq!(*d.platform().terminated.borrow(), vec![WindowHandle(4)]);
    }

    #[test]
    fn close_with_nothing_focused_is_a_noop() {
        let mut d = grid();
        d.platform().set_foreground(None);
        d.refresh();
        assert_eq!(d.handle(Action::CloseWindow).unwrap(), Dispatched::Done);
        assert_eq!(d.handle(Action::TerminateWindow).unwrap(), Dispatched::Done);
        assert!(d.platform().closed.borrow().is_empty());
        assert!(d.platform().terminated.borrow().is_empty());
    }

    #[test]
    fn reload_is_handed_back_to_the_caller() {
        let mut d = grid();
        assert_eq!(d.handle(Action::Reload).unwrap(), Dispatched::ReloadRequested);
    }

    //  Display settings

    #[test]
    fn display_settings_are_applied_and_undone() {
        let mut d = grid();
        d.set_display_settings(DisplaySettings {
            disable_drop_shadows: true,
            disable_rounded_corners: true,
            draw_focus_border: true,
            ..DisplaySettings::default()
        });
        d.apply_display_settings();

        let p = d.platform();
        assert_eq!(p.drop_shadow.get(), Some(false));
        assert_eq!(p.rounded.borrow().get(&WindowHandle(2)), Some(&false));
        assert_eq!(p.borders.borrow().get(&WindowHandle(1)), Some(&0x999999));
        assert_eq!(p.borders.borrow().get(&WindowHandle(2)), Some(&0x333333));

        d.set_display_settings(DisplaySettings::default());
        d.apply_display_settings();
        let p = d.platform();
        assert_eq!(p.drop_shadow.get(), Some(true));
        assert_eq!(p.rounded.borrow().get(&WindowHandle(2)), Some(&true));
        assert_eq!(p.borders.borrow().get(&WindowHandle(1)), Some(&SYSTEM_BORDER_COLOR));
    }

    #[test]
    fn default_settings_leave_the_system_alone() {
        let mut d = grid();
        d.apply_display_settings();
        assert_eq!(d.platform().drop_shadow.get(), None);
        assert!(d.platform().rounded.borrow().is_empty());
        assert!(d.platform().borders.borrow().is_empty());
    }

    #[test]
    fn borders_follow_focus_changes() {
        let mut d = grid();
        d.set_display_settings(DisplaySettings {
            draw_focus_border: true,
            ..DisplaySettings::default()
        });
        d.apply_display_settings();

        d.handle(Action::FocusWindow(Direction::Right)).unwrap();
        d.refresh();
        let p = d.platform();
        assert_eq!(p.borders.borrow().get(&WindowHandle(2)), Some(&0x999999));
        assert_eq!(p.borders.borrow().get(&WindowHandle(1)), Some(&0x333333));
    }

    #[test]
    fn new_windows_lose_rounded_corners() {
        let mut d = grid();
        d.set_display_settings(DisplaySettings {
            disable_rounded_corners: true,
            ..DisplaySettings::default()
        });
        let late = d.platform().add(9, "late", rect(300.0, 0.0, 100.0, 100.0), D1);
        d.refresh();
        assert_eq!(d.platform().rounded.borrow().get(&late), Some(&false));
        assert_eq!(d.platform().rounded.borrow().get(&WindowHandle(1)), None);
    }
}
