//! In-memory test doubles for the platform traits.
//!
//! [`FakePlatform`] models a handful of virtual desktops with windows on
//! them and records every mutating call.  Replaying a combo whose key is
//! `left`/`right` switches the active desktop, the way the real desktop
//! switch shortcut does.  [`FakeHotkeys`] is a registrar plus a trigger
//! queue.

use crate::geometry::Rect;
use crate::keycombo::{Key, KeyCombo, KeyEvent, KeyStroke, Modifiers};
use crate::traits::{
    DesktopId, HotkeyId, HotkeyRegistrar, Trigger, TriggerSource, WindowHandle, WindowService,
};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("fake platform: {0}")]
pub struct FakeError(pub String);

#[derive(Debug, Clone)]
pub struct FakeWindow {
    pub title: String,
    pub rect: Rect,
    pub desktop: Option<DesktopId>,
    pub minimized: bool,
    pub visible: bool,
    /// Make every query on this window fail.
    pub broken: bool,
}

pub const D1: DesktopId = DesktopId(1);
pub const D2: DesktopId = DesktopId(2);
pub const D3: DesktopId = DesktopId(3);

#[derive(Debug)]
pub struct FakePlatform {
    pub windows: RefCell<Vec<(WindowHandle, FakeWindow)>>,
    pub foreground: Cell<Option<WindowHandle>>,
    pub desktop_order: Vec<DesktopId>,
    pub current: Cell<Option<DesktopId>>,
    pub held: Cell<Modifiers>,

    pub sent: RefCell<Vec<KeyEvent>>,
    pub focused: RefCell<Vec<WindowHandle>>,
    pub closed: RefCell<Vec<WindowHandle>>,
    pub terminated: RefCell<Vec<WindowHandle>>,
    pub moved: RefCell<Vec<(WindowHandle, DesktopId)>>,
    pub rects_set: RefCell<Vec<(WindowHandle, Rect)>>,
    pub drop_shadow: Cell<Option<bool>>,
    pub rounded: RefCell<HashMap<WindowHandle, bool>>,
    pub borders: RefCell<HashMap<WindowHandle, u32>>,
    pub enumerations: Cell<usize>,

    pub fail_set_rect: RefCell<HashSet<WindowHandle>>,
    pub refuse_moves: Cell<bool>,
}

impl FakePlatform {
    /// A platform with desktops `D1`, `D2`, `D3` (in that order) and `D1` active.
    pub fn new() -> Self {
        Self::with_desktops(vec![D1, D2, D3])
    }

    pub fn with_desktops(desktop_order: Vec<DesktopId>) -> Self {
        Self {
            windows: RefCell::new(Vec::new()),
            foreground: Cell::new(None),
            current: Cell::new(desktop_order.first().copied()),
            desktop_order,
            held: Cell::new(Modifiers::empty()),
            sent: RefCell::new(Vec::new()),
            focused: RefCell::new(Vec::new()),
            closed: RefCell::new(Vec::new()),
            terminated: RefCell::new(Vec::new()),
            moved: RefCell::new(Vec::new()),
            rects_set: RefCell::new(Vec::new()),
            drop_shadow: Cell::new(None),
            rounded: RefCell::new(HashMap::new()),
            borders: RefCell::new(HashMap::new()),
            enumerations: Cell::new(0),
            fail_set_rect: RefCell::new(HashSet::new()),
            refuse_moves: Cell::new(false),
        }
    }

    /// Add a visible, titled window with the given frame on `desktop`.
    pub fn add(&self, handle: isize, title: &str, rect: Rect, desktop: DesktopId) -> WindowHandle {
        let handle = WindowHandle(handle);
        self.windows.borrow_mut().push((
            handle,
            FakeWindow {
                title: title.to_string(),
                rect,
                desktop: Some(desktop),
                minimized: false,
                visible: true,
                broken: false,
            },
        ));
        handle
    }

    /// Edit a window in place.
    pub fn edit(&self, handle: WindowHandle, f: impl FnOnce(&mut FakeWindow)) {
        let mut windows = self.windows.borrow_mut();
        if let Some((_, w)) = windows.iter_mut().find(|(h, _)| *h == handle) {
            f(w);
        }
    }

    pub fn remove(&self, handle: WindowHandle) {
        self.windows.borrow_mut().retain(|(h, _)| *h != handle);
        if self.foreground.get() == Some(handle) {
            self.foreground.set(None);
        }
    }

    pub fn set_foreground(&self, handle: Option<WindowHandle>) {
        self.foreground.set(handle);
    }

    pub fn rect_of(&self, handle: WindowHandle) -> Option<Rect> {
        self.with_window(handle, |w| w.rect).ok()
    }

    pub fn desktop_of(&self, handle: WindowHandle) -> Option<DesktopId> {
        self.with_window(handle, |w| w.desktop).ok().flatten()
    }

    fn with_window<T>(&self, handle: WindowHandle, f: impl FnOnce(&FakeWindow) -> T) -> Result<T, FakeError> {
        let windows = self.windows.borrow();
        match windows.iter().find(|(h, _)| *h == handle) {
            Some((_, w)) if !w.broken => Ok(f(w)),
            Some(_) => Err(FakeError(format!("window {} is broken", handle))),
            None => Err(FakeError(format!("no window {}", handle))),
        }
    }

    fn switch_desktop(&self, step: isize) {
        let Some(current) = self.current.get() else {
            return;
        };
        let Some(index) = self.desktop_order.iter().position(|d| *d == current) else {
            return;
        };
        let target = index as isize + step;
        if target < 0 || target as usize >= self.desktop_order.len() {
            return;
        }
        self.current.set(Some(self.desktop_order[target as usize]));
        self.foreground.set(None);
    }
}

impl WindowService for FakePlatform {
    type Error = FakeError;

    fn enumerate_windows(&self) -> Vec<WindowHandle> {
        self.enumerations.set(self.enumerations.get() + 1);
        self.windows.borrow().iter().map(|(h, _)| *h).collect()
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        self.foreground.get()
    }

    fn title(&self, window: WindowHandle) -> Result<String, FakeError> {
        self.with_window(window, |w| w.title.clone())
    }

    fn frame_rect(&self, window: WindowHandle) -> Result<Rect, FakeError> {
        self.with_window(window, |w| w.rect)
    }

    fn set_frame_rect(&self, window: WindowHandle, rect: Rect) -> Result<(), FakeError> {
        if self.fail_set_rect.borrow().contains(&window) {
            return Err(FakeError(format!("window {} refused to move", window)));
        }
        self.with_window(window, |_| ())?;
        self.edit(window, |w| w.rect = rect);
        self.rects_set.borrow_mut().push((window, rect));
        Ok(())
    }

    fn is_minimized(&self, window: WindowHandle) -> bool {
        self.with_window(window, |w| w.minimized).unwrap_or(false)
    }

    fn is_visible(&self, window: WindowHandle) -> bool {
        self.with_window(window, |w| w.visible).unwrap_or(false)
    }

    fn desktop_id(&self, window: WindowHandle) -> Result<Option<DesktopId>, FakeError> {
        self.with_window(window, |w| w.desktop)
    }

    fn is_on_current_desktop(&self, window: WindowHandle) -> bool {
        let current = self.current.get();
        self.with_window(window, |w| current.is_some() && w.desktop == current)
            .unwrap_or(false)
    }

    fn move_to_desktop(&self, window: WindowHandle, desktop: DesktopId) -> Result<(), FakeError> {
        if self.refuse_moves.get() {
            return Err(FakeError("desktop move refused".into()));
        }
        self.with_window(window, |_| ())?;
        self.edit(window, |w| w.desktop = Some(desktop));
        self.moved.borrow_mut().push((window, desktop));
        Ok(())
    }

    fn focus(&self, window: WindowHandle) -> Result<(), FakeError> {
        self.with_window(window, |_| ())?;
        self.foreground.set(Some(window));
        self.focused.borrow_mut().push(window);
        Ok(())
    }

    fn close(&self, window: WindowHandle) -> Result<(), FakeError> {
        self.with_window(window, |_| ())?;
        self.closed.borrow_mut().push(window);
        self.remove(window);
        Ok(())
    }

    fn terminate(&self, window: WindowHandle) -> Result<(), FakeError> {
        self.with_window(window, |_| ())?;
        self.terminated.borrow_mut().push(window);
        self.remove(window);
        Ok(())
    }

    fn held_modifiers(&self) -> Modifiers {
        self.held.get()
    }

    fn send_input(&self, events: &[KeyEvent]) -> Result<(), FakeError> {
        for event in events {
            match (event.stroke, event.pressed) {
                (KeyStroke::Key(Key::Left), true) => self.switch_desktop(-1),
                (KeyStroke::Key(Key::Right), true) => self.switch_desktop(1),
                _ => {}
            }
        }
        self.sent.borrow_mut().extend_from_slice(events);
        Ok(())
    }

    fn set_system_drop_shadow(&self, enabled: bool) -> Result<(), FakeError> {
        self.drop_shadow.set(Some(enabled));
        Ok(())
    }

    fn set_rounded_corners(&self, window: WindowHandle, enabled: bool) -> Result<(), FakeError> {
        self.rounded.borrow_mut().insert(window, enabled);
        Ok(())
    }

    fn set_border_color(&self, window: WindowHandle, color: u32) -> Result<(), FakeError> {
        self.borders.borrow_mut().insert(window, color);
        Ok(())
    }
}

/// Registrar that records bindings and hands out queued triggers.
#[derive(Debug, Default)]
pub struct FakeHotkeys {
    pub registered: HashMap<HotkeyId, KeyCombo>,
    pub unregistered: Vec<HotkeyId>,
    pub pending: VecDeque<Trigger>,
    /// Combos the "operating system" refuses to bind.
    pub taken: Vec<KeyCombo>,
}

impl FakeHotkeys {
    /// Queue a press of whatever id is currently bound to `combo`.
    pub fn press(&mut self, combo: &str) {
        let Ok(combo) = combo.parse::<KeyCombo>() else {
            return;
        };
        if let Some((&id, _)) = self.registered.iter().find(|(_, c)| **c == combo) {
            self.pending.push_back(Trigger::Hotkey(id));
        }
    }
}

impl HotkeyRegistrar for FakeHotkeys {
    type Error = FakeError;

    fn register(&mut self, id: HotkeyId, combo: &KeyCombo) -> Result<(), FakeError> {
        if self.taken.contains(combo) || self.registered.values().any(|c| c == combo) {
            return Err(FakeError(format!("{} is already registered", combo)));
        }
        self.registered.insert(id, *combo);
        Ok(())
    }

    fn unregister(&mut self, id: HotkeyId) {
        self.registered.remove(&id);
        self.unregistered.push(id);
    }
}

impl TriggerSource for FakeHotkeys {
    type Error = FakeError;

    fn poll_triggers(&mut self) -> Result<Vec<Trigger>, FakeError> {
        Ok(self.pending.drain(..).collect())
    }
}

/// A `w`×`h` rect whose top-left corner is at (`x`, `y`).
pub fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
    Rect::from_origin_size(x, y, w, h)
}
