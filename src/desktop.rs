//! The window/desktop registry.
//!
//! [`WindowManagerState`] is the in-memory model of every manageable window,
//! grouped by virtual desktop.  It is rebuilt from a full enumeration on
//! every [`refresh`](WindowManagerState::refresh) because windows appear,
//! vanish, move and change desktops behind our back.

use crate::adjacency;
use crate::command::Direction;
use crate::geometry::Rect;
use crate::traits::{DesktopId, WindowHandle, WindowService};
use log::{debug, trace};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Instant;

/// A tracked top-level window.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub handle: WindowHandle,
    /// Title text at the last refresh.
    pub name: String,
    /// Visible frame at the last refresh, or as last set by us.
    pub rect: Rect,
    /// Last time the window was focused or rearranged.
    pub last_interaction: Option<Instant>,
    marked_for_deletion: bool,
    /// Monotonic sequence number of the refresh pass that first saw the window.
    first_seen: u64,
}

impl Window {
    pub fn new(handle: WindowHandle, name: String, rect: Rect, first_seen: u64) -> Self {
        Self {
            handle,
            name,
            rect,
            last_interaction: None,
            marked_for_deletion: false,
            first_seen,
        }
    }

    /// Take fresh values from the platform and clear the deletion mark.
    ///
    /// Returns `true` if the name or the rect changed.
    fn update(&mut self, name: String, rect: Rect) -> bool {
        self.marked_for_deletion = false;
        let changed = self.name != name || self.rect != rect;
        self.name = name;
        self.rect = rect;
        changed
    }

    /// Record an interaction at `now`.
    pub fn touch(&mut self, now: Instant) {
        self.last_interaction = Some(now);
    }
}

/// One virtual desktop and the windows on it.
#[derive(Debug, Default)]
pub struct Desktop {
    windows: HashMap<WindowHandle, Window>,
    focused: Option<WindowHandle>,
}

impl Desktop {
    pub fn windows(&self) -> impl Iterator<Item = &Window> {
        self.windows.values()
    }

    pub fn window(&self, handle: WindowHandle) -> Option<&Window> {
        self.windows.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// The most recently focused window on this desktop, if it still exists.
    pub fn focused(&self) -> Option<WindowHandle> {
        self.focused
    }

    /// The earliest-observed window still on this desktop.
    pub fn first_window(&self) -> Option<WindowHandle> {
        self.windows
            .values()
            .min_by_key(|w| (w.first_seen, w.handle))
            .map(|w| w.handle)
    }

    /// Neighbour of `handle` in `direction`, see [`adjacency::find_adjacent`].
    pub fn adjacent_window(&self, handle: WindowHandle, direction: Direction) -> Option<WindowHandle> {
        let reference = self.windows.get(&handle)?;
        adjacency::find_adjacent(reference, self.windows.values(), direction).map(|w| w.handle)
    }
}

/// What a refresh changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Windows seen for the first time.
    pub added: Vec<WindowHandle>,
    /// Known windows whose name or rect changed.
    pub changed: Vec<WindowHandle>,
    /// Windows that are gone or no longer manageable.
    pub removed: Vec<WindowHandle>,
}

impl RefreshSummary {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

/// The registry: desktop id → [`Desktop`], plus the current desktop.
///
/// Owned by the [`Dispatcher`](crate::dispatcher::Dispatcher) and only
/// touched from the scheduler thread.
#[derive(Debug, Default)]
pub struct WindowManagerState {
    desktops: HashMap<DesktopId, Desktop>,
    current_desktop: Option<DesktopId>,
    foreground: Option<WindowHandle>,
    next_sequence: u64,
}

impl WindowManagerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-derive the registry from a full enumeration of `platform`.
    ///
    /// Existing entries are updated in place so handles and interaction
    /// timestamps survive.  Windows that fail a query, are untitled,
    /// minimized or hidden are left out for this pass.  Desktops left
    /// without windows are dropped.
    pub fn refresh<P: WindowService>(&mut self, platform: &P, now: Instant) -> RefreshSummary {
        for desktop in self.desktops.values_mut() {
            for window in desktop.windows.values_mut() {
                window.marked_for_deletion = true;
            }
        }
        self.current_desktop = None;
        self.foreground = None;

        let foreground = platform.foreground_window();
        let mut summary = RefreshSummary::default();

        for handle in platform.enumerate_windows() {
            let desktop_id = match platform.desktop_id(handle) {
                Ok(Some(id)) => id,
                Ok(None) => continue,
                Err(e) => {
                    trace!("window {}: no desktop id: {}", handle, e);
                    continue;
                }
            };
            let Some((name, rect)) = manageable(platform, handle) else {
                continue;
            };

            // A window that changed desktop keeps its entry.
            let moved = self
                .desktops
                .iter_mut()
                .filter(|(id, _)| **id != desktop_id)
                .find_map(|(_, d)| d.windows.remove(&handle));

            let sequence = self.next_sequence;
            let desktop = self.desktops.entry(desktop_id).or_default();
            if let Some(window) = moved {
                debug!("window {} moved to desktop {}", handle, desktop_id);
                desktop.windows.insert(handle, window);
            }

            let window = match desktop.windows.entry(handle) {
                Entry::Occupied(entry) => {
                    let window = entry.into_mut();
                    if window.update(name, rect) {
                        summary.changed.push(handle);
                    }
                    window
                }
                Entry::Vacant(entry) => {
                    self.next_sequence += 1;
                    summary.added.push(handle);
                    entry.insert(Window::new(handle, name, rect, sequence))
                }
            };

            if foreground == Some(handle) {
                window.touch(now);
                desktop.focused = Some(handle);
                self.foreground = Some(handle);
            }

            if self.current_desktop.is_none() && platform.is_on_current_desktop(handle) {
                self.current_desktop = Some(desktop_id);
            }
        }

        for desktop in self.desktops.values_mut() {
            desktop.windows.retain(|handle, w| {
                if w.marked_for_deletion {
                    summary.removed.push(*handle);
                }
                !w.marked_for_deletion
            });
            if let Some(focused) = desktop.focused {
                if !desktop.windows.contains_key(&focused) {
                    desktop.focused = None;
                }
            }
        }
        self.desktops.retain(|_, d| !d.is_empty());

        if !summary.is_empty() {
            debug!(
                "refresh: {} added, {} changed, {} removed, {} desktops",
                summary.added.len(),
                summary.changed.len(),
                summary.removed.len(),
                self.desktops.len()
            );
        }
        summary
    }

    pub fn desktops(&self) -> impl Iterator<Item = (&DesktopId, &Desktop)> {
        self.desktops.iter()
    }

    pub fn desktop(&self, id: DesktopId) -> Option<&Desktop> {
        self.desktops.get(&id)
    }

    /// Id of the desktop the user is looking at, as of the last refresh.
    pub fn current_desktop_id(&self) -> Option<DesktopId> {
        self.current_desktop
    }

    pub fn current_desktop(&self) -> Option<&Desktop> {
        self.current_desktop.and_then(|id| self.desktops.get(&id))
    }

    /// The foreground window, if it is a managed one.
    pub fn focused_window(&self) -> Option<WindowHandle> {
        self.foreground
    }

    /// Desktop that holds `handle`.
    pub fn locate(&self, handle: WindowHandle) -> Option<DesktopId> {
        self.desktops
            .iter()
            .find(|(_, d)| d.windows.contains_key(&handle))
            .map(|(id, _)| *id)
    }

    pub fn window(&self, handle: WindowHandle) -> Option<&Window> {
        self.desktops.values().find_map(|d| d.windows.get(&handle))
    }

    pub fn window_mut(&mut self, handle: WindowHandle) -> Option<&mut Window> {
        self.desktops.values_mut().find_map(|d| d.windows.get_mut(&handle))
    }

    /// Neighbour of `handle` in `direction` on the same desktop.
    pub fn adjacent_window(&self, handle: WindowHandle, direction: Direction) -> Option<WindowHandle> {
        let id = self.locate(handle)?;
        self.desktops.get(&id)?.adjacent_window(handle, direction)
    }

    /// Mark `handle` as focused at `now` without waiting for the next refresh.
    pub fn record_focus(&mut self, handle: WindowHandle, now: Instant) {
        let Some(id) = self.locate(handle) else {
            return;
        };
        if let Some(desktop) = self.desktops.get_mut(&id) {
            if let Some(window) = desktop.windows.get_mut(&handle) {
                window.touch(now);
            }
            desktop.focused = Some(handle);
        }
        self.foreground = Some(handle);
    }
}

/// Name and frame of `handle`, or `None` if it cannot be managed right now.
fn manageable<P: WindowService>(platform: &P, handle: WindowHandle) -> Option<(String, Rect)> {
    let name = match platform.title(handle) {
        Ok(name) if !name.is_empty() => name,
        Ok(_) => return None,
        Err(e) => {
            trace!("window {}: no title: {}", handle, e);
            return None;
        }
    };
    if platform.is_minimized(handle) || !platform.is_visible(handle) {
        return None;
    }
    match platform.frame_rect(handle) {
        Ok(rect) => Some((name, rect)),
        Err(e) => {
            trace!("window {}: no frame rect: {}", handle, e);
            None
        }
    }
}
