//! **twm**: keyboard-driven window navigation across virtual desktops.
//!
//! twm keeps a registry of the top-level windows on every virtual desktop
//! and lets global hotkeys move focus between spatially adjacent windows,
//! swap them, hop between desktops and carry windows along.
//!
//! # Architecture
//!
//! The crate is organised around three core traits:
//!
//! * [`traits::WindowService`]: abstracts window queries, window commands
//!   and input injection so the registry and the dispatcher are not coupled
//!   to any specific platform.
//! * [`traits::HotkeyRegistrar`]: abstracts system-wide hotkey
//!   registration.
//! * [`traits::TriggerSource`]: abstracts how hotkey presses (and quit
//!   requests) reach the main loop.
//!
//! [`desktop::WindowManagerState`] mirrors the platform's windows,
//! [`adjacency`] picks the neighbour in a direction,
//! [`dispatcher::Dispatcher`] executes [`command::Action`]s,
//! [`hotkey::Hotkeys`] maps keycombos to actions and
//! [`scheduler::Scheduler`] drives all of it.  The Win32 implementation
//! lives in `win32` (Windows only).

pub mod adjacency;
pub mod command;
pub mod config;
pub mod desktop;
pub mod dispatcher;
pub mod geometry;
pub mod hotkey;
pub mod keycombo;
pub mod scheduler;
pub mod traits;
#[cfg(windows)]
pub mod win32;

#[cfg(test)]
mod testing;
