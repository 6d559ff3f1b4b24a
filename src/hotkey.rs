//! The hotkey engine.
//!
//! [`Hotkeys`] owns the registered bindings: each one pairs a parsed
//! [`KeyCombo`] with the [`Action`] it triggers.  On a trigger it refreshes
//! the registry before dispatching, so actions never run on state that is
//! seconds old.

use crate::command::Action;
use crate::dispatcher::{DispatchError, Dispatched, Dispatcher};
use crate::keycombo::{modifier_events, KeyCombo, KeycomboError, SendMode};
use crate::traits::{HotkeyId, HotkeyRegistrar, WindowService};
use log::{debug, info};

/// Possible errors from the hotkey engine.
#[derive(Debug, thiserror::Error)]
pub enum HotkeyError {
    /// The keycombo string is malformed.
    #[error(transparent)]
    Parse(#[from] KeycomboError),

    /// The operating system refused the binding.
    #[error("could not register {keycombo:?}: {reason}")]
    Registration { keycombo: String, reason: String },

    /// A trigger arrived for an id we never handed out.
    #[error("unknown hotkey id {0}")]
    UnknownId(HotkeyId),

    /// The bound action failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// A registered binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotkey {
    pub id: HotkeyId,
    /// The keycombo as written in the configuration.
    pub keycombo: String,
    pub combo: KeyCombo,
    pub action: Action,
}

/// Registered bindings, in registration order.
///
/// Bindings are released by [`clear`](Hotkeys::clear) and when the engine
/// is dropped.
#[derive(Debug)]
pub struct Hotkeys<R: HotkeyRegistrar> {
    registrar: R,
    hotkeys: Vec<Hotkey>,
    next_id: HotkeyId,
}

impl<R: HotkeyRegistrar> Hotkeys<R> {
    pub fn new(registrar: R) -> Self {
        Self {
            registrar,
            hotkeys: Vec::new(),
            next_id: 1,
        }
    }

    pub fn registrar(&self) -> &R {
        &self.registrar
    }

    pub fn registrar_mut(&mut self) -> &mut R {
        &mut self.registrar
    }

    pub fn hotkeys(&self) -> &[Hotkey] {
        &self.hotkeys
    }

    pub fn get(&self, id: HotkeyId) -> Option<&Hotkey> {
        self.hotkeys.iter().find(|h| h.id == id)
    }

    /// Parse `keycombo` and bind it to `action` system-wide.
    ///
    /// Nothing is registered if parsing fails.
    pub fn add(&mut self, keycombo: &str, action: Action) -> Result<HotkeyId, HotkeyError> {
        let combo: KeyCombo = keycombo.parse()?;
        let id = self.next_id;

        self.registrar
            .register(id, &combo)
            .map_err(|e| HotkeyError::Registration {
                keycombo: keycombo.to_string(),
                reason: e.to_string(),
            })?;

        self.next_id += 1;
        info!("bound {} to {:?}", combo, action.to_string());
        self.hotkeys.push(Hotkey {
            id,
            keycombo: keycombo.to_string(),
            combo,
            action,
        });
        Ok(id)
    }

    /// Release every binding.  Unregister failures are ignored.
    ///
    /// Ids are handed out from 1 again afterwards; the platform caps them.
    pub fn clear(&mut self) {
        for hotkey in self.hotkeys.drain(..) {
            self.registrar.unregister(hotkey.id);
        }
        self.next_id = 1;
    }

    /// Run the action bound to `id`, refreshing the registry first.
    pub fn trigger<P: WindowService>(
        &self,
        id: HotkeyId,
        dispatcher: &mut Dispatcher<P>,
    ) -> Result<Dispatched, HotkeyError> {
        let hotkey = self.get(id).ok_or(HotkeyError::UnknownId(id))?;
        debug!("hotkey {} triggered", hotkey.combo);
        dispatcher.refresh();
        Ok(dispatcher.handle(hotkey.action)?)
    }
}

impl<R: HotkeyRegistrar> Drop for Hotkeys<R> {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Replay `combo` to the operating system as synthesized input.
///
/// Modifiers the user is physically holding (typically the ones of the
/// hotkey that got us here) are released first and pressed again afterwards,
/// so they neither mix into `combo` nor end up stuck.
pub fn send_to_system<P: WindowService>(
    platform: &P,
    combo: &KeyCombo,
    mode: SendMode,
) -> Result<(), P::Error> {
    let held = platform.held_modifiers();
    let mut events = modifier_events(held, SendMode::Release);
    events.extend(combo.events(mode));
    events.extend(modifier_events(held, SendMode::Press));
    platform.send_input(&events)
}
