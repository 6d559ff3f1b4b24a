//! Keycombo strings such as `"alt+shift+l"`.
//!
//! A keycombo is a chord of zero or more modifiers plus exactly one
//! non-modifier key, written as `+`-separated tokens.  Tokens are
//! case-insensitive and may be padded with whitespace.
//!
//! Besides parsing, this module builds the press/release sequences used to
//! replay a combo to the operating system (see
//! [`send_to_system`](crate::hotkey::send_to_system)).

use bitflags::bitflags;
use std::fmt;
use std::str::FromStr;

bitflags! {
    /// Modifier keys of a chord.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const CTRL = 0b0001;
        const ALT = 0b0010;
        const SHIFT = 0b0100;
        const WIN = 0b1000;
    }
}

impl Modifiers {
    /// Parse a single modifier token.
    fn from_token(token: &str) -> Option<Modifiers> {
        match token {
            "ctrl" | "control" => Some(Modifiers::CTRL),
            "alt" => Some(Modifiers::ALT),
            "super" | "win" => Some(Modifiers::WIN),
            "shift" => Some(Modifiers::SHIFT),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        if self == Modifiers::CTRL {
            "ctrl"
        } else if self == Modifiers::ALT {
            "alt"
        } else if self == Modifiers::SHIFT {
            "shift"
        } else {
            "win"
        }
    }
}

/// A non-modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable character, stored upper-cased.
    Char(char),
    Up,
    Down,
    Left,
    Right,
    Backspace,
    Tab,
    Enter,
    Escape,
    Space,
}

impl Key {
    fn from_token(token: &str) -> Option<Key> {
        let named = match token {
            "up" => Key::Up,
            "down" => Key::Down,
            "left" => Key::Left,
            "right" => Key::Right,
            "back" | "backspace" => Key::Backspace,
            "tab" => Key::Tab,
            "return" | "enter" => Key::Enter,
            "escape" | "esc" => Key::Escape,
            "space" => Key::Space,
            _ => {
                let mut chars = token.chars();
                return match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_control() && !c.is_whitespace() => {
                        Some(Key::Char(c.to_uppercase().next().unwrap_or(c)))
                    }
                    _ => None,
                };
            }
        };
        Some(named)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{}", c),
            Key::Up => write!(f, "up"),
            Key::Down => write!(f, "down"),
            Key::Left => write!(f, "left"),
            Key::Right => write!(f, "right"),
            Key::Backspace => write!(f, "backspace"),
            Key::Tab => write!(f, "tab"),
            Key::Enter => write!(f, "enter"),
            Key::Escape => write!(f, "escape"),
            Key::Space => write!(f, "space"),
        }
    }
}

/// Why a keycombo string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeycomboError {
    /// More than one non-modifier key in the same combo.
    #[error("{combo:?}: duplicate keycode {token:?}, only one non-modifier key is allowed")]
    DuplicateKeycode { combo: String, token: String },

    /// A token that is neither a modifier, a named key, nor a single character.
    #[error("{combo:?}: unknown keycode {token:?}")]
    UnknownKeycode { combo: String, token: String },

    /// Only modifiers were given.
    #[error("{combo:?}: no keycode, a combo needs exactly one non-modifier key")]
    MissingKeycode { combo: String },
}

/// A parsed chord: modifiers plus exactly one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub modifiers: Modifiers,
    pub key: Key,
}

impl KeyCombo {
    pub fn new(modifiers: Modifiers, key: Key) -> Self {
        Self { modifiers, key }
    }

    /// The press/release events that replay this combo.
    ///
    /// Modifiers go first so that the key is seen with them held. With
    /// [`SendMode::PressAndRelease`] every press is followed by the matching
    /// releases in reverse order.
    pub fn events(&self, mode: SendMode) -> Vec<KeyEvent> {
        let mut strokes: Vec<KeyStroke> = modifier_strokes(self.modifiers).collect();
        strokes.push(KeyStroke::Key(self.key));
        sequence(&strokes, mode)
    }
}

impl FromStr for KeyCombo {
    type Err = KeycomboError;

    fn from_str(combo: &str) -> Result<Self, Self::Err> {
        let mut modifiers = Modifiers::empty();
        let mut key = None;

        for part in combo.split('+') {
            let token = part.trim().to_lowercase();

            if let Some(modifier) = Modifiers::from_token(&token) {
                modifiers |= modifier;
                continue;
            }

            if key.is_some() {
                return Err(KeycomboError::DuplicateKeycode {
                    combo: combo.to_string(),
                    token,
                });
            }

            key = Some(Key::from_token(&token).ok_or_else(|| KeycomboError::UnknownKeycode {
                combo: combo.to_string(),
                token: token.clone(),
            })?);
        }

        let key = key.ok_or_else(|| KeycomboError::MissingKeycode {
            combo: combo.to_string(),
        })?;
        Ok(KeyCombo { modifiers, key })
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in modifier_strokes(self.modifiers) {
            if let KeyStroke::Modifier(m) = modifier {
                write!(f, "{}+", m.name())?;
            }
        }
        write!(f, "{}", self.key)
    }
}

/// How a replayed combo is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendMode {
    PressAndRelease,
    Press,
    Release,
}

/// A single physical key, modifier or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyStroke {
    /// Exactly one modifier flag.
    Modifier(Modifiers),
    Key(Key),
}

/// A synthesized key press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub stroke: KeyStroke,
    pub pressed: bool,
}

impl KeyEvent {
    pub fn press(stroke: KeyStroke) -> Self {
        Self {
            stroke,
            pressed: true,
        }
    }

    pub fn release(stroke: KeyStroke) -> Self {
        Self {
            stroke,
            pressed: false,
        }
    }
}

/// Events pressing or releasing every modifier in `modifiers`.
pub fn modifier_events(modifiers: Modifiers, mode: SendMode) -> Vec<KeyEvent> {
    let strokes: Vec<KeyStroke> = modifier_strokes(modifiers).collect();
    sequence(&strokes, mode)
}

/// Individual modifier strokes in a fixed order: ctrl, alt, shift, win.
fn modifier_strokes(modifiers: Modifiers) -> impl Iterator<Item = KeyStroke> {
    [Modifiers::CTRL, Modifiers::ALT, Modifiers::SHIFT, Modifiers::WIN]
        .into_iter()
        .filter(move |m| modifiers.contains(*m))
        .map(KeyStroke::Modifier)
}

fn sequence(strokes: &[KeyStroke], mode: SendMode) -> Vec<KeyEvent> {
    match mode {
        SendMode::Press => strokes.iter().copied().map(KeyEvent::press).collect(),
        SendMode::Release => strokes.iter().copied().map(KeyEvent::release).collect(),
        SendMode::PressAndRelease => strokes
            .iter()
            .copied()
            .map(KeyEvent::press)
            .chain(strokes.iter().rev().copied().map(KeyEvent::release))
            .collect(),
    }
}
