//! Actions and the vocabulary they are built from.
//!
//! Every hotkey is bound to an action string of the form
//! `<verb> <target> [<direction>]`, e.g. `"focus window left"` or
//! `"move_to_desktop window right"`.  This module parses those strings into
//! typed [`Action`]s and validates the verb/target/direction combination up
//! front, so the dispatcher never sees an invalid one.

use crate::geometry::Axis;
use std::fmt;
use std::str::FromStr;

/// Direction for spatial navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// The direction pointing the other way.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// The axis this direction moves along.
    pub fn axis(self) -> Axis {
        match self {
            Direction::Left | Direction::Right => Axis::Horizontal,
            Direction::Up | Direction::Down => Axis::Vertical,
        }
    }

    /// `+1.0` if moving in this direction increases the coordinate on
    /// [`axis`](Direction::axis), `-1.0` otherwise.
    pub fn sign(self) -> f32 {
        match self {
            Direction::Right | Direction::Down => 1.0,
            Direction::Left | Direction::Up => -1.0,
        }
    }

    fn is_horizontal(self) -> bool {
        self.axis() == Axis::Horizontal
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
        }
    }
}

/// Parse a lower-case direction token.
fn parse_direction(s: &str) -> Option<Direction> {
    match s {
        "up" => Some(Direction::Up),
        "down" => Some(Direction::Down),
        "left" => Some(Direction::Left),
        "right" => Some(Direction::Right),
        _ => None,
    }
}

/// First word of an action string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Focus,
    Swap,
    MoveToDesktop,
    Close,
    Terminate,
    Reload,
}

impl Verb {
    fn parse(s: &str) -> Option<Verb> {
        match s {
            "focus" => Some(Verb::Focus),
            "swap" => Some(Verb::Swap),
            "move_to_desktop" => Some(Verb::MoveToDesktop),
            "close" => Some(Verb::Close),
            "terminate" => Some(Verb::Terminate),
            "reload" => Some(Verb::Reload),
            _ => None,
        }
    }
}

/// What a verb applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Window,
    Desktop,
}

impl Target {
    fn parse(s: &str) -> Option<Target> {
        match s {
            "window" => Some(Target::Window),
            "desktop" => Some(Target::Desktop),
            _ => None,
        }
    }
}

/// Every action a hotkey can be bound to.
///
/// Produced by parsing an action string and consumed by the
/// [`Dispatcher`](crate::dispatcher::Dispatcher).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Focus the nearest window in the given direction on the current desktop.
    FocusWindow(Direction),

    /// Exchange the rectangles of the focused window and its neighbour in the
    /// given direction.
    SwapWindow(Direction),

    /// Switch to the virtual desktop on the left or right.
    FocusDesktop(Direction),

    /// Switch to the virtual desktop on the left or right and take the
    /// focused window along.
    MoveWindowToDesktop(Direction),

    /// Politely ask the focused window to close.
    CloseWindow,

    /// Kill the process owning the focused window.
    TerminateWindow,

    /// Reload the configuration file.
    Reload,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::FocusWindow(dir) => write!(f, "focus window {}", dir),
            Action::SwapWindow(dir) => write!(f, "swap window {}", dir),
            Action::FocusDesktop(dir) => write!(f, "focus desktop {}", dir),
            Action::MoveWindowToDesktop(dir) => write!(f, "move_to_desktop window {}", dir),
            Action::CloseWindow => write!(f, "close window"),
            Action::TerminateWindow => write!(f, "terminate window"),
            Action::Reload => write!(f, "reload"),
        }
    }
}

/// An action string that does not follow the grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid action {action:?}: expected {expected}")]
pub struct InvalidActionSyntax {
    /// The offending action string.
    pub action: String,
    /// Description of what would have been accepted.
    pub expected: String,
}

impl InvalidActionSyntax {
    fn new(action: &str, expected: &str) -> Self {
        Self {
            action: action.to_string(),
            expected: expected.to_string(),
        }
    }
}

const GRAMMAR: &str = "<focus|swap|move_to_desktop|close|terminate|reload> <window|desktop> [<up|down|left|right>]";

impl FromStr for Action {
    type Err = InvalidActionSyntax;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().collect();
        let err = |expected: &str| InvalidActionSyntax::new(s, expected);

        let (&verb, rest) = tokens.split_first().ok_or_else(|| err(GRAMMAR))?;
        let verb = Verb::parse(verb).ok_or_else(|| err(GRAMMAR))?;
        let target = match rest.first() {
            Some(t) => Some(Target::parse(t).ok_or_else(|| err(GRAMMAR))?),
            None => None,
        };
        let direction = match rest.get(1..).unwrap_or(&[]) {
            [] => None,
            [dir] => Some(parse_direction(dir).ok_or_else(|| err(GRAMMAR))?),
            _ => return Err(err(GRAMMAR)),
        };

        match (verb, target, direction) {
            (Verb::Reload, None, None) => Ok(Action::Reload),
            (Verb::Reload, _, _) => Err(err("\"reload\" without arguments")),
            (_, None, _) => Err(err(GRAMMAR)),
            (Verb::Focus, Some(Target::Window), Some(dir)) => Ok(Action::FocusWindow(dir)),
            (Verb::Focus, Some(Target::Window), None) => Err(err("focus window <up|down|left|right>")),
            (Verb::Focus, Some(Target::Desktop), Some(dir)) if dir.is_horizontal() => {
                Ok(Action::FocusDesktop(dir))
            }
            (Verb::Focus, Some(Target::Desktop), _) => Err(err("focus desktop <left|right>")),
            (Verb::Swap, Some(Target::Window), Some(dir)) => Ok(Action::SwapWindow(dir)),
            (Verb::Swap, _, _) => Err(err("swap window <up|down|left|right>")),
            (Verb::MoveToDesktop, Some(Target::Window), Some(dir)) if dir.is_horizontal() => {
                Ok(Action::MoveWindowToDesktop(dir))
            }
            (Verb::MoveToDesktop, _, _) => Err(err("move_to_desktop window <left|right>")),
            (Verb::Close, Some(Target::Window), None) => Ok(Action::CloseWindow),
            (Verb::Close, _, _) => Err(err("close window")),
            (Verb::Terminate, Some(Target::Window), None) => Ok(Action::TerminateWindow),
            (Verb::Terminate, _, _) => Err(err("terminate window")),
        }
    }
}
