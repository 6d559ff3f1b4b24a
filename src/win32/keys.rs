//! Mapping between [`Key`]/[`Modifiers`] and Win32 virtual keys.

use crate::keycombo::{Key, KeyStroke, Modifiers};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    VkKeyScanW, HOT_KEY_MODIFIERS, MOD_ALT, MOD_CONTROL, MOD_SHIFT, MOD_WIN, VIRTUAL_KEY, VK_BACK,
    VK_CONTROL, VK_DOWN, VK_ESCAPE, VK_LEFT, VK_LWIN, VK_MENU, VK_RETURN, VK_RIGHT, VK_RWIN,
    VK_SHIFT, VK_SPACE, VK_TAB, VK_UP,
};

/// Virtual key of a non-modifier key, if the keyboard layout has one.
pub(super) fn virtual_key(key: Key) -> Option<VIRTUAL_KEY> {
    let vk = match key {
        Key::Up => VK_UP,
        Key::Down => VK_DOWN,
        Key::Left => VK_LEFT,
        Key::Right => VK_RIGHT,
        Key::Backspace => VK_BACK,
        Key::Tab => VK_TAB,
        Key::Enter => VK_RETURN,
        Key::Escape => VK_ESCAPE,
        Key::Space => VK_SPACE,
        // Letters and digits share their (upper-case) ASCII code.
        Key::Char(c) if c.is_ascii_uppercase() || c.is_ascii_digit() => VIRTUAL_KEY(c as u16),
        Key::Char(c) => {
            let mut units = [0u16; 2];
            let [unit] = c.encode_utf16(&mut units) else {
                return None;
            };
            let scan = unsafe { VkKeyScanW(*unit) };
            if scan == -1 {
                return None;
            }
            VIRTUAL_KEY((scan as u16) & 0xff)
        }
    };
    Some(vk)
}

/// Virtual key for a single modifier flag.
fn modifier_key(modifier: Modifiers) -> VIRTUAL_KEY {
    if modifier == Modifiers::CTRL {
        VK_CONTROL
    } else if modifier == Modifiers::ALT {
        VK_MENU
    } else if modifier == Modifiers::SHIFT {
        VK_SHIFT
    } else {
        VK_LWIN
    }
}

pub(super) fn stroke_key(stroke: KeyStroke) -> Option<VIRTUAL_KEY> {
    match stroke {
        KeyStroke::Modifier(m) => Some(modifier_key(m)),
        KeyStroke::Key(k) => virtual_key(k),
    }
}

/// Keys that need `KEYEVENTF_EXTENDEDKEY` when synthesized.
pub(super) fn is_extended(vk: VIRTUAL_KEY) -> bool {
    matches!(vk, VK_UP | VK_DOWN | VK_LEFT | VK_RIGHT | VK_LWIN | VK_RWIN)
}

pub(super) fn hotkey_modifiers(modifiers: Modifiers) -> HOT_KEY_MODIFIERS {
    let mut out = HOT_KEY_MODIFIERS(0);
    if modifiers.contains(Modifiers::CTRL) {
        out |= MOD_CONTROL;
    }
    if modifiers.contains(Modifiers::ALT) {
        out |= MOD_ALT;
    }
    if modifiers.contains(Modifiers::SHIFT) {
        out |= MOD_SHIFT;
    }
    if modifiers.contains(Modifiers::WIN) {
        out |= MOD_WIN;
    }
    out
}

/// Virtual keys polled to find out which modifiers are held.
///
/// Each entry is the same key [`stroke_key`] synthesizes for that modifier,
/// so releasing and re-pressing a held modifier hits the key that is down.
/// The right Win key is not polled; only the left one is ever synthesized.
pub(super) const HELD_MODIFIER_KEYS: &[(VIRTUAL_KEY, Modifiers)] = &[
    (VK_CONTROL, Modifiers::CTRL),
    (VK_MENU, Modifiers::ALT),
    (VK_SHIFT, Modifiers::SHIFT),
    (VK_LWIN, Modifiers::WIN),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_and_digits_map_to_ascii() {
        assert_eq!(virtual_key(Key::Char('L')), Some(VIRTUAL_KEY(b'L' as u16)));
        assert_eq!(virtual_key(Key::Char('7')), Some(VIRTUAL_KEY(b'7' as u16)));
        assert_eq!(virtual_key(Key::Right), Some(VK_RIGHT));
    }

    #[test]
    fn hotkey_modifiers_combine() {
        let mods = hotkey_modifiers(Modifiers::CTRL | Modifiers::WIN);
        assert_eq!(mods, MOD_CONTROL | MOD_WIN);
    }

    #[test]
    fn polled_modifiers_are_the_synthesized_keys() {
        for (vk, modifier) in HELD_MODIFIER_KEYS {
            assert_eq!(stroke_key(KeyStroke::Modifier(*modifier)), Some(*vk));
        }
        assert!(HELD_MODIFIER_KEYS.iter().all(|(vk, _)| *vk != VK_RWIN));
    }

    #[test]
    fn arrows_are_extended() {
        assert!(is_extended(VK_LEFT));
        assert!(!is_extended(VK_SHIFT));
    }
}
