use crate::types::{Modifiers, Vk};

// Native (Windows) virtual-key codes.
pub const VK_BACK: Vk = 0x08;
pub const VK_TAB: Vk = 0x09;
pub const VK_RETURN: Vk = 0x0D;
pub const VK_SHIFT: Vk = 0x10;
pub const VK_CONTROL: Vk = 0x11;
pub const VK_MENU: Vk = 0x12;
pub const VK_PAUSE: Vk = 0x13;
pub const VK_CAPITAL: Vk = 0x14;
pub const VK_ESCAPE: Vk = 0x1B;
pub const VK_SPACE: Vk = 0x20;
pub const VK_PRIOR: Vk = 0x21;
pub const VK_NEXT: Vk = 0x22;
pub const VK_END: Vk = 0x23;
pub const VK_HOME: Vk = 0x24;
pub const VK_LEFT: Vk = 0x25;
pub const VK_UP: Vk = 0x26;
pub const VK_RIGHT: Vk = 0x27;
pub const VK_DOWN: Vk = 0x28;
pub const VK_INSERT: Vk = 0x2D;
pub const VK_DELETE: Vk = 0x2E;
pub const VK_LWIN: Vk = 0x5B;
pub const VK_RWIN: Vk = 0x5C;
pub const VK_F1: Vk = 0x70;
pub const VK_F12: Vk = 0x7B;
pub const VK_LSHIFT: Vk = 0xA0;
pub const VK_RSHIFT: Vk = 0xA1;
pub const VK_LCONTROL: Vk = 0xA2;
pub const VK_RCONTROL: Vk = 0xA3;
pub const VK_LMENU: Vk = 0xA4;
pub const VK_RMENU: Vk = 0xA5;
pub const VK_OEM_1: Vk = 0xBA; // ;
pub const VK_OEM_PLUS: Vk = 0xBB; // =
pub const VK_OEM_COMMA: Vk = 0xBC;
pub const VK_OEM_MINUS: Vk = 0xBD;
pub const VK_OEM_PERIOD: Vk = 0xBE;
pub const VK_OEM_2: Vk = 0xBF; // /
pub const VK_OEM_3: Vk = 0xC0; // `
pub const VK_OEM_4: Vk = 0xDB; // [
pub const VK_OEM_5: Vk = 0xDC; // \
pub const VK_OEM_6: Vk = 0xDD; // ]
pub const VK_OEM_7: Vk = 0xDE; // '

/// Backspace scan code (set 1).
pub const SC_BACKSPACE: u16 = 0x0E;

/// Native virtual key -> engine key number.
///
/// The engine uses its own platform-neutral numbering (the ANSI key positions
/// of the Apple keyboard layout), so every key handed to it goes through here.
pub const VK_TO_ENGINE: &[(Vk, u16)] = &[
    // Letters
    (0x41, 0x00), // A
    (0x42, 0x0B), // B
    (0x43, 0x08), // C
    (0x44, 0x02), // D
    (0x45, 0x0E), // E
    (0x46, 0x03), // F
    (0x47, 0x05), // G
    (0x48, 0x04), // H
    (0x49, 0x22), // I
    (0x4A, 0x26), // J
    (0x4B, 0x28), // K
    (0x4C, 0x25), // L
    (0x4D, 0x2E), // M
    (0x4E, 0x2D), // N
    (0x4F, 0x1F), // O
    (0x50, 0x23), // P
    (0x51, 0x0C), // Q
    (0x52, 0x0F), // R
    (0x53, 0x01), // S
    (0x54, 0x11), // T
    (0x55, 0x20), // U
    (0x56, 0x09), // V
    (0x57, 0x0D), // W
    (0x58, 0x07), // X
    (0x59, 0x10), // Y
    (0x5A, 0x06), // Z
    // Digits
    (0x30, 0x1D), // 0
    (0x31, 0x12), // 1
    (0x32, 0x13), // 2
    (0x33, 0x14), // 3
    (0x34, 0x15), // 4
    (0x35, 0x17), // 5
    (0x36, 0x16), // 6
    (0x37, 0x1A), // 7
    (0x38, 0x1C), // 8
    (0x39, 0x19), // 9
    // Editing / whitespace
    (VK_SPACE, 0x31),
    (VK_RETURN, 0x24),
    (VK_BACK, 0x33),
    (VK_TAB, 0x30),
    (VK_ESCAPE, 0x35),
    // Punctuation
    (VK_OEM_4, 0x21),
    (VK_OEM_6, 0x1E),
    (VK_OEM_1, 0x29),
    (VK_OEM_7, 0x27),
    (VK_OEM_COMMA, 0x2B),
    (VK_OEM_PERIOD, 0x2F),
    (VK_OEM_2, 0x2C),
    (VK_OEM_MINUS, 0x1B),
    (VK_OEM_PLUS, 0x18),
    (VK_OEM_3, 0x32),
    (VK_OEM_5, 0x2A),
    // Arrows
    (VK_LEFT, 0x7B),
    (VK_RIGHT, 0x7C),
    (VK_DOWN, 0x7D),
    (VK_UP, 0x7E),
];

pub fn to_engine_key(vk: Vk) -> Option<u16> {
    VK_TO_ENGINE
        .iter()
        .find(|(native, _)| *native == vk)
        .map(|(_, engine)| *engine)
}

pub fn from_engine_key(key: u16) -> Option<Vk> {
    VK_TO_ENGINE
        .iter()
        .find(|(_, engine)| *engine == key)
        .map(|(native, _)| *native)
}

pub fn is_letter(vk: Vk) -> bool {
    (0x41..=0x5A).contains(&vk)
}

pub fn is_digit(vk: Vk) -> bool {
    (0x30..=0x39).contains(&vk)
}

pub fn is_letter_or_digit(vk: Vk) -> bool {
    is_letter(vk) || is_digit(vk)
}

pub fn is_shift(vk: Vk) -> bool {
    matches!(vk, VK_SHIFT | VK_LSHIFT | VK_RSHIFT)
}

pub fn is_ctrl(vk: Vk) -> bool {
    matches!(vk, VK_CONTROL | VK_LCONTROL | VK_RCONTROL)
}

pub fn is_alt(vk: Vk) -> bool {
    matches!(vk, VK_MENU | VK_LMENU | VK_RMENU)
}

pub fn is_win(vk: Vk) -> bool {
    matches!(vk, VK_LWIN | VK_RWIN)
}

/// Any key that participates in a modifier-only shortcut.
pub fn is_modifier(vk: Vk) -> bool {
    is_shift(vk) || is_ctrl(vk) || is_alt(vk)
}

/// The modifier flag a key contributes when held.
pub fn modifier_of(vk: Vk) -> Modifiers {
    Modifiers::new(is_ctrl(vk), is_alt(vk), is_shift(vk))
}

/// Keys forwarded to the engine: letters, digits, space, enter, backspace and
/// the two bracket keys used for the bracket shortcuts.
pub fn is_relevant(vk: Vk) -> bool {
    is_letter_or_digit(vk)
        || matches!(vk, VK_SPACE | VK_RETURN | VK_BACK | VK_OEM_4 | VK_OEM_6)
}

/// Keys that end the current word without being forwarded: navigation,
/// Tab, Escape, and bare Ctrl/Alt/Win. Shift is excluded since it is part of
/// ordinary capitalised typing.
pub fn breaks_buffer(vk: Vk) -> bool {
    matches!(
        vk,
        VK_LEFT
            | VK_RIGHT
            | VK_UP
            | VK_DOWN
            | VK_HOME
            | VK_END
            | VK_PRIOR
            | VK_NEXT
            | VK_INSERT
            | VK_DELETE
            | VK_TAB
            | VK_ESCAPE
    ) || is_ctrl(vk)
        || is_alt(vk)
        || is_win(vk)
}

/// Extended-key flag for synthesising navigation keys.
pub fn is_extended(vk: Vk) -> bool {
    matches!(
        vk,
        VK_LEFT
            | VK_RIGHT
            | VK_UP
            | VK_DOWN
            | VK_HOME
            | VK_END
            | VK_PRIOR
            | VK_NEXT
            | VK_INSERT
            | VK_DELETE
            | VK_RCONTROL
            | VK_RMENU
            | VK_LWIN
            | VK_RWIN
    )
}

pub fn key_name(vk: Vk) -> Option<&'static str> {
    let name = match vk {
        0x41 => "A",
        0x42 => "B",
        0x43 => "C",
        0x44 => "D",
        0x45 => "E",
        0x46 => "F",
        0x47 => "G",
        0x48 => "H",
        0x49 => "I",
        0x4A => "J",
        0x4B => "K",
        0x4C => "L",
        0x4D => "M",
        0x4E => "N",
        0x4F => "O",
        0x50 => "P",
        0x51 => "Q",
        0x52 => "R",
        0x53 => "S",
        0x54 => "T",
        0x55 => "U",
        0x56 => "V",
        0x57 => "W",
        0x58 => "X",
        0x59 => "Y",
        0x5A => "Z",
        0x30 => "0",
        0x31 => "1",
        0x32 => "2",
        0x33 => "3",
        0x34 => "4",
        0x35 => "5",
        0x36 => "6",
        0x37 => "7",
        0x38 => "8",
        0x39 => "9",
        0x70 => "F1",
        0x71 => "F2",
        0x72 => "F3",
        0x73 => "F4",
        0x74 => "F5",
        0x75 => "F6",
        0x76 => "F7",
        0x77 => "F8",
        0x78 => "F9",
        0x79 => "F10",
        0x7A => "F11",
        0x7B => "F12",
        VK_SPACE => "Space",
        VK_RETURN => "Enter",
        VK_TAB => "Tab",
        VK_ESCAPE => "Esc",
        VK_BACK => "Backspace",
        VK_PAUSE => "Pause",
        VK_LEFT => "Left",
        VK_RIGHT => "Right",
        VK_UP => "Up",
        VK_DOWN => "Down",
        VK_HOME => "Home",
        VK_END => "End",
        VK_PRIOR => "PageUp",
        VK_NEXT => "PageDown",
        VK_INSERT => "Insert",
        VK_DELETE => "Delete",
        VK_OEM_3 => "`",
        VK_OEM_4 => "[",
        VK_OEM_6 => "]",
        VK_OEM_1 => ";",
        VK_OEM_7 => "'",
        VK_OEM_COMMA => ",",
        VK_OEM_PERIOD => ".",
        VK_OEM_2 => "/",
        VK_OEM_MINUS => "-",
        VK_OEM_PLUS => "=",
        VK_OEM_5 => "\\",
        _ => return None,
    };
    Some(name)
}

/// Reverse of [`key_name`], case-insensitive, with a few aliases.
pub fn key_from_name(name: &str) -> Option<Vk> {
    match name.to_ascii_lowercase().as_str() {
        "escape" => return Some(VK_ESCAPE),
        "return" => return Some(VK_RETURN),
        "back" => return Some(VK_BACK),
        "pgup" => return Some(VK_PRIOR),
        "pgdn" => return Some(VK_NEXT),
        "del" => return Some(VK_DELETE),
        "ins" => return Some(VK_INSERT),
        _ => {}
    }
    (0..=0xFFu16).find(|&vk| key_name(vk).is_some_and(|n| n.eq_ignore_ascii_case(name)))
}
