//! Keys a signal can be bound to on the receiving machine.
//!
//! The canonical numeric value of a [`KeyCode`] is its USB HID Usage ID
//! (page 0x07, Keyboard/Keypad).  Textual names follow the DOM
//! `KeyboardEvent.code` convention and are what configuration files use:
//!
//! ```toml
//! [[signals]]
//! name = "left"
//! key = "ArrowLeft"
//! ```
//!
//! Platform codes are produced at the injection boundary:
//!
//! | Column        | Used by                                  |
//! |---------------|------------------------------------------|
//! | HID usage     | canonical value, logs                    |
//! | Windows VK    | `SendInput` backend                      |
//! | evdev keycode | Linux uinput backend (`linux/input-event-codes.h`) |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// The key name was not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown key name: {0}")]
pub struct UnknownKey(pub String);

struct KeyEntry {
    key: KeyCode,
    name: &'static str,
    hid: u16,
    vk: u8,
    evdev: u16,
}

macro_rules! key_table {
    ($($variant:ident => hid $hid:literal, vk $vk:literal, evdev $evdev:literal;)+) => {
        /// A physical key identified by its DOM `code` name.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum KeyCode {
            $($variant,)+
        }

        const KEY_TABLE: &[KeyEntry] = &[
            $(KeyEntry {
                key: KeyCode::$variant,
                name: stringify!($variant),
                hid: $hid,
                vk: $vk,
                evdev: $evdev,
            },)+
        ];
    };
}

key_table! {
    ArrowLeft    => hid 0x50, vk 0x25, evdev 105;
    ArrowDown    => hid 0x51, vk 0x28, evdev 108;
    ArrowUp      => hid 0x52, vk 0x26, evdev 103;
    ArrowRight   => hid 0x4F, vk 0x27, evdev 106;
    KeyA => hid 0x04, vk 0x41, evdev 30;
    KeyB => hid 0x05, vk 0x42, evdev 48;
    KeyC => hid 0x06, vk 0x43, evdev 46;
    KeyD => hid 0x07, vk 0x44, evdev 32;
    KeyE => hid 0x08, vk 0x45, evdev 18;
    KeyF => hid 0x09, vk 0x46, evdev 33;
    KeyG => hid 0x0A, vk 0x47, evdev 34;
    KeyH => hid 0x0B, vk 0x48, evdev 35;
    KeyI => hid 0x0C, vk 0x49, evdev 23;
    KeyJ => hid 0x0D, vk 0x4A, evdev 36;
    KeyK => hid 0x0E, vk 0x4B, evdev 37;
    KeyL => hid 0x0F, vk 0x4C, evdev 38;
    KeyM => hid 0x10, vk 0x4D, evdev 50;
    KeyN => hid 0x11, vk 0x4E, evdev 49;
    KeyO => hid 0x12, vk 0x4F, evdev 24;
    KeyP => hid 0x13, vk 0x50, evdev 25;
    KeyQ => hid 0x14, vk 0x51, evdev 16;
    KeyR => hid 0x15, vk 0x52, evdev 19;
    KeyS => hid 0x16, vk 0x53, evdev 31;
    KeyT => hid 0x17, vk 0x54, evdev 20;
    KeyU => hid 0x18, vk 0x55, evdev 22;
    KeyV => hid 0x19, vk 0x56, evdev 47;
    KeyW => hid 0x1A, vk 0x57, evdev 17;
    KeyX => hid 0x1B, vk 0x58, evdev 45;
    KeyY => hid 0x1C, vk 0x59, evdev 21;
    KeyZ => hid 0x1D, vk 0x5A, evdev 44;
    Digit1 => hid 0x1E, vk 0x31, evdev 2;
    Digit2 => hid 0x1F, vk 0x32, evdev 3;
    Digit3 => hid 0x20, vk 0x33, evdev 4;
    Digit4 => hid 0x21, vk 0x34, evdev 5;
    Digit5 => hid 0x22, vk 0x35, evdev 6;
    Digit6 => hid 0x23, vk 0x36, evdev 7;
    Digit7 => hid 0x24, vk 0x37, evdev 8;
    Digit8 => hid 0x25, vk 0x38, evdev 9;
    Digit9 => hid 0x26, vk 0x39, evdev 10;
    Digit0 => hid 0x27, vk 0x30, evdev 11;
    Enter     => hid 0x28, vk 0x0D, evdev 28;
    Escape    => hid 0x29, vk 0x1B, evdev 1;
    Backspace => hid 0x2A, vk 0x08, evdev 14;
    Tab       => hid 0x2B, vk 0x09, evdev 15;
    Space     => hid 0x2C, vk 0x20, evdev 57;
    ControlLeft  => hid 0xE0, vk 0xA2, evdev 29;
    ShiftLeft    => hid 0xE1, vk 0xA0, evdev 42;
    AltLeft      => hid 0xE2, vk 0xA4, evdev 56;
    ControlRight => hid 0xE4, vk 0xA3, evdev 97;
    ShiftRight   => hid 0xE5, vk 0xA1, evdev 54;
    AltRight     => hid 0xE6, vk 0xA5, evdev 100;
}

impl KeyCode {
    fn entry(self) -> &'static KeyEntry {
        // Every variant is generated together with its table row.
        KEY_TABLE
            .iter()
            .find(|e| e.key == self)
            .unwrap_or(&KEY_TABLE[0])
    }

    /// DOM `KeyboardEvent.code` name, e.g. `"ArrowLeft"`.
    pub fn name(self) -> &'static str {
        self.entry().name
    }

    /// USB HID Usage ID on the keyboard page.
    pub fn hid_usage(self) -> u16 {
        self.entry().hid
    }

    /// Windows Virtual-Key code.
    pub fn to_windows_vk(self) -> u8 {
        self.entry().vk
    }

    /// Linux input event code (`KEY_*`).
    pub fn to_evdev_code(self) -> u16 {
        self.entry().evdev
    }

    /// Every supported key, in table order.
    pub fn all() -> impl Iterator<Item = KeyCode> {
        KEY_TABLE.iter().map(|e| e.key)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyCode {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KEY_TABLE
            .iter()
            .find(|e| e.name == s)
            .map(|e| e.key)
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}

impl Serialize for KeyCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for KeyCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
