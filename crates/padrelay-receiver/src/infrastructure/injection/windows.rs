//! Windows key backend via the SendInput API.

#![cfg(target_os = "windows")]

use padrelay_core::KeyCode;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, VIRTUAL_KEY,
};

use super::keyboard::KeyBackend;
use crate::application::receive_state::InjectionError;

/// VKs that must carry `KEYEVENTF_EXTENDEDKEY`: arrows, right Ctrl, right Alt.
const EXTENDED_VKS: &[u8] = &[0x25, 0x26, 0x27, 0x28, 0xA3, 0xA5];

#[derive(Debug, Default)]
pub struct SendInputBackend;

impl SendInputBackend {
    pub fn new() -> Self {
        Self
    }
}

impl KeyBackend for SendInputBackend {
    fn key_down(&mut self, key: KeyCode) -> Result<(), InjectionError> {
        send_key(key.to_windows_vk(), false)
    }

    fn key_up(&mut self, key: KeyCode) -> Result<(), InjectionError> {
        send_key(key.to_windows_vk(), true)
    }
}

fn send_key(vk: u8, key_up: bool) -> Result<(), InjectionError> {
    let mut flags = KEYBD_EVENT_FLAGS(0);
    if key_up {
        flags |= KEYEVENTF_KEYUP;
    }
    if EXTENDED_VKS.contains(&vk) {
        flags |= KEYEVENTF_EXTENDEDKEY;
    }

    let input = INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(vk as u16),
                wScan: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    };
    // SAFETY: input is a valid KEYBDINPUT structure on the stack
    let inserted = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
    if inserted != 1 {
        return Err(InjectionError::Platform(format!(
            "SendInput rejected key 0x{vk:02X} (blocked by UIPI?)"
        )));
    }
    Ok(())
}
