// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Translation from `winit` window events to the loop's abstract input events.
//!
//! This module keeps the rest of the workspace independent of the input
//! format of the `winit` crate.

use ember_core::platform::{InputEvent, Key, KeyAction, KeyModifiers, MouseButton};
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, ModifiersState, NativeKeyCode, PhysicalKey};

/// Translates a `winit::event::WindowEvent` into an [`InputEvent`].
///
/// `modifiers` is the modifier state last reported by `ModifiersChanged`;
/// winit does not attach it to key or button events.
///
/// # Returns
///
/// `Some(InputEvent)` for user input, `None` for every other window event
/// (resizes, focus changes, close requests...).
pub fn translate_winit_input(event: &WindowEvent, modifiers: KeyModifiers) -> Option<InputEvent> {
    match event {
        WindowEvent::KeyboardInput {
            event: key_event, ..
        } => {
            let (key, scan_code) = map_physical_key(key_event.physical_key);
            Some(InputEvent::Key {
                action: map_key_action(key_event.state, key_event.repeat),
                modifiers,
                key,
                scan_code,
            })
        }
        WindowEvent::CursorMoved { position, .. } => Some(InputEvent::CursorMoved {
            x: position.x,
            y: position.y,
        }),
        WindowEvent::CursorEntered { .. } => Some(InputEvent::CursorEntered),
        WindowEvent::CursorLeft { .. } => Some(InputEvent::CursorLeft),
        WindowEvent::MouseInput { state, button, .. } => Some(InputEvent::MouseButton {
            action: map_key_action(*state, false),
            modifiers,
            button: map_mouse_button(*button),
        }),
        WindowEvent::MouseWheel { delta, .. } => {
            let (x_offset, y_offset) = match delta {
                MouseScrollDelta::LineDelta(x, y) => (f64::from(*x), f64::from(*y)),
                MouseScrollDelta::PixelDelta(pos) => (pos.x, pos.y),
            };
            if x_offset != 0.0 || y_offset != 0.0 {
                Some(InputEvent::Scroll { x_offset, y_offset })
            } else {
                None
            }
        }
        WindowEvent::DroppedFile(path) => Some(InputEvent::FilesDropped {
            paths: vec![path.clone()],
        }),
        _ => None,
    }
}

/// Maps winit's modifier state to [`KeyModifiers`].
pub fn map_modifiers(state: ModifiersState) -> KeyModifiers {
    let mut modifiers = KeyModifiers::empty();
    modifiers.set(KeyModifiers::SHIFT, state.shift_key());
    modifiers.set(KeyModifiers::CONTROL, state.control_key());
    modifiers.set(KeyModifiers::ALT, state.alt_key());
    modifiers.set(KeyModifiers::SUPER, state.super_key());
    modifiers
}

// --- Private Helper Functions ---

fn map_key_action(state: ElementState, repeat: bool) -> KeyAction {
    match state {
        ElementState::Pressed if repeat => KeyAction::Repeat,
        ElementState::Pressed => KeyAction::Press,
        ElementState::Released => KeyAction::Release,
    }
}

/// (Internal) Splits a physical key into its name and, for keys winit could
/// not name, the native scan code.
fn map_physical_key(key: PhysicalKey) -> (Key, Option<u32>) {
    match key {
        PhysicalKey::Code(keycode) => (Key::Code(map_keycode_to_string(keycode)), None),
        PhysicalKey::Unidentified(native) => (Key::Unidentified, map_native_scan_code(native)),
    }
}

fn map_native_scan_code(native: NativeKeyCode) -> Option<u32> {
    match native {
        NativeKeyCode::Unidentified => None,
        NativeKeyCode::Android(code) | NativeKeyCode::Xkb(code) => Some(code),
        NativeKeyCode::MacOS(code) | NativeKeyCode::Windows(code) => Some(u32::from(code)),
    }
}

/// (Internal) Maps a `winit::keyboard::KeyCode` to a string representation.
fn map_keycode_to_string(keycode: KeyCode) -> String {
    format!("{keycode:?}")
}

/// (Internal) Maps a `winit::event::MouseButton` to the loop's `MouseButton` enum.
fn map_mouse_button(button: WinitMouseButton) -> MouseButton {
    match button {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Back,
        WinitMouseButton::Forward => MouseButton::Forward,
        WinitMouseButton::Other(id) => MouseButton::Other(id),
    }
}
