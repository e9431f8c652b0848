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

//! Backend-agnostic input events and the sink that receives them.
//!
//! Windowing backends translate their native events into [`InputEvent`]s and
//! hand them to an [`InputSink`]. The engine never sees backend types.

use std::ops::BitOr;
use std::path::PathBuf;

/// What happened to a key or a mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// The key or button was released.
    Release,
    /// The key or button was pressed.
    Press,
    /// The key is held and the OS generated a repeat.
    Repeat,
}

/// A set of modifier keys held while an input event occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyModifiers(u8);

impl KeyModifiers {
    /// Either shift key.
    pub const SHIFT: Self = Self(0b0001);
    /// Either control key.
    pub const CONTROL: Self = Self(0b0010);
    /// Either alt key.
    pub const ALT: Self = Self(0b0100);
    /// Either super (logo) key.
    pub const SUPER: Self = Self(0b1000);

    /// No modifier held.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Builds a set from raw bits, ignoring unknown bits.
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & 0b1111)
    }

    /// Raw bits of the set.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether no modifier is held.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether every modifier in `other` is held.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Adds or removes `other` depending on `held`.
    pub fn set(&mut self, other: Self, held: bool) {
        if held {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }
}

impl BitOr for KeyModifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A logical key, identified by its physical code name (e.g. `"KeyA"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A key the backend could name.
    Code(String),
    /// A key the backend could not name; match it through its scan code.
    Unidentified,
}

impl Key {
    /// Shorthand for `Key::Code(name.into())`.
    pub fn code(name: impl Into<String>) -> Self {
        Key::Code(name.into())
    }
}

/// An engine-internal representation of a mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// The left mouse button.
    Left,
    /// The right mouse button.
    Right,
    /// The middle mouse button.
    Middle,
    /// The back mouse button (typically on the side).
    Back,
    /// The forward mouse button (typically on the side).
    Forward,
    /// Another mouse button, identified by a numeric code.
    Other(u16),
}

/// A user input event, as produced by a windowing backend.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A keyboard key changed state.
    Key {
        /// Press, release or repeat.
        action: KeyAction,
        /// Modifiers held at the time.
        modifiers: KeyModifiers,
        /// The key, when it could be named.
        key: Key,
        /// The platform scan code, when the backend exposes one.
        scan_code: Option<u32>,
    },
    /// The cursor moved inside the window.
    CursorMoved {
        /// Horizontal position in window pixels.
        x: f64,
        /// Vertical position in window pixels.
        y: f64,
    },
    /// The cursor entered the window.
    CursorEntered,
    /// The cursor left the window.
    CursorLeft,
    /// A mouse button changed state.
    MouseButton {
        /// Press or release.
        action: KeyAction,
        /// Modifiers held at the time.
        modifiers: KeyModifiers,
        /// The button.
        button: MouseButton,
    },
    /// The wheel or touchpad scrolled.
    Scroll {
        /// Horizontal offset.
        x_offset: f64,
        /// Vertical offset.
        y_offset: f64,
    },
    /// Files were dropped onto the window.
    FilesDropped {
        /// Paths of the dropped files.
        paths: Vec<PathBuf>,
    },
}

/// Receives input from a window.
///
/// Implementors only provide the six callbacks; [`dispatch`](Self::dispatch)
/// routes an [`InputEvent`] to the right one.
pub trait InputSink {
    /// A key changed state.
    fn key_callback(
        &self,
        action: KeyAction,
        modifiers: KeyModifiers,
        key: &Key,
        scan_code: Option<u32>,
    );

    /// The cursor moved to `(x, y)`.
    fn cursor_callback(&self, x: f64, y: f64);

    /// The cursor entered (`true`) or left (`false`) the window.
    fn cursor_in_out_callback(&self, entered: bool);

    /// A mouse button changed state.
    fn mouse_button_callback(
        &self,
        action: KeyAction,
        modifiers: KeyModifiers,
        button: MouseButton,
    );

    /// The wheel scrolled.
    fn scroll_callback(&self, x_offset: f64, y_offset: f64);

    /// Files were dropped onto the window.
    fn drop_callback(&self, paths: &[PathBuf]);

    /// Routes `event` to the matching callback.
    fn dispatch(&self, event: &InputEvent) {
        match event {
            InputEvent::Key {
                action,
                modifiers,
                key,
                scan_code,
            } => self.key_callback(*action, *modifiers, key, *scan_code),
            InputEvent::CursorMoved { x, y } => self.cursor_callback(*x, *y),
            InputEvent::CursorEntered => self.cursor_in_out_callback(true),
            InputEvent::CursorLeft => self.cursor_in_out_callback(false),
            InputEvent::MouseButton {
                action,
                modifiers,
                button,
            } => self.mouse_button_callback(*action, *modifiers, *button),
            InputEvent::Scroll { x_offset, y_offset } => {
                self.scroll_callback(*x_offset, *y_offset)
            }
            InputEvent::FilesDropped { paths } => self.drop_callback(paths),
        }
    }
}

/// An [`InputSink`] that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardInput;

impl InputSink for DiscardInput {
    fn key_callback(&self, _: KeyAction, _: KeyModifiers, _: &Key, _: Option<u32>) {}
    fn cursor_callback(&self, _: f64, _: f64) {}
    fn cursor_in_out_callback(&self, _: bool) {}
    fn mouse_button_callback(&self, _: KeyAction, _: KeyModifiers, _: MouseButton) {}
    fn scroll_callback(&self, _: f64, _: f64) {}
    fn drop_callback(&self, _: &[PathBuf]) {}
}
