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

//! Per-state input handling.
//!
//! Every [`GameState`](crate::GameState) owns a [`Controller`]. The manager
//! feeds it the input its state is live for, and the controller runs the
//! matching keybindings and callbacks. A failing callback is logged and the
//! remaining callbacks still run.

mod keybinding;

pub use keybinding::{KeyCallback, Keybinding};

use crate::StateCommands;
use ember_core::platform::{Key, KeyAction, KeyModifiers, MouseButton};
use std::fmt;
use std::path::PathBuf;

/// Called with the cursor position.
pub type CursorCallback = Box<dyn FnMut(f64, f64, &StateCommands) -> anyhow::Result<()> + Send>;
/// Called when the cursor enters or leaves the window.
pub type CursorCrossingCallback = Box<dyn FnMut(&StateCommands) -> anyhow::Result<()> + Send>;
/// Called with the button and the modifiers held.
pub type MouseButtonCallback =
    Box<dyn FnMut(MouseButton, KeyModifiers, &StateCommands) -> anyhow::Result<()> + Send>;
/// Called with the scroll offsets.
pub type ScrollCallback = Box<dyn FnMut(f64, f64, &StateCommands) -> anyhow::Result<()> + Send>;
/// Called with the dropped paths.
pub type DropCallback = Box<dyn FnMut(&[PathBuf], &StateCommands) -> anyhow::Result<()> + Send>;

/// A registry of keybindings and input callbacks.
#[derive(Default)]
pub struct Controller {
    keybindings: Vec<Keybinding>,
    cursor_callbacks: Vec<CursorCallback>,
    cursor_in_callbacks: Vec<CursorCrossingCallback>,
    cursor_out_callbacks: Vec<CursorCrossingCallback>,
    mouse_button_press_callbacks: Vec<MouseButtonCallback>,
    mouse_button_release_callbacks: Vec<MouseButtonCallback>,
    scroll_callbacks: Vec<ScrollCallback>,
    drop_callbacks: Vec<DropCallback>,
}

impl Controller {
    /// Creates an empty controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces everything with the contents of `other`.
    pub fn replace(&mut self, other: Controller) {
        *self = other;
    }

    /// Removes every keybinding and callback.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    // --- Event entry points ---

    /// Runs every keybinding matching the event.
    pub fn on_key(
        &mut self,
        action: KeyAction,
        modifiers: KeyModifiers,
        key: &Key,
        scan_code: Option<u32>,
        commands: &StateCommands,
    ) {
        log::trace!("Key {action:?} {modifiers:?} {key:?} {scan_code:?}");
        for binding in &mut self.keybindings {
            if let Err(err) = binding.process(action, modifiers, key, scan_code, commands) {
                log::error!("Keybinding {binding:?} failed: {err:#}");
            }
        }
    }

    /// Runs the cursor callbacks.
    pub fn on_cursor(&mut self, x: f64, y: f64, commands: &StateCommands) {
        run_all(&mut self.cursor_callbacks, "cursor", |cb| cb(x, y, commands));
    }

    /// Runs the cursor-in callbacks.
    pub fn on_cursor_in(&mut self, commands: &StateCommands) {
        run_all(&mut self.cursor_in_callbacks, "cursor in", |cb| cb(commands));
    }

    /// Runs the cursor-out callbacks.
    pub fn on_cursor_out(&mut self, commands: &StateCommands) {
        run_all(&mut self.cursor_out_callbacks, "cursor out", |cb| cb(commands));
    }

    /// Runs the press or release callbacks. Repeats are ignored.
    pub fn on_mouse_button(
        &mut self,
        action: KeyAction,
        modifiers: KeyModifiers,
        button: MouseButton,
        commands: &StateCommands,
    ) {
        let callbacks = match action {
            KeyAction::Press => &mut self.mouse_button_press_callbacks,
            KeyAction::Release => &mut self.mouse_button_release_callbacks,
            KeyAction::Repeat => return,
        };
        run_all(callbacks, "mouse button", |cb| cb(button, modifiers, commands));
    }

    /// Runs the scroll callbacks.
    pub fn on_scroll(&mut self, x_offset: f64, y_offset: f64, commands: &StateCommands) {
        run_all(&mut self.scroll_callbacks, "scroll", |cb| {
            cb(x_offset, y_offset, commands)
        });
    }

    /// Runs the drop callbacks.
    pub fn on_drop(&mut self, paths: &[PathBuf], commands: &StateCommands) {
        run_all(&mut self.drop_callbacks, "drop", |cb| cb(paths, commands));
    }

    // --- Keybindings ---

    /// All keybindings, in registration order.
    pub fn keybindings(&self) -> &[Keybinding] {
        &self.keybindings
    }

    /// Keybindings this key event would fire, under [`Keybinding::matches`].
    pub fn keybindings_matching(
        &self,
        action: KeyAction,
        modifiers: KeyModifiers,
        key: &Key,
        scan_code: Option<u32>,
    ) -> Vec<&Keybinding> {
        self.filter(|b| b.matches(action, modifiers, key, scan_code))
    }

    /// Keybindings bound to `action`.
    pub fn keybindings_by_action(&self, action: KeyAction) -> Vec<&Keybinding> {
        self.filter(|b| b.action() == action)
    }

    /// Keybindings bound to `key`.
    pub fn keybindings_by_key(&self, key: &Key) -> Vec<&Keybinding> {
        self.filter(|b| b.key() == key)
    }

    /// Keybindings requiring exactly `modifiers`.
    pub fn keybindings_by_modifiers(&self, modifiers: KeyModifiers) -> Vec<&Keybinding> {
        self.filter(|b| b.modifiers() == modifiers)
    }

    /// Keybindings carrying `scan_code` as their fallback.
    pub fn keybindings_by_scan_code(&self, scan_code: u32) -> Vec<&Keybinding> {
        self.filter(|b| b.scan_code() == Some(scan_code))
    }

    /// Replaces all keybindings.
    pub fn set_keybindings(&mut self, keybindings: Vec<Keybinding>) {
        self.keybindings = keybindings;
    }

    /// Appends a keybinding. Bindings run in registration order.
    pub fn add_keybinding(&mut self, keybinding: Keybinding) {
        self.keybindings.push(keybinding);
    }

    /// Removes every keybinding, leaving the callbacks.
    pub fn clear_keybindings(&mut self) {
        self.keybindings.clear();
    }

    /// Removes the keybindings [`keybindings_matching`](Self::keybindings_matching) would return.
    pub fn remove_keybindings(
        &mut self,
        action: KeyAction,
        modifiers: KeyModifiers,
        key: &Key,
        scan_code: Option<u32>,
    ) {
        self.keybindings
            .retain(|b| !b.matches(action, modifiers, key, scan_code));
    }

    /// Removes the keybindings bound to `action`.
    pub fn remove_keybindings_by_action(&mut self, action: KeyAction) {
        self.keybindings.retain(|b| b.action() != action);
    }

    /// Removes the keybindings bound to `key`.
    pub fn remove_keybindings_by_key(&mut self, key: &Key) {
        self.keybindings.retain(|b| b.key() != key);
    }

    /// Removes the keybindings requiring exactly `modifiers`.
    pub fn remove_keybindings_by_modifiers(&mut self, modifiers: KeyModifiers) {
        self.keybindings.retain(|b| b.modifiers() != modifiers);
    }

    /// Removes the keybindings carrying `scan_code`.
    pub fn remove_keybindings_by_scan_code(&mut self, scan_code: u32) {
        self.keybindings.retain(|b| b.scan_code() != Some(scan_code));
    }

    // --- Callbacks ---

    /// Registers a callback for cursor motion, in window coordinates.
    pub fn add_cursor_callback<F>(&mut self, callback: F)
    where
        F: FnMut(f64, f64, &StateCommands) -> anyhow::Result<()> + Send + 'static,
    {
        self.cursor_callbacks.push(Box::new(callback));
    }

    /// Removes every cursor callback.
    pub fn clear_cursor_callbacks(&mut self) {
        self.cursor_callbacks.clear();
    }

    /// Registers a callback for the cursor entering the window.
    pub fn add_cursor_in_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&StateCommands) -> anyhow::Result<()> + Send + 'static,
    {
        self.cursor_in_callbacks.push(Box::new(callback));
    }

    /// Removes every cursor-in callback.
    pub fn clear_cursor_in_callbacks(&mut self) {
        self.cursor_in_callbacks.clear();
    }

    /// Registers a callback for the cursor leaving the window.
    pub fn add_cursor_out_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&StateCommands) -> anyhow::Result<()> + Send + 'static,
    {
        self.cursor_out_callbacks.push(Box::new(callback));
    }

    /// Removes every cursor-out callback.
    pub fn clear_cursor_out_callbacks(&mut self) {
        self.cursor_out_callbacks.clear();
    }

    /// Registers a callback for mouse button presses.
    pub fn add_mouse_button_press_callback<F>(&mut self, callback: F)
    where
        F: FnMut(MouseButton, KeyModifiers, &StateCommands) -> anyhow::Result<()> + Send + 'static,
    {
        self.mouse_button_press_callbacks.push(Box::new(callback));
    }

    /// Removes every press callback.
    pub fn clear_mouse_button_press_callbacks(&mut self) {
        self.mouse_button_press_callbacks.clear();
    }

    /// Registers a callback for mouse button releases.
    pub fn add_mouse_button_release_callback<F>(&mut self, callback: F)
    where
        F: FnMut(MouseButton, KeyModifiers, &StateCommands) -> anyhow::Result<()> + Send + 'static,
    {
        self.mouse_button_release_callbacks.push(Box::new(callback));
    }

    /// Removes every release callback.
    pub fn clear_mouse_button_release_callbacks(&mut self) {
        self.mouse_button_release_callbacks.clear();
    }

    /// Registers a callback for wheel or touchpad scrolling.
    pub fn add_scroll_callback<F>(&mut self, callback: F)
    where
        F: FnMut(f64, f64, &StateCommands) -> anyhow::Result<()> + Send + 'static,
    {
        self.scroll_callbacks.push(Box::new(callback));
    }

    /// Removes every scroll callback.
    pub fn clear_scroll_callbacks(&mut self) {
        self.scroll_callbacks.clear();
    }

    /// Registers a callback for files dropped onto the window.
    pub fn add_drop_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&[PathBuf], &StateCommands) -> anyhow::Result<()> + Send + 'static,
    {
        self.drop_callbacks.push(Box::new(callback));
    }

    /// Removes every drop callback.
    pub fn clear_drop_callbacks(&mut self) {
        self.drop_callbacks.clear();
    }

    fn filter(&self, predicate: impl Fn(&Keybinding) -> bool) -> Vec<&Keybinding> {
        self.keybindings.iter().filter(|b| predicate(b)).collect()
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("keybindings", &self.keybindings)
            .field("cursor_callbacks", &self.cursor_callbacks.len())
            .field("cursor_in_callbacks", &self.cursor_in_callbacks.len())
            .field("cursor_out_callbacks", &self.cursor_out_callbacks.len())
            .field("mouse_button_press_callbacks", &self.mouse_button_press_callbacks.len())
            .field("mouse_button_release_callbacks", &self.mouse_button_release_callbacks.len())
            .field("scroll_callbacks", &self.scroll_callbacks.len())
            .field("drop_callbacks", &self.drop_callbacks.len())
            .finish()
    }
}

fn run_all<C>(
    callbacks: &mut [C],
    what: &str,
    mut invoke: impl FnMut(&mut C) -> anyhow::Result<()>,
) {
    for callback in callbacks.iter_mut() {
        if let Err(err) = invoke(callback) {
            log::error!("{what} callback failed: {err:#}");
        }
    }
}
