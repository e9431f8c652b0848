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

use crate::StateCommands;
use ember_core::platform::{Key, KeyAction, KeyModifiers};
use std::fmt;

/// Callback run when a [`Keybinding`] fires.
pub type KeyCallback = Box<dyn FnMut(&StateCommands) -> anyhow::Result<()> + Send>;

/// Binds a key combination to a callback.
pub struct Keybinding {
    action: KeyAction,
    modifiers: KeyModifiers,
    key: Key,
    scan_code: Option<u32>,
    callback: KeyCallback,
}

impl Keybinding {
    /// Creates a binding firing `callback` on `action` of `key` with exactly `modifiers` held.
    pub fn new<F>(action: KeyAction, modifiers: KeyModifiers, key: Key, callback: F) -> Self
    where
        F: FnMut(&StateCommands) -> anyhow::Result<()> + Send + 'static,
    {
        Self {
            action,
            modifiers,
            key,
            scan_code: None,
            callback: Box::new(callback),
        }
    }

    /// Also matches events whose key is unidentified but whose scan code is `scan_code`.
    pub fn with_scan_code(mut self, scan_code: u32) -> Self {
        self.scan_code = Some(scan_code);
        self
    }

    /// Whether an event fires this binding.
    ///
    /// Action and modifiers must be equal. Then either the keys are equal, or
    /// the event key is unidentified and its scan code equals the bound one.
    pub fn matches(
        &self,
        action: KeyAction,
        modifiers: KeyModifiers,
        key: &Key,
        scan_code: Option<u32>,
    ) -> bool {
        if action != self.action || modifiers != self.modifiers {
            return false;
        }
        match key {
            Key::Unidentified => scan_code.is_some() && scan_code == self.scan_code,
            named => *named == self.key,
        }
    }

    /// Runs the callback if the event matches.
    ///
    /// ## Returns
    /// `Ok(true)` if the binding fired, `Ok(false)` if it did not match, or the
    /// callback's error.
    pub fn process(
        &mut self,
        action: KeyAction,
        modifiers: KeyModifiers,
        key: &Key,
        scan_code: Option<u32>,
        commands: &StateCommands,
    ) -> anyhow::Result<bool> {
        if !self.matches(action, modifiers, key, scan_code) {
            return Ok(false);
        }
        (self.callback)(commands)?;
        Ok(true)
    }

    /// Replaces the callback.
    pub fn set_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&StateCommands) -> anyhow::Result<()> + Send + 'static,
    {
        self.callback = Box::new(callback);
    }

    /// The bound action.
    pub fn action(&self) -> KeyAction {
        self.action
    }

    /// The exact modifier set required.
    pub fn modifiers(&self) -> KeyModifiers {
        self.modifiers
    }

    /// The bound key.
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// The bound scan code, if any.
    pub fn scan_code(&self) -> Option<u32> {
        self.scan_code
    }

    /// Rebinds to `action`.
    pub fn set_action(&mut self, action: KeyAction) {
        self.action = action;
    }

    /// Requires exactly `modifiers` from now on.
    pub fn set_modifiers(&mut self, modifiers: KeyModifiers) {
        self.modifiers = modifiers;
    }

    /// Rebinds to `key`.
    pub fn set_key(&mut self, key: Key) {
        self.key = key;
    }

    /// Sets or clears the scan-code fallback.
    pub fn set_scan_code(&mut self, scan_code: Option<u32>) {
        self.scan_code = scan_code;
    }

    /// Whether Shift is part of the required modifiers.
    pub fn shift(&self) -> bool {
        self.modifiers.contains(KeyModifiers::SHIFT)
    }

    /// Whether Control is part of the required modifiers.
    pub fn control(&self) -> bool {
        self.modifiers.contains(KeyModifiers::CONTROL)
    }

    /// Whether Alt is part of the required modifiers.
    pub fn alt(&self) -> bool {
        self.modifiers.contains(KeyModifiers::ALT)
    }

    /// Whether the Super (logo) key is part of the required modifiers.
    pub fn super_key(&self) -> bool {
        self.modifiers.contains(KeyModifiers::SUPER)
    }
}

impl fmt::Debug for Keybinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keybinding")
            .field("action", &self.action)
            .field("modifiers", &self.modifiers)
            .field("key", &self.key)
            .field("scan_code", &self.scan_code)
            .finish_non_exhaustive()
    }
}
