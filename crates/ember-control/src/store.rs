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

//! Keyed cache of reusable game states.

use crate::{share, GameState, SharedState};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A keyed registry of game states, independent of the stack.
///
/// A stored state may or may not be on the stack; removing it from one does
/// not affect the other.
#[derive(Default)]
pub struct GameStateStore {
    states: RwLock<HashMap<String, SharedState>>,
}

impl GameStateStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a state is registered under `key`.
    pub fn state_exists(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    /// Returns the state registered under `key`.
    pub fn get_state(&self, key: &str) -> Option<SharedState> {
        self.read().get(key).cloned()
    }

    /// Registers `state` under `key`.
    ///
    /// ## Returns
    /// `false` if the key is taken; the existing entry is kept.
    pub fn register_state(&self, key: impl Into<String>, state: SharedState) -> bool {
        let key = key.into();
        let mut states = self.write();
        if states.contains_key(&key) {
            log::warn!("Game state with \"{key}\" key already exists");
            return false;
        }
        log::debug!("Registered game state \"{key}\"");
        states.insert(key, state);
        true
    }

    /// Builds a state with `factory` and registers it under `key`.
    ///
    /// `factory` only runs when `key` is free.
    ///
    /// ## Returns
    /// The registered state, or `None` if the key is taken.
    pub fn make_state<S, F>(&self, key: impl Into<String>, factory: F) -> Option<SharedState>
    where
        S: GameState + 'static,
        F: FnOnce() -> S,
    {
        let key = key.into();
        let mut states = self.write();
        if states.contains_key(&key) {
            log::warn!("Game state with \"{key}\" key already exists");
            return None;
        }
        let state = share(factory());
        states.insert(key, state.clone());
        Some(state)
    }

    /// Removes the entry under `key`, returning it.
    pub fn delete_state(&self, key: &str) -> Option<SharedState> {
        self.write().remove(key)
    }

    /// Number of registered states.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether no state is registered.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, SharedState>> {
        self.states.read().unwrap_or_else(|poisoned| {
            log::warn!("Recovering poisoned game state store");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, SharedState>> {
        self.states.write().unwrap_or_else(|poisoned| {
            log::warn!("Recovering poisoned game state store");
            poisoned.into_inner()
        })
    }
}

impl std::fmt::Debug for GameStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameStateStore")
            .field("keys", &self.keys())
            .finish()
    }
}
