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

//! # Ember Control
//!
//! The game-state layer driven by the loop.
//!
//! - [`GameState`]: a unit of game logic with lifecycle callbacks.
//! - [`GameStateManager`]: the pushdown automaton holding the active stack
//!   and the live lists each dispatch channel reads.
//! - [`GameStateStore`]: a keyed cache of reusable states.
//! - [`Controller`]: per-state keybindings and input callbacks.

#![warn(missing_docs)]

pub mod controller;
pub mod error;
pub mod manager;
pub mod state;
pub mod store;

pub use controller::{Controller, Keybinding};
pub use error::StateError;
pub use manager::GameStateManager;
pub use state::{share, GameState, SharedState, StateCommand, StateCommands, Transparency};
pub use store::GameStateStore;

use std::sync::{Mutex, MutexGuard};

/// Locks `mutex`, recovering the guard if a previous holder panicked.
///
/// A poisoned state lock only means one of its callbacks panicked; the data
/// itself is still usable by the rest of the stack.
pub(crate) fn lock_or_recover<'a, T: ?Sized>(
    mutex: &'a Mutex<T>,
    what: &str,
) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        log::warn!("Recovering poisoned lock on {what}");
        poisoned.into_inner()
    })
}
