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

//! The [`GameState`] trait and the handles passed to its callbacks.

use crate::Controller;
use crossbeam_channel::Sender;
use std::fmt;
use std::sync::{Arc, Mutex};

/// A game state shared between the stack, the store and the caller.
pub type SharedState = Arc<Mutex<dyn GameState>>;

/// Wraps a concrete state into a [`SharedState`].
pub fn share<S: GameState + 'static>(state: S) -> SharedState {
    Arc::new(Mutex::new(state))
}

/// Which dispatch channels reach through a state to the state below it.
///
/// A flag set on a state lets the state directly beneath it keep receiving
/// that kind of dispatch. The top state always receives all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transparency {
    /// The state below is still rendered.
    pub render: bool,
    /// The state below is still updated.
    pub update: bool,
    /// The state below still receives input.
    pub input: bool,
}

impl Transparency {
    /// Nothing reaches the states below.
    pub const OPAQUE: Self = Self {
        render: false,
        update: false,
        input: false,
    };

    /// Every channel reaches the states below.
    pub const TRANSPARENT: Self = Self {
        render: true,
        update: true,
        input: true,
    };

    /// Only rendering reaches the states below (e.g. a pause overlay).
    pub const RENDER_ONLY: Self = Self {
        render: true,
        update: false,
        input: false,
    };
}

/// A polymorphic unit of game logic living on the state stack.
///
/// Lifecycle callbacks are invoked by the [`GameStateManager`](crate::GameStateManager)
/// while it holds its stack lock, so they must not call back into the manager.
/// Transitions requested from inside a state go through [`StateCommands`].
pub trait GameState: Send {
    /// The state was pushed onto the stack.
    fn on_push(&mut self) {}

    /// The state was removed from the stack.
    fn on_pop(&mut self) {}

    /// The state became the top of the stack.
    fn on_activate(&mut self) {}

    /// The state stopped being the top of the stack.
    fn on_deactivate(&mut self) {}

    /// A state above this one was popped.
    fn on_ascend(&mut self) {}

    /// A state was pushed above this one.
    fn on_descend(&mut self) {}

    /// Which channels reach the state below. Read once, when the state is pushed.
    fn transparency(&self) -> Transparency {
        Transparency::OPAQUE
    }

    /// Draws the state. `delta` is the scaled time since the last update tick.
    fn render(&mut self, delta: f64) -> anyhow::Result<()>;

    /// Advances the state by `delta` scaled seconds.
    fn update(&mut self, delta: f64, commands: &StateCommands) -> anyhow::Result<()>;

    /// The controller receiving this state's input.
    fn controller(&mut self) -> &mut Controller;

    /// A name used in logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A stack transition requested from inside a callback.
pub enum StateCommand {
    /// Push the given state.
    Push(SharedState),
    /// Push the state registered under this key in the store.
    PushKey(String),
    /// Pop the top state and discard it.
    Pop,
}

impl fmt::Debug for StateCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateCommand::Push(_) => f.write_str("Push(..)"),
            StateCommand::PushKey(key) => f.debug_tuple("PushKey").field(key).finish(),
            StateCommand::Pop => f.write_str("Pop"),
        }
    }
}

/// A cloneable handle for requesting stack transitions.
///
/// Requests are queued and applied by the manager once the current dispatch
/// has finished, in the order they were made.
#[derive(Debug, Clone)]
pub struct StateCommands {
    sender: Sender<StateCommand>,
}

impl StateCommands {
    pub(crate) fn new(sender: Sender<StateCommand>) -> Self {
        Self { sender }
    }

    /// Requests `state` to be pushed.
    pub fn push(&self, state: SharedState) {
        self.send(StateCommand::Push(state));
    }

    /// Requests the store entry `key` to be pushed.
    pub fn push_key(&self, key: impl Into<String>) {
        self.send(StateCommand::PushKey(key.into()));
    }

    /// Requests the top state to be popped.
    pub fn pop(&self) {
        self.send(StateCommand::Pop);
    }

    fn send(&self, command: StateCommand) {
        if let Err(err) = self.sender.send(command) {
            log::debug!("Dropping state command {:?}: manager is gone", err.0);
        }
    }
}
