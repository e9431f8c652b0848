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

//! Errors raised by the game-state stack.

/// An error raised by the game-state stack.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// A pop or drop was attempted on an empty stack.
    #[error("cannot {operation} a state: the state stack is empty")]
    EmptyStack {
        /// The rejected operation (`"pop"` or `"drop"`).
        operation: &'static str,
    },
    /// A state's `render` or `update` callback failed.
    #[error("game state '{state}' failed during {phase}")]
    Callback {
        /// Diagnostic name of the failing state.
        state: String,
        /// `"render"` or `"update"`.
        phase: &'static str,
        /// The error returned by the state.
        #[source]
        source: anyhow::Error,
    },
}
