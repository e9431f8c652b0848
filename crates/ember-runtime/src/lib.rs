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

//! # Ember Runtime
//!
//! The dual-rate loop tying a window to a [`GameStateManager`](ember_control::GameStateManager).
//!
//! ```text
//!  render thread (caller)            update thread ("ember-update")
//!  ----------------------            ------------------------------
//!  poll window events  ──input──►   manager.update(step * time_speed)
//!  manager.render(delta)            update governor.next()
//!  render governor.next()
//! ```

pub mod config;
pub mod control;
pub mod error;
pub mod game_loop;

pub use config::LoopConfig;
pub use control::LoopControl;
pub use error::{ConfigError, LoopError};
pub use game_loop::GameLoop;
