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

//! # Ember Core
//!
//! Foundational crate containing the timing primitives that pace the engine's
//! loops and the interface contracts through which the engine talks to the
//! windowing layer.

#![warn(missing_docs)]

pub mod platform;
pub mod timing;

pub use platform::{GameWindow, InputEvent, InputSink, PlatformError};
pub use timing::{Clock, SpeedGovernor, TimingError};
