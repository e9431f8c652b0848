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

//! Provides abstractions over platform-specific functionalities.
//!
//! This module contains the traits and types through which the engine drives a
//! window and receives user input, independently of the windowing backend.

pub mod headless;
pub mod input;
pub mod window;

pub use headless::{CloseHandle, HeadlessWindow};
pub use input::{DiscardInput, InputEvent, InputSink, Key, KeyAction, KeyModifiers, MouseButton};
pub use window::GameWindow;

/// An error raised by a windowing backend.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The window or its rendering context could not be created or made current.
    #[error("failed to create window context: {0}")]
    ContextCreation(String),
    /// The backend's event loop could not be created or has exited.
    #[error("event loop failure: {0}")]
    EventLoop(String),
}
