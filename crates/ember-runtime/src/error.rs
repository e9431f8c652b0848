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

use ember_control::StateError;
use ember_core::{PlatformError, TimingError};
use std::path::PathBuf;

/// An invalid or unreadable loop configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A frame or tick rate of zero.
    #[error("{field} must be greater than zero")]
    ZeroRate {
        /// The offending field.
        field: &'static str,
    },
    /// A negative, NaN or infinite time speed.
    #[error("time speed must be finite and >= 0, got {0}")]
    InvalidTimeSpeed(f64),
    /// A negative, NaN or infinite lag cap.
    #[error("max lag must be finite and >= 0, got {0}")]
    InvalidMaxLag(f64),
    /// The config file could not be read or written.
    #[error("cannot access loop config file {}", .path.display())]
    Io {
        /// The file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The config is not valid JSON for a [`LoopConfig`](crate::LoopConfig).
    #[error("malformed loop config")]
    Parse(#[from] serde_json::Error),
}

/// An error ending [`GameLoop::run`](crate::GameLoop::run) or rejecting a loop setting.
#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    /// The configuration was rejected.
    #[error("invalid loop configuration")]
    Config(#[from] ConfigError),
    /// A governor rejected a timing parameter.
    #[error("invalid loop timing")]
    Timing(#[from] TimingError),
    /// The window could not be made current; no thread was started.
    #[error("failed to start the game loop")]
    Startup(#[source] PlatformError),
    /// `run` was called while the loop was already running.
    #[error("the game loop is already running")]
    AlreadyRunning,
    /// The OS refused to spawn the update thread.
    #[error("failed to spawn the update thread")]
    Spawn(#[source] std::io::Error),
    /// A state failed during update.
    #[error("update loop failed")]
    Update(#[source] StateError),
    /// A state failed during render.
    #[error("render loop failed")]
    Render(#[source] StateError),
    /// The update thread panicked.
    #[error("the update thread panicked")]
    UpdateThreadPanicked,
}
