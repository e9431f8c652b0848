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

use super::{InputSink, PlatformError};

/// A trait that abstracts the behavior of a window driven by the game loop.
///
/// Any windowing backend (Winit, SDL2, Glfw, a headless stub, etc.) can
/// implement this trait to be driven by the engine. All methods are called
/// from the thread running the render loop.
pub trait GameWindow {
    /// Makes the window's context current on the calling thread.
    ///
    /// Called once before the loop starts. A failure aborts startup.
    fn make_current(&mut self) -> Result<(), PlatformError>;

    /// Processes pending OS events, forwarding input to `sink`.
    fn poll_events(&mut self, sink: &dyn InputSink);

    /// Presents the frame that was just rendered.
    fn swap_buffers(&mut self);

    /// Whether the user or the OS asked the window to close.
    fn should_close(&self) -> bool;
}
