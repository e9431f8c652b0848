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

//! A `winit`-based implementation of the `GameWindow` trait.

use crate::platform::input::{map_modifiers, translate_winit_input};
use ember_core::platform::{GameWindow, InputEvent, InputSink, KeyModifiers, PlatformError};
use std::time::Duration;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Window, WindowId},
};

/// How long one startup pump may block while waiting for the platform to resume.
const STARTUP_PUMP_TIMEOUT: Duration = Duration::from_millis(10);
/// Startup pumps attempted before giving up on the window.
const MAX_STARTUP_PUMPS: usize = 200;

/// A desktop window driven by a `winit` event loop that the game loop pumps.
///
/// The event loop is never run in `winit`'s own blocking mode: the render
/// loop pumps it once per frame, so the window must live on the thread that
/// calls `GameLoop::run`. The OS window is only created by
/// [`make_current`](GameWindow::make_current).
pub struct WinitWindow {
    event_loop: EventLoop<()>,
    handler: WindowHandler,
}

/// A builder for creating `WinitWindow` instances.
pub struct WinitWindowBuilder {
    title: String,
    width: u32,
    height: u32,
}

impl WinitWindowBuilder {
    /// Creates a new `WinitWindowBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            title: "Ember".to_string(),
            width: 1024,
            height: 768,
        }
    }

    /// Sets the title of the window to be built.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the initial inner dimensions of the window to be built.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Creates the event loop backing the window.
    ///
    /// # Errors
    /// Returns [`PlatformError::EventLoop`] if `winit` refuses to create an
    /// event loop, e.g. off the main thread or when one already exists.
    pub fn build(self) -> Result<WinitWindow, PlatformError> {
        let event_loop =
            EventLoop::new().map_err(|err| PlatformError::EventLoop(err.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        Ok(WinitWindow {
            event_loop,
            handler: WindowHandler {
                title: self.title,
                width: self.width,
                height: self.height,
                window: None,
                creation_error: None,
                close_requested: false,
                modifiers: KeyModifiers::empty(),
                pending: Vec::new(),
            },
        })
    }
}

impl Default for WinitWindowBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WinitWindow {
    /// The underlying `winit` window, once created.
    pub fn window(&self) -> Option<&Window> {
        self.handler.window.as_ref()
    }

    /// Returns the physical dimensions (width, height) of the window's inner area.
    pub fn inner_size(&self) -> Option<(u32, u32)> {
        self.window().map(|window| {
            let size = window.inner_size();
            (size.width, size.height)
        })
    }

    fn pump(&mut self, timeout: Duration) {
        let status = self
            .event_loop
            .pump_app_events(Some(timeout), &mut self.handler);
        if let PumpStatus::Exit(code) = status {
            log::info!("Window event loop exited with code {code}");
            self.handler.close_requested = true;
        }
    }
}

impl GameWindow for WinitWindow {
    fn make_current(&mut self) -> Result<(), PlatformError> {
        for _ in 0..MAX_STARTUP_PUMPS {
            if self.handler.window.is_some() {
                return Ok(());
            }
            self.pump(STARTUP_PUMP_TIMEOUT);
            if let Some(reason) = self.handler.creation_error.take() {
                return Err(PlatformError::ContextCreation(reason));
            }
            if self.handler.close_requested && self.handler.window.is_none() {
                return Err(PlatformError::ContextCreation(
                    "the event loop exited before the window was created".to_string(),
                ));
            }
        }
        if self.handler.window.is_some() {
            return Ok(());
        }
        Err(PlatformError::ContextCreation(
            "the platform never resumed the event loop".to_string(),
        ))
    }

    fn poll_events(&mut self, sink: &dyn InputSink) {
        self.pump(Duration::ZERO);
        for event in self.handler.pending.drain(..) {
            sink.dispatch(&event);
        }
    }

    fn swap_buffers(&mut self) {
        if let Some(window) = &self.handler.window {
            window.pre_present_notify();
            window.request_redraw();
        }
    }

    fn should_close(&self) -> bool {
        self.handler.close_requested
    }
}

impl std::fmt::Debug for WinitWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WinitWindow")
            .field("title", &self.handler.title)
            .field("window", &self.handler.window.as_ref().map(Window::id))
            .field("close_requested", &self.handler.close_requested)
            .finish_non_exhaustive()
    }
}

/// Receives `winit` callbacks during a pump and buffers the input they carry.
struct WindowHandler {
    title: String,
    width: u32,
    height: u32,
    window: Option<Window>,
    creation_error: Option<String>,
    close_requested: bool,
    modifiers: KeyModifiers,
    pending: Vec<InputEvent>,
}

impl ApplicationHandler for WindowHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        log::info!(
            "Building window with title: '{}' and size: {}x{}",
            self.title,
            self.width,
            self.height
        );
        let attributes = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(LogicalSize::new(self.width, self.height))
            .with_visible(true);

        match event_loop.create_window(attributes) {
            Ok(window) => {
                log::info!("Winit window created successfully (id: {:?}).", window.id());
                self.window = Some(window);
            }
            Err(err) => {
                log::error!("Failed to create the window: {err}");
                self.creation_error = Some(err.to_string());
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if self.window.as_ref().map(Window::id) != Some(id) {
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                self.close_requested = true;
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = map_modifiers(modifiers.state());
            }
            _ => {}
        }

        if let Some(input) = translate_winit_input(&event, self.modifiers) {
            log::trace!("Input event: {input:?}");
            self.pending.push(input);
        }
    }
}
