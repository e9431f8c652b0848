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

//! A window with no OS surface, for dedicated servers and tests.

use super::{GameWindow, InputEvent, InputSink, PlatformError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A cloneable handle that asks a [`HeadlessWindow`] to close from anywhere.
#[derive(Debug, Clone, Default)]
pub struct CloseHandle(Arc<AtomicBool>);

impl CloseHandle {
    /// Requests the window to close. Observed on the next `should_close`.
    pub fn close(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a close was requested.
    pub fn is_closed(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A deterministic [`GameWindow`] that never touches the OS.
///
/// It closes after a fixed lifetime measured from [`make_current`](GameWindow::make_current),
/// or when its [`CloseHandle`] is triggered. Queued input events are delivered
/// on the next poll.
#[derive(Debug, Default)]
pub struct HeadlessWindow {
    lifetime: Option<Duration>,
    opened_at: Option<Instant>,
    close: CloseHandle,
    pending: VecDeque<InputEvent>,
    startup_failure: Option<String>,
    frames_presented: u64,
    polls: u64,
}

impl HeadlessWindow {
    /// Creates a window that stays open until its close handle is triggered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a window that closes `lifetime` after `make_current`.
    pub fn with_lifetime(lifetime: Duration) -> Self {
        Self {
            lifetime: Some(lifetime),
            ..Self::default()
        }
    }

    /// Makes the next `make_current` call fail with `reason`.
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.startup_failure = Some(reason.into());
        self
    }

    /// Returns a handle that closes this window.
    pub fn close_handle(&self) -> CloseHandle {
        self.close.clone()
    }

    /// Queues an input event for the next poll.
    pub fn queue_event(&mut self, event: InputEvent) {
        self.pending.push_back(event);
    }

    /// Number of `swap_buffers` calls so far.
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Number of `poll_events` calls so far.
    pub fn polls(&self) -> u64 {
        self.polls
    }
}

impl GameWindow for HeadlessWindow {
    fn make_current(&mut self) -> Result<(), PlatformError> {
        if let Some(reason) = self.startup_failure.take() {
            return Err(PlatformError::ContextCreation(reason));
        }
        self.opened_at = Some(Instant::now());
        log::debug!("Headless window opened (lifetime: {:?})", self.lifetime);
        Ok(())
    }

    fn poll_events(&mut self, sink: &dyn InputSink) {
        self.polls += 1;
        while let Some(event) = self.pending.pop_front() {
            sink.dispatch(&event);
        }
    }

    fn swap_buffers(&mut self) {
        self.frames_presented += 1;
    }

    fn should_close(&self) -> bool {
        if self.close.is_closed() {
            return true;
        }
        match (self.lifetime, self.opened_at) {
            (Some(lifetime), Some(opened_at)) => opened_at.elapsed() >= lifetime,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{DiscardInput, Key, KeyAction, KeyModifiers};
    use std::thread;

    #[test]
    fn closes_after_lifetime_from_make_current() {
        let mut window = HeadlessWindow::with_lifetime(Duration::from_millis(30));
        thread::sleep(Duration::from_millis(40));
        assert!(!window.should_close(), "Lifetime starts at make_current");

        window.make_current().unwrap();
        assert!(!window.should_close());
        thread::sleep(Duration::from_millis(40));
        assert!(window.should_close());
    }

    #[test]
    fn close_handle_closes_from_another_thread() {
        let window = HeadlessWindow::new();
        let handle = window.close_handle();
        assert!(!window.should_close());

        thread::spawn(move || handle.close()).join().unwrap();

        assert!(window.should_close());
    }

    #[test]
    fn failing_window_reports_context_error_once() {
        let mut window = HeadlessWindow::new().failing("no display");
        let err = window.make_current().unwrap_err();
        assert!(matches!(err, PlatformError::ContextCreation(ref r) if r == "no display"));
        assert!(window.make_current().is_ok());
    }

    #[test]
    fn queued_events_are_drained_on_poll() {
        let mut window = HeadlessWindow::new();
        window.queue_event(InputEvent::Key {
            action: KeyAction::Press,
            modifiers: KeyModifiers::empty(),
            key: Key::code("Escape"),
            scan_code: None,
        });

        window.poll_events(&DiscardInput);
        window.poll_events(&DiscardInput);
        window.swap_buffers();

        assert_eq!(window.polls(), 2);
        assert_eq!(window.frames_presented(), 1);
        assert!(window.pending.is_empty());
    }
}
