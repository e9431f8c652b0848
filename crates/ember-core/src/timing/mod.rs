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

//! Timing primitives used to pace the engine's loops.
//!
//! * [`Clock`]: a monotonic stopwatch that can be shared read-only across threads.
//! * [`SpeedGovernor`]: a rate limiter pairing a clock with a target interval.

pub mod clock;
pub mod governor;

pub use clock::Clock;
pub use governor::SpeedGovernor;

/// An error raised when a timing parameter is out of its valid domain.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum TimingError {
    /// The interval is negative, NaN or infinite.
    #[error("invalid governor interval: {0} seconds (must be finite and >= 0)")]
    InvalidInterval(f64),
    /// The frequency is zero, negative or NaN.
    #[error("invalid governor frequency: {0} Hz (must be > 0)")]
    InvalidFrequency(f64),
}

/// Converts a number of seconds into truncated whole milliseconds.
#[inline]
pub(crate) fn seconds_to_millis(seconds: f64) -> i64 {
    (seconds * 1_000.0) as i64
}

/// Converts a number of seconds into truncated whole microseconds.
#[inline]
pub(crate) fn seconds_to_micros(seconds: f64) -> i64 {
    (seconds * 1_000_000.0) as i64
}

/// Converts a number of seconds into truncated whole nanoseconds.
#[inline]
pub(crate) fn seconds_to_nanos(seconds: f64) -> i64 {
    (seconds * 1_000_000_000.0) as i64
}
