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

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A monotonic stopwatch measuring the time elapsed since its last reset.
///
/// The reset instant is stored as an atomic nanosecond offset from the moment
/// the clock was created, so a `Clock` behind an `Arc` can be reset by its
/// owning loop while another thread samples [`elapsed`](Self::elapsed).
#[derive(Debug)]
pub struct Clock {
    origin: Instant,
    reset_offset_nanos: AtomicU64,
}

impl Clock {
    /// Creates a new clock, started at the moment of creation.
    ///
    /// ## Returns
    /// A new instance of the Clock struct.
    #[inline]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            reset_offset_nanos: AtomicU64::new(0),
        }
    }

    /// Resets the clock so that the elapsed time starts again from zero.
    pub fn reset(&self) {
        let offset = self.origin.elapsed().as_nanos() as u64;
        self.reset_offset_nanos.store(offset, Ordering::Release);
    }

    /// Returns the instant of the last reset (or of creation).
    pub fn reset_time(&self) -> Instant {
        self.origin + Duration::from_nanos(self.reset_offset_nanos.load(Ordering::Acquire))
    }

    /// Returns the time elapsed since the last reset.
    ///
    /// Never negative: a reset racing this call yields a zero duration.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        Instant::now().saturating_duration_since(self.reset_time())
    }

    /// Returns the elapsed time in seconds as f64.
    #[inline]
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    /// Returns the elapsed time in whole milliseconds.
    #[inline]
    pub fn elapsed_milliseconds(&self) -> u128 {
        self.elapsed().as_millis()
    }

    /// Returns the elapsed time in whole microseconds.
    #[inline]
    pub fn elapsed_microseconds(&self) -> u128 {
        self.elapsed().as_micros()
    }

    /// Returns the elapsed time in whole nanoseconds.
    #[inline]
    pub fn elapsed_nanoseconds(&self) -> u128 {
        self.elapsed().as_nanos()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
