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

//! A rate limiter pacing one loop against a target interval.

use super::{seconds_to_micros, seconds_to_millis, seconds_to_nanos, Clock, TimingError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Regulates how often a loop iteration may proceed.
///
/// Each call to [`next`](Self::next) sleeps away whatever is left of the target
/// interval, reports how late the iteration finished and restarts the clock.
///
/// * In **fixed-step** mode every iteration is treated as exactly one interval
///   long, so lateness is always reported as zero.
/// * In **catch-up** mode banked lag lets the governor skip sleeps until the
///   deficit is repaid. Lag is only repaid automatically when fixed-step is on.
#[derive(Debug)]
pub struct SpeedGovernor {
    fixed_step: bool,
    catch_up: bool,
    seconds: f64,
    frequency: f64,
    lag_seconds: f64,
    clock: Arc<Clock>,
}

impl SpeedGovernor {
    /// Creates a governor targeting `seconds` per iteration.
    ///
    /// ## Arguments
    /// * `fixed_step` - Report every iteration as exactly on time.
    /// * `catch_up` - Let banked lag shorten following iterations.
    /// * `seconds` - Minimum duration of one iteration. `0.0` means unthrottled.
    ///
    /// ## Returns
    /// The governor, or [`TimingError::InvalidInterval`] when `seconds` is
    /// negative or not finite.
    pub fn new(fixed_step: bool, catch_up: bool, seconds: f64) -> Result<Self, TimingError> {
        validate_seconds(seconds)?;
        Ok(Self {
            fixed_step,
            catch_up,
            seconds,
            frequency: 1.0 / seconds,
            lag_seconds: 0.0,
            clock: Arc::new(Clock::new()),
        })
    }

    /// Creates a governor targeting `frequency` iterations per second.
    pub fn from_frequency(
        fixed_step: bool,
        catch_up: bool,
        frequency: f64,
    ) -> Result<Self, TimingError> {
        validate_frequency(frequency)?;
        let mut governor = Self::new(fixed_step, catch_up, 0.0)?;
        governor.seconds = 1.0 / frequency;
        governor.frequency = frequency;
        Ok(governor)
    }

    /// Waits out the remainder of the current interval and starts the next one.
    ///
    /// ## Returns
    /// How many seconds past the deadline the iteration finished. Always `0.0`
    /// in fixed-step mode. Negative when banked lag let the iteration end
    /// before its deadline.
    pub fn next(&mut self) -> f64 {
        let elapsed = self.clock.elapsed_seconds();
        let lag = if self.catch_up { self.lag_seconds } else { 0.0 };

        if elapsed + lag < self.seconds {
            thread::sleep(Duration::from_secs_f64(self.seconds - elapsed));
        }

        let late = if self.fixed_step {
            0.0
        } else {
            self.clock.elapsed_seconds() - self.seconds
        };

        self.clock.reset();

        if self.catch_up && self.fixed_step {
            self.lose_lag(self.seconds);
        }

        late
    }

    /// Restarts the interval clock without sleeping.
    pub fn reset(&self) {
        self.clock.reset();
    }

    /// Returns a shared handle to the interval clock.
    ///
    /// The handle can be read from another thread; only this governor resets it.
    pub fn clock(&self) -> Arc<Clock> {
        Arc::clone(&self.clock)
    }

    // --- Modes ---

    /// Whether fixed-step mode is on.
    pub fn fixed_step_enabled(&self) -> bool {
        self.fixed_step
    }

    /// Whether catch-up mode is on.
    pub fn catch_up_enabled(&self) -> bool {
        self.catch_up
    }

    /// Turns fixed-step mode on.
    pub fn enable_fixed_step(&mut self) {
        self.fixed_step = true;
    }

    /// Turns fixed-step mode off.
    pub fn disable_fixed_step(&mut self) {
        self.fixed_step = false;
    }

    /// Turns catch-up mode on.
    pub fn enable_catch_up(&mut self) {
        self.catch_up = true;
    }

    /// Turns catch-up mode off.
    pub fn disable_catch_up(&mut self) {
        self.catch_up = false;
    }

    // --- Target interval ---

    /// Minimum number of seconds per iteration.
    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    /// Maximum number of iterations per second.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Minimum whole milliseconds per iteration, truncated.
    pub fn milliseconds(&self) -> i64 {
        seconds_to_millis(self.seconds)
    }

    /// Minimum whole microseconds per iteration, truncated.
    pub fn microseconds(&self) -> i64 {
        seconds_to_micros(self.seconds)
    }

    /// Minimum whole nanoseconds per iteration, truncated.
    pub fn nanoseconds(&self) -> i64 {
        seconds_to_nanos(self.seconds)
    }

    /// Sets the target interval. The frequency follows as its inverse.
    pub fn set_seconds(&mut self, seconds: f64) -> Result<(), TimingError> {
        validate_seconds(seconds)?;
        self.seconds = seconds;
        self.frequency = 1.0 / seconds;
        Ok(())
    }

    /// Sets the target frequency. The interval follows as its inverse.
    pub fn set_frequency(&mut self, frequency: f64) -> Result<(), TimingError> {
        validate_frequency(frequency)?;
        self.seconds = 1.0 / frequency;
        self.frequency = frequency;
        Ok(())
    }

    /// Sets the target interval in milliseconds.
    pub fn set_milliseconds(&mut self, milliseconds: i64) -> Result<(), TimingError> {
        self.set_seconds(milliseconds as f64 / 1_000.0)
    }

    /// Sets the target interval in microseconds.
    pub fn set_microseconds(&mut self, microseconds: i64) -> Result<(), TimingError> {
        self.set_seconds(microseconds as f64 / 1_000_000.0)
    }

    /// Sets the target interval in nanoseconds.
    pub fn set_nanoseconds(&mut self, nanoseconds: i64) -> Result<(), TimingError> {
        self.set_seconds(nanoseconds as f64 / 1_000_000_000.0)
    }

    // --- Elapsed ---

    /// Elapsed time of the current iteration, in target intervals.
    pub fn elapsed_intervals(&self) -> f64 {
        self.elapsed_seconds() * self.frequency
    }

    /// Elapsed time of the current iteration, in seconds.
    pub fn elapsed_seconds(&self) -> f64 {
        self.clock.elapsed_seconds()
    }

    /// Elapsed time of the current iteration, in whole milliseconds.
    pub fn elapsed_milliseconds(&self) -> i64 {
        seconds_to_millis(self.elapsed_seconds())
    }

    /// Elapsed time of the current iteration, in whole microseconds.
    pub fn elapsed_microseconds(&self) -> i64 {
        seconds_to_micros(self.elapsed_seconds())
    }

    /// Elapsed time of the current iteration, in whole nanoseconds.
    pub fn elapsed_nanoseconds(&self) -> i64 {
        seconds_to_nanos(self.elapsed_seconds())
    }

    // --- Early / late ---

    /// Time left before the deadline, in target intervals.
    pub fn early_intervals(&self) -> f64 {
        self.early_seconds() * self.frequency
    }

    /// Time left before the deadline, in seconds. Negative once late.
    pub fn early_seconds(&self) -> f64 {
        self.seconds - self.elapsed_seconds()
    }

    /// Time left before the deadline, in whole milliseconds.
    pub fn early_milliseconds(&self) -> i64 {
        seconds_to_millis(self.early_seconds())
    }

    /// Time left before the deadline, in whole microseconds.
    pub fn early_microseconds(&self) -> i64 {
        seconds_to_micros(self.early_seconds())
    }

    /// Time left before the deadline, in whole nanoseconds.
    pub fn early_nanoseconds(&self) -> i64 {
        seconds_to_nanos(self.early_seconds())
    }

    /// Time past the deadline, in target intervals.
    pub fn late_intervals(&self) -> f64 {
        self.late_seconds() * self.frequency
    }

    /// Time past the deadline, in seconds. Negative while early.
    pub fn late_seconds(&self) -> f64 {
        -self.early_seconds()
    }

    /// Time past the deadline, in whole milliseconds.
    pub fn late_milliseconds(&self) -> i64 {
        seconds_to_millis(self.late_seconds())
    }

    /// Time past the deadline, in whole microseconds.
    pub fn late_microseconds(&self) -> i64 {
        seconds_to_micros(self.late_seconds())
    }

    /// Time past the deadline, in whole nanoseconds.
    pub fn late_nanoseconds(&self) -> i64 {
        seconds_to_nanos(self.late_seconds())
    }

    // --- Lag ---

    /// Banked lag, in target intervals.
    pub fn lag_intervals(&self) -> f64 {
        self.lag_seconds * self.frequency
    }

    /// Banked lag, in seconds.
    pub fn lag_seconds(&self) -> f64 {
        self.lag_seconds
    }

    /// Banked lag, in whole milliseconds.
    pub fn lag_milliseconds(&self) -> i64 {
        seconds_to_millis(self.lag_seconds)
    }

    /// Banked lag, in whole microseconds.
    pub fn lag_microseconds(&self) -> i64 {
        seconds_to_micros(self.lag_seconds)
    }

    /// Banked lag, in whole nanoseconds.
    pub fn lag_nanoseconds(&self) -> i64 {
        seconds_to_nanos(self.lag_seconds)
    }

    /// Overwrites the banked lag.
    pub fn set_lag(&mut self, seconds: f64) {
        self.lag_seconds = seconds;
    }

    /// Adds `seconds` to the banked lag. The result never drops below zero.
    pub fn gain_lag(&mut self, seconds: f64) {
        self.lag_seconds = (self.lag_seconds + seconds).max(0.0);
    }

    /// Removes `seconds` from the banked lag, stopping at zero.
    pub fn lose_lag(&mut self, seconds: f64) {
        self.gain_lag(-seconds);
    }

    /// Drops all banked lag.
    pub fn clear_lag(&mut self) {
        self.lag_seconds = 0.0;
    }
}

fn validate_seconds(seconds: f64) -> Result<(), TimingError> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(())
    } else {
        Err(TimingError::InvalidInterval(seconds))
    }
}

fn validate_frequency(frequency: f64) -> Result<(), TimingError> {
    // +inf is the frequency of an unthrottled governor.
    if frequency > 0.0 {
        Ok(())
    } else {
        Err(TimingError::InvalidFrequency(frequency))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::time::Instant;

    const INTERVAL: f64 = 0.05;
    const MARGIN: f64 = 0.2;

    #[test]
    fn frequency_is_inverse_of_seconds() {
        let mut governor = SpeedGovernor::new(true, true, 0.025).unwrap();
        assert_relative_eq!(governor.frequency(), 40.0);

        governor.set_frequency(60.0).unwrap();
        assert_relative_eq!(governor.seconds(), 1.0 / 60.0);

        governor.set_milliseconds(250).unwrap();
        assert_relative_eq!(governor.frequency(), 4.0);
        assert_eq!(governor.milliseconds(), 250);
        assert_eq!(governor.microseconds(), 250_000);

        let governor = SpeedGovernor::from_frequency(false, false, 4.0).unwrap();
        assert_relative_eq!(governor.seconds(), 0.25);
        assert_eq!(governor.nanoseconds(), 250_000_000);
    }

    #[test]
    fn invalid_intervals_are_rejected() {
        assert_eq!(
            SpeedGovernor::new(true, false, -1.0).unwrap_err(),
            TimingError::InvalidInterval(-1.0)
        );
        assert!(SpeedGovernor::new(true, false, f64::NAN).is_err());
        assert!(SpeedGovernor::from_frequency(true, false, 0.0).is_err());
        assert!(SpeedGovernor::from_frequency(true, false, -5.0).is_err());

        let mut governor = SpeedGovernor::new(true, false, INTERVAL).unwrap();
        assert!(governor.set_frequency(f64::NAN).is_err());
        assert!(governor.set_seconds(f64::INFINITY).is_err());
        assert!(governor.set_microseconds(-1).is_err());
        // A failed setter leaves the interval untouched.
        assert_relative_eq!(governor.seconds(), INTERVAL);
    }

    #[test]
    fn next_sleeps_for_the_interval_when_on_time() {
        let mut governor = SpeedGovernor::new(true, false, INTERVAL).unwrap();
        let start = Instant::now();

        let late = governor.next();

        let waited = start.elapsed().as_secs_f64();
        assert!(waited >= INTERVAL * 0.9, "Waited {waited}s, expected about {INTERVAL}s");
        assert!(waited < INTERVAL + MARGIN, "Waited {waited}s, far beyond interval");
        assert_eq!(late, 0.0, "Fixed step always reports on time");
    }

    #[test]
    fn next_does_not_block_when_already_late() {
        let mut governor = SpeedGovernor::new(false, false, INTERVAL).unwrap();
        thread::sleep(Duration::from_secs_f64(INTERVAL * 2.0));

        let start = Instant::now();
        let late = governor.next();

        assert!(
            start.elapsed().as_secs_f64() < INTERVAL,
            "A late governor must not sleep"
        );
        assert!(late >= INTERVAL, "Reported lateness {late} should be about one interval");
        assert!(late < INTERVAL + MARGIN);
    }

    #[test]
    fn next_resets_the_clock() {
        let mut governor = SpeedGovernor::new(false, false, 0.0).unwrap();
        thread::sleep(Duration::from_millis(20));
        governor.next();
        assert!(governor.elapsed_seconds() < 0.015);
    }

    #[test]
    fn zero_interval_is_unthrottled() {
        let mut governor = SpeedGovernor::new(false, false, 0.0).unwrap();
        assert!(governor.frequency().is_infinite());
        thread::sleep(Duration::from_millis(20));

        let start = Instant::now();
        let late = governor.next();

        assert!(start.elapsed() < Duration::from_millis(20));
        assert!(late >= 0.02, "Late should equal the full elapsed time, got {late}");
    }

    #[test]
    fn fixed_step_catch_up_repays_lag_each_tick() {
        let mut governor = SpeedGovernor::new(true, true, 0.01).unwrap();
        governor.gain_lag(0.05);

        let mut previous = governor.lag_seconds();
        for _ in 0..4 {
            governor.next();
            let lag = governor.lag_seconds();
            assert_relative_eq!(previous - lag, 0.01, epsilon = 1e-9);
            previous = lag;
        }
        assert_relative_eq!(governor.lag_seconds(), 0.01, epsilon = 1e-9);

        governor.next();
        governor.next();
        assert_eq!(governor.lag_seconds(), 0.0, "Lag is bounded below by zero");
    }

    #[test]
    fn banked_lag_skips_the_sleep() {
        let mut governor = SpeedGovernor::new(true, true, INTERVAL).unwrap();
        governor.gain_lag(INTERVAL * 3.0);

        let start = Instant::now();
        governor.next();

        assert!(start.elapsed().as_secs_f64() < INTERVAL);
    }

    #[test]
    fn lag_is_ignored_without_catch_up() {
        let mut governor = SpeedGovernor::new(true, false, INTERVAL).unwrap();
        governor.set_lag(INTERVAL * 3.0);

        let start = Instant::now();
        governor.next();

        assert!(start.elapsed().as_secs_f64() >= INTERVAL * 0.9);
        assert_relative_eq!(governor.lag_seconds(), INTERVAL * 3.0);
    }

    #[test]
    fn lag_adjustments_clamp_at_zero() {
        let mut governor = SpeedGovernor::new(true, true, 0.5).unwrap();
        governor.gain_lag(0.75);
        governor.lose_lag(0.25);
        assert_eq!(governor.lag_seconds(), 0.5);
        assert_eq!(governor.lag_intervals(), 1.0);
        assert_eq!(governor.lag_milliseconds(), 500);

        governor.lose_lag(1.0);
        assert_eq!(governor.lag_seconds(), 0.0);

        governor.gain_lag(0.5);
        governor.clear_lag();
        assert_eq!(governor.lag_seconds(), 0.0);
    }

    #[test]
    fn early_and_late_mirror_each_other() {
        let governor = SpeedGovernor::new(false, false, 10.0).unwrap();
        let early = governor.early_seconds();
        assert!(early > 9.0 && early <= 10.0);
        assert!(governor.late_seconds() < -9.0);
        assert!(governor.early_milliseconds() > 9_000);
        assert!(governor.late_milliseconds() < -9_000);
        assert!(governor.early_intervals() > 0.9);
        assert!(governor.elapsed_intervals() < 0.1);
    }

    #[test]
    fn mode_toggles() {
        let mut governor = SpeedGovernor::new(false, false, INTERVAL).unwrap();
        governor.enable_fixed_step();
        governor.enable_catch_up();
        assert!(governor.fixed_step_enabled() && governor.catch_up_enabled());
        governor.disable_fixed_step();
        governor.disable_catch_up();
        assert!(!governor.fixed_step_enabled() && !governor.catch_up_enabled());
    }
}
