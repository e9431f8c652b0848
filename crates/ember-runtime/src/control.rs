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

//! Flags and rates shared between the two loop threads.

use crate::config::{validate_rate, validate_time_speed};
use crate::{ConfigError, LoopConfig};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

/// Cross-thread loop state. Every field is read without a lock.
#[derive(Debug)]
pub(crate) struct LoopShared {
    pub(crate) window_open: AtomicBool,
    pub(crate) is_running: AtomicBool,
    pub(crate) render_loop_running: AtomicBool,
    pub(crate) update_loop_running: AtomicBool,
    pub(crate) stop_requested: AtomicBool,
    render_frame_rate: AtomicU32,
    update_tick_rate: AtomicU32,
    time_speed_bits: AtomicU64,
}

impl LoopShared {
    fn new(config: &LoopConfig) -> Self {
        Self {
            window_open: AtomicBool::new(false),
            is_running: AtomicBool::new(false),
            render_loop_running: AtomicBool::new(false),
            update_loop_running: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            render_frame_rate: AtomicU32::new(config.render_frame_rate),
            update_tick_rate: AtomicU32::new(config.update_tick_rate),
            time_speed_bits: AtomicU64::new(config.time_speed.to_bits()),
        }
    }
}

/// A cloneable handle for steering a running [`GameLoop`](crate::GameLoop).
///
/// Game states keep one to pause the simulation, stop the loop or change its
/// rates from either thread. New rates apply from the next iteration.
#[derive(Debug, Clone)]
pub struct LoopControl {
    pub(crate) shared: Arc<LoopShared>,
}

impl LoopControl {
    pub(crate) fn new(config: &LoopConfig) -> Self {
        Self {
            shared: Arc::new(LoopShared::new(config)),
        }
    }

    /// Stops dispatching render, update and input. Pacing continues.
    pub fn freeze(&self) {
        log::debug!("Game loop frozen");
        self.shared.is_running.store(false, Ordering::SeqCst);
    }

    /// Resumes dispatch after [`freeze`](Self::freeze).
    pub fn resume(&self) {
        log::debug!("Game loop resumed");
        self.shared.is_running.store(true, Ordering::SeqCst);
    }

    /// Whether the loop dispatches to the game states.
    pub fn is_running(&self) -> bool {
        self.shared.is_running.load(Ordering::SeqCst)
    }

    /// Asks the render loop to stop after its current frame.
    pub fn request_stop(&self) {
        self.shared.stop_requested.store(true, Ordering::SeqCst);
    }

    /// Whether the window is open, i.e. the update loop may keep ticking.
    pub fn is_window_open(&self) -> bool {
        self.shared.window_open.load(Ordering::SeqCst)
    }

    pub fn render_frame_rate(&self) -> u32 {
        self.shared.render_frame_rate.load(Ordering::Relaxed)
    }

    pub fn update_tick_rate(&self) -> u32 {
        self.shared.update_tick_rate.load(Ordering::Relaxed)
    }

    pub fn time_speed(&self) -> f64 {
        f64::from_bits(self.shared.time_speed_bits.load(Ordering::Relaxed))
    }

    /// Sets the maximum render frames per second.
    pub fn set_render_frame_rate(&self, rate: u32) -> Result<(), ConfigError> {
        validate_rate("render_frame_rate", rate)?;
        self.shared.render_frame_rate.store(rate, Ordering::Relaxed);
        Ok(())
    }

    /// Sets the update ticks per second.
    pub fn set_update_tick_rate(&self, rate: u32) -> Result<(), ConfigError> {
        validate_rate("update_tick_rate", rate)?;
        self.shared.update_tick_rate.store(rate, Ordering::Relaxed);
        Ok(())
    }

    /// Sets the multiplier applied to every delta. `0.0` stops simulated time.
    pub fn set_time_speed(&self, time_speed: f64) -> Result<(), ConfigError> {
        validate_time_speed(time_speed)?;
        self.shared
            .time_speed_bits
            .store(time_speed.to_bits(), Ordering::Relaxed);
        Ok(())
    }
}
