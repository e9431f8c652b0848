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

//! The dual-rate game loop.

use crate::{ConfigError, LoopConfig, LoopControl, LoopError};
use crossbeam_channel::{Receiver, Sender};
use ember_control::GameStateManager;
use ember_core::platform::{DiscardInput, GameWindow};
use ember_core::{Clock, SpeedGovernor, TimingError};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

const UPDATE_THREAD_NAME: &str = "ember-update";

/// Drives a [`GameStateManager`] from two threads.
///
/// The update loop ticks on its own thread at `update_tick_rate` Hz. The
/// render loop runs on the thread calling [`run`](Self::run), at most
/// `render_frame_rate` Hz, and also pumps the window's input events.
pub struct GameLoop {
    config: LoopConfig,
    manager: Arc<GameStateManager>,
    control: LoopControl,
    render_governor: SpeedGovernor,
    /// `None` while the update thread owns it.
    update_governor: Option<SpeedGovernor>,
}

impl GameLoop {
    /// Creates a stopped loop over `manager`.
    pub fn new(config: LoopConfig, manager: Arc<GameStateManager>) -> Result<Self, LoopError> {
        config.validate()?;
        let render_governor = SpeedGovernor::from_frequency(
            config.render_fixed_step,
            config.render_catch_up,
            f64::from(config.render_frame_rate),
        )?;
        let update_governor = update_governor_for(&config)?;
        let control = LoopControl::new(&config);

        Ok(Self {
            config,
            manager,
            control,
            render_governor,
            update_governor: Some(update_governor),
        })
    }

    /// Runs the loop until `window` wants to close or a stop is requested.
    ///
    /// The window is made current before anything else; if that fails no
    /// thread is started and no state is dispatched. The update thread is
    /// joined before this returns, whatever the outcome. A panic on the render
    /// side is resumed only after the update thread has been joined.
    pub fn run(&mut self, window: &mut dyn GameWindow) -> Result<(), LoopError> {
        let shared = Arc::clone(&self.control.shared);
        if shared.render_loop_running.swap(true, Ordering::SeqCst) {
            return Err(LoopError::AlreadyRunning);
        }
        let _render_guard = RunningGuard(&shared.render_loop_running);

        window.make_current().map_err(|err| {
            log::error!("Failed to start the game loop: {err}");
            LoopError::Startup(err)
        })?;

        shared.stop_requested.store(false, Ordering::SeqCst);
        shared.is_running.store(true, Ordering::SeqCst);
        shared.window_open.store(true, Ordering::SeqCst);

        let (error_tx, error_rx) = crossbeam_channel::unbounded();
        let (update_thread, update_clock) = match self.spawn_update_thread(error_tx) {
            Ok(spawned) => spawned,
            Err(err) => {
                shared.window_open.store(false, Ordering::SeqCst);
                return Err(err);
            }
        };

        log::info!(
            "Game loop started (render: {} Hz, update: {} Hz)",
            self.control.render_frame_rate(),
            self.control.update_tick_rate()
        );

        let render_result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.render_loop(window, &update_clock, &error_rx, &update_thread)
        }));

        shared.window_open.store(false, Ordering::SeqCst);
        let join_result = match update_thread.join() {
            Ok(governor) => {
                self.update_governor = Some(governor);
                Ok(())
            }
            Err(_) => {
                log::error!("The update thread panicked");
                self.update_governor = Some(update_governor_for(&self.config)?);
                Err(LoopError::UpdateThreadPanicked)
            }
        };

        log::info!("Game loop stopped");

        let render_result = match render_result {
            Ok(result) => result,
            Err(payload) => {
                log::error!("The render loop panicked");
                panic::resume_unwind(payload);
            }
        };

        // An update failure outranks whatever the render loop observed after it.
        if let Ok(err) = error_rx.try_recv() {
            return Err(err);
        }
        render_result.and(join_result)
    }

    fn spawn_update_thread(
        &mut self,
        errors: Sender<LoopError>,
    ) -> Result<(JoinHandle<SpeedGovernor>, Arc<Clock>), LoopError> {
        let shared = &self.control.shared;
        let governor = match self.update_governor.take() {
            Some(governor) if !shared.update_loop_running.load(Ordering::SeqCst) => governor,
            Some(governor) => {
                self.update_governor = Some(governor);
                return Err(LoopError::AlreadyRunning);
            }
            None => return Err(LoopError::AlreadyRunning),
        };
        let clock = governor.clock();

        let manager = Arc::clone(&self.manager);
        let control = self.control.clone();
        let max_lag = self.config.max_lag_seconds;
        let spawned = thread::Builder::new()
            .name(UPDATE_THREAD_NAME.to_string())
            .spawn(move || update_loop(governor, &manager, &control, max_lag, &errors));

        match spawned {
            Ok(handle) => Ok((handle, clock)),
            Err(err) => {
                log::error!("Failed to spawn the update thread: {err}");
                self.update_governor = Some(update_governor_for(&self.config)?);
                Err(LoopError::Spawn(err))
            }
        }
    }

    fn render_loop(
        &mut self,
        window: &mut dyn GameWindow,
        update_clock: &Clock,
        errors: &Receiver<LoopError>,
        update_thread: &JoinHandle<SpeedGovernor>,
    ) -> Result<(), LoopError> {
        let shared = Arc::clone(&self.control.shared);
        self.render_governor.clear_lag();
        self.render_governor.reset();

        while !window.should_close() && !shared.stop_requested.load(Ordering::SeqCst) {
            sync_rate(&mut self.render_governor, self.control.render_frame_rate())?;

            if !errors.is_empty() || update_thread.is_finished() {
                break;
            }

            let delta = update_clock.elapsed_seconds();
            if self.control.is_running() {
                window.swap_buffers();
                window.poll_events(&*self.manager);
                self.manager
                    .render(delta * self.control.time_speed())
                    .map_err(LoopError::Render)?;
            } else {
                window.poll_events(&DiscardInput);
            }

            let late = self.render_governor.next();
            if late > 0.0 {
                log::trace!("Render frame finished {:.3} ms late", late * 1000.0);
            }
        }
        Ok(())
    }

    // --- Control ---

    /// A handle for steering the loop from game states or other threads.
    pub fn control(&self) -> LoopControl {
        self.control.clone()
    }

    /// Pauses dispatch to the game states. Both loops keep pacing.
    pub fn freeze(&self) {
        self.control.freeze();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    pub fn is_running(&self) -> bool {
        self.control.is_running()
    }

    pub fn render_frame_rate(&self) -> u32 {
        self.control.render_frame_rate()
    }

    pub fn update_tick_rate(&self) -> u32 {
        self.control.update_tick_rate()
    }

    pub fn time_speed(&self) -> f64 {
        self.control.time_speed()
    }

    pub fn set_render_frame_rate(&self, rate: u32) -> Result<(), ConfigError> {
        self.control.set_render_frame_rate(rate)
    }

    pub fn set_update_tick_rate(&self, rate: u32) -> Result<(), ConfigError> {
        self.control.set_update_tick_rate(rate)
    }

    pub fn set_time_speed(&self, time_speed: f64) -> Result<(), ConfigError> {
        self.control.set_time_speed(time_speed)
    }

    /// The configuration the loop was built from.
    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn manager(&self) -> &Arc<GameStateManager> {
        &self.manager
    }
}

impl std::fmt::Debug for GameLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLoop")
            .field("config", &self.config)
            .field("control", &self.control)
            .finish_non_exhaustive()
    }
}

/// The update thread's body. Hands its governor back when the window closes.
fn update_loop(
    mut governor: SpeedGovernor,
    manager: &GameStateManager,
    control: &LoopControl,
    max_lag: f64,
    errors: &Sender<LoopError>,
) -> SpeedGovernor {
    let shared = &control.shared;
    let _update_guard = RunningGuard(&shared.update_loop_running);
    shared.update_loop_running.store(true, Ordering::SeqCst);
    log::info!("Update loop started");

    governor.clear_lag();
    governor.reset();
    let mut period = governor.seconds();

    while shared.window_open.load(Ordering::SeqCst) {
        if let Err(err) = sync_rate(&mut governor, control.update_tick_rate()) {
            let _ = errors.send(LoopError::Timing(err));
            break;
        }

        if control.is_running() {
            let step = if governor.fixed_step_enabled() {
                governor.seconds()
            } else {
                period
            };
            if let Err(err) = manager.update(step * control.time_speed()) {
                let _ = errors.send(LoopError::Update(err));
                break;
            }
        }

        // Lag is only repaid in fixed-step catch-up mode, so only bank it there.
        let elapsed = governor.elapsed_seconds();
        let repays_lag = governor.fixed_step_enabled() && governor.catch_up_enabled();
        if repays_lag && elapsed > governor.seconds() {
            governor.gain_lag(elapsed);
            if governor.lag_seconds() > max_lag {
                governor.set_lag(max_lag);
            }
            log::debug!(
                "Update tick overran ({:.3} ms), lag is now {} ms",
                elapsed * 1000.0,
                governor.lag_milliseconds()
            );
        }

        let late = governor.next();
        period = governor.seconds() + late.max(0.0);
        if late > 0.0 {
            log::trace!("Update tick finished {:.3} ms late", late * 1000.0);
        }
    }

    log::info!("Update loop stopped");
    governor
}

fn update_governor_for(config: &LoopConfig) -> Result<SpeedGovernor, TimingError> {
    SpeedGovernor::from_frequency(
        config.update_fixed_step,
        config.update_catch_up,
        f64::from(config.update_tick_rate),
    )
}

/// Retargets `governor` when the published rate changed.
fn sync_rate(governor: &mut SpeedGovernor, rate: u32) -> Result<(), TimingError> {
    let frequency = f64::from(rate);
    if governor.frequency() != frequency {
        log::debug!("Retargeting governor to {frequency} Hz");
        governor.set_frequency(frequency)?;
    }
    Ok(())
}

/// Clears a loop-running flag when its loop exits, even by unwinding.
struct RunningGuard<'a>(&'a std::sync::atomic::AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
