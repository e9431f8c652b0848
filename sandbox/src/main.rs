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

// Ember Sandbox
// A bouncing ball that can be paused (Escape) and slowed down (S).

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use ember_control::{
    Controller, GameState, GameStateManager, GameStateStore, Keybinding, StateCommands,
    Transparency,
};
use ember_core::platform::{Key, KeyAction, KeyModifiers};
use ember_infra::WinitWindowBuilder;
use ember_runtime::{GameLoop, LoopConfig, LoopControl};

const GAMEPLAY: &str = "gameplay";
const PAUSE: &str = "pause";
const SLOW_MOTION: f64 = 0.25;

/// A ball bouncing between 0 and 1, integrated on every update tick.
struct Gameplay {
    position: f64,
    velocity: f64,
    simulated: f64,
    controller: Controller,
}

impl Gameplay {
    fn new(control: LoopControl) -> Self {
        let mut controller = Controller::new();
        controller.add_keybinding(Keybinding::new(
            KeyAction::Press,
            KeyModifiers::empty(),
            Key::code("Escape"),
            |commands: &StateCommands| {
                commands.push_key(PAUSE);
                Ok(())
            },
        ));

        let mut slowed = false;
        controller.add_keybinding(Keybinding::new(
            KeyAction::Press,
            KeyModifiers::empty(),
            Key::code("KeyS"),
            move |_: &StateCommands| {
                slowed = !slowed;
                let speed = if slowed { SLOW_MOTION } else { 1.0 };
                control.set_time_speed(speed)?;
                log::info!("Time speed set to {speed}");
                Ok(())
            },
        ));

        controller.add_mouse_button_press_callback(|button, _, _: &StateCommands| {
            log::info!("Clicked {button:?}");
            Ok(())
        });

        Self {
            position: 0.0,
            velocity: 0.5,
            simulated: 0.0,
            controller,
        }
    }
}

impl GameState for Gameplay {
    fn on_activate(&mut self) {
        log::info!("Gameplay active");
    }

    fn render(&mut self, delta: f64) -> Result<()> {
        // Extrapolate from the last tick to the time this frame is shown.
        let shown = (self.position + self.velocity * delta).clamp(0.0, 1.0);
        log::trace!("Ball drawn at {shown:.3}");
        Ok(())
    }

    fn update(&mut self, delta: f64, _: &StateCommands) -> Result<()> {
        self.position += self.velocity * delta;
        if !(0.0..=1.0).contains(&self.position) {
            self.velocity = -self.velocity;
            self.position = self.position.clamp(0.0, 1.0);
        }

        let before = self.simulated.floor();
        self.simulated += delta;
        if self.simulated.floor() > before {
            log::info!(
                "{:.0} s simulated, ball at {:.3}",
                self.simulated,
                self.position
            );
        }
        Ok(())
    }

    fn controller(&mut self) -> &mut Controller {
        &mut self.controller
    }

    fn name(&self) -> &str {
        GAMEPLAY
    }
}

/// Freezes the simulation underneath while letting it render.
struct Pause {
    controller: Controller,
}

impl Pause {
    fn new() -> Self {
        let mut controller = Controller::new();
        controller.add_keybinding(Keybinding::new(
            KeyAction::Press,
            KeyModifiers::empty(),
            Key::code("Escape"),
            |commands: &StateCommands| {
                commands.pop();
                Ok(())
            },
        ));
        Self { controller }
    }
}

impl GameState for Pause {
    fn on_push(&mut self) {
        log::info!("Paused, press Escape to resume");
    }

    fn on_pop(&mut self) {
        log::info!("Resumed");
    }

    fn transparency(&self) -> Transparency {
        Transparency::RENDER_ONLY
    }

    fn render(&mut self, _: f64) -> Result<()> {
        Ok(())
    }

    fn update(&mut self, _: f64, _: &StateCommands) -> Result<()> {
        Ok(())
    }

    fn controller(&mut self) -> &mut Controller {
        &mut self.controller
    }

    fn name(&self) -> &str {
        PAUSE
    }
}

fn load_config() -> Result<LoopConfig> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("loop.json");
    if path.exists() {
        log::info!("Loading loop configuration from {}", path.display());
        Ok(LoopConfig::from_file(&path)?)
    } else {
        Ok(LoopConfig::default())
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("winit", log::LevelFilter::Warn)
        .init();

    let config = load_config()?;
    let store = Arc::new(GameStateStore::new());
    let manager = Arc::new(GameStateManager::new(Arc::clone(&store)));
    let mut game_loop = GameLoop::new(config, Arc::clone(&manager))?;

    let control = game_loop.control();
    store.make_state(GAMEPLAY, move || Gameplay::new(control));
    store.make_state(PAUSE, Pause::new);
    manager.push_state_by_key(GAMEPLAY);

    let mut window = WinitWindowBuilder::new()
        .with_title("Ember Sandbox")
        .with_dimensions(800, 600)
        .build()?;
    game_loop.run(&mut window)?;
    Ok(())
}
