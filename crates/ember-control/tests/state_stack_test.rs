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

use ember_control::{
    share, Controller, GameState, GameStateManager, GameStateStore, StateCommands, Transparency,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

// --- DUMMY STATES FOR THIS TEST ---

/// Counts its renders and updates.
struct Counter {
    renders: Arc<AtomicUsize>,
    updates: Arc<AtomicUsize>,
    controller: Controller,
}

impl GameState for Counter {
    fn render(&mut self, _: f64) -> anyhow::Result<()> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn update(&mut self, _: f64, _: &StateCommands) -> anyhow::Result<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn controller(&mut self) -> &mut Controller {
        &mut self.controller
    }
}

/// Requests the "overlay" on every other update.
struct Toggler {
    ticks: usize,
    controller: Controller,
}

impl GameState for Toggler {
    fn transparency(&self) -> Transparency {
        Transparency::TRANSPARENT
    }

    fn render(&mut self, _: f64) -> anyhow::Result<()> {
        Ok(())
    }

    fn update(&mut self, _: f64, commands: &StateCommands) -> anyhow::Result<()> {
        self.ticks += 1;
        if self.ticks % 2 == 0 {
            commands.push_key("overlay");
        }
        Ok(())
    }

    fn controller(&mut self) -> &mut Controller {
        &mut self.controller
    }
}

/// An overlay that requests one pop per push, on its first update.
struct Overlay {
    armed: bool,
    controller: Controller,
}

impl GameState for Overlay {
    fn on_push(&mut self) {
        self.armed = true;
    }

    fn transparency(&self) -> Transparency {
        Transparency::TRANSPARENT
    }

    fn render(&mut self, _: f64) -> anyhow::Result<()> {
        Ok(())
    }

    fn update(&mut self, _: f64, commands: &StateCommands) -> anyhow::Result<()> {
        if self.armed {
            self.armed = false;
            commands.pop();
        }
        Ok(())
    }

    fn controller(&mut self) -> &mut Controller {
        &mut self.controller
    }
}

/// Counts every render that reaches it after it was popped.
struct Transient {
    popped: bool,
    renders_after_pop: Arc<AtomicUsize>,
    controller: Controller,
}

impl GameState for Transient {
    fn on_pop(&mut self) {
        self.popped = true;
    }

    fn render(&mut self, _: f64) -> anyhow::Result<()> {
        if self.popped {
            self.renders_after_pop.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn update(&mut self, _: f64, _: &StateCommands) -> anyhow::Result<()> {
        Ok(())
    }

    fn controller(&mut self) -> &mut Controller {
        &mut self.controller
    }
}

#[test]
fn test_stack_transitions_race_with_rendering() {
    // --- 1. ARRANGE ---
    let store = Arc::new(GameStateStore::new());
    store.make_state("overlay", || Overlay {
        armed: false,
        controller: Controller::new(),
    });
    let manager = Arc::new(GameStateManager::new(store));

    let renders = Arc::new(AtomicUsize::new(0));
    let updates = Arc::new(AtomicUsize::new(0));
    manager.push_state(share(Counter {
        renders: Arc::clone(&renders),
        updates: Arc::clone(&updates),
        controller: Controller::new(),
    }));
    manager.push_state(share(Toggler {
        ticks: 0,
        controller: Controller::new(),
    }));

    // --- 2. ACT ---
    // The update thread keeps pushing and popping the overlay while this
    // thread renders the stack.
    let updater = {
        let manager = Arc::clone(&manager);
        thread::spawn(move || {
            for _ in 0..2_000 {
                manager.update(0.025).expect("Update should not fail");
            }
        })
    };
    for _ in 0..2_000 {
        manager.render(0.016).expect("Render should not fail");
    }
    updater.join().expect("Update thread panicked");

    // --- 3. ASSERT ---
    // Every dispatch reaches through the transparent states to the counter.
    assert_eq!(renders.load(Ordering::SeqCst), 2_000);
    assert_eq!(updates.load(Ordering::SeqCst), 2_000);

    // Every pop is matched by an earlier overlay push, so the base states survive.
    let len = manager.len();
    assert!(len >= 2, "Unexpected stack height {len}");
    let live = manager.live_update_states().len();
    assert_eq!(live, len, "All states are transparent for update");
}

#[test]
fn test_live_lists_are_snapshots() {
    // --- 1. ARRANGE ---
    let manager = GameStateManager::default();
    let renders = Arc::new(AtomicUsize::new(0));
    manager.push_state(share(Counter {
        renders: Arc::clone(&renders),
        updates: Arc::new(AtomicUsize::new(0)),
        controller: Controller::new(),
    }));
    let before = manager.live_render_states();

    // --- 2. ACT ---
    manager.drop_state().expect("Stack holds one state");

    // --- 3. ASSERT ---
    assert_eq!(before.len(), 1, "A snapshot keeps its states alive");
    assert!(manager.live_render_states().is_empty());
    manager.render(0.0).expect("Empty stack render is a no-op");
    assert_eq!(renders.load(Ordering::SeqCst), 0);
}

#[test]
fn test_popped_state_is_never_rendered() {
    // --- 1. ARRANGE ---
    let manager = Arc::new(GameStateManager::default());
    let renders_after_pop = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(AtomicBool::new(false));

    // --- 2. ACT ---
    let transitions = {
        let manager = Arc::clone(&manager);
        let renders_after_pop = Arc::clone(&renders_after_pop);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for _ in 0..20_000 {
                manager.push_state(share(Transient {
                    popped: false,
                    renders_after_pop: Arc::clone(&renders_after_pop),
                    controller: Controller::new(),
                }));
                manager.drop_state().expect("A state was just pushed");
            }
            done.store(true, Ordering::SeqCst);
        })
    };
    let mut frames = 0usize;
    while !done.load(Ordering::SeqCst) {
        manager.render(0.0).expect("Render should not fail");
        frames += 1;
    }
    transitions.join().expect("Transition thread panicked");

    // --- 3. ASSERT ---
    assert!(frames > 0);
    assert_eq!(renders_after_pop.load(Ordering::SeqCst), 0);
    assert!(manager.is_empty());
}
