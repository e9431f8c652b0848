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

//! The pushdown automaton over game states.

use crate::{
    lock_or_recover, Controller, GameState, GameStateStore, SharedState, StateCommand,
    StateCommands, StateError, Transparency,
};
use crossbeam_channel::Receiver;
use ember_core::platform::{InputSink, Key, KeyAction, KeyModifiers, MouseButton};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// A stack slot: the state and the transparency it reported when pushed.
struct StateEntry {
    live: LiveState,
    transparency: Transparency,
}

/// A state as seen by a dispatch snapshot.
///
/// `on_stack` belongs to the slot, not to the state: it is cleared under the
/// stack lock before `on_deactivate`/`on_pop` run, so a dispatch holding an
/// older snapshot can tell, once it has locked the state, that the slot is gone.
#[derive(Clone)]
struct LiveState {
    state: SharedState,
    on_stack: Arc<AtomicBool>,
}

impl LiveState {
    fn new(state: SharedState) -> Self {
        Self {
            state,
            on_stack: Arc::new(AtomicBool::new(true)),
        }
    }

    fn is_on_stack(&self) -> bool {
        self.on_stack.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Copy)]
enum Channel {
    Render,
    Update,
    Input,
}

/// The stack and its derived live lists. Live lists are ordered top-first.
#[derive(Default)]
struct StateStack {
    states: Vec<StateEntry>,
    live_render: Vec<LiveState>,
    live_update: Vec<LiveState>,
    live_input: Vec<LiveState>,
}

impl StateStack {
    fn push(&mut self, state: SharedState) {
        let transparency = {
            let mut new_top = lock_or_recover(&state, "game state");
            new_top.on_push();
            new_top.on_activate();
            new_top.transparency()
        };
        self.states.push(StateEntry {
            live: LiveState::new(state),
            transparency,
        });

        let below = self.states.len() - 1;
        if below > 0 {
            lock_or_recover(&self.states[below - 1].live.state, "game state").on_deactivate();
            for entry in self.states[..below].iter().rev() {
                lock_or_recover(&entry.live.state, "game state").on_descend();
            }
        }

        self.refresh_live_states();
    }

    fn pop(&mut self) -> Option<SharedState> {
        let top = self.states.pop()?;
        top.live.on_stack.store(false, Ordering::SeqCst);
        {
            let mut old_top = lock_or_recover(&top.live.state, "game state");
            old_top.on_deactivate();
            old_top.on_pop();
        }

        if let Some(new_top) = self.states.last() {
            lock_or_recover(&new_top.live.state, "game state").on_activate();
            for entry in self.states.iter().rev() {
                lock_or_recover(&entry.live.state, "game state").on_ascend();
            }
        }

        self.refresh_live_states();
        Some(top.live.state)
    }

    /// Rebuilds the three live lists from the stack.
    ///
    /// Each channel walks down from the top and stops below the first state
    /// that is not transparent for it. Channels are cut independently.
    fn refresh_live_states(&mut self) {
        self.live_render.clear();
        self.live_update.clear();
        self.live_input.clear();

        let (mut render, mut update, mut input) = (true, true, true);
        for entry in self.states.iter().rev() {
            if !(render || update || input) {
                break;
            }
            if render {
                self.live_render.push(entry.live.clone());
                render = entry.transparency.render;
            }
            if update {
                self.live_update.push(entry.live.clone());
                update = entry.transparency.update;
            }
            if input {
                self.live_input.push(entry.live.clone());
                input = entry.transparency.input;
            }
        }
    }

    fn live(&self, channel: Channel) -> &[LiveState] {
        match channel {
            Channel::Render => &self.live_render,
            Channel::Update => &self.live_update,
            Channel::Input => &self.live_input,
        }
    }
}

/// Owns the game-state stack and dispatches render, update and input to it.
///
/// The manager is shared between the render and update threads as an
/// `Arc<GameStateManager>`. Every stack access goes through one mutex.
/// Dispatch copies the live list, releases the stack lock and then locks each
/// state in turn, so a state's callback never runs under the stack lock. A
/// state popped by the other thread in the meantime is skipped: once popped,
/// a state never sees another render, update or input event from that slot.
///
/// Render and update are dispatched **top-first**: the top state runs before
/// the states it lets through.
///
/// States must not call the manager from their own callbacks. They request
/// transitions through [`StateCommands`], which are applied once the current
/// dispatch has finished.
pub struct GameStateManager {
    stack: Mutex<StateStack>,
    store: Arc<GameStateStore>,
    commands: StateCommands,
    pending: Receiver<StateCommand>,
    warned_empty: AtomicBool,
}

impl GameStateManager {
    /// Creates a manager with an empty stack, resolving keys through `store`.
    pub fn new(store: Arc<GameStateStore>) -> Self {
        let (sender, pending) = crossbeam_channel::unbounded();
        Self {
            stack: Mutex::new(StateStack::default()),
            store,
            commands: StateCommands::new(sender),
            pending,
            warned_empty: AtomicBool::new(false),
        }
    }

    // --- Transitions ---

    /// Pushes `state` on top of the stack.
    ///
    /// Fires `on_push` then `on_activate` on the new top, then `on_deactivate`
    /// on the previous top and `on_descend` on every state below the new top.
    pub fn push_state(&self, state: SharedState) {
        log::debug!("Pushing game state '{}'", lock_or_recover(&state, "game state").name());
        self.lock_stack().push(state);
        self.warned_empty.store(false, Ordering::Relaxed);
    }

    /// Pushes the state registered under `key` in the store.
    ///
    /// ## Returns
    /// `false`, leaving the stack untouched, if no state is registered under `key`.
    pub fn push_state_by_key(&self, key: &str) -> bool {
        match self.store.get_state(key) {
            Some(state) => {
                self.push_state(state);
                true
            }
            None => {
                log::debug!("No game state registered under \"{key}\"");
                false
            }
        }
    }

    /// Pops the top state and hands it back.
    ///
    /// Fires `on_deactivate` then `on_pop` on the removed state, then
    /// `on_activate` on the new top and `on_ascend` on every remaining state.
    pub fn pop_state(&self) -> Result<SharedState, StateError> {
        self.remove_top("pop")
    }

    /// Pops the top state and discards it.
    pub fn drop_state(&self) -> Result<(), StateError> {
        self.remove_top("drop").map(drop)
    }

    fn remove_top(&self, operation: &'static str) -> Result<SharedState, StateError> {
        let popped = self.lock_stack().pop();
        popped.ok_or_else(|| {
            log::warn!("Cannot {operation} a game state: the stack is empty");
            StateError::EmptyStack { operation }
        })
    }

    /// Applies every transition requested through [`StateCommands`].
    ///
    /// ## Returns
    /// The number of commands applied.
    pub fn apply_pending_commands(&self) -> usize {
        let mut applied = 0;
        while let Ok(command) = self.pending.try_recv() {
            applied += 1;
            match command {
                StateCommand::Push(state) => self.push_state(state),
                StateCommand::PushKey(key) => {
                    if !self.push_state_by_key(&key) {
                        log::warn!("Requested push of unknown game state \"{key}\"");
                    }
                }
                StateCommand::Pop => {
                    // An empty stack is already reported by drop_state.
                    let _ = self.drop_state();
                }
            }
        }
        applied
    }

    // --- Dispatch ---

    /// Renders every live render state, top-first.
    ///
    /// Stops at the first failing state and returns its error. An empty stack
    /// is a no-op.
    pub fn render(&self, delta: f64) -> Result<(), StateError> {
        self.dispatch(Channel::Render, "render", |state| state.render(delta))
    }

    /// Updates every live update state, top-first.
    ///
    /// Stops at the first failing state and returns its error. An empty stack
    /// is a no-op.
    pub fn update(&self, delta: f64) -> Result<(), StateError> {
        let commands = self.commands.clone();
        self.dispatch(Channel::Update, "update", |state| {
            state.update(delta, &commands)
        })
    }

    fn dispatch<F>(
        &self,
        channel: Channel,
        phase: &'static str,
        mut call: F,
    ) -> Result<(), StateError>
    where
        F: FnMut(&mut dyn GameState) -> anyhow::Result<()>,
    {
        let live = self.snapshot(channel);
        if live.is_empty() {
            let applied = self.apply_pending_commands();
            if applied == 0 && !self.warned_empty.swap(true, Ordering::Relaxed) {
                log::warn!("Skipping {phase}: the game state stack is empty");
            }
            return Ok(());
        }

        let mut result = Ok(());
        for entry in &live {
            let mut state = lock_or_recover(&entry.state, "game state");
            if !entry.is_on_stack() {
                continue;
            }
            if let Err(source) = call(&mut *state) {
                let name = state.name().to_string();
                log::error!("Game state '{name}' failed during {phase}: {source:#}");
                result = Err(StateError::Callback {
                    state: name,
                    phase,
                    source,
                });
                break;
            }
        }

        self.apply_pending_commands();
        result
    }

    fn fan_out_input(&self, mut deliver: impl FnMut(&mut Controller, &StateCommands)) {
        for entry in &self.snapshot(Channel::Input) {
            let mut state = lock_or_recover(&entry.state, "game state");
            if !entry.is_on_stack() {
                continue;
            }
            deliver(state.controller(), &self.commands);
        }
        self.apply_pending_commands();
    }

    // --- Queries ---

    /// Number of states on the stack.
    pub fn len(&self) -> usize {
        self.lock_stack().states.len()
    }

    /// Whether the stack holds no state.
    pub fn is_empty(&self) -> bool {
        self.lock_stack().states.is_empty()
    }

    /// The current state, if any.
    pub fn top(&self) -> Option<SharedState> {
        self.lock_stack().states.last().map(|e| Arc::clone(&e.live.state))
    }

    /// The whole stack, bottom first.
    pub fn states(&self) -> Vec<SharedState> {
        self.lock_stack()
            .states
            .iter()
            .map(|e| Arc::clone(&e.live.state))
            .collect()
    }

    /// States receiving render, top-first.
    pub fn live_render_states(&self) -> Vec<SharedState> {
        self.shared_states(Channel::Render)
    }

    /// States receiving update, top-first.
    pub fn live_update_states(&self) -> Vec<SharedState> {
        self.shared_states(Channel::Update)
    }

    /// States receiving input, top-first.
    pub fn live_input_states(&self) -> Vec<SharedState> {
        self.shared_states(Channel::Input)
    }

    /// A handle for requesting transitions from outside a dispatch.
    pub fn commands(&self) -> StateCommands {
        self.commands.clone()
    }

    /// The store `push_state_by_key` resolves keys through.
    pub fn store(&self) -> &Arc<GameStateStore> {
        &self.store
    }

    fn snapshot(&self, channel: Channel) -> Vec<LiveState> {
        self.lock_stack().live(channel).to_vec()
    }

    fn shared_states(&self, channel: Channel) -> Vec<SharedState> {
        self.lock_stack()
            .live(channel)
            .iter()
            .map(|live| Arc::clone(&live.state))
            .collect()
    }

    fn lock_stack(&self) -> MutexGuard<'_, StateStack> {
        lock_or_recover(&self.stack, "game state stack")
    }
}

impl Default for GameStateManager {
    fn default() -> Self {
        Self::new(Arc::new(GameStateStore::new()))
    }
}

impl std::fmt::Debug for GameStateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameStateManager")
            .field("len", &self.len())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl InputSink for GameStateManager {
    fn key_callback(
        &self,
        action: KeyAction,
        modifiers: KeyModifiers,
        key: &Key,
        scan_code: Option<u32>,
    ) {
        self.fan_out_input(|controller, commands| {
            controller.on_key(action, modifiers, key, scan_code, commands)
        });
    }

    fn cursor_callback(&self, x: f64, y: f64) {
        self.fan_out_input(|controller, commands| controller.on_cursor(x, y, commands));
    }

    fn cursor_in_out_callback(&self, entered: bool) {
        self.fan_out_input(|controller, commands| {
            if entered {
                controller.on_cursor_in(commands)
            } else {
                controller.on_cursor_out(commands)
            }
        });
    }

    fn mouse_button_callback(
        &self,
        action: KeyAction,
        modifiers: KeyModifiers,
        button: MouseButton,
    ) {
        self.fan_out_input(|controller, commands| {
            controller.on_mouse_button(action, modifiers, button, commands)
        });
    }

    fn scroll_callback(&self, x_offset: f64, y_offset: f64) {
        self.fan_out_input(|controller, commands| {
            controller.on_scroll(x_offset, y_offset, commands)
        });
    }

    fn drop_callback(&self, paths: &[PathBuf]) {
        self.fan_out_input(|controller, commands| controller.on_drop(paths, commands));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{share, Keybinding};

    type Journal = Arc<Mutex<Vec<String>>>;

    /// Records every callback into a shared journal as `"<label>.<callback>"`.
    struct Recorder {
        label: &'static str,
        journal: Journal,
        transparency: Transparency,
        fail_update: bool,
        controller: Controller,
    }

    impl Recorder {
        fn new(label: &'static str, journal: &Journal) -> Self {
            Self {
                label,
                journal: Arc::clone(journal),
                transparency: Transparency::OPAQUE,
                fail_update: false,
                controller: Controller::new(),
            }
        }

        fn transparent(mut self, transparency: Transparency) -> Self {
            self.transparency = transparency;
            self
        }

        fn record(&self, what: &str) {
            self.journal.lock().unwrap().push(format!("{}.{what}", self.label));
        }
    }

    impl GameState for Recorder {
        fn on_push(&mut self) {
            self.record("push");
        }
        fn on_pop(&mut self) {
            self.record("pop");
        }
        fn on_activate(&mut self) {
            self.record("activate");
        }
        fn on_deactivate(&mut self) {
            self.record("deactivate");
        }
        fn on_ascend(&mut self) {
            self.record("ascend");
        }
        fn on_descend(&mut self) {
            self.record("descend");
        }
        fn transparency(&self) -> Transparency {
            self.transparency
        }
        fn render(&mut self, _: f64) -> anyhow::Result<()> {
            self.record("render");
            Ok(())
        }
        fn update(&mut self, _: f64, _: &StateCommands) -> anyhow::Result<()> {
            self.record("update");
            if self.fail_update {
                anyhow::bail!("{} refused to update", self.label);
            }
            Ok(())
        }
        fn controller(&mut self) -> &mut Controller {
            &mut self.controller
        }
        fn name(&self) -> &str {
            self.label
        }
    }

    fn take(journal: &Journal) -> Vec<String> {
        std::mem::take(&mut *journal.lock().unwrap())
    }

    fn labels(states: &[SharedState]) -> Vec<String> {
        states
            .iter()
            .map(|s| s.lock().unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn push_pop_round_trip_fires_lifecycle_in_order() {
        let journal = Journal::default();
        let manager = GameStateManager::default();

        manager.push_state(share(Recorder::new("a", &journal)));
        manager.push_state(share(Recorder::new("b", &journal)));
        let popped = manager.pop_state().unwrap();

        assert_eq!(popped.lock().unwrap().name(), "b");
        assert_eq!(labels(&[manager.top().unwrap()]), vec!["a"]);
        assert_eq!(
            take(&journal),
            vec![
                "a.push",
                "a.activate",
                "b.push",
                "b.activate",
                "a.deactivate",
                "a.descend",
                "b.deactivate",
                "b.pop",
                "a.activate",
                "a.ascend",
            ]
        );
    }

    #[test]
    fn activate_twice_and_deactivate_once_across_a_round_trip() {
        let journal = Journal::default();
        let manager = GameStateManager::default();
        manager.push_state(share(Recorder::new("a", &journal)));
        manager.push_state(share(Recorder::new("b", &journal)));
        manager.pop_state().unwrap();

        let entries = take(&journal);
        let count = |what: &str| entries.iter().filter(|e| *e == what).count();
        assert_eq!(count("a.activate"), 2);
        assert_eq!(count("a.deactivate"), 1);
    }

    #[test]
    fn descend_and_ascend_reach_every_lower_state() {
        let journal = Journal::default();
        let manager = GameStateManager::default();
        manager.push_state(share(Recorder::new("a", &journal)));
        manager.push_state(share(Recorder::new("b", &journal)));
        take(&journal);

        manager.push_state(share(Recorder::new("c", &journal)));
        assert_eq!(
            take(&journal),
            vec!["c.push", "c.activate", "b.deactivate", "b.descend", "a.descend"]
        );

        manager.drop_state().unwrap();
        assert_eq!(
            take(&journal),
            vec!["c.deactivate", "c.pop", "b.activate", "b.ascend", "a.ascend"]
        );
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn empty_stack_pop_and_drop_are_errors() {
        let manager = GameStateManager::default();
        assert!(matches!(
            manager.pop_state(),
            Err(StateError::EmptyStack { operation: "pop" })
        ));
        assert!(matches!(
            manager.drop_state(),
            Err(StateError::EmptyStack { operation: "drop" })
        ));
        assert!(manager.is_empty());
    }

    #[test]
    fn empty_stack_dispatch_is_a_no_op() {
        let manager = GameStateManager::default();
        assert!(manager.render(0.016).is_ok());
        assert!(manager.update(0.025).is_ok());
        assert!(manager.update(0.025).is_ok());
        manager.key_callback(KeyAction::Press, KeyModifiers::empty(), &Key::code("KeyA"), None);
    }

    #[test]
    fn transparency_cuts_each_channel_independently() {
        let journal = Journal::default();
        let manager = GameStateManager::default();
        manager.push_state(share(Recorder::new("a", &journal)));
        manager.push_state(share(Recorder::new("b", &journal).transparent(Transparency {
            render: false,
            update: true,
            input: true,
        })));
        manager.push_state(share(Recorder::new("c", &journal).transparent(Transparency {
            render: true,
            update: true,
            input: false,
        })));

        assert_eq!(labels(&manager.live_render_states()), vec!["c", "b"]);
        assert_eq!(labels(&manager.live_update_states()), vec!["c", "b", "a"]);
        assert_eq!(labels(&manager.live_input_states()), vec!["c"]);
    }

    #[test]
    fn a_blocked_channel_stays_blocked_below_transparent_states() {
        let journal = Journal::default();
        let manager = GameStateManager::default();
        manager.push_state(share(Recorder::new("a", &journal)));
        manager.push_state(share(Recorder::new("b", &journal).transparent(Transparency::TRANSPARENT)));
        manager.push_state(share(Recorder::new("c", &journal).transparent(Transparency::OPAQUE)));
        manager.push_state(share(Recorder::new("d", &journal).transparent(Transparency::RENDER_ONLY)));

        assert_eq!(labels(&manager.live_render_states()), vec!["d", "c"]);
        assert_eq!(labels(&manager.live_update_states()), vec!["d"]);
        assert_eq!(labels(&manager.live_input_states()), vec!["d"]);
    }

    #[test]
    fn live_lists_follow_pops() {
        let journal = Journal::default();
        let manager = GameStateManager::default();
        manager.push_state(share(Recorder::new("a", &journal)));
        manager.push_state(share(Recorder::new("b", &journal).transparent(Transparency::TRANSPARENT)));
        assert_eq!(labels(&manager.live_update_states()), vec!["b", "a"]);

        manager.drop_state().unwrap();
        assert_eq!(labels(&manager.live_update_states()), vec!["a"]);
        manager.drop_state().unwrap();
        assert!(manager.live_render_states().is_empty());
    }

    #[test]
    fn render_and_update_dispatch_top_first() {
        let journal = Journal::default();
        let manager = GameStateManager::default();
        manager.push_state(share(Recorder::new("a", &journal)));
        manager.push_state(share(Recorder::new("b", &journal).transparent(Transparency::TRANSPARENT)));
        take(&journal);

        manager.render(0.0).unwrap();
        manager.update(0.0).unwrap();

        assert_eq!(take(&journal), vec!["b.render", "a.render", "b.update", "a.update"]);
    }

    #[test]
    fn update_failure_stops_dispatch_and_names_the_state() {
        let journal = Journal::default();
        let manager = GameStateManager::default();
        manager.push_state(share(Recorder::new("a", &journal)));
        let mut failing = Recorder::new("b", &journal).transparent(Transparency::TRANSPARENT);
        failing.fail_update = true;
        manager.push_state(share(failing));
        take(&journal);

        let err = manager.update(0.1).unwrap_err();

        match err {
            StateError::Callback { state, phase, source } => {
                assert_eq!(state, "b");
                assert_eq!(phase, "update");
                assert_eq!(source.to_string(), "b refused to update");
            }
            other => panic!("Unexpected error {other:?}"),
        }
        assert_eq!(take(&journal), vec!["b.update"]);
    }

    #[test]
    fn push_by_key_uses_the_store() {
        let journal = Journal::default();
        let store = Arc::new(GameStateStore::new());
        store.register_state("menu", share(Recorder::new("menu", &journal)));
        let manager = GameStateManager::new(Arc::clone(&store));

        assert!(!manager.push_state_by_key("missing"));
        assert!(manager.is_empty());
        assert!(manager.push_state_by_key("menu"));
        assert!(Arc::ptr_eq(&manager.top().unwrap(), &store.get_state("menu").unwrap()));
    }

    #[test]
    fn commands_are_applied_after_dispatch() {
        struct Spawner {
            controller: Controller,
            spawned: bool,
        }
        impl GameState for Spawner {
            fn render(&mut self, _: f64) -> anyhow::Result<()> {
                Ok(())
            }
            fn update(&mut self, _: f64, commands: &StateCommands) -> anyhow::Result<()> {
                if !self.spawned {
                    self.spawned = true;
                    commands.push_key("overlay");
                }
                Ok(())
            }
            fn controller(&mut self) -> &mut Controller {
                &mut self.controller
            }
        }

        let journal = Journal::default();
        let manager = GameStateManager::default();
        manager
            .store()
            .register_state("overlay", share(Recorder::new("overlay", &journal)));
        manager.push_state(share(Spawner {
            controller: Controller::new(),
            spawned: false,
        }));

        manager.update(0.025).unwrap();

        assert_eq!(manager.len(), 2);
        assert_eq!(labels(&[manager.top().unwrap()]), vec!["overlay"]);
    }

    #[test]
    fn input_reaches_only_live_input_controllers() {
        let journal = Journal::default();
        let manager = GameStateManager::default();

        let mut bottom = Recorder::new("bottom", &journal);
        let j = Arc::clone(&journal);
        bottom.controller.add_cursor_callback(move |_, _, _| {
            j.lock().unwrap().push("bottom.cursor".into());
            Ok(())
        });
        let mut top = Recorder::new("top", &journal).transparent(Transparency::RENDER_ONLY);
        top.controller.add_keybinding(Keybinding::new(
            KeyAction::Press,
            KeyModifiers::empty(),
            Key::code("Escape"),
            |commands| {
                commands.pop();
                Ok(())
            },
        ));
        manager.push_state(share(bottom));
        manager.push_state(share(top));
        take(&journal);

        manager.cursor_callback(1.0, 1.0);
        assert!(take(&journal).is_empty(), "Bottom state is not live for input");

        manager.key_callback(KeyAction::Press, KeyModifiers::empty(), &Key::code("Escape"), None);
        assert_eq!(manager.len(), 1);
        take(&journal);

        manager.cursor_callback(1.0, 1.0);
        assert_eq!(take(&journal), vec!["bottom.cursor"]);
    }

    #[test]
    fn external_commands_are_applied_on_the_next_dispatch() {
        let journal = Journal::default();
        let manager = GameStateManager::default();
        manager.commands().push(share(Recorder::new("queued", &journal)));
        assert!(manager.is_empty());

        manager.render(0.0).unwrap();

        assert_eq!(manager.len(), 1);
    }
}
