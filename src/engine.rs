//! Host-facing command/event boundary (section 6): a FIFO command queue
//! processed against an owned [`Simulator`], emitting events back. This is
//! the layer that carries `running`/`paused`/`stepsPerFrame` scheduling
//! state, which the simulator itself does not know about.

use serde::{Deserialize, Serialize};
use tracing::{error, instrument};

use crate::config::{SimParams, SimParamsPatch};
use crate::error::SimError;
use crate::network::NeuralNet;
use crate::simulator::{AgentInfo, GenerationStats, Simulator};

/// A message from the host. Processed strictly in FIFO order; none can
/// observe a half-updated step (section 5).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    Init { params: SimParams },
    Reset { params: Option<SimParams> },
    Start,
    Pause,
    Resume,
    Step,
    StepGeneration,
    UpdateParams { partial: SimParamsPatch },
    Inspect { x: i32, y: i32 },
    SetSpeed { steps_per_frame: u32 },
}

/// A message to the host, emitted in response to a [`Command`] or as a
/// side effect of one (`generationComplete` can fire mid-`Start` run).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    State(StateSnapshot),
    GenerationComplete { stats: GenerationStats },
    InspectResult {
        network: Option<NeuralNet>,
        info: Option<AgentInfo>,
    },
    Error { message: String },
}

/// The full renderable snapshot: everything a viewer needs to draw one
/// frame, plus the running generation history.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub generation: u32,
    pub sim_step: u32,
    pub running: bool,
    pub paused: bool,
    pub size_x: i32,
    pub size_y: i32,
    pub grid_bytes: Vec<u8>,
    pub signal_bytes: Vec<u8>,
    pub color_bytes: Vec<u8>,
    pub stats: Option<GenerationStats>,
    pub history: Vec<GenerationStats>,
}

/// Owns a [`Simulator`] plus the scheduling state the spec keeps outside
/// the simulation core proper: `running`/`paused`/`stepsPerFrame`. Processes
/// one [`Command`] at a time and returns the [`Event`]s it produces.
///
/// `start`/`pause`/`resume` only set flags here; the host is expected to
/// drive further stepping (e.g. via repeated `Step` commands, or its own
/// frame timer checking `running && !paused`) rather than have the engine
/// spin a thread of its own (section 9, "coroutine/async patterns").
pub struct Engine {
    sim: Option<Simulator>,
    running: bool,
    paused: bool,
    steps_per_frame: u32,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            sim: None,
            running: false,
            paused: false,
            steps_per_frame: 1,
        }
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn steps_per_frame(&self) -> u32 {
        self.steps_per_frame
    }

    /// Handles one command, returning the events it produces. A command
    /// that needs a simulator but finds none implicitly initializes one
    /// with default params first (section 7, "step called before init").
    #[instrument(skip(self))]
    pub fn handle(&mut self, command: Command) -> Vec<Event> {
        match command {
            Command::Init { params } => self.init(params),
            Command::Reset { params } => self.reset(params),
            Command::Start => {
                self.ensure_initialized(SimParams::default());
                self.running = true;
                self.paused = false;
                vec![self.state_event()]
            }
            Command::Pause => {
                self.paused = true;
                vec![self.state_event()]
            }
            Command::Resume => {
                self.paused = false;
                vec![self.state_event()]
            }
            Command::Step => self.step(),
            Command::StepGeneration => self.step_generation(),
            Command::UpdateParams { partial } => self.update_params(&partial),
            Command::Inspect { x, y } => self.inspect(x, y),
            Command::SetSpeed { steps_per_frame } => {
                self.steps_per_frame = steps_per_frame.max(1);
                vec![self.state_event()]
            }
        }
    }

    fn init(&mut self, params: SimParams) -> Vec<Event> {
        match Simulator::new(params) {
            Ok(sim) => {
                self.sim = Some(sim);
                self.running = false;
                self.paused = false;
                vec![self.state_event()]
            }
            Err(err) => vec![error_event(&err)],
        }
    }

    fn reset(&mut self, params: Option<SimParams>) -> Vec<Event> {
        let params = params.or_else(|| self.sim.as_ref().map(|s| s.config().clone()));
        let Some(params) = params else {
            return vec![error_event(&SimError::InvalidConfig(
                "reset with no prior params and none supplied".into(),
            ))];
        };
        self.init(params)
    }

    fn ensure_initialized(&mut self, fallback: SimParams) {
        if self.sim.is_none() {
            self.sim = Simulator::new(fallback).ok();
        }
    }

    fn step(&mut self) -> Vec<Event> {
        self.ensure_initialized(SimParams::default());
        let Some(sim) = self.sim.as_mut() else {
            return vec![error_event(&SimError::InvalidConfig(
                "no simulator available".into(),
            ))];
        };

        let mut events = Vec::new();
        let was_generation_boundary = sim.sim_step() + 1 >= sim.config().steps_per_generation;
        sim.step_once();
        if was_generation_boundary {
            let stats = sim.end_generation();
            events.push(Event::GenerationComplete { stats });
        }
        events.push(self.state_event());
        events
    }

    fn step_generation(&mut self) -> Vec<Event> {
        self.ensure_initialized(SimParams::default());
        let Some(sim) = self.sim.as_mut() else {
            return vec![error_event(&SimError::InvalidConfig(
                "no simulator available".into(),
            ))];
        };

        let stats = sim.run_generation();
        vec![
            Event::GenerationComplete { stats },
            self.state_event(),
        ]
    }

    fn update_params(&mut self, patch: &SimParamsPatch) -> Vec<Event> {
        self.ensure_initialized(SimParams::default());
        let Some(sim) = self.sim.as_mut() else {
            return vec![error_event(&SimError::InvalidConfig(
                "no simulator available".into(),
            ))];
        };

        match sim.update_params(patch) {
            Ok(()) => vec![self.state_event()],
            Err(err) => vec![error_event(&err)],
        }
    }

    fn inspect(&mut self, x: i32, y: i32) -> Vec<Event> {
        let Some(sim) = self.sim.as_ref() else {
            return vec![Event::InspectResult {
                network: None,
                info: None,
            }];
        };

        match sim.inspect(x, y) {
            Some((network, info)) => vec![Event::InspectResult {
                network: Some(network),
                info: Some(info),
            }],
            None => vec![Event::InspectResult {
                network: None,
                info: None,
            }],
        }
    }

    /// Assembles the full renderable [`StateSnapshot`] from the current
    /// simulator, wrapped as an [`Event::State`].
    fn state_event(&self) -> Event {
        let Some(sim) = self.sim.as_ref() else {
            return Event::State(StateSnapshot {
                generation: 0,
                sim_step: 0,
                running: self.running,
                paused: self.paused,
                size_x: 0,
                size_y: 0,
                grid_bytes: Vec::new(),
                signal_bytes: Vec::new(),
                color_bytes: Vec::new(),
                stats: None,
                history: Vec::new(),
            });
        };

        let size_x = sim.config().size_x;
        let size_y = sim.config().size_y;
        let color_bytes = self.color_bytes(sim, size_x, size_y);

        Event::State(StateSnapshot {
            generation: sim.generation(),
            sim_step: sim.sim_step(),
            running: self.running,
            paused: self.paused,
            size_x,
            size_y,
            grid_bytes: sim.grid().to_bytes(),
            signal_bytes: sim.signals().to_bytes(0),
            color_bytes,
            stats: sim.history().last().cloned(),
            history: sim.history().to_vec(),
        })
    }

    /// Row-major RGB bytes: `(0,0,0)` for empty/barrier cells, otherwise the
    /// color assigned to that cell's agent's genome at placement time
    /// (section 6, "snapshot buffer layouts").
    fn color_bytes(&self, sim: &Simulator, size_x: i32, size_y: i32) -> Vec<u8> {
        let mut out = Vec::with_capacity((size_x as usize) * (size_y as usize) * 3);
        for y in 0..size_y {
            for x in 0..size_x {
                let c = crate::coord::Coord::new(x, y);
                let cell = sim.grid().at(c);
                let rgb = if cell == crate::grid::EMPTY_CELL || cell == crate::grid::BARRIER_CELL {
                    (0u8, 0u8, 0u8)
                } else {
                    sim.colors()
                        .get(cell as usize)
                        .copied()
                        .unwrap_or((0, 0, 0))
                };
                out.push(rgb.0);
                out.push(rgb.1);
                out.push(rgb.2);
            }
        }
        out
    }
}

fn error_event(err: &SimError) -> Event {
    error!(error = %err, "command failed");
    Event::Error {
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_params() -> SimParams {
        let mut p = SimParams::default();
        p.population = 4;
        p.size_x = 8;
        p.size_y = 8;
        p.steps_per_generation = 3;
        p.rng_seed = 1;
        p
    }

    #[test]
    fn step_before_init_implicitly_initializes() {
        let mut engine = Engine::new();
        let events = engine.handle(Command::Step);
        assert!(matches!(events.last(), Some(Event::State(_))));
    }

    #[test]
    fn init_with_invalid_config_emits_error_and_keeps_no_simulator() {
        let mut engine = Engine::new();
        let mut bad = SimParams::default();
        bad.size_x = 0;

        let events = engine.handle(Command::Init { params: bad });
        assert!(matches!(events.as_slice(), [Event::Error { .. }]));
    }

    #[test]
    fn inspect_miss_returns_nulls() {
        let mut engine = Engine::new();
        engine.handle(Command::Init {
            params: tiny_params(),
        });
        let events = engine.handle(Command::Inspect { x: -1, y: -1 });
        match events.as_slice() {
            [Event::InspectResult { network, info }] => {
                assert!(network.is_none());
                assert!(info.is_none());
            }
            _ => panic!("expected a single InspectResult event"),
        }
    }

    #[test]
    fn step_generation_emits_generation_complete_then_state() {
        let mut engine = Engine::new();
        engine.handle(Command::Init {
            params: tiny_params(),
        });
        let events = engine.handle(Command::StepGeneration);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::GenerationComplete { .. }));
        assert!(matches!(events[1], Event::State(_)));
    }

    #[test]
    fn state_snapshot_buffer_lengths_match_grid_shape() {
        let mut engine = Engine::new();
        engine.handle(Command::Init {
            params: tiny_params(),
        });
        let events = engine.handle(Command::Step);
        let Event::State(snap) = events.last().unwrap() else {
            panic!("expected a State event");
        };

        let cells = (snap.size_x * snap.size_y) as usize;
        assert_eq!(snap.grid_bytes.len(), cells * 2);
        assert_eq!(snap.signal_bytes.len(), cells);
        assert_eq!(snap.color_bytes.len(), cells * 3);
    }

    #[test]
    fn set_speed_clamps_to_at_least_one() {
        let mut engine = Engine::new();
        engine.handle(Command::SetSpeed { steps_per_frame: 0 });
        assert_eq!(engine.steps_per_frame(), 1);
    }

    #[test]
    fn pause_and_resume_toggle_the_flag() {
        let mut engine = Engine::new();
        engine.handle(Command::Start);
        assert!(engine.running());
        engine.handle(Command::Pause);
        assert!(engine.paused());
        engine.handle(Command::Resume);
        assert!(!engine.paused());
    }
}
