//! Re-exports the public surface most callers need: the engine's
//! command/event types, the simulator, and configuration.

pub use crate::actions::Action;
pub use crate::agent::Agent;
pub use crate::barriers::BarrierType;
pub use crate::config::{SimParams, SimParamsPatch};
pub use crate::coord::{Coord, Direction};
pub use crate::engine::{Command, Engine, Event, StateSnapshot};
pub use crate::error::SimError;
pub use crate::gene::{Gene, Genome};
pub use crate::network::NeuralNet;
pub use crate::sensors::Sensor;
pub use crate::simulator::{AgentInfo, GenerationStats, Simulator};
pub use crate::survival::SurvivalCriterion;
