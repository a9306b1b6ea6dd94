//! Data Petri nets with guarded firing, workflow-net normalisation, silent
//! transition pruning and an algebra of activity patterns.

pub mod config;
pub mod net;
pub mod pattern;
pub mod simulation;

pub use config::{EngineConfig, PruningConfig, SimulationConfig};
pub use net::{DataPetriNet, Guard, Marking, NetError, Place, Result, Transition, Variable};
pub use pattern::{
    ActivityLabels, ActivityMap, ActivityPattern, choice, choice_list, interleaving, parallel,
    sequence, unbounded_repetition,
};
pub use simulation::{SimulationTrace, Simulator};
