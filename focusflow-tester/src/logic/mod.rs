pub mod memory;
pub mod replay;
pub mod reports;
pub mod seeds;
pub mod simulation;
pub mod tester;

pub use replay::{ReplayLog, ReplayReport, replay};
pub use seeds::resolve_seed_inputs;
pub use simulation::SimulationPlan;
pub use tester::*;
