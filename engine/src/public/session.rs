//! The public entry point: run one build-order program
//! against one catalogue and get back a [`SimulationResult`].

use crate::internal::driver;
use crate::internal::error::SimError;
use crate::public::catalogue::GameCatalogue;
use crate::public::human_delay::HumanDelayRng;
use crate::public::program::BuildOrderProgram;
use crate::public::result::SimulationResult;

/// Run `program` against `catalogue` to the program's evaluation horizon.
///
/// `rng` is the engine's only source of nondeterminism: it backs
/// human-delay sampling for `queueAction` commands with a configured
/// `humanDelays` entry. Supply the same RNG state and the same inputs to
/// get byte-for-byte identical results.
pub fn run_simulation(catalogue: &GameCatalogue, program: &BuildOrderProgram, rng: &mut dyn HumanDelayRng) -> Result<SimulationResult, SimError> {
    driver::run(catalogue, program, rng)
}
