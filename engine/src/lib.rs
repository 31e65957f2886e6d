//! A deterministic discrete-event simulation engine for real-time-strategy
//! build orders.
//!
//! A host supplies a [`public::catalogue::GameCatalogue`] (the static game
//! data: resources, entity types, action recipes, resource-node prototypes)
//! and a [`public::program::BuildOrderProgram`] (a timestamped command
//! list), then calls [`public::session::run_simulation`] to get back a
//! [`public::result::SimulationResult`]: the resource timeline, entity
//! timelines, completed actions, recorded violations, and any scores the
//! program asked for.
//!
//! Two things make a run reproducible: time only ever advances through the
//! tick-quantized clock in [`internal::clock`], and the only nondeterministic
//! input, human-delay sampling, is drawn from a host-supplied
//! [`public::human_delay::HumanDelayRng`] rather than an engine-owned seed.

pub mod internal;
pub mod public;

pub use internal::error::SimError;
pub use public::catalogue::GameCatalogue;
pub use public::human_delay::{human_delay_sample, HumanDelayRng, NoDelay};
pub use public::program::BuildOrderProgram;
pub use public::result::SimulationResult;
pub use public::session::run_simulation;
