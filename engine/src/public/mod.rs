//! The crate's public surface: the typed inputs a host constructs
//! ([`catalogue`], [`program`]), the one nondeterministic hook it can
//! supply ([`human_delay`]), the typed output ([`result`]), and the entry
//! point that ties them together ([`session`]).

pub mod catalogue;
pub mod human_delay;
pub mod program;
pub mod result;
pub mod session;
