//! The boundary phase processor: every time the driver
//! settles on a new "now", it runs completion, depletion, deferred,
//! trigger, and automation in that fixed order. Node depletion itself is
//! detected inside [`crate::internal::economy::advance_economy`]
//! (which runs just before this), so this module's depletion "phase" is
//! really "anything that reacts to a depletion that already happened".

use crate::internal::clock::time_eq;
use crate::internal::deferred;
use crate::internal::scheduler;
use crate::internal::state::SimState;
use crate::internal::trigger;
use crate::public::human_delay::HumanDelayRng;

fn process_completions(state: &mut SimState) {
    loop {
        match state.completions.peek_time() {
            Some(t) if time_eq(t, state.now) => {
                let (_, completion) = state.completions.pop().expect("peeked completion must pop");
                scheduler::apply_completion(state, &completion);
            }
            _ => break,
        }
    }
}

fn run_automation(state: &mut SimState, rng: &mut dyn HumanDelayRng) {
    scheduler::pump_queue_rules(state, rng);
    scheduler::pump_auto_queue_rules(state, rng);
}

/// Run completion -> depletion-reaction -> deferred -> trigger ->
/// automation once, at the current `state.now`.
pub fn process_boundary(state: &mut SimState, rng: &mut dyn HumanDelayRng) {
    process_completions(state);
    deferred::process_deferred(state);
    trigger::process_triggers(state);
    run_automation(state, rng);
}
