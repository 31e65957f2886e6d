//! Fatal exceptions: the handful of outcomes that abort the run
//! rather than being recorded as a [`crate::public::result::Violation`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("unknown action id: {0}")]
    UnknownAction(String),

    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    #[error("unknown resource-node prototype: {0}")]
    UnknownPrototype(String),

    #[error("loop guard tripped at simulation time {at}: {context}")]
    LoopGuardTripped { at: f64, context: String },
}
