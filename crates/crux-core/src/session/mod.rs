//! Session domain module.
//!
//! # Module Structure
//!
//! - `model`: Core session domain model (`Session`, `HypothesisCard`, ...)
//! - `phase`: The workflow phase enum (`SessionPhase`)
//! - `event`: Events fed into the state machine (`SessionEvent`, `EventKind`)

mod event;
mod model;
mod phase;

// Re-export public API
pub use event::{EventKind, SessionEvent};
pub use model::{
    AgentResponse, EvidenceEntry, HypothesisCard, HypothesisSet, OperatorResult, Session,
};
pub use phase::SessionPhase;
