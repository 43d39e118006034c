//! Use-case layer of the Crux protocol.
//!
//! Coordinates the pure domain layer (`crux-core`) with the mailbox
//! transport (`crux-mailbox`): fanning a session out to its collaborator
//! roles and matching their replies back as they arrive. Polling is
//! caller-driven; no background timers live here.

mod dispatch;

// Re-export public API
pub use dispatch::{Dispatch, DispatchTask, TaskState};
