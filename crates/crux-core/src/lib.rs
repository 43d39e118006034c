//! Core domain layer of the Crux falsification protocol.
//!
//! Everything in this crate is pure: snapshot in, snapshot out. The two
//! load-bearing pieces are the session phase state machine
//! ([`machine::transition`] over a declarative table) and the thread
//! status reconstruction engine ([`thread::compute_status`], a
//! deterministic fold over a mailbox message snapshot). Networking lives
//! in `crux-mailbox`; use-case orchestration in `crux-application`.

pub mod error;
pub mod machine;
pub mod role;
pub mod session;
pub mod thread;

// Re-export common error type
pub use error::CruxError;
pub use role::Role;
