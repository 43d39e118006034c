//! Thread domain module.
//!
//! A thread is the set of mailbox messages exchanged for one session's
//! multi-party collaboration. This module holds the message records, the
//! subject-line micro-grammar, and the status reconstruction engine that
//! derives the current protocol state from a message snapshot.
//!
//! # Module Structure
//!
//! - `message`: Mailbox message records (`MailMessage`, `NewMessage`)
//! - `subject`: Subject-line classification (`ParsedSubject`, `SubjectKind`)
//! - `status`: Status reconstruction (`compute_status`, `ThreadStatus`)

mod message;
mod status;
mod subject;

// Re-export public API
pub use message::{MailMessage, NewMessage};
pub use status::{AckStatus, ArtifactInfo, RoleStatus, ThreadPhase, ThreadStatus, compute_status};
pub use subject::{ParsedSubject, SubjectKind, parse_subject};
