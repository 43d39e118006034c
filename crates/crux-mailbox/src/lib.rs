//! Mailbox transport client for the Crux protocol.
//!
//! Consumes the remote mailbox's RPC contract: one POST per logical
//! call, answered either by a buffered JSON envelope or by a
//! `text/event-stream` whose first well-formed envelope is the outcome.
//! The reconstruction engine in `crux-core` depends on this crate's
//! parsing contract, nothing else; the mailbox service itself is an
//! external collaborator.
//!
//! # Module Structure
//!
//! - `config`: Address/path/credential resolution (`MailboxConfig`)
//! - `envelope`: Request/response envelope types
//! - `sse`: Chunk-independent event-stream scanning
//! - `client`: The RPC client (`MailboxClient`)
//! - `error`: Transport error kinds (`MailboxError`)

mod client;
mod config;
mod envelope;
mod error;
mod sse;

// Re-export public API
pub use client::MailboxClient;
pub use config::{ENV_BASE_URL, ENV_PATH, ENV_TOKEN, MailboxConfig, MailboxOverrides, normalize_path};
pub use envelope::{PROTOCOL_VERSION, RpcErrorBody, RpcRequest, RpcResponse};
pub use error::MailboxError;
pub use sse::EventStreamScanner;
