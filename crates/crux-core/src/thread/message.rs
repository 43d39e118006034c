//! Mailbox message records.
//!
//! Messages are immutable after receipt and identified by their numeric id.
//! They are fetched on demand from the mailbox transport; this layer never
//! owns or mutates a thread, it only folds snapshots of one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single message in a collaboration thread, as returned by the mailbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailMessage {
    /// Server-assigned numeric message id.
    pub id: u64,
    /// Thread this message belongs to, if the server scoped it.
    #[serde(default)]
    pub thread_id: Option<String>,
    /// Subject line; carries the protocol type and metadata.
    pub subject: String,
    /// Sender name. Senderless messages are tolerated (counted but never
    /// attributed to a role).
    #[serde(default)]
    pub sender: Option<String>,
    /// Primary recipients.
    #[serde(default)]
    pub to: Vec<String>,
    /// Carbon-copy recipients.
    #[serde(default)]
    pub cc: Vec<String>,
    /// Blind-carbon-copy recipients.
    #[serde(default)]
    pub bcc: Vec<String>,
    /// Creation timestamp assigned by the server.
    pub created_at: DateTime<Utc>,
    /// Whether the sender demanded acknowledgement from recipients.
    #[serde(default)]
    pub ack_required: bool,
    /// Free-text body.
    #[serde(default)]
    pub body: Option<String>,
    /// Id of the message this one replies to, if any.
    #[serde(default)]
    pub reply_to: Option<u64>,
}

impl MailMessage {
    /// All addressed recipients (to + cc + bcc) in declaration order.
    pub fn recipients(&self) -> impl Iterator<Item = &String> {
        self.to.iter().chain(self.cc.iter()).chain(self.bcc.iter())
    }

    /// Whether `name` is among the addressed recipients, compared
    /// case-insensitively after trimming.
    pub fn addresses(&self, name: &str) -> bool {
        let needle = name.trim().to_ascii_lowercase();
        self.recipients()
            .any(|r| r.trim().to_ascii_lowercase() == needle)
    }
}

/// An outbound message draft. The server assigns the id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    /// Thread to post into.
    #[serde(default)]
    pub thread_id: Option<String>,
    /// Subject line, including the protocol prefix.
    pub subject: String,
    /// Sender name to record.
    pub sender: String,
    /// Primary recipients.
    #[serde(default)]
    pub to: Vec<String>,
    /// Carbon-copy recipients.
    #[serde(default)]
    pub cc: Vec<String>,
    /// Whether recipients must acknowledge.
    #[serde(default)]
    pub ack_required: bool,
    /// Free-text body.
    #[serde(default)]
    pub body: Option<String>,
    /// Id of the message being replied to, if any.
    #[serde(default)]
    pub reply_to: Option<u64>,
}
