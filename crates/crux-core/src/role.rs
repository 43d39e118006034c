//! The three canonical collaborator roles of the falsification protocol.
//!
//! Every session involves exactly three autonomous collaborators: one
//! proposing hypotheses, one designing tests, one attacking both. Role
//! attribution of inbound mail is derived from a shorthand token embedded
//! in `DELTA[...]:` subject lines, so the token vocabulary here is closed
//! and matched case-insensitively.

use serde::{Deserialize, Serialize};

/// A fixed collaborator function within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Proposes and refines hypothesis cards.
    Proposer,
    /// Designs tests and falsification procedures.
    TestDesigner,
    /// Mounts adversarial critique against hypotheses and tests.
    Critic,
}

impl Role {
    /// All roles in canonical order.
    pub const ALL: [Role; 3] = [Role::Proposer, Role::TestDesigner, Role::Critic];

    /// Returns the canonical wire name (matches the serde representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Proposer => "proposer",
            Role::TestDesigner => "test_designer",
            Role::Critic => "critic",
        }
    }

    /// Human-readable display label.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Proposer => "Hypothesis Proposer",
            Role::TestDesigner => "Test Designer",
            Role::Critic => "Adversarial Critic",
        }
    }

    /// Maps a subject-line role token to a role.
    ///
    /// The vocabulary covers the shorthand tokens agents actually emit and,
    /// for robustness, the raw canonical role names. Matching is
    /// case-insensitive and ignores surrounding whitespace. Unknown tokens
    /// return `None`; callers treat that as "not yet attributed".
    pub fn from_token(token: &str) -> Option<Role> {
        match token.trim().to_ascii_lowercase().as_str() {
            "prop" | "proposer" | "hypothesis" => Some(Role::Proposer),
            "test" | "design" | "test_designer" | "test-designer" => Some(Role::TestDesigner),
            "crit" | "critic" | "critique" => Some(Role::Critic),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
