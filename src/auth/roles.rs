//! Closed role set and the capability table behind every moderation check.
//!
//! Roles arrive from the user record, never from request input. Handlers ask
//! `role.allows(capability)` instead of comparing strings; an action missing
//! from the table is denied for everyone.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Moderator,
    Admin,
}

/// Actions gated by role rather than ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Staff validation of an answer (quality gate, no stake payout).
    ValidateAnswers,
    /// Moderation deletion of an answer.
    DeleteAnswers,
    /// Delete without an active report referencing the answer.
    BypassReportGate,
    /// Read another user's point and gem history.
    ViewLedgers,
}

impl Role {
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::ValidateAnswers => {
                matches!(self, Role::Teacher | Role::Moderator | Role::Admin)
            }
            Capability::DeleteAnswers => matches!(self, Role::Moderator | Role::Admin),
            Capability::BypassReportGate => matches!(self, Role::Admin),
            Capability::ViewLedgers => {
                matches!(self, Role::Teacher | Role::Moderator | Role::Admin)
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    /// Parses the storage representation. Unknown strings are rejected so a
    /// corrupted row can never grant capabilities by accident.
    pub fn from_str_opt(value: &str) -> Option<Role> {
        match value {
            "student" => Some(Role::Student),
            "teacher" => Some(Role::Teacher),
            "moderator" => Some(Role::Moderator),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}
