//! Unified error handling for warden.
//!
//! Registry operations fail with [`PunishError`]. The recoverable kinds carry
//! the subject they tripped over so the caller can render a message for the
//! moderator; see [`PunishError::message`].

use crate::db::DbError;
use crate::punish::{PunishmentKind, Subject};
use thiserror::Error;

// ============================================================================
// Registry Errors
// ============================================================================

/// Errors returned by punish and pardon operations.
#[derive(Debug, Error)]
pub enum PunishError {
    #[error("{kind} already active for {subject}")]
    AlreadyPunished {
        kind: PunishmentKind,
        subject: Subject,
    },

    #[error("no active {kind} for {subject}")]
    NotPunished {
        kind: PunishmentKind,
        subject: Subject,
    },

    #[error("moderator not found: {0}")]
    ModeratorNotFound(String),

    #[error("store error: {0}")]
    Store(#[from] DbError),
}

impl PunishError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyPunished { .. } => "already_punished",
            Self::NotPunished { .. } => "not_punished",
            Self::ModeratorNotFound(_) => "moderator_not_found",
            Self::Store(_) => "store_error",
        }
    }

    /// The subject this error is about, if any.
    pub fn subject(&self) -> Option<&Subject> {
        match self {
            Self::AlreadyPunished { subject, .. } | Self::NotPunished { subject, .. } => {
                Some(subject)
            }
            Self::ModeratorNotFound(_) | Self::Store(_) => None,
        }
    }

    /// Message template for display, before interpolation.
    ///
    /// Returns `None` for errors that have no moderator-facing template.
    pub fn template(&self) -> Option<&'static str> {
        match self {
            Self::AlreadyPunished { kind, .. } => Some(kind.already_punished_template()),
            Self::NotPunished { kind, .. } => Some(kind.not_punished_template()),
            Self::ModeratorNotFound(_) | Self::Store(_) => None,
        }
    }

    /// Message for display, with the subject interpolated.
    pub fn message(&self) -> String {
        match (self.template(), self.subject()) {
            (Some(template), Some(subject)) => {
                let (name, value) = subject.placeholder();
                render_template(template, &[(name, value.as_str())])
            }
            _ => self.to_string(),
        }
    }
}

/// Replace every `%name%` in `template` with its value.
pub fn render_template(template: &str, params: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in params {
        out = out.replace(&format!("%{}%", name), value);
    }
    out
}
