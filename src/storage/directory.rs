// src/storage/directory.rs
//! Directory (user pool) abstraction.
//!
//! The directory is an external record store keyed by username. The token
//! workflow needs exactly two operations from it: set the token attribute on
//! an existing record, and create a record. A missing record is an expected
//! answer, not a fault, so it is reported as [`UpdateOutcome::UserNotFound`]
//! instead of an error.

use async_trait::async_trait;
use thiserror::Error;

/// Name of the custom attribute holding the latest issued token.
pub const TOKEN_ATTRIBUTE: &str = "custom:jwtToken";
pub const EMAIL_ATTRIBUTE: &str = "email";
pub const EMAIL_VERIFIED_ATTRIBUTE: &str = "email_verified";

/// Result of an attribute update that reached the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    /// No record exists for the username
    UserNotFound,
}

/// Standard attributes of a record created by the token workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub email_verified: bool,
}

impl NewUser {
    /// Record for `username` with the synthesized `<username>@<domain>` email,
    /// already marked as verified.
    pub fn for_username(username: &str, email_domain: &str) -> Self {
        Self {
            username: username.to_string(),
            email: format!("{username}@{email_domain}"),
            email_verified: true,
        }
    }

    /// Attribute list in directory wire order.
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        vec![
            (EMAIL_ATTRIBUTE, self.email.clone()),
            (EMAIL_VERIFIED_ATTRIBUTE, self.email_verified.to_string()),
        ]
    }
}

/// Faults reported by a directory backend or by the reconciler on top of it.
///
/// Display output never includes the username, which is a CPF.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The request never produced a service answer (connection, timeout,
    /// credentials or signing failure)
    #[error("directory unreachable during {operation}: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("directory rejected {operation} ({kind}): {message}")]
    Rejected {
        operation: &'static str,
        kind: String,
        message: String,
    },

    #[error("could not build {operation} request: {message}")]
    InvalidRequest {
        operation: &'static str,
        message: String,
    },

    #[error("record already exists")]
    UserExists(String),

    #[error("record still missing after it was created")]
    RecordStillMissing(String),
}

/// A user-pool backend.
///
/// Implementations must be safe to share across concurrent requests; the
/// workflow never holds locks across calls.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Sets `attribute` to `value` on the record for `username`.
    async fn update_attribute(
        &self,
        username: &str,
        attribute: &str,
        value: &str,
    ) -> Result<UpdateOutcome, DirectoryError>;

    /// Creates a new record.
    async fn create_user(&self, user: &NewUser) -> Result<(), DirectoryError>;
}
