// src/services/directory_reconciler.rs
//! Stores issued tokens on directory records.
//!
//! `store_token` is a self-healing upsert:
//! 1. Set the token attribute on the record.
//! 2. If the record does not exist, create it and go back to step 1, once.
//! 3. Any other failure is returned as-is, without retrying.
//!
//! The retry bound is what guarantees termination: a directory that keeps
//! answering "not found" after a successful create yields
//! [`DirectoryError::RecordStillMissing`] instead of looping.
//!
//! Concurrent calls for the same username are not coordinated; the last
//! update wins.

use crate::storage::directory::{Directory, DirectoryError, NewUser, UpdateOutcome, TOKEN_ATTRIBUTE};
use log::{info, warn};
use std::sync::Arc;

/// Record creations allowed per `store_token` call.
const MAX_CREATE_ATTEMPTS: u32 = 1;

/// Upserts the token attribute on directory records.
#[derive(Clone)]
pub struct DirectoryReconciler {
    directory: Arc<dyn Directory>,
    email_domain: String,
}

impl DirectoryReconciler {
    /// # Arguments
    /// * `directory` - Backend holding the user records
    /// * `email_domain` - Domain of the email synthesized for new records
    pub fn new(directory: Arc<dyn Directory>, email_domain: impl Into<String>) -> Self {
        Self {
            directory,
            email_domain: email_domain.into(),
        }
    }

    /// Associates `token` with the record for `username`, creating the record
    /// if it does not exist yet.
    ///
    /// # Errors
    /// - Any non-"not found" directory failure, from update or create
    /// - [`DirectoryError::RecordStillMissing`] if the record is still absent
    ///   after being created
    pub async fn store_token(&self, username: &str, token: &str) -> Result<(), DirectoryError> {
        let mut creations = 0;

        loop {
            match self
                .directory
                .update_attribute(username, TOKEN_ATTRIBUTE, token)
                .await?
            {
                UpdateOutcome::Updated => return Ok(()),
                UpdateOutcome::UserNotFound if creations < MAX_CREATE_ATTEMPTS => {
                    warn!("directory record not found, creating it");
                    self.directory
                        .create_user(&NewUser::for_username(username, &self.email_domain))
                        .await?;
                    creations += 1;
                    info!("directory record created");
                }
                UpdateOutcome::UserNotFound => {
                    return Err(DirectoryError::RecordStillMissing(username.to_string()))
                }
            }
        }
    }
}
