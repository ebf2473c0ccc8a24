// src/storage/memory_directory.rs
//! Process-local directory backend.
//!
//! Keeps user records in a hashmap behind a mutex. Used when
//! `DIRECTORY_BACKEND=memory` for local runs, and by the tests, which also
//! inspect the call journal to check the order of directory operations.

use crate::storage::directory::{Directory, DirectoryError, NewUser, UpdateOutcome};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A stored user record: attribute name to value.
pub type Record = HashMap<String, String>;

/// One directory operation, as observed by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryCall {
    Update { username: String, attribute: String },
    Create { username: String },
}

#[derive(Default)]
struct State {
    records: HashMap<String, Record>,
    journal: Vec<DirectoryCall>,
    #[cfg(test)]
    faults: Faults,
}

#[cfg(test)]
#[derive(Default)]
struct Faults {
    reject_updates: bool,
    reject_creates: bool,
    drop_creates: bool,
}

/// In-memory [`Directory`].
#[derive(Default)]
pub struct InMemoryDirectory {
    state: Mutex<State>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock cannot leave a record half-written.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the record for `username`.
    pub fn record(&self, username: &str) -> Option<Record> {
        self.lock().records.get(username).cloned()
    }

    pub fn record_count(&self) -> usize {
        self.lock().records.len()
    }

    /// Every operation received so far, oldest first.
    pub fn calls(&self) -> Vec<DirectoryCall> {
        self.lock().journal.clone()
    }
}

#[cfg(test)]
impl InMemoryDirectory {
    pub fn insert_record(&self, username: &str, record: Record) {
        self.lock().records.insert(username.to_string(), record);
    }

    /// Every update fails with a generic rejection.
    pub fn reject_updates(self) -> Self {
        self.lock().faults.reject_updates = true;
        self
    }

    /// Every create fails with a generic rejection.
    pub fn reject_creates(self) -> Self {
        self.lock().faults.reject_creates = true;
        self
    }

    /// Creates report success but store nothing.
    pub fn drop_creates(self) -> Self {
        self.lock().faults.drop_creates = true;
        self
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn update_attribute(
        &self,
        username: &str,
        attribute: &str,
        value: &str,
    ) -> Result<UpdateOutcome, DirectoryError> {
        let mut state = self.lock();
        state.journal.push(DirectoryCall::Update {
            username: username.to_string(),
            attribute: attribute.to_string(),
        });

        #[cfg(test)]
        if state.faults.reject_updates {
            return Err(DirectoryError::Rejected {
                operation: "update",
                kind: "InternalErrorException".into(),
                message: "injected failure".into(),
            });
        }

        match state.records.get_mut(username) {
            Some(record) => {
                record.insert(attribute.to_string(), value.to_string());
                Ok(UpdateOutcome::Updated)
            }
            None => Ok(UpdateOutcome::UserNotFound),
        }
    }

    async fn create_user(&self, user: &NewUser) -> Result<(), DirectoryError> {
        let mut state = self.lock();
        state.journal.push(DirectoryCall::Create {
            username: user.username.clone(),
        });

        #[cfg(test)]
        {
            if state.faults.reject_creates {
                return Err(DirectoryError::Rejected {
                    operation: "create",
                    kind: "InternalErrorException".into(),
                    message: "injected failure".into(),
                });
            }
            if state.faults.drop_creates {
                return Ok(());
            }
        }

        if state.records.contains_key(&user.username) {
            return Err(DirectoryError::UserExists(user.username.clone()));
        }

        let record = user
            .attributes()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        state.records.insert(user.username.clone(), record);
        Ok(())
    }
}
