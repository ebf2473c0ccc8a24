// src/models/profile.rs
//! Subject profile produced by a successful identity verification.

use crate::models::cpf::Cpf;
use serde::{Deserialize, Serialize};

/// Name used when the verification backend confirms a CPF without
/// returning any profile data.
pub const PLACEHOLDER_NAME: &str = "Teste Usuario";

/// The verified subject of a token request.
///
/// Built by the verification client and consumed once by the token issuer;
/// never persisted beyond the request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SubjectProfile {
    /// Display name of the subject
    pub name: String,

    /// Normalized CPF the profile was verified for
    pub identifier: Cpf,
}

impl SubjectProfile {
    pub fn new(name: impl Into<String>, identifier: Cpf) -> Self {
        Self {
            name: name.into(),
            identifier,
        }
    }

    /// Profile carrying [`PLACEHOLDER_NAME`].
    pub fn placeholder(identifier: Cpf) -> Self {
        Self::new(PLACEHOLDER_NAME, identifier)
    }
}
