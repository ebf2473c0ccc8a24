// src/error.rs
//! Request-level error taxonomy and its mapping onto trigger responses.

use crate::models::cpf::CpfError;
use crate::models::trigger::TriggerResponse;
use crate::services::token_issuer::TokenError;
use crate::storage::directory::DirectoryError;
use thiserror::Error;

/// Why a token request did not end with an issued token.
///
/// Every variant maps to a fixed status and a fixed plain-text body; error
/// details go to the log only.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// No `cpf` parameter, or an empty one
    #[error("CPF not provided")]
    InputMissing,

    #[error("malformed CPF: {0}")]
    InputMalformed(#[from] CpfError),

    /// The backend did not confirm the subject. Also covers an unreachable
    /// backend unless the 503 policy is enabled.
    #[error("subject not verified")]
    SubjectNotVerified,

    #[error("verification backend unavailable")]
    VerificationUnavailable,

    #[error("token issuance failed: {0}")]
    TokenIssuance(#[from] TokenError),

    #[error("directory reconciliation failed: {0}")]
    DirectoryReconciliationFailed(#[from] DirectoryError),
}

impl HandlerError {
    pub fn status_code(&self) -> u16 {
        match self {
            HandlerError::InputMissing => 400,
            HandlerError::InputMalformed(_) => 401,
            HandlerError::SubjectNotVerified => 404,
            HandlerError::VerificationUnavailable => 503,
            HandlerError::TokenIssuance(_) | HandlerError::DirectoryReconciliationFailed(_) => 500,
        }
    }

    /// Client-facing body.
    pub fn public_message(&self) -> &'static str {
        match self {
            HandlerError::InputMissing => "CPF não fornecido",
            HandlerError::InputMalformed(_) => "CPF inválido",
            HandlerError::SubjectNotVerified => "CPF não encontrado",
            HandlerError::VerificationUnavailable => "Serviço de verificação indisponível",
            HandlerError::TokenIssuance(_) | HandlerError::DirectoryReconciliationFailed(_) => {
                "Erro interno ao emitir o token"
            }
        }
    }

    /// `true` for failures caused by this service or its dependencies rather
    /// than by the caller's input.
    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }
}

impl From<HandlerError> for TriggerResponse {
    fn from(err: HandlerError) -> Self {
        TriggerResponse::new(err.status_code(), err.public_message())
    }
}
