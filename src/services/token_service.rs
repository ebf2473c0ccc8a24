// src/services/token_service.rs
//! End-to-end token request workflow.
//!
//! ## Decision flow
//! 1. No `cpf` parameter → 400
//! 2. CPF fails the shape check → 401
//! 3. Backend does not confirm the CPF → 404 (503 for an unreachable backend
//!    when that policy is enabled)
//! 4. Token issued and stored on the directory record → 200
//! 5. Signing or directory failure → 500
//!
//! Each stage short-circuits; nothing is kept between requests.

use crate::error::HandlerError;
use crate::models::cpf::Cpf;
use crate::models::trigger::{TriggerRequest, TriggerResponse};
use crate::services::directory_reconciler::DirectoryReconciler;
use crate::services::token_issuer::TokenIssuer;
use crate::services::verification_client::{VerificationClient, VerificationOutcome};
use log::{error, info, warn};

/// Result of a successful request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub cpf: Cpf,
    pub token: String,
}

/// Composes verification, issuance and directory storage.
#[derive(Clone)]
pub struct TokenService {
    verification: VerificationClient,
    issuer: TokenIssuer,
    reconciler: DirectoryReconciler,
    /// Answer 503 instead of 404 when the backend is unreachable
    unreachable_is_error: bool,
}

impl TokenService {
    pub fn new(
        verification: VerificationClient,
        issuer: TokenIssuer,
        reconciler: DirectoryReconciler,
        unreachable_is_error: bool,
    ) -> Self {
        Self {
            verification,
            issuer,
            reconciler,
            unreachable_is_error,
        }
    }

    /// Handles one trigger event. Never fails: every outcome is a response.
    pub async fn handle(&self, request: &TriggerRequest) -> TriggerResponse {
        match self.issue_for(request.cpf()).await {
            Ok(issued) => TriggerResponse::new(200, format!("Token JWT: {}", issued.token)),
            Err(err) => {
                if err.is_internal() {
                    error!("token request failed: {err}");
                }
                err.into()
            }
        }
    }

    /// Runs the workflow for a raw `cpf` parameter.
    ///
    /// # Errors
    /// One [`HandlerError`] per terminal failure state.
    pub async fn issue_for(&self, raw_cpf: Option<&str>) -> Result<IssuedToken, HandlerError> {
        let raw_cpf = raw_cpf
            .filter(|raw| !raw.is_empty())
            .ok_or(HandlerError::InputMissing)?;
        let cpf = Cpf::parse(raw_cpf)?;

        let profile = match self.verification.verify(&cpf).await {
            VerificationOutcome::Verified(profile) => profile,
            VerificationOutcome::NotFound => {
                info!("CPF {} not confirmed by verification backend", cpf.masked());
                return Err(HandlerError::SubjectNotVerified);
            }
            VerificationOutcome::Unreachable if self.unreachable_is_error => {
                return Err(HandlerError::VerificationUnavailable);
            }
            VerificationOutcome::Unreachable => {
                warn!(
                    "treating unreachable verification backend as not found for {}",
                    cpf.masked()
                );
                return Err(HandlerError::SubjectNotVerified);
            }
        };

        let token = self.issuer.issue(&profile)?;
        self.reconciler.store_token(cpf.as_str(), &token).await?;

        info!("token issued for {}", cpf.masked());
        Ok(IssuedToken { cpf, token })
    }
}
