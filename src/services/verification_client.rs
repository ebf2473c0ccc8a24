// src/services/verification_client.rs
//! Client for the external identity-verification backend.
//!
//! The backend is treated as an oracle: one GET, and an HTTP 200 means the CPF
//! belongs to a real subject. Every request outcome is folded into a
//! [`VerificationOutcome`]; this client never returns an error.

use crate::settings::{VerificationConfig, CPF_PLACEHOLDER};
use crate::models::cpf::Cpf;
use crate::models::profile::SubjectProfile;
use log::{debug, warn};
use reqwest::StatusCode;
use serde::Deserialize;

/// What the verification backend said about a CPF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The backend confirmed the subject
    Verified(SubjectProfile),
    /// The backend answered with anything but 200
    NotFound,
    /// The backend could not be reached (timeout, connection or DNS failure)
    Unreachable,
}

/// Optional profile fields in a 200 response body.
#[derive(Deserialize)]
struct ProfileBody {
    name: Option<String>,
}

/// HTTP client for the verification backend.
#[derive(Clone)]
pub struct VerificationClient {
    client: reqwest::Client,
    url_template: String,
}

impl VerificationClient {
    /// Creates a client with the configured endpoint and timeout.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (e.g. TLS backend
    /// initialization failure).
    pub fn new(config: &VerificationConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            url_template: config.url.clone(),
        })
    }

    /// Endpoint for `cpf`, with any `{cpf}` placeholder filled in.
    fn url_for(&self, cpf: &Cpf) -> String {
        self.url_template.replace(CPF_PLACEHOLDER, cpf.as_str())
    }

    /// Asks the backend whether `cpf` belongs to a known subject.
    ///
    /// # Process Flow
    /// 1. GET the endpoint, bounded by the configured timeout
    /// 2. Any status other than 200 is `NotFound`
    /// 3. On 200, take `name` from a JSON body when present, falling back
    ///    to the placeholder profile
    ///
    /// Transport failures are logged and reported as `Unreachable`.
    pub async fn verify(&self, cpf: &Cpf) -> VerificationOutcome {
        let response = match self.client.get(self.url_for(cpf)).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    "verification backend unreachable for {}: {}",
                    cpf.masked(),
                    e.without_url()
                );
                return VerificationOutcome::Unreachable;
            }
        };

        if response.status() != StatusCode::OK {
            debug!(
                "verification backend answered {} for {}",
                response.status(),
                cpf.masked()
            );
            return VerificationOutcome::NotFound;
        }

        // The body is optional; fixture backends answer 200 with arbitrary content.
        let name = match response.json::<ProfileBody>().await {
            Ok(ProfileBody { name: Some(name) }) if !name.trim().is_empty() => Some(name),
            _ => None,
        };

        let profile = match name {
            Some(name) => SubjectProfile::new(name, cpf.clone()),
            None => SubjectProfile::placeholder(cpf.clone()),
        };
        VerificationOutcome::Verified(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::PLACEHOLDER_NAME;
    use mockito::mock;
    use std::time::Duration;

    fn client(url: String) -> VerificationClient {
        VerificationClient::new(&VerificationConfig {
            url,
            timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    fn cpf() -> Cpf {
        Cpf::parse("529.982.247-25").unwrap()
    }

    #[tokio::test]
    async fn test_200_without_profile_uses_placeholder() {
        let _m = mock("GET", "/verify-fixture")
            .with_status(200)
            .with_body("<html>ok</html>")
            .create();

        let outcome = client(format!("{}/verify-fixture", mockito::server_url()))
            .verify(&cpf())
            .await;
        assert_eq!(
            outcome,
            VerificationOutcome::Verified(SubjectProfile::new(PLACEHOLDER_NAME, cpf()))
        );
    }

    #[tokio::test]
    async fn test_200_with_name_is_authoritative() {
        let _m = mock("GET", "/verify-named/52998224725")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name": "Maria da Silva"}"#)
            .create();

        let outcome = client(format!("{}/verify-named/{{cpf}}", mockito::server_url()))
            .verify(&cpf())
            .await;
        match outcome {
            VerificationOutcome::Verified(profile) => {
                assert_eq!(profile.name, "Maria da Silva");
                assert_eq!(profile.identifier.as_str(), "52998224725");
            }
            other => panic!("expected Verified, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_200_is_not_found() {
        let _m404 = mock("GET", "/verify-missing").with_status(404).create();
        let _m500 = mock("GET", "/verify-broken").with_status(500).create();
        let _m204 = mock("GET", "/verify-empty").with_status(204).create();

        for path in ["/verify-missing", "/verify-broken", "/verify-empty"] {
            let outcome = client(format!("{}{path}", mockito::server_url()))
                .verify(&cpf())
                .await;
            assert_eq!(outcome, VerificationOutcome::NotFound, "path {path}");
        }
    }

    #[tokio::test]
    async fn test_connection_failure_is_unreachable() {
        let outcome = client("http://127.0.0.1:1/verify".into()).verify(&cpf()).await;
        assert_eq!(outcome, VerificationOutcome::Unreachable);
    }
}
