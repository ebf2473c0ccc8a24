// src/main.rs

//! # CPF Token Issuer - Main Entry Point
//!
//! Verifies a CPF against an external identity-verification backend and, on
//! success, issues an HS256-signed JWT and stores it on the subject's record
//! in a directory (user pool).
//!
//! ## Architecture Overview
//! 1. **Models**: `Cpf` validation, subject profile, trigger envelope
//! 2. **Services**: verification client, token issuer, directory reconciler,
//!    the request workflow, and the HTTP server
//! 3. **Storage**: directory backends (Cognito via the AWS SDK, in-memory)
//!
//! See [`settings`] for the environment variables read at startup.

use crate::settings::{AppConfig, DirectoryBackend};
use crate::services::api_server::ApiServer;
use crate::services::directory_reconciler::DirectoryReconciler;
use crate::services::token_issuer::TokenIssuer;
use crate::services::token_service::TokenService;
use crate::services::verification_client::VerificationClient;
use crate::storage::cognito_client::CognitoDirectory;
use crate::storage::directory::Directory;
use crate::storage::memory_directory::InMemoryDirectory;
use anyhow::Context;
use dotenv::dotenv;
use log::{info, warn};
use std::sync::Arc;

mod settings;      // Startup configuration
mod error;         // Request error taxonomy
mod models;        // Data structures
mod services;      // Workflow stages and API
mod storage;       // Directory backends

/// Main application entry point
///
/// # Initialization Sequence
/// 1. Load `.env` and initialize logging
/// 2. Load and validate configuration (fails fast on anything missing)
/// 3. Build the workflow components
/// 4. Start the API server
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let verification = VerificationClient::new(&config.verification)
        .context("failed to build verification client")?;
    let issuer = TokenIssuer::new(&config.signing_secret);

    let directory: Arc<dyn Directory> = match &config.directory.backend {
        DirectoryBackend::Cognito { endpoint } => {
            match endpoint {
                Some(endpoint) => info!("using Cognito directory at {endpoint}"),
                None => info!("using Cognito directory (regional endpoint)"),
            }
            Arc::new(CognitoDirectory::from_env(endpoint.as_deref(), &config.directory).await)
        }
        DirectoryBackend::Memory => {
            warn!("using in-memory directory; records are lost on restart");
            Arc::new(InMemoryDirectory::new())
        }
    };
    if config.directory.timeout.is_none() {
        warn!("DIRECTORY_TIMEOUT_SECS not set; directory calls have no deadline");
    }
    let reconciler = DirectoryReconciler::new(directory, config.directory.email_domain.clone());

    let token_service = TokenService::new(
        verification,
        issuer,
        reconciler,
        config.unreachable_is_error,
    );

    ApiServer::new(token_service)
        .run(config.bind_addr)
        .await
        .context("API server failed")
}
