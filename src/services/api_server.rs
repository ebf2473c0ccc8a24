// src/services/api_server.rs
//! HTTP surface of the token issuer.
//!
//! Exposes the token workflow two ways:
//! - `GET /token?cpf=...`: plain-text response with the workflow's status code
//! - `POST /invoke`: takes a trigger event (`{"queryStringParameters": {...}}`)
//!   and answers with the trigger response as JSON (`{"statusCode", "body"}`)
//!
//! plus `GET /health` for liveness checks.

use crate::models::trigger::{TriggerRequest, TriggerResponse};
use crate::services::token_service::TokenService;
use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

/// API server state containing the token workflow
#[derive(Clone)]
pub struct ApiServer {
    token_service: Arc<TokenService>,
}

impl ApiServer {
    pub fn new(token_service: TokenService) -> Self {
        ApiServer {
            token_service: Arc::new(token_service),
        }
    }

    /// Builds the router; separate from [`ApiServer::run`] so tests can drive
    /// it without a socket.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/token", get(Self::token_handler))
            .route("/invoke", post(Self::invoke_handler))
            .route("/health", get(Self::health_handler))
            .with_state(Arc::new(self.clone()))
    }

    /// Binds `addr` and serves requests until the process is stopped.
    ///
    /// # Errors
    /// Returns an error if the address cannot be bound or the server fails.
    pub async fn run(&self, addr: SocketAddr) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("API server listening on http://{}", listener.local_addr()?);
        axum::serve(listener, self.router()).await
    }

    /// Issues a token for the `cpf` query parameter
    ///
    /// # Endpoint
    /// GET /token?cpf=529.982.247-25
    ///
    /// # Responses
    /// - 200 OK: `Token JWT: <token>`
    /// - 400 Bad Request: no CPF
    /// - 401 Unauthorized: malformed CPF
    /// - 404 Not Found: CPF not confirmed
    /// - 500 / 503: internal or backend failure
    async fn token_handler(
        State(state): State<Arc<ApiServer>>,
        Query(params): Query<HashMap<String, String>>,
    ) -> impl IntoResponse {
        let request = TriggerRequest {
            query_string_parameters: Some(params),
        };
        let response = state.token_service.handle(&request).await;
        let status =
            StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, response.body)
    }

    /// Runs the workflow for a raw trigger event
    ///
    /// # Endpoint
    /// POST /invoke
    ///
    /// Always answers 200 at the HTTP level; the workflow outcome is in the
    /// JSON `statusCode` field, as a gateway integration expects.
    async fn invoke_handler(
        State(state): State<Arc<ApiServer>>,
        Json(event): Json<TriggerRequest>,
    ) -> Json<TriggerResponse> {
        Json(state.token_service.handle(&event).await)
    }

    async fn health_handler() -> &'static str {
        "ok"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{SigningSecret, VerificationConfig};
    use crate::services::directory_reconciler::DirectoryReconciler;
    use crate::services::token_issuer::TokenIssuer;
    use crate::services::verification_client::VerificationClient;
    use crate::storage::memory_directory::InMemoryDirectory;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use mockito::mock;
    use std::time::Duration;
    use tower::ServiceExt;

    fn server(path: &str) -> ApiServer {
        let verification = VerificationClient::new(&VerificationConfig {
            url: format!("{}{path}", mockito::server_url()),
            timeout: Duration::from_secs(2),
        })
        .unwrap();
        ApiServer::new(TokenService::new(
            verification,
            TokenIssuer::new(&SigningSecret::new("api-test-secret").unwrap()),
            DirectoryReconciler::new(Arc::new(InMemoryDirectory::new()), "exemplo.com"),
            false,
        ))
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_get_token_success() {
        let _m = mock("GET", "/api-verified").with_status(200).create();

        let response = server("/api-verified")
            .router()
            .oneshot(
                Request::get("/token?cpf=529.982.247-25")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.starts_with("Token JWT: "));
    }

    #[tokio::test]
    async fn test_get_token_status_codes() {
        let _m = mock("GET", "/api-not-found").with_status(404).create();
        let router = server("/api-not-found").router();

        for (uri, expected) in [
            ("/token", StatusCode::BAD_REQUEST),
            ("/token?cpf=", StatusCode::BAD_REQUEST),
            ("/token?cpf=11111111111", StatusCode::UNAUTHORIZED),
            ("/token?cpf=123", StatusCode::UNAUTHORIZED),
            ("/token?cpf=52998224725", StatusCode::NOT_FOUND),
        ] {
            let response = router
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), expected, "uri {uri}");
        }
    }

    #[tokio::test]
    async fn test_invoke_returns_trigger_response() {
        let router = server("/api-invoke-unused").router();

        let response = router
            .oneshot(
                Request::post("/invoke")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"queryStringParameters": null}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let payload: TriggerResponse = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(payload, TriggerResponse::new(400, "CPF não fornecido"));
    }

    #[tokio::test]
    async fn test_health() {
        let response = server("/api-health-unused")
            .router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "ok");
    }
}
