// src/models/trigger.rs
//! Trigger envelope for a single token request.
//!
//! Mirrors the API-gateway proxy event shape the handler was first deployed
//! behind: the request carries `queryStringParameters`, the response is a
//! `{statusCode, body}` pair with a plain-text body.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Query parameter holding the raw CPF.
pub const CPF_PARAM: &str = "cpf";

/// Incoming trigger event.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest {
    /// Query string parameters; gateways send `null` when there are none
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
}

impl TriggerRequest {
    /// Builds a request carrying a single `cpf` parameter.
    pub fn with_cpf(cpf: impl Into<String>) -> Self {
        let mut params = HashMap::new();
        params.insert(CPF_PARAM.to_string(), cpf.into());
        Self {
            query_string_parameters: Some(params),
        }
    }

    /// The raw `cpf` parameter, or `None` when absent or empty.
    pub fn cpf(&self) -> Option<&str> {
        self.query_string_parameters
            .as_ref()
            .and_then(|params| params.get(CPF_PARAM))
            .map(String::as_str)
            .filter(|cpf| !cpf.is_empty())
    }
}

/// Outgoing trigger response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    pub status_code: u16,
    pub body: String,
}

impl TriggerResponse {
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
        }
    }
}
