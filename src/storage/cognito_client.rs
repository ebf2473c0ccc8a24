// src/storage/cognito_client.rs
//! Cognito Identity Provider backend for the [`Directory`] trait.
//!
//! Uses the AWS SDK, so every request is SigV4-signed with the credentials
//! found by the default provider chain:
//! - `AdminUpdateUserAttributes` to store the token attribute
//! - `AdminCreateUser` to create a missing record
//!
//! The region comes from the usual AWS sources and falls back to the prefix
//! of the user pool id (`sa-east-1_abc123` → `sa-east-1`).
//!
//! # Timeouts
//! Without `DIRECTORY_TIMEOUT_SECS` the SDK applies no operation deadline, so a
//! stalled directory stalls the request that called it.

use crate::settings::DirectoryConfig;
use crate::storage::directory::{Directory, DirectoryError, NewUser, UpdateOutcome};
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::timeout::TimeoutConfig;
use aws_config::Region;
use aws_sdk_cognitoidentityprovider::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_cognitoidentityprovider::types::AttributeType;
use aws_sdk_cognitoidentityprovider::Client;
use log::warn;

/// Directory backed by a Cognito user pool.
#[derive(Clone)]
pub struct CognitoDirectory {
    client: Client,
    user_pool_id: String,
}

impl CognitoDirectory {
    /// Builds a client from the ambient AWS configuration.
    ///
    /// # Arguments
    /// * `endpoint` - Overrides the regional service URL (local emulators)
    /// * `config` - User pool id and optional operation timeout
    pub async fn from_env(endpoint: Option<&str>, config: &DirectoryConfig) -> Self {
        let mut region = RegionProviderChain::default_provider();
        if let Some(pool_region) = pool_region(&config.user_pool_id) {
            region = region.or_else(Region::new(pool_region.to_string()));
        }

        let mut loader = aws_config::from_env().region(region);
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        if let Some(timeout) = config.timeout {
            loader = loader.timeout_config(
                TimeoutConfig::builder().operation_timeout(timeout).build(),
            );
        }
        let sdk_config = loader.load().await;
        if sdk_config.region().is_none() {
            warn!("no AWS region configured; directory calls will fail");
        }

        Self::with_client(Client::new(&sdk_config), &config.user_pool_id)
    }

    pub fn with_client(client: Client, user_pool_id: impl Into<String>) -> Self {
        Self {
            client,
            user_pool_id: user_pool_id.into(),
        }
    }
}

/// Region encoded in a user pool id, if any.
fn pool_region(user_pool_id: &str) -> Option<&str> {
    user_pool_id
        .split_once('_')
        .map(|(region, _)| region)
        .filter(|region| !region.is_empty())
}

fn attribute(
    operation: &'static str,
    name: &str,
    value: &str,
) -> Result<AttributeType, DirectoryError> {
    AttributeType::builder()
        .name(name)
        .value(value)
        .build()
        .map_err(|e| DirectoryError::InvalidRequest {
            operation,
            message: e.to_string(),
        })
}

fn rejected(operation: &'static str, error: &impl ProvideErrorMetadata) -> DirectoryError {
    DirectoryError::Rejected {
        operation,
        kind: error.code().unwrap_or("Unknown").to_string(),
        message: error.message().unwrap_or_default().to_string(),
    }
}

fn transport(operation: &'static str, error: impl std::error::Error) -> DirectoryError {
    DirectoryError::Transport {
        operation,
        message: DisplayErrorContext(error).to_string(),
    }
}

#[async_trait]
impl Directory for CognitoDirectory {
    async fn update_attribute(
        &self,
        username: &str,
        attribute_name: &str,
        value: &str,
    ) -> Result<UpdateOutcome, DirectoryError> {
        let result = self
            .client
            .admin_update_user_attributes()
            .user_pool_id(&self.user_pool_id)
            .username(username)
            .user_attributes(attribute("update", attribute_name, value)?)
            .send()
            .await;

        match result {
            Ok(_) => Ok(UpdateOutcome::Updated),
            Err(error) => match error.as_service_error() {
                Some(e) if e.is_user_not_found_exception() => Ok(UpdateOutcome::UserNotFound),
                Some(e) => Err(rejected("update", e)),
                None => Err(transport("update", &error)),
            },
        }
    }

    async fn create_user(&self, user: &NewUser) -> Result<(), DirectoryError> {
        let mut request = self
            .client
            .admin_create_user()
            .user_pool_id(&self.user_pool_id)
            .username(&user.username);
        for (name, value) in user.attributes() {
            request = request.user_attributes(attribute("create", name, &value)?);
        }

        match request.send().await {
            Ok(_) => Ok(()),
            Err(error) => match error.as_service_error() {
                Some(e) if e.is_username_exists_exception() => {
                    Err(DirectoryError::UserExists(user.username.clone()))
                }
                Some(e) => Err(rejected("create", e)),
                None => Err(transport("create", &error)),
            },
        }
    }
}

/// Client pointed at `endpoint` with fixed credentials and no retries, for
/// tests against a mock server.
#[cfg(test)]
pub(crate) fn test_directory(endpoint: &str) -> CognitoDirectory {
    use aws_sdk_cognitoidentityprovider::config::retry::RetryConfig;
    use aws_sdk_cognitoidentityprovider::config::{BehaviorVersion, Credentials};

    let config = aws_sdk_cognitoidentityprovider::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("sa-east-1"))
        .credentials_provider(Credentials::new("AKIDTEST", "test-secret", None, None, "tests"))
        .endpoint_url(endpoint)
        .retry_config(RetryConfig::disabled())
        .build();
    CognitoDirectory::with_client(Client::from_conf(config), "sa-east-1_test")
}
