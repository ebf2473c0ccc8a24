// src/services/token_issuer.rs
//! Credential (JWT) issuance.
//!
//! Tokens are compact HS256 JWS strings whose payload is exactly the verified
//! profile: `{"name": ..., "identifier": ...}`. No `iat`/`exp` claims are
//! added, so the same profile and secret always yield the same token.

use crate::settings::SigningSecret;
use crate::models::profile::SubjectProfile;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Signed payload of an issued token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub name: String,
    /// Normalized 11-digit CPF
    pub identifier: String,
}

impl From<&SubjectProfile> for TokenClaims {
    fn from(profile: &SubjectProfile) -> Self {
        Self {
            name: profile.name.clone(),
            identifier: profile.identifier.as_str().to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("token rejected: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Signs and checks tokens with one shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenIssuer {
    pub fn new(secret: &SigningSecret) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issues a token for a verified profile.
    ///
    /// # Errors
    /// Returns [`TokenError::Signing`] if the claims cannot be serialized or
    /// signed.
    pub fn issue(&self, profile: &SubjectProfile) -> Result<String, TokenError> {
        encode(
            &Header::new(Algorithm::HS256),
            &TokenClaims::from(profile),
            &self.encoding_key,
        )
        .map_err(TokenError::Signing)
    }

    /// Checks a token's signature and returns its claims.
    ///
    /// Only HS256 is accepted. Issued tokens carry no expiry, so none is
    /// required here.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cpf::Cpf;

    fn issuer(secret: &str) -> TokenIssuer {
        TokenIssuer::new(&SigningSecret::new(secret).unwrap())
    }

    fn profile() -> SubjectProfile {
        SubjectProfile::placeholder(Cpf::parse("529.982.247-25").unwrap())
    }

    #[test]
    fn test_round_trip_with_same_secret() {
        let issuer = issuer("correct horse battery staple");
        let token = issuer.issue(&profile()).unwrap();

        let claims = issuer.decode(&token).unwrap();
        assert_eq!(claims.identifier, "52998224725");
        assert_eq!(claims.name, "Teste Usuario");
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let token = issuer("secret-one").issue(&profile()).unwrap();
        for other in ["secret-two", "secret-on", "Secret-one"] {
            assert!(
                issuer(other).decode(&token).is_err(),
                "token must not verify with {other:?}"
            );
        }
    }

    #[test]
    fn test_issuance_is_deterministic() {
        let issuer = issuer("deterministic");
        assert_eq!(
            issuer.issue(&profile()).unwrap(),
            issuer.issue(&profile()).unwrap()
        );
    }

    #[test]
    fn test_header_is_hs256() {
        let token = issuer("header-check").issue(&profile()).unwrap();
        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS256);
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let issuer = issuer("tamper");
        let token = issuer.issue(&profile()).unwrap();
        let forged = issuer
            .issue(&SubjectProfile::placeholder(Cpf::parse("12345678900").unwrap()))
            .unwrap();

        // Original header and signature around someone else's payload
        let original: Vec<&str> = token.split('.').collect();
        let forged_payload = forged.split('.').nth(1).unwrap();
        let spliced = format!("{}.{}.{}", original[0], forged_payload, original[2]);
        assert!(issuer.decode(&spliced).is_err());
    }
}
