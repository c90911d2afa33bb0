//! Authentication Gate - bearer token verification
//!
//! Tokens are issued by an external identity provider. Its signing keys are
//! fetched once at startup into a [`KeySet`]; a token whose `kid` is not in the
//! set is rejected rather than triggering a refetch. A token is accepted when
//! its signature verifies and its `token_use` claim is `access`.

use std::collections::HashMap;

use axum::http::{header, HeaderMap};
use jsonwebtoken::jwk::{JwkSet, KeyAlgorithm};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

/// Required value of the usage claim.
pub const ACCESS_USAGE: &str = "access";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("token has no key id or an unknown one")]
    UnknownKey,
    #[error("token rejected: {0}")]
    Rejected(String),
    #[error("token usage `{0}` is not `access`")]
    WrongUsage(String),
    #[error("failed to fetch signing keys: {0}")]
    Fetch(String),
}

/// Identity of the authenticated operator, attached to request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal(pub String);

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    token_use: String,
    #[serde(default)]
    username: Option<String>,
}

/// Process-wide signing key set, immutable after startup.
#[derive(Clone, Default)]
pub struct KeySet {
    keys: HashMap<String, (DecodingKey, Algorithm)>,
}

impl KeySet {
    /// Download the provider's JWKS document.
    pub async fn fetch(url: &str) -> Result<Self, AuthError> {
        let set: JwkSet = reqwest::get(url)
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| AuthError::Fetch(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::Fetch(e.to_string()))?;

        let keys = Self::from_jwks(&set);
        info!("Loaded {} signing keys from {}", keys.len(), url);
        Ok(keys)
    }

    pub fn from_jwks(set: &JwkSet) -> Self {
        let mut keys = Self::default();
        for jwk in &set.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                warn!("Skipping signing key without kid");
                continue;
            };
            let algorithm = match jwk.common.key_algorithm.as_ref() {
                Some(alg) => match algorithm_for(alg) {
                    Some(alg) => alg,
                    None => {
                        warn!("Skipping signing key {} with unsupported algorithm {:?}", kid, alg);
                        continue;
                    }
                },
                None => Algorithm::RS256,
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => keys.insert(kid, key, algorithm),
                Err(e) => warn!("Skipping unusable signing key {}: {}", kid, e),
            }
        }
        keys
    }

    pub fn insert(&mut self, kid: impl Into<String>, key: DecodingKey, algorithm: Algorithm) {
        self.keys.insert(kid.into(), (key, algorithm));
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Verify a raw bearer token and return the principal it names.
    pub fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::Malformed(e.to_string()))?;
        let kid = header.kid.ok_or(AuthError::UnknownKey)?;
        let (key, algorithm) = self.keys.get(&kid).ok_or(AuthError::UnknownKey)?;
        if header.alg != *algorithm {
            return Err(AuthError::Rejected(format!(
                "algorithm {:?} does not match key {}",
                header.alg, kid
            )));
        }

        let mut validation = Validation::new(*algorithm);
        // Access tokens from the provider carry no audience.
        validation.validate_aud = false;

        let claims = decode::<Claims>(token, key, &validation)
            .map_err(|e| AuthError::Rejected(e.to_string()))?
            .claims;

        if claims.token_use != ACCESS_USAGE {
            return Err(AuthError::WrongUsage(claims.token_use));
        }

        Ok(Principal(claims.username.unwrap_or(claims.sub)))
    }
}

fn algorithm_for(alg: &KeyAlgorithm) -> Option<Algorithm> {
    let algorithm = match alg {
        KeyAlgorithm::RS256 => Algorithm::RS256,
        KeyAlgorithm::RS384 => Algorithm::RS384,
        KeyAlgorithm::RS512 => Algorithm::RS512,
        KeyAlgorithm::PS256 => Algorithm::PS256,
        KeyAlgorithm::PS384 => Algorithm::PS384,
        KeyAlgorithm::PS512 => Algorithm::PS512,
        KeyAlgorithm::ES256 => Algorithm::ES256,
        KeyAlgorithm::ES384 => Algorithm::ES384,
        KeyAlgorithm::EdDSA => Algorithm::EdDSA,
        KeyAlgorithm::HS256 => Algorithm::HS256,
        KeyAlgorithm::HS384 => Algorithm::HS384,
        KeyAlgorithm::HS512 => Algorithm::HS512,
        _ => return None,
    };
    Some(algorithm)
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
