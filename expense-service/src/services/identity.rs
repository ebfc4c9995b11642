//! Identity-token verification.
//!
//! The identity provider issues signed ID tokens to the browser; the login
//! endpoint exchanges one for a server-side session via [`IdentityVerifier`].

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

use crate::config::IdentityConfig;

/// The caller identity established by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub user_id: String,
    pub email: Option<String>,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, AppError>;
}

/// Claims read from an ID token. `sub` is the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
}

/// HS256 ID-token verifier with optional issuer and audience pinning.
#[derive(Clone)]
pub struct JwtIdentityVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityVerifier {
    pub fn new(config: &IdentityConfig) -> Self {
        Self::from_secret(
            &config.jwt_secret,
            config.issuer.as_deref(),
            config.audience.as_deref(),
        )
    }

    pub fn from_secret(
        secret: &Secret<String>,
        issuer: Option<&str>,
        audience: Option<&str>,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        match issuer {
            Some(issuer) => validation.set_issuer(&[issuer]),
            None => validation.iss = None,
        }
        match audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            decoding_key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, AppError> {
        let token_data = decode::<IdTokenClaims>(id_token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "ID token rejected");
                AppError::InvalidToken(e)
            })?;

        let claims = token_data.claims;
        if claims.sub.trim().is_empty() {
            return Err(AppError::Unauthorized(anyhow::anyhow!(
                "Token has no subject"
            )));
        }

        Ok(VerifiedIdentity {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}
