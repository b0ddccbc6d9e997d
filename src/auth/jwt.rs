//! JWT token management
//!
//! Issues and verifies HMAC-signed access and refresh tokens. The issuer is
//! stateless; refresh token revocation lives in the session cache.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{AppError, Result};

/// Value of the `iss` claim on every token.
pub const ISSUER: &str = "multiplayer-game-server";

/// Token verification failures.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Bad signature, disallowed algorithm, wrong issuer or unparsable token
    #[error("token rejected: {0}")]
    Rejected(#[from] jsonwebtoken::errors::Error),
    /// Current time is at or past `exp`
    #[error("token expired")]
    Expired,
    /// `sub` is not a numeric account id
    #[error("token subject is not an account id")]
    InvalidSubject,
}

impl From<TokenError> for AppError {
    fn from(_: TokenError) -> Self {
        Self::unauthorized(crate::auth::TOKEN_INVALID)
    }
}

/// Registered claims carried by both token kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// A freshly signed access token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// A freshly signed refresh token together with its identifier.
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    pub token: String,
    pub token_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub account_id: i32,
    pub token_id: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies tokens
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: TimeDelta,
    refresh_ttl: TimeDelta,
}

impl TokenIssuer {
    /// Create an issuer from a shared secret and token lifetimes
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Result<Self> {
        let to_delta = |ttl: Duration, name: &str| {
            TimeDelta::from_std(ttl)
                .map_err(|e| AppError::config_with_source(format!("{name} out of range"), e))
        };

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_aud = false;
        validation.validate_nbf = false;
        // Expiry is checked against an explicit clock in `verify_at`
        validation.validate_exp = false;
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl: to_delta(access_ttl, "access_token_ttl")?,
            refresh_ttl: to_delta(refresh_ttl, "refresh_token_ttl")?,
        })
    }

    /// Create an issuer from the auth section of the application config
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        Self::new(
            &config.jwt_secret,
            Duration::from_secs(config.access_token_ttl),
            Duration::from_secs(config.refresh_token_ttl),
        )
    }

    #[must_use]
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl.to_std().unwrap_or_default()
    }

    #[must_use]
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl.to_std().unwrap_or_default()
    }

    /// Issue an access token valid from now
    pub fn issue_access(&self, account_id: i32) -> Result<IssuedToken> {
        self.issue_access_at(account_id, Utc::now())
    }

    pub fn issue_access_at(&self, account_id: i32, now: DateTime<Utc>) -> Result<IssuedToken> {
        let (claims, expires_at) = self.claims(account_id, now, self.access_ttl, None)?;
        Ok(IssuedToken {
            token: self.sign(&claims)?,
            expires_at,
        })
    }

    /// Issue a refresh token with a fresh `jti`
    pub fn issue_refresh(&self, account_id: i32) -> Result<IssuedRefreshToken> {
        self.issue_refresh_at(account_id, Utc::now())
    }

    pub fn issue_refresh_at(
        &self,
        account_id: i32,
        now: DateTime<Utc>,
    ) -> Result<IssuedRefreshToken> {
        let token_id = Uuid::new_v4().to_string();
        let (claims, expires_at) =
            self.claims(account_id, now, self.refresh_ttl, Some(token_id.clone()))?;
        Ok(IssuedRefreshToken {
            token: self.sign(&claims)?,
            token_id,
            expires_at,
        })
    }

    /// Verify signature, algorithm, issuer and expiry against the current time
    pub fn verify(&self, token: &str) -> std::result::Result<VerifiedToken, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify against an explicit clock. Valid strictly before `exp`.
    pub fn verify_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<VerifiedToken, TokenError> {
        let verified = self.verify_ignoring_expiry(token)?;
        if now >= verified.expires_at {
            return Err(TokenError::Expired);
        }
        Ok(verified)
    }

    /// Verify everything except expiry. Used where a stale token is still
    /// meaningful, such as naming the session to revoke on logout.
    pub fn verify_ignoring_expiry(
        &self,
        token: &str,
    ) -> std::result::Result<VerifiedToken, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        let account_id = claims
            .sub
            .parse::<i32>()
            .map_err(|_| TokenError::InvalidSubject)?;
        let expires_at =
            DateTime::<Utc>::from_timestamp(claims.exp, 0).ok_or(TokenError::Expired)?;

        Ok(VerifiedToken {
            account_id,
            token_id: claims.jti,
            expires_at,
        })
    }

    fn claims(
        &self,
        account_id: i32,
        now: DateTime<Utc>,
        ttl: TimeDelta,
        jti: Option<String>,
    ) -> Result<(Claims, DateTime<Utc>)> {
        let iat = now.timestamp();
        let exp = iat
            .checked_add(ttl.num_seconds())
            .ok_or_else(|| crate::internal_error!("token expiry overflow"))?;
        let expires_at = DateTime::<Utc>::from_timestamp(exp, 0)
            .ok_or_else(|| crate::internal_error!("token expiry out of range"))?;

        Ok((
            Claims {
                sub: account_id.to_string(),
                iss: ISSUER.to_string(),
                iat,
                exp,
                jti,
            },
            expires_at,
        ))
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::internal_with_source("Token generation failed", e))
    }
}
