//! Bearer token signing and verification.
//!
//! Tokens are issued by the shop's identity provider with a shared HS256
//! secret. The service only needs to verify them; [`JwtService::issue`]
//! exists for tooling and tests that hold the same secret.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::{Claims, Role};
use crate::config::JwtSettings;

/// Signing secret and token lifetime.
#[derive(Clone)]
pub struct JwtConfig {
    /// HS256 secret.
    pub secret: String,
    /// Lifetime of issued tokens.
    pub ttl: Duration,
}

impl JwtConfig {
    /// Longest lifetime an issued token may have.
    pub const MAX_TTL_SECS: i64 = 366 * 24 * 60 * 60;

    /// Builds the config from the `jwt` settings section.
    ///
    /// Lifetimes are clamped to [`Self::MAX_TTL_SECS`].
    #[must_use]
    pub fn from_settings(settings: &JwtSettings) -> Self {
        let secs = i64::try_from(settings.access_token_expiry_secs)
            .unwrap_or(i64::MAX)
            .min(Self::MAX_TTL_SECS);
        Self {
            secret: settings.secret.clone(),
            ttl: Duration::seconds(secs),
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[hidden]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Why a token was refused.
#[derive(Debug, Error)]
pub enum JwtError {
    /// `exp` is in the past.
    #[error("token has expired")]
    Expired,

    /// Bad signature, bad encoding or missing claims.
    #[error("invalid token: {0}")]
    Invalid(String),

    /// Claims could not be signed.
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Verifies (and for tooling, issues) access tokens.
#[derive(Clone)]
pub struct JwtService {
    ttl: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl JwtService {
    /// Creates a service for the given secret.
    #[must_use]
    pub fn new(config: JwtConfig) -> Self {
        let secret = config.secret.as_bytes();
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            ttl: config.ttl,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Signs a token for `user_id` acting as `role`.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::Signing`] if encoding fails.
    pub fn issue(&self, user_id: Uuid, name: &str, role: Role) -> Result<String, JwtError> {
        let claims = Claims::new(user_id, name, role, Utc::now() + self.ttl);
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Signing(e.to_string()))
    }

    /// Checks signature and expiry and returns the claims.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::Expired`] for stale tokens and
    /// [`JwtError::Invalid`] for anything else that fails verification.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => Err(JwtError::Expired),
            Err(e) => Err(JwtError::Invalid(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str, ttl: Duration) -> JwtService {
        JwtService::new(JwtConfig {
            secret: secret.to_string(),
            ttl,
        })
    }

    #[test]
    fn test_issued_token_verifies_with_role() {
        let jwt = service("shop-secret", Duration::minutes(15));
        let user_id = Uuid::new_v4();

        let claims = jwt
            .verify(&jwt.issue(user_id, "Rahim", Role::Accountant).unwrap())
            .unwrap();

        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.name, "Rahim");
        assert_eq!(claims.role, Role::Accountant);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_foreign_secret_is_invalid() {
        let ours = service("shop-secret", Duration::minutes(15));
        let theirs = service("someone-else", Duration::minutes(15));
        let token = theirs.issue(Uuid::new_v4(), "x", Role::Owner).unwrap();
        assert!(matches!(ours.verify(&token), Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_stale_token_is_expired() {
        let jwt = service("shop-secret", Duration::hours(-1));
        let token = jwt.issue(Uuid::new_v4(), "x", Role::Staff).unwrap();
        assert!(matches!(jwt.verify(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let jwt = service("shop-secret", Duration::minutes(15));
        assert!(matches!(jwt.verify("not.a.jwt"), Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_config_from_settings() {
        let config = JwtConfig::from_settings(&JwtSettings {
            secret: "do-not-log-me".into(),
            access_token_expiry_secs: 600,
        });
        assert_eq!(config.ttl, Duration::minutes(10));
        assert!(!format!("{config:?}").contains("do-not-log-me"));
    }
}
