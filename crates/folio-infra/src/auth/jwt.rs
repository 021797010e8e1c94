//! JWT token service implementation.
//!
//! Access and refresh tokens are signed with separate secrets, so a leaked
//! refresh token can never pass access validation and vice versa. Tokens are
//! stateless: validity is a function of signature and expiry alone.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use folio_core::ports::{AuthError, TokenClaims, TokenPurpose, TokenService};

/// JWT token service configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_expire_minutes: i64,
    pub refresh_expire_minutes: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            access_secret: "change-me-in-production".to_string(),
            refresh_secret: "change-me-too-in-production".to_string(),
            access_expire_minutes: 30,
            refresh_expire_minutes: 60 * 24 * 7,
        }
    }
}

impl JwtConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let access_secret =
            std::env::var("JWT_SECRET").unwrap_or_else(|_| defaults.access_secret.clone());
        if access_secret == defaults.access_secret {
            tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
        }

        Self {
            access_secret,
            refresh_secret: std::env::var("JWT_REFRESH_SECRET")
                .unwrap_or_else(|_| defaults.refresh_secret.clone()),
            access_expire_minutes: std::env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.access_expire_minutes),
            refresh_expire_minutes: std::env::var("REFRESH_TOKEN_EXPIRE_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.refresh_expire_minutes),
        }
    }
}

/// Wire format of the claims.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    groups: Vec<String>,
    exp: i64,
    iat: i64,
}

/// JWT-based token service (HS256).
pub struct JwtTokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(JwtConfig::from_env())
    }
}

impl TokenService for JwtTokenService {
    fn issue(
        &self,
        subject: &str,
        groups: Vec<String>,
        purpose: TokenPurpose,
    ) -> Result<String, AuthError> {
        let (key, ttl_minutes) = match purpose {
            TokenPurpose::Access => (&self.access_encoding, self.config.access_expire_minutes),
            TokenPurpose::Refresh => (&self.refresh_encoding, self.config.refresh_expire_minutes),
        };

        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            groups,
            exp: (now + TimeDelta::minutes(ttl_minutes)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    fn validate(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        // Bad signature, expiry, and malformed claims all collapse into one
        // opaque error; the caller must not learn which check failed.
        let token_data = decode::<Claims>(token, &self.access_decoding, &validation)
            .map_err(|_| AuthError::InvalidToken)?;

        if token_data.claims.sub.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        Ok(TokenClaims {
            sub: token_data.claims.sub,
            groups: token_data.claims.groups,
            exp: token_data.claims.exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            access_secret: "access-test-secret".to_string(),
            refresh_secret: "refresh-test-secret".to_string(),
            access_expire_minutes: 30,
            refresh_expire_minutes: 60 * 24 * 7,
        }
    }

    fn user_groups() -> Vec<String> {
        vec!["user".to_string()]
    }

    #[test]
    fn issue_then_validate_round_trips_subject_and_groups() {
        let service = JwtTokenService::new(test_config());

        let token = service
            .issue("ann", vec!["user".into(), "admin".into()], TokenPurpose::Access)
            .unwrap();
        let claims = service.validate(&token).unwrap();

        assert_eq!(claims.sub, "ann");
        assert_eq!(claims.groups, vec!["user".to_string(), "admin".to_string()]);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn refresh_token_is_rejected_by_access_validation() {
        let service = JwtTokenService::new(test_config());

        let refresh = service
            .issue("ann", user_groups(), TokenPurpose::Refresh)
            .unwrap();

        assert!(matches!(
            service.validate(&refresh).unwrap_err(),
            AuthError::InvalidToken
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut config = test_config();
        config.access_expire_minutes = -1;
        let service = JwtTokenService::new(config);

        let token = service
            .issue("ann", user_groups(), TokenPurpose::Access)
            .unwrap();

        assert!(matches!(
            service.validate(&token).unwrap_err(),
            AuthError::InvalidToken
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let service = JwtTokenService::new(test_config());

        assert!(matches!(
            service.validate("not-a-token").unwrap_err(),
            AuthError::InvalidToken
        ));
    }

    #[test]
    fn tokens_from_a_different_secret_are_rejected() {
        let service = JwtTokenService::new(test_config());
        let other = JwtTokenService::new(JwtConfig {
            access_secret: "some-other-secret".to_string(),
            ..test_config()
        });

        let token = other
            .issue("ann", user_groups(), TokenPurpose::Access)
            .unwrap();

        assert!(service.validate(&token).is_err());
    }
}
