//! Authentication and authorization ports.

/// What a token is signed for. Access and refresh tokens use different
/// signing secrets so one can never be replayed as the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    Access,
    Refresh,
}

/// Claims carried by a bearer token.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    /// Subject - the user's login.
    pub sub: String,
    /// Role claims: `["user"]` or `["user", "admin"]`.
    pub groups: Vec<String>,
    /// Expiry, unix seconds.
    pub exp: i64,
}

/// Token service trait for JWT operations.
pub trait TokenService: Send + Sync {
    /// Issue a signed token for a subject with the given role claims.
    /// Fails only on a signing-backend error.
    fn issue(
        &self,
        subject: &str,
        groups: Vec<String>,
        purpose: TokenPurpose,
    ) -> Result<String, AuthError>;

    /// Validate and decode an ACCESS token.
    ///
    /// Any failure - bad signature, expiry, missing subject - surfaces as the
    /// same opaque `AuthError::InvalidToken` so callers cannot tell which
    /// check failed.
    fn validate(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password with a per-call salt.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a stored hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Could not validate credentials")]
    InvalidToken,

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Access forbidden")]
    Forbidden,

    #[error("Hashing error: {0}")]
    Hashing(String),

    #[error("Signing error: {0}")]
    Signing(String),
}
