//! Password hashing and bearer tokens.
//!
//! Passwords are stored as bcrypt hashes. Tokens are HS256 JWTs whose
//! `sub` is the user id; a `token_type` claim keeps refresh tokens from
//! being accepted where an access token is required.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("failed to hash password: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("failed to issue token: {0}")]
    Issue(jsonwebtoken::errors::Error),

    #[error("Could not validate credentials")]
    InvalidToken,

    #[error("expected {expected} token, got {actual}")]
    WrongTokenType {
        expected: TokenKind,
        actual: TokenKind,
    },
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    Ok(bcrypt::hash(password, cost)?)
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub token_type: TokenKind,
    pub jti: String,
    pub exp: i64,
    pub iat: i64,
}

/// A signed token together with its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

/// Signs and verifies access and refresh tokens with one shared secret.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn issue(
        &self,
        user_id: Uuid,
        kind: TokenKind,
        now: OffsetDateTime,
    ) -> Result<IssuedToken, AuthError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let expires_at = now + ttl;
        let claims = Claims {
            sub: user_id.to_string(),
            token_type: kind,
            jti: Uuid::new_v4().simple().to_string(),
            exp: expires_at.unix_timestamp(),
            iat: now.unix_timestamp(),
        };
        let token =
            encode(&Header::default(), &claims, &self.encoding).map_err(AuthError::Issue)?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Decode a token, check its signature, expiry and type, and return the
    /// user id it was issued for.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Uuid, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AuthError::InvalidToken)?;
        let claims = data.claims;
        if claims.token_type != expected {
            return Err(AuthError::WrongTokenType {
                expected,
                actual: claims.token_type,
            });
        }
        Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)
    }
}
