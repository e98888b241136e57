use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::SecurityConfig;

use super::AuthError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub authorized: bool,
    /// Id of the user the token was issued to.
    pub id: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, lifetime_hours: u64) -> Result<Self, AuthError> {
        let now = Utc::now();
        let exp = i64::try_from(lifetime_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| AuthError::TokenGeneration(format!("token lifetime of {} hours is out of range", lifetime_hours)))?;

        Ok(Self {
            authorized: true,
            id: user_id,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        })
    }
}

/// Issues and verifies HS256 bearer tokens signed with the shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    lifetime_hours: u64,
}

impl TokenService {
    pub fn new(secret: &str, lifetime_hours: u64) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }

        Ok(Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            lifetime_hours,
        })
    }

    pub fn from_config(config: &SecurityConfig) -> Result<Self, AuthError> {
        Self::new(&config.jwt_secret, config.jwt_expiry_hours)
    }

    /// Token lifetime in seconds, as reported to clients at login.
    pub fn lifetime_secs(&self) -> Result<u64, AuthError> {
        self.lifetime_hours
            .checked_mul(3600)
            .ok_or_else(|| AuthError::TokenGeneration(format!("token lifetime of {} hours is out of range", self.lifetime_hours)))
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, AuthError> {
        let claims = Claims::new(user_id, self.lifetime_hours)?;
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    /// Checks signature and expiry and returns the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        if !token_data.claims.authorized {
            return Err(AuthError::InvalidToken("token is not authorized".to_string()));
        }
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_carries_user_id() {
        let tokens = TokenService::new("test-secret", 2).unwrap();
        let user_id = Uuid::now_v7();

        let claims = tokens.verify(&tokens.issue(user_id).unwrap()).unwrap();
        assert_eq!(claims.id, user_id);
        assert!(claims.authorized);
        assert_eq!(claims.exp - claims.iat, 2 * 3600);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let issuer = TokenService::new("one", 1).unwrap();
        let verifier = TokenService::new("two", 1).unwrap();
        let token = issuer.issue(Uuid::now_v7()).unwrap();

        assert!(matches!(verifier.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn rejects_expired_token() {
        let tokens = TokenService::new("test-secret", 1).unwrap();
        let mut claims = Claims::new(Uuid::now_v7(), 1).unwrap();
        claims.exp = Utc::now().timestamp() - 3600;
        let token = encode(&Header::default(), &claims, &tokens.encoding_key).unwrap();

        assert!(matches!(tokens.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn oversized_lifetime_fails_instead_of_panicking() {
        for hours in [3_000_000_000, u64::MAX] {
            let tokens = TokenService::new("test-secret", hours).unwrap();
            assert!(matches!(tokens.issue(Uuid::now_v7()), Err(AuthError::TokenGeneration(_))));
        }
        assert!(TokenService::new("test-secret", u64::MAX).unwrap().lifetime_secs().is_err());
        assert_eq!(TokenService::new("test-secret", 2).unwrap().lifetime_secs().unwrap(), 7200);
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(TokenService::new("", 1), Err(AuthError::InvalidSecret)));
    }
}
