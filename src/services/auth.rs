//! Accounts, password hashing and signed session tokens.
//!
//! A token is `base64url(claims json) + "." + hex(hmac_sha256(secret, first part))`.

use std::sync::Arc;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::domain::aggregates::{Role, User};
use crate::storage::UserStore;
use crate::{EcommerceError, Result};

type HmacSha256 = Hmac<Sha256>;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    /// Unix seconds.
    pub exp: i64,
}

impl Claims {
    pub fn is_admin(&self) -> bool { self.role == Role::Admin }

    /// Owners see their own records; admins see everything.
    pub fn can_access(&self, owner: Uuid) -> bool { self.is_admin() || self.sub == owner }
}

#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self { secret: secret.as_bytes().to_vec(), ttl: Duration::hours(ttl_hours) }
    }

    pub fn ttl_seconds(&self) -> i64 { self.ttl.num_seconds() }

    pub fn issue(&self, user: &User) -> Result<String> {
        let claims = Claims { sub: user.id, role: user.role, exp: (Utc::now() + self.ttl).timestamp() };
        let json = serde_json::to_vec(&claims).map_err(|_| EcommerceError::Internal("failed to issue token"))?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = hex::encode(self.mac(&payload)?.finalize().into_bytes());
        Ok(format!("{payload}.{signature}"))
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let invalid = || EcommerceError::Unauthorized("invalid token".into());
        let (payload, signature) = token.split_once('.').ok_or_else(invalid)?;
        let signature = hex::decode(signature).map_err(|_| invalid())?;
        self.mac(payload)?.verify_slice(&signature).map_err(|_| invalid())?;
        let json = URL_SAFE_NO_PAD.decode(payload).map_err(|_| invalid())?;
        let claims: Claims = serde_json::from_slice(&json).map_err(|_| invalid())?;
        if claims.exp <= Utc::now().timestamp() {
            return Err(EcommerceError::Unauthorized("token expired".into()));
        }
        Ok(claims)
    }

    fn mac(&self, payload: &str) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).map_err(|_| EcommerceError::Internal("invalid signing key"))?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>()).map_err(|e| {
        tracing::error!("salt encoding failed: {e}");
        EcommerceError::Internal("failed to hash password")
    })?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("password hashing failed: {e}");
            EcommerceError::Internal("failed to hash password")
        })
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: TokenSigner,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenSigner) -> Self { Self { users, tokens } }

    pub fn tokens(&self) -> &TokenSigner { &self.tokens }

    #[tracing::instrument(skip(self, password))]
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<(User, String)> {
        if name.trim().is_empty() { return Err(EcommerceError::validation("name is required")); }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(EcommerceError::validation(format!("password must be at least {MIN_PASSWORD_LEN} characters")));
        }
        let user = User::register(name, email, hash_password(password)?);
        if self.users.find_user_by_email(&user.email).await?.is_some() {
            return Err(EcommerceError::conflict("email already registered"));
        }
        self.users.insert_user(&user).await?;
        tracing::info!(user_id = %user.id, "user registered");
        let token = self.tokens.issue(&user)?;
        Ok((user, token))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String)> {
        let email = email.trim().to_lowercase();
        let user = self.users.find_user_by_email(&email).await?
            .filter(|user| verify_password(password, &user.password_hash))
            .ok_or_else(|| EcommerceError::Unauthorized("invalid email or password".into()))?;
        let token = self.tokens.issue(&user)?;
        Ok((user, token))
    }

    pub fn authenticate(&self, token: &str) -> Result<Claims> { self.tokens.verify(token) }

    pub async fn current_user(&self, claims: &Claims) -> Result<User> {
        self.users.find_user(claims.sub).await?.ok_or(EcommerceError::NotFound("user"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner { TokenSigner::new("0123456789abcdef-secret", 1) }

    #[test]
    fn test_token_roundtrip() {
        let user = User::register("Sari", "Sari@Example.com", "x".into());
        let claims = signer().verify(&signer().issue(&user).unwrap()).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::Customer);
    }

    #[test]
    fn test_tampered_token_rejected() {
        let user = User::register("Sari", "sari@example.com", "x".into());
        let token = signer().issue(&user).unwrap();
        let (_, signature) = token.split_once('.').unwrap();
        let forged_claims = Claims { sub: user.id, role: Role::Admin, exp: Utc::now().timestamp() + 3600 };
        let forged = format!("{}.{signature}", URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap()));
        assert!(matches!(signer().verify(&forged), Err(EcommerceError::Unauthorized(_))));
        assert!(TokenSigner::new("another-secret-of-length", 1).verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let user = User::register("Sari", "sari@example.com", "x".into());
        let token = TokenSigner::new("0123456789abcdef-secret", -1).issue(&user).unwrap();
        assert!(signer().verify(&token).is_err());
    }

    #[test]
    fn test_password_hash_verifies() {
        let hash = hash_password("rahasia123").unwrap();
        assert!(verify_password("rahasia123", &hash));
        assert!(!verify_password("rahasia124", &hash));
        assert!(!verify_password("rahasia123", "not-a-hash"));
    }
}
