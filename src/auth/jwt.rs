//! JWT issuance and validation against the process-wide secret.

use crate::auth::models::Claims;
use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;
use uuid::Uuid;

/// Signs and validates the tokens handed out by `POST /login`.
pub struct JwtHandler {
    secret: String,
    expiration_hours: i64,
}

impl JwtHandler {
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            expiration_hours: 24,
        }
    }

    /// Issue a token whose subject is the given user id.
    ///
    /// The claims are exactly {sub, iat, exp}; expiry is iat plus the fixed
    /// TTL. Validity is later computed from the signature and expiry alone,
    /// there is no revocation list.
    pub fn generate_token(&self, user_id: &Uuid) -> Result<String> {
        let now = Utc::now();
        let expiry = now
            .checked_add_signed(chrono::Duration::hours(self.expiration_hours))
            .context("Invalid timestamp")?;

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp() as usize,
            exp: expiry.timestamp() as usize,
        };

        debug!(
            "Issuing token for user {}, expires in {}h",
            user_id, self.expiration_hours
        );

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to sign token")
    }

    /// Check a token's signature and expiry and return its claims.
    ///
    /// Returns the raw `jsonwebtoken` error so the gate can tell an expired
    /// token apart from a malformed or forged one.
    pub fn validate_token(&self, token: &str) -> jsonwebtoken::errors::Result<Claims> {
        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(decoded.claims)
    }
}
