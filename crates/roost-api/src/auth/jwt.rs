//! HS256 credentials signed with the configured secret.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use roost_core::{Account, AppError, Identity};

use super::models::JwtClaims;

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: i64,
}

impl JwtService {
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_hours,
        }
    }

    /// Sign a credential carrying the account's identity claims.
    pub fn issue(&self, account: &Account) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: account.id,
            email: account.email.clone(),
            name: account.name.clone(),
            verified: account.email_verified,
            avatar: Some(account.avatar.location.clone()),
            exp: (now + Duration::hours(self.expiry_hours)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<Identity, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let token_data = decode::<JwtClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!("JWT validation failed: {}", e);
            match e.kind() {
                ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Token has expired".to_string())
                }
                _ => AppError::Unauthorized("Invalid token".to_string()),
            }
        })?;

        Ok(token_data.claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roost_core::StoredFileRef;
    use uuid::Uuid;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn account() -> Account {
        Account {
            id: Uuid::new_v4(),
            name: "Ana".to_string(),
            email: "ana@x.com".to_string(),
            bio: String::new(),
            avatar: StoredFileRef::new("avatars/ana_1.png", 33),
            email_verified: true,
            password_hash: "hash".to_string(),
            verification_token: None,
            reset_token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_issued_token_verifies_to_identity() {
        let jwt = JwtService::new(SECRET, 24);
        let account = account();

        let identity = jwt.verify(&jwt.issue(&account).unwrap()).unwrap();
        assert_eq!(identity.subject_id, account.id);
        assert_eq!(identity.email, "ana@x.com");
        assert!(identity.verified);
        assert_eq!(identity.avatar.as_deref(), Some("avatars/ana_1.png"));
    }

    #[test]
    fn test_expired_token_rejected() {
        let jwt = JwtService::new(SECRET, -1);
        let token = jwt.issue(&account()).unwrap();

        let err = jwt.verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref msg) if msg == "Token has expired"));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let other = JwtService::new("another-secret-another-secret-xx", 24);
        let token = other.issue(&account()).unwrap();

        assert!(matches!(
            JwtService::new(SECRET, 24).verify(&token),
            Err(AppError::Unauthorized(_))
        ));
    }
}
