use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::file::StoredFileRef;
use super::identity::Identity;

/// Verification state of an account. There is no transition back to `Unverified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Unverified,
    Verified,
}

/// Registered account. Secrets are never serialized.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub bio: String,
    pub avatar: StoredFileRef,
    pub email_verified: bool,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub verification_token: Option<String>,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub reset_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn status(&self) -> AccountStatus {
        if self.email_verified {
            AccountStatus::Verified
        } else {
            AccountStatus::Unverified
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            subject_id: self.id,
            display_name: self.name.clone(),
            email: self.email.clone(),
            verified: self.email_verified,
            avatar: Some(self.avatar.location.clone()),
        }
    }
}

/// Row to insert for a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub bio: String,
    pub password_hash: String,
    pub avatar: StoredFileRef,
    pub verification_token: String,
}

/// Partial update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub password_hash: Option<String>,
    pub avatar: Option<StoredFileRef>,
}

/// Deleted account plus every file its cascaded rows referenced.
#[derive(Debug, Clone)]
pub struct DeletedAccount {
    pub account: Account,
    pub owned_files: Vec<StoredFileRef>,
}

/// Registration form fields (sent as multipart alongside the `avatar` file)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterAccountRequest {
    #[validate(
        length(min = 1, max = 255),
        custom(function = "crate::validation::not_blank")
    )]
    #[schema(example = "Ana")]
    pub name: String,
    #[validate(email, length(max = 255))]
    #[schema(example = "ana@x.com")]
    pub email: String,
    #[validate(length(min = 8, max = 255))]
    pub password: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub bio: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email, length(max = 255))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 8, max = 255))]
    pub password: String,
}

/// Profile update form fields; an `avatar` file part may accompany them.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(
        length(min = 1, max = 255),
        custom(function = "crate::validation::not_blank")
    )]
    pub name: Option<String>,
    #[validate(length(max = 255))]
    pub bio: Option<String>,
    #[validate(length(min = 8, max = 255))]
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account {
            id: Uuid::new_v4(),
            name: "Ana".to_string(),
            email: "ana@x.com".to_string(),
            bio: String::new(),
            avatar: StoredFileRef::new("avatars/ana_1.png", 42),
            email_verified: false,
            password_hash: "$argon2id$v=19$secret".to_string(),
            verification_token: Some("abc".to_string()),
            reset_token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_serialization_omits_secrets() {
        let json = serde_json::to_value(account()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("verification_token").is_none());
        assert!(json.get("reset_token").is_none());
        assert_eq!(json["email"], "ana@x.com");
        assert_eq!(json["avatar"]["location"], "avatars/ana_1.png");
    }

    #[test]
    fn test_status_follows_verification_flag() {
        let mut acct = account();
        assert_eq!(acct.status(), AccountStatus::Unverified);
        acct.email_verified = true;
        assert_eq!(acct.status(), AccountStatus::Verified);
        assert!(acct.identity().verified);
    }

    #[test]
    fn test_register_request_rejects_short_password() {
        let req = RegisterAccountRequest {
            name: "Ana".to_string(),
            email: "ana@x.com".to_string(),
            password: "1234567".to_string(),
            bio: String::new(),
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_register_request_rejects_blank_name() {
        let req = RegisterAccountRequest {
            name: "   ".to_string(),
            email: "ana@x.com".to_string(),
            password: "12345678".to_string(),
            bio: String::new(),
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }
}
