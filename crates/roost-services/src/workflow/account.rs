use std::sync::Arc;

use roost_core::models::{
    Account, AccountUpdate, ForgotPasswordRequest, LoginRequest, NewAccount,
    RegisterAccountRequest, ResetPasswordRequest, UpdateProfileRequest,
};
use roost_core::validation::sanitize_text;
use roost_core::{AppError, Identity};
use roost_db::{AccountRepository, Repositories};
use roost_processing::UploadRequest;
use roost_storage::Destination;

use super::{require_file, validate_fields, EntityCreateWorkflow, MediaPolicies};
use crate::notification::Notifier;
use crate::security::{generate_token, hash_password, verify_password};

/// Registration, verification, credentials and profile of accounts.
#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
    workflow: EntityCreateWorkflow,
    policies: MediaPolicies,
    notifier: Arc<dyn Notifier>,
}

impl AccountService {
    pub fn new(
        repositories: Repositories,
        workflow: EntityCreateWorkflow,
        policies: MediaPolicies,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            accounts: repositories.accounts,
            workflow,
            policies,
            notifier,
        }
    }

    /// Create an unverified account with its avatar and send the verification link.
    #[tracing::instrument(skip_all, fields(email = %form.email))]
    pub async fn register(
        &self,
        form: RegisterAccountRequest,
        avatar: Option<UploadRequest>,
    ) -> Result<Account, AppError> {
        let avatar = require_file(&form, avatar, "avatar")?;
        let email = form.email.trim().to_lowercase();

        match self.accounts.find_by_email(&email).await {
            Ok(None) => {}
            Ok(Some(_)) => {
                return Err(AppError::Conflict(
                    "An account with this email already exists".to_string(),
                ))
            }
            Err(e) => {
                return Err(AppError::InternalWithSource {
                    message: "Failed to check for an existing account".to_string(),
                    source: e.into(),
                })
            }
        }

        let pending = self
            .workflow
            .start_upload(avatar, &self.policies.image, Destination::avatars());

        let password_hash = hash_password(form.password).await?;
        let token = generate_token();

        let avatar = pending.wait().await?;

        let account = self
            .workflow
            .persist(
                Some(&avatar),
                self.accounts.insert(NewAccount {
                    name: sanitize_text(&form.name),
                    email: email.clone(),
                    bio: sanitize_text(&form.bio),
                    password_hash,
                    avatar: avatar.clone(),
                    verification_token: token.clone(),
                }),
            )
            .await?;

        tracing::info!(account_id = %account.id, "Account registered");

        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.send_verification(&email, &token).await {
                tracing::warn!(to = %email, error = %e, "Failed to send verification email");
            }
        });

        Ok(account)
    }

    /// Consume a verification token.
    #[tracing::instrument(skip_all)]
    pub async fn verify_email(&self, token: &str) -> Result<Account, AppError> {
        let account = self
            .accounts
            .verify_by_token(token)
            .await?
            .ok_or_else(|| AppError::NotFound("Invalid or expired verification token".to_string()))?;

        tracing::info!(account_id = %account.id, "Email verified");
        Ok(account)
    }

    #[tracing::instrument(skip_all, fields(email = %form.email))]
    pub async fn login(&self, form: LoginRequest) -> Result<Account, AppError> {
        validate_fields(&form)?;
        let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

        let account = self
            .accounts
            .find_by_email(form.email.trim())
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(form.password, account.password_hash.clone()).await? {
            return Err(invalid());
        }

        Ok(account)
    }

    /// Store a reset token and mail it. Unknown addresses succeed silently.
    #[tracing::instrument(skip_all, fields(email = %form.email))]
    pub async fn forgot_password(&self, form: ForgotPasswordRequest) -> Result<(), AppError> {
        validate_fields(&form)?;

        let Some(account) = self.accounts.find_by_email(form.email.trim()).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = generate_token();
        self.accounts.set_reset_token(account.id, &token).await?;

        let notifier = self.notifier.clone();
        let email = account.email;
        tokio::spawn(async move {
            if let Err(e) = notifier.send_password_reset(&email, &token).await {
                tracing::warn!(to = %email, error = %e, "Failed to send password reset email");
            }
        });

        Ok(())
    }

    /// Resolve the account behind an emailed reset link without consuming it.
    #[tracing::instrument(skip_all)]
    pub async fn check_reset_token(&self, token: &str) -> Result<Account, AppError> {
        self.accounts
            .find_by_reset_token(token)
            .await?
            .ok_or_else(|| AppError::NotFound("Invalid or expired reset token".to_string()))
    }

    #[tracing::instrument(skip_all)]
    pub async fn reset_password(
        &self,
        token: &str,
        form: ResetPasswordRequest,
    ) -> Result<Account, AppError> {
        validate_fields(&form)?;
        let password_hash = hash_password(form.password).await?;

        self.accounts
            .reset_password(token, &password_hash)
            .await?
            .ok_or_else(|| AppError::NotFound("Invalid or expired reset token".to_string()))
    }

    pub async fn profile(&self, identity: &Identity) -> Result<Account, AppError> {
        self.accounts
            .find_by_id(identity.subject_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Account not found".to_string()))
    }

    /// Apply profile changes. A new avatar replaces the old one, which is
    /// deleted after the update commits.
    #[tracing::instrument(skip_all, fields(account_id = %identity.subject_id))]
    pub async fn update_profile(
        &self,
        identity: &Identity,
        form: UpdateProfileRequest,
        avatar: Option<UploadRequest>,
    ) -> Result<Account, AppError> {
        validate_fields(&form)?;
        let existing = self.profile(identity).await?;

        let pending = avatar.map(|file| {
            self.workflow
                .start_upload(file, &self.policies.image, Destination::avatars())
        });

        let password_hash = match form.password {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };

        let new_avatar = match pending {
            Some(pending) => Some(pending.wait().await?),
            None => None,
        };

        let update = AccountUpdate {
            name: form.name.as_deref().map(sanitize_text),
            bio: form.bio.as_deref().map(sanitize_text),
            password_hash,
            avatar: new_avatar.clone(),
        };

        let updated = self
            .workflow
            .persist(new_avatar.as_ref(), async {
                self.accounts
                    .update(existing.id, update)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Account not found".to_string()))
            })
            .await?;

        if new_avatar.is_some() {
            self.workflow.replace(existing.avatar, &updated.avatar);
        }

        Ok(updated)
    }

    /// Delete the account with everything it owns, then every file they held.
    #[tracing::instrument(skip_all, fields(account_id = %identity.subject_id))]
    pub async fn delete_account(&self, identity: &Identity) -> Result<(), AppError> {
        let deleted = self
            .accounts
            .delete(identity.subject_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;

        let files = std::iter::once(deleted.account.avatar).chain(deleted.owned_files);
        let scheduled = self.workflow.cleanup().cleanup_all(files).len();

        tracing::info!(files = scheduled, "Account deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use roost_core::models::{
        CreateGroupRequest, CreatePostRequest, CreatePropertyRequest, RegisterCompanyRequest,
    };

    fn registration(email: &str) -> RegisterAccountRequest {
        RegisterAccountRequest {
            name: "Ana".to_string(),
            email: email.to_string(),
            password: "s3cret-pass".to_string(),
            bio: "<b>hi</b>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_stores_avatar_and_sends_verification() {
        let h = Harness::new().await;
        let account = h
            .services
            .accounts
            .register(registration("Ana@X.com"), Some(png("me.png").await))
            .await
            .unwrap();

        assert_eq!(account.email, "ana@x.com");
        assert!(!account.email_verified);
        assert_eq!(account.bio, "&lt;b&gt;hi&lt;/b&gt;");
        assert_ne!(account.password_hash, "s3cret-pass");
        assert_eq!(h.storage.download(&account.avatar.location).await.unwrap(), PNG);

        settle().await;
        let sent = h.notifier.verifications.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "ana@x.com");
        assert_eq!(Some(&sent[0].1), account.verification_token.as_ref());
    }

    #[tokio::test]
    async fn test_register_requires_avatar() {
        let h = Harness::new().await;
        let err = h
            .services
            .accounts
            .register(registration("ana@x.com"), None)
            .await
            .unwrap_err();

        assert!(err.field_errors().unwrap().contains_key("avatar"));
        assert_eq!(h.store.account_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts_before_upload() {
        let h = Harness::new().await;
        h.services
            .accounts
            .register(registration("ana@x.com"), Some(png("a.png").await))
            .await
            .unwrap();

        let err = h
            .services
            .accounts
            .register(registration("ana@x.com"), Some(png("b.png").await))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(h.files_in("avatars"), 1);
    }

    #[tokio::test]
    async fn test_concurrent_registrations_leave_one_account_and_one_file() {
        let h = Harness::new().await;
        let attempts = (0..4).map(|i| {
            let accounts = h.services.accounts.clone();
            tokio::spawn(async move {
                accounts
                    .register(
                        registration("race@x.com"),
                        Some(png(&format!("r{}.png", i)).await),
                    )
                    .await
            })
        });

        let results = futures::future::join_all(attempts).await;
        let ok = results.iter().filter(|r| matches!(r, Ok(Ok(_)))).count();
        assert_eq!(ok, 1);
        assert!(results
            .iter()
            .filter(|r| !matches!(r, Ok(Ok(_))))
            .all(|r| matches!(r, Ok(Err(AppError::Conflict(_))))));
        assert_eq!(h.store.account_count(), 1);

        settle().await;
        assert_eq!(h.files_in("avatars"), 1);
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_account() {
        let h = Harness::with_notifier(RecordingNotifier {
            fail: true,
            ..Default::default()
        })
        .await;

        let account = h
            .services
            .accounts
            .register(registration("ana@x.com"), Some(png("a.png").await))
            .await
            .unwrap();

        settle().await;
        assert_eq!(h.notifier.verifications.lock().unwrap().len(), 1);
        assert!(h
            .services
            .accounts
            .profile(&account.identity())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_verify_then_login() {
        let h = Harness::new().await;
        let account = h
            .services
            .accounts
            .register(registration("ana@x.com"), Some(png("a.png").await))
            .await
            .unwrap();
        let token = account.verification_token.unwrap();

        let verified = h.services.accounts.verify_email(&token).await.unwrap();
        assert!(verified.email_verified);
        assert!(matches!(
            h.services.accounts.verify_email(&token).await,
            Err(AppError::NotFound(_))
        ));

        let logged_in = h
            .services
            .accounts
            .login(LoginRequest {
                email: "ana@x.com".to_string(),
                password: "s3cret-pass".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(logged_in.id, account.id);

        let err = h
            .services
            .accounts
            .login(LoginRequest {
                email: "ana@x.com".to_string(),
                password: "wrong-pass".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let h = Harness::new().await;
        h.services
            .accounts
            .register(registration("ana@x.com"), Some(png("a.png").await))
            .await
            .unwrap();

        h.services
            .accounts
            .forgot_password(ForgotPasswordRequest {
                email: "nobody@x.com".to_string(),
            })
            .await
            .unwrap();
        h.services
            .accounts
            .forgot_password(ForgotPasswordRequest {
                email: "ana@x.com".to_string(),
            })
            .await
            .unwrap();
        settle().await;

        let resets = h.notifier.resets.lock().unwrap().clone();
        assert_eq!(resets.len(), 1);
        let token = resets[0].1.clone();

        h.services
            .accounts
            .reset_password(
                &token,
                ResetPasswordRequest {
                    password: "brand-new-pass".to_string(),
                },
            )
            .await
            .unwrap();

        assert!(h
            .services
            .accounts
            .login(LoginRequest {
                email: "ana@x.com".to_string(),
                password: "brand-new-pass".to_string(),
            })
            .await
            .is_ok());
        assert!(matches!(
            h.services
                .accounts
                .reset_password(
                    &token,
                    ResetPasswordRequest {
                        password: "another-pass".to_string()
                    }
                )
                .await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_new_avatar_replaces_old_file() {
        let h = Harness::new().await;
        let account = h
            .services
            .accounts
            .register(registration("ana@x.com"), Some(png("old.png").await))
            .await
            .unwrap();

        let updated = h
            .services
            .accounts
            .update_profile(
                &account.identity(),
                UpdateProfileRequest {
                    name: Some("Ana B".to_string()),
                    ..Default::default()
                },
                Some(png("new.png").await),
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Ana B");
        assert_ne!(updated.avatar.location, account.avatar.location);
        settle().await;
        assert!(!h.storage.exists(&account.avatar.location).await.unwrap());
        assert!(h.storage.exists(&updated.avatar.location).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_account_cascades_and_removes_files() {
        let h = Harness::new().await;
        let account = h
            .services
            .accounts
            .register(registration("ana@x.com"), Some(png("a.png").await))
            .await
            .unwrap();
        let identity = identity_of(&account);
        let post = h
            .services
            .posts
            .create(
                &identity,
                CreatePostRequest {
                    text: "clip".to_string(),
                    ..Default::default()
                },
                Some(mp4("clip.mp4").await),
            )
            .await
            .unwrap();

        h.services
            .properties
            .create(
                &identity,
                CreatePropertyRequest {
                    title: "Cabin".to_string(),
                    description: "Quiet".to_string(),
                    price_per_night: 80,
                    bedrooms: 1,
                    guests: 2,
                    country: "Portugal".to_string(),
                    country_code: "PT".to_string(),
                    category: "cabins".to_string(),
                },
                Some(png("cabin.png").await),
            )
            .await
            .unwrap();
        h.services
            .groups
            .create(
                &identity,
                CreateGroupRequest {
                    name: "Rustaceans".to_string(),
                    description: "crab talk".to_string(),
                },
                Some(png("crab.png").await),
            )
            .await
            .unwrap();
        h.services
            .companies
            .register(
                &identity,
                RegisterCompanyRequest {
                    name: "Acme".to_string(),
                    email: "jobs@acme.test".to_string(),
                    description: "Anvils".to_string(),
                    website: "https://acme.test".to_string(),
                    location: "Desert".to_string(),
                },
                Some(png("acme.png").await),
            )
            .await
            .unwrap();
        assert_eq!(h.files_in("groups"), 1);
        assert_eq!(h.files_in("companies"), 1);

        h.services.accounts.delete_account(&identity).await.unwrap();
        settle().await;

        assert_eq!(h.store.account_count(), 0);
        assert!(matches!(
            h.services.posts.get(&identity, post.id).await,
            Err(AppError::NotFound(_))
        ));
        for folder in ["avatars", "posts", "properties", "groups", "companies"] {
            assert_eq!(h.files_in(folder), 0, "{folder} left behind");
        }
    }

    #[tokio::test]
    async fn test_reset_link_token_checks_without_consuming() {
        let h = Harness::new().await;
        let account = h
            .services
            .accounts
            .register(registration("ana@x.com"), Some(png("a.png").await))
            .await
            .unwrap();
        h.services
            .accounts
            .forgot_password(ForgotPasswordRequest {
                email: "ana@x.com".to_string(),
            })
            .await
            .unwrap();
        settle().await;
        let token = h.notifier.resets.lock().unwrap()[0].1.clone();

        let found = h.services.accounts.check_reset_token(&token).await.unwrap();
        assert_eq!(found.id, account.id);
        assert!(h.services.accounts.check_reset_token(&token).await.is_ok());
        assert!(matches!(
            h.services.accounts.check_reset_token("bogus").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_name_rejected_before_upload() {
        let h = Harness::new().await;
        let mut form = registration("ana@x.com");
        form.name = "   ".to_string();

        let err = h
            .services
            .accounts
            .register(form, Some(png("a.png").await))
            .await
            .unwrap_err();

        assert_eq!(err.field_errors().unwrap()["name"], "name is required");
        assert_eq!(h.files_in("avatars"), 0);
    }
}
