use async_trait::async_trait;
use roost_core::models::{
    Account, AccountUpdate, Company, DeletedAccount, Group, NewAccount, NewCompany, NewGroup,
    NewPost, NewProperty, Page, PageRequest, Post, PostUpdate, Property, PropertyUpdate,
};
use roost_core::AppError;
use uuid::Uuid;

/// Account persistence. Email lookups are case-insensitive.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;

    /// Fails with [`AppError::Conflict`] when the email is already taken,
    /// including when another insert wins a race for it.
    async fn insert(&self, account: NewAccount) -> Result<Account, AppError>;

    /// Mark the account holding `token` verified and consume the token.
    async fn verify_by_token(&self, token: &str) -> Result<Option<Account>, AppError>;

    async fn set_reset_token(&self, id: Uuid, token: &str) -> Result<(), AppError>;

    /// Account holding an unconsumed reset `token`. Does not consume it.
    async fn find_by_reset_token(&self, token: &str) -> Result<Option<Account>, AppError>;

    /// Replace the password of the account holding `token` and consume it.
    async fn reset_password(
        &self,
        token: &str,
        password_hash: &str,
    ) -> Result<Option<Account>, AppError>;

    async fn update(&self, id: Uuid, update: AccountUpdate) -> Result<Option<Account>, AppError>;

    /// Delete the account and everything it owns in one step. Returns the
    /// deleted row together with the files of every row removed with it, so
    /// a child inserted concurrently is either deleted and reported, or the
    /// insert fails on the missing owner.
    async fn delete(&self, id: Uuid) -> Result<Option<DeletedAccount>, AppError>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert(&self, post: NewPost) -> Result<Post, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, AppError>;

    /// Public posts plus the viewer's own, newest first.
    async fn list_visible(&self, viewer: Uuid) -> Result<Vec<Post>, AppError>;

    async fn update(&self, id: Uuid, update: PostUpdate) -> Result<Option<Post>, AppError>;

    async fn delete(&self, id: Uuid) -> Result<Option<Post>, AppError>;
}

#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn insert(&self, property: NewProperty) -> Result<Property, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Property>, AppError>;

    /// Newest first.
    async fn list(&self) -> Result<Vec<Property>, AppError>;

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Property>, AppError>;

    async fn update(
        &self,
        id: Uuid,
        update: PropertyUpdate,
    ) -> Result<Option<Property>, AppError>;

    async fn delete(&self, id: Uuid) -> Result<Option<Property>, AppError>;
}

#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Fails with [`AppError::NotFound`] when the owner does not exist.
    async fn insert(&self, group: NewGroup) -> Result<Group, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, AppError>;

    /// Newest first.
    async fn list(&self, page: PageRequest) -> Result<Page<Group>, AppError>;

    async fn delete(&self, id: Uuid) -> Result<Option<Group>, AppError>;
}

/// Company persistence. Email lookups are case-insensitive.
#[async_trait]
pub trait CompanyRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Company>, AppError>;

    /// Fails with [`AppError::Conflict`] on a taken email and
    /// [`AppError::NotFound`] when the owner does not exist.
    async fn insert(&self, company: NewCompany) -> Result<Company, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError>;

    /// Newest first.
    async fn list(&self) -> Result<Vec<Company>, AppError>;

    async fn delete(&self, id: Uuid) -> Result<Option<Company>, AppError>;
}
