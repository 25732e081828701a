//! In-memory store implementing every repository trait
//!
//! All tables sit behind one mutex so the email uniqueness check and the
//! account cascade are atomic, matching the unique index and the foreign
//! keys of the Postgres schema.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use roost_core::models::{
    Account, AccountUpdate, Company, DeletedAccount, Group, NewAccount, NewCompany, NewGroup,
    NewPost, NewProperty, Page, PageRequest, Post, PostUpdate, Property, PropertyUpdate,
};
use roost_core::{AppError, StoredFileRef};
use uuid::Uuid;

use crate::repository::{
    AccountRepository, CompanyRepository, GroupRepository, PostRepository, PropertyRepository,
};

#[derive(Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    posts: HashMap<Uuid, Post>,
    properties: HashMap<Uuid, Property>,
    groups: HashMap<Uuid, Group>,
    companies: HashMap<Uuid, Company>,
}

impl Tables {
    fn require_owner(&self, owner_id: Uuid) -> Result<(), AppError> {
        if self.accounts.contains_key(&owner_id) {
            Ok(())
        } else {
            Err(AppError::NotFound("Owner account not found".to_string()))
        }
    }
}

/// Remove every row owned by `owner_id` and hand back the removed rows.
fn take_owned<T>(
    table: &mut HashMap<Uuid, T>,
    owner_id: Uuid,
    owner: impl Fn(&T) -> Uuid,
) -> Vec<T> {
    let ids: Vec<Uuid> = table
        .iter()
        .filter(|(_, row)| owner(row) == owner_id)
        .map(|(id, _)| *id)
        .collect();
    ids.iter().filter_map(|id| table.remove(id)).collect()
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn account_count(&self) -> usize {
        self.tables().accounts.len()
    }
}

fn newest_first<T>(items: &mut [T], created: impl Fn(&T) -> chrono::DateTime<Utc>) {
    items.sort_by_key(|item| std::cmp::Reverse(created(item)));
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        Ok(self.tables().accounts.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        Ok(self
            .tables()
            .accounts
            .values()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, AppError> {
        let mut tables = self.tables();
        if tables
            .accounts
            .values()
            .any(|a| a.email.eq_ignore_ascii_case(&account.email))
        {
            return Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let created = Account {
            id: Uuid::new_v4(),
            name: account.name,
            email: account.email,
            bio: account.bio,
            avatar: account.avatar,
            email_verified: false,
            password_hash: account.password_hash,
            verification_token: Some(account.verification_token),
            reset_token: None,
            created_at: now,
            updated_at: now,
        };
        tables.accounts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn verify_by_token(&self, token: &str) -> Result<Option<Account>, AppError> {
        let mut tables = self.tables();
        let Some(account) = tables
            .accounts
            .values_mut()
            .find(|a| a.verification_token.as_deref() == Some(token))
        else {
            return Ok(None);
        };

        account.email_verified = true;
        account.verification_token = None;
        account.updated_at = Utc::now();
        Ok(Some(account.clone()))
    }

    async fn set_reset_token(&self, id: Uuid, token: &str) -> Result<(), AppError> {
        if let Some(account) = self.tables().accounts.get_mut(&id) {
            account.reset_token = Some(token.to_string());
            account.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<Account>, AppError> {
        Ok(self
            .tables()
            .accounts
            .values()
            .find(|a| a.reset_token.as_deref() == Some(token))
            .cloned())
    }

    async fn reset_password(
        &self,
        token: &str,
        password_hash: &str,
    ) -> Result<Option<Account>, AppError> {
        let mut tables = self.tables();
        let Some(account) = tables
            .accounts
            .values_mut()
            .find(|a| a.reset_token.as_deref() == Some(token))
        else {
            return Ok(None);
        };

        account.password_hash = password_hash.to_string();
        account.reset_token = None;
        account.updated_at = Utc::now();
        Ok(Some(account.clone()))
    }

    async fn update(&self, id: Uuid, update: AccountUpdate) -> Result<Option<Account>, AppError> {
        let mut tables = self.tables();
        let Some(account) = tables.accounts.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            account.name = name;
        }
        if let Some(bio) = update.bio {
            account.bio = bio;
        }
        if let Some(hash) = update.password_hash {
            account.password_hash = hash;
        }
        if let Some(avatar) = update.avatar {
            account.avatar = avatar;
        }
        account.updated_at = Utc::now();
        Ok(Some(account.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<DeletedAccount>, AppError> {
        let mut tables = self.tables();
        let Some(account) = tables.accounts.remove(&id) else {
            return Ok(None);
        };

        let mut owned_files: Vec<StoredFileRef> = Vec::new();
        owned_files.extend(
            take_owned(&mut tables.posts, id, |p| p.owner_id)
                .into_iter()
                .map(|p| p.video),
        );
        owned_files.extend(
            take_owned(&mut tables.properties, id, |p| p.owner_id)
                .into_iter()
                .map(|p| p.image),
        );
        owned_files.extend(
            take_owned(&mut tables.groups, id, |g| g.owner_id)
                .into_iter()
                .filter_map(|g| g.image),
        );
        owned_files.extend(
            take_owned(&mut tables.companies, id, |c| c.owner_id)
                .into_iter()
                .map(|c| c.logo),
        );
        Ok(Some(DeletedAccount {
            account,
            owned_files,
        }))
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn insert(&self, post: NewPost) -> Result<Post, AppError> {
        let mut tables = self.tables();
        tables.require_owner(post.owner_id)?;

        let now = Utc::now();
        let created = Post {
            id: Uuid::new_v4(),
            owner_id: post.owner_id,
            text: post.text,
            hashtags: post.hashtags,
            music: post.music,
            location: post.location,
            is_private: post.is_private,
            video: post.video,
            created_at: now,
            updated_at: now,
        };
        tables.posts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, AppError> {
        Ok(self.tables().posts.get(&id).cloned())
    }

    async fn list_visible(&self, viewer: Uuid) -> Result<Vec<Post>, AppError> {
        let mut posts: Vec<Post> = self
            .tables()
            .posts
            .values()
            .filter(|p| p.visible_to(Some(viewer)))
            .cloned()
            .collect();
        newest_first(&mut posts, |p| p.created_at);
        Ok(posts)
    }

    async fn update(&self, id: Uuid, update: PostUpdate) -> Result<Option<Post>, AppError> {
        let mut tables = self.tables();
        let Some(post) = tables.posts.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(text) = update.text {
            post.text = text;
        }
        if let Some(hashtags) = update.hashtags {
            post.hashtags = hashtags;
        }
        if let Some(music) = update.music {
            post.music = music;
        }
        if let Some(location) = update.location {
            post.location = location;
        }
        if let Some(is_private) = update.is_private {
            post.is_private = is_private;
        }
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Post>, AppError> {
        Ok(self.tables().posts.remove(&id))
    }
}

#[async_trait]
impl PropertyRepository for MemoryStore {
    async fn insert(&self, property: NewProperty) -> Result<Property, AppError> {
        let mut tables = self.tables();
        tables.require_owner(property.owner_id)?;

        let now = Utc::now();
        let created = Property {
            id: Uuid::new_v4(),
            owner_id: property.owner_id,
            title: property.title,
            description: property.description,
            price_per_night: property.price_per_night,
            bedrooms: property.bedrooms,
            guests: property.guests,
            country: property.country,
            country_code: property.country_code,
            category: property.category,
            image: property.image,
            created_at: now,
            updated_at: now,
        };
        tables.properties.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Property>, AppError> {
        Ok(self.tables().properties.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Property>, AppError> {
        let mut properties: Vec<Property> = self.tables().properties.values().cloned().collect();
        newest_first(&mut properties, |p| p.created_at);
        Ok(properties)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Property>, AppError> {
        let mut properties: Vec<Property> = self
            .tables()
            .properties
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        newest_first(&mut properties, |p| p.created_at);
        Ok(properties)
    }

    async fn update(
        &self,
        id: Uuid,
        update: PropertyUpdate,
    ) -> Result<Option<Property>, AppError> {
        let mut tables = self.tables();
        let Some(property) = tables.properties.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(v) = update.title {
            property.title = v;
        }
        if let Some(v) = update.description {
            property.description = v;
        }
        if let Some(v) = update.price_per_night {
            property.price_per_night = v;
        }
        if let Some(v) = update.bedrooms {
            property.bedrooms = v;
        }
        if let Some(v) = update.guests {
            property.guests = v;
        }
        if let Some(v) = update.country {
            property.country = v;
        }
        if let Some(v) = update.country_code {
            property.country_code = v;
        }
        if let Some(v) = update.category {
            property.category = v;
        }
        if let Some(v) = update.image {
            property.image = v;
        }
        property.updated_at = Utc::now();
        Ok(Some(property.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Property>, AppError> {
        Ok(self.tables().properties.remove(&id))
    }
}

#[async_trait]
impl GroupRepository for MemoryStore {
    async fn insert(&self, group: NewGroup) -> Result<Group, AppError> {
        let mut tables = self.tables();
        tables.require_owner(group.owner_id)?;

        let now = Utc::now();
        let created = Group {
            id: Uuid::new_v4(),
            owner_id: group.owner_id,
            name: group.name,
            description: group.description,
            image: group.image,
            created_at: now,
            updated_at: now,
        };
        tables.groups.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, AppError> {
        Ok(self.tables().groups.get(&id).cloned())
    }

    async fn list(&self, page: PageRequest) -> Result<Page<Group>, AppError> {
        let mut groups: Vec<Group> = self.tables().groups.values().cloned().collect();
        newest_first(&mut groups, |g| g.created_at);
        let total = groups.len() as u64;
        let items = groups
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.limit as usize)
            .collect();
        Ok(Page {
            items,
            total,
            request: page,
        })
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Group>, AppError> {
        Ok(self.tables().groups.remove(&id))
    }
}

#[async_trait]
impl CompanyRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Company>, AppError> {
        Ok(self
            .tables()
            .companies
            .values()
            .find(|c| c.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn insert(&self, company: NewCompany) -> Result<Company, AppError> {
        let mut tables = self.tables();
        tables.require_owner(company.owner_id)?;
        if tables
            .companies
            .values()
            .any(|c| c.email.eq_ignore_ascii_case(&company.email))
        {
            return Err(AppError::Conflict(
                "A company with this email already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let created = Company {
            id: Uuid::new_v4(),
            owner_id: company.owner_id,
            name: company.name,
            email: company.email,
            description: company.description,
            website: company.website,
            location: company.location,
            logo: company.logo,
            created_at: now,
            updated_at: now,
        };
        tables.companies.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        Ok(self.tables().companies.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Company>, AppError> {
        let mut companies: Vec<Company> = self.tables().companies.values().cloned().collect();
        newest_first(&mut companies, |c| c.created_at);
        Ok(companies)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        Ok(self.tables().companies.remove(&id))
    }
}
