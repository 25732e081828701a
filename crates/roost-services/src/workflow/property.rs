use std::sync::Arc;

use roost_core::models::{
    CreatePropertyRequest, NewProperty, Property, PropertyUpdate, UpdatePropertyRequest,
};
use roost_core::validation::sanitize_text;
use roost_core::{AppError, Identity};
use roost_db::PropertyRepository;
use roost_processing::UploadRequest;
use roost_storage::Destination;
use uuid::Uuid;

use super::{require_file, validate_fields, EntityCreateWorkflow, MediaPolicies};

#[derive(Clone)]
pub struct PropertyService {
    properties: Arc<dyn PropertyRepository>,
    workflow: EntityCreateWorkflow,
    policies: MediaPolicies,
}

fn sanitize_opt(value: Option<String>) -> Option<String> {
    value.as_deref().map(sanitize_text)
}

impl PropertyService {
    pub fn new(
        properties: Arc<dyn PropertyRepository>,
        workflow: EntityCreateWorkflow,
        policies: MediaPolicies,
    ) -> Self {
        Self {
            properties,
            workflow,
            policies,
        }
    }

    #[tracing::instrument(skip_all, fields(owner_id = %identity.subject_id))]
    pub async fn create(
        &self,
        identity: &Identity,
        form: CreatePropertyRequest,
        image: Option<UploadRequest>,
    ) -> Result<Property, AppError> {
        let image = require_file(&form, image, "image")?;

        let pending = self
            .workflow
            .start_upload(image, &self.policies.image, Destination::properties());
        let image = pending.wait().await?;

        let property = self
            .workflow
            .persist(
                Some(&image),
                self.properties.insert(NewProperty {
                    owner_id: identity.subject_id,
                    title: sanitize_text(&form.title),
                    description: sanitize_text(&form.description),
                    price_per_night: form.price_per_night,
                    bedrooms: form.bedrooms,
                    guests: form.guests,
                    country: sanitize_text(&form.country),
                    country_code: sanitize_text(&form.country_code),
                    category: sanitize_text(&form.category),
                    image: image.clone(),
                }),
            )
            .await?;

        tracing::info!(property_id = %property.id, "Property created");
        Ok(property)
    }

    pub async fn get(&self, id: Uuid) -> Result<Property, AppError> {
        self.properties
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found".to_string()))
    }

    pub async fn list(&self) -> Result<Vec<Property>, AppError> {
        self.properties.list().await
    }

    pub async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Property>, AppError> {
        self.properties.list_by_owner(owner_id).await
    }

    /// Update listing fields; a new image replaces the old one after commit.
    #[tracing::instrument(skip_all, fields(property_id = %id))]
    pub async fn update(
        &self,
        identity: &Identity,
        id: Uuid,
        form: UpdatePropertyRequest,
        image: Option<UploadRequest>,
    ) -> Result<Property, AppError> {
        validate_fields(&form)?;
        let existing = self.get(id).await?;
        identity.ensure_owner(existing.owner_id)?;

        let new_image = match image {
            Some(file) => Some(
                self.workflow
                    .start_upload(file, &self.policies.image, Destination::properties())
                    .wait()
                    .await?,
            ),
            None => None,
        };

        let update = PropertyUpdate {
            title: sanitize_opt(form.title),
            description: sanitize_opt(form.description),
            price_per_night: form.price_per_night,
            bedrooms: form.bedrooms,
            guests: form.guests,
            country: sanitize_opt(form.country),
            country_code: sanitize_opt(form.country_code),
            category: sanitize_opt(form.category),
            image: new_image.clone(),
        };

        let updated = self
            .workflow
            .persist(new_image.as_ref(), async {
                self.properties
                    .update(id, update)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Property not found".to_string()))
            })
            .await?;

        if new_image.is_some() {
            self.workflow.replace(existing.image, &updated.image);
        }

        Ok(updated)
    }

    #[tracing::instrument(skip_all, fields(property_id = %id))]
    pub async fn delete(&self, identity: &Identity, id: Uuid) -> Result<(), AppError> {
        let existing = self.get(id).await?;
        identity.ensure_owner(existing.owner_id)?;

        if let Some(property) = self.properties.delete(id).await? {
            self.workflow.cleanup().cleanup(property.image);
            tracing::info!("Property deleted");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use roost_core::models::RegisterAccountRequest;

    async fn account(h: &Harness, email: &str) -> Identity {
        h.services
            .accounts
            .register(
                RegisterAccountRequest {
                    name: "Host".to_string(),
                    email: email.to_string(),
                    password: "s3cret-pass".to_string(),
                    bio: String::new(),
                },
                Some(png("a.png").await),
            )
            .await
            .unwrap()
            .identity()
    }

    fn listing() -> CreatePropertyRequest {
        CreatePropertyRequest {
            title: "Sea <view>".to_string(),
            description: "Quiet flat".to_string(),
            price_per_night: 120,
            bedrooms: 2,
            guests: 4,
            country: "Portugal".to_string(),
            country_code: "PT".to_string(),
            category: "beach".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_sanitizes_and_stores_image() {
        let h = Harness::new().await;
        let host = account(&h, "host@x.com").await;

        let property = h
            .services
            .properties
            .create(&host, listing(), Some(png("house.png").await))
            .await
            .unwrap();

        assert_eq!(property.title, "Sea &lt;view&gt;");
        assert!(property.image.location.starts_with("properties/house_"));
        assert_eq!(h.storage.download(&property.image.location).await.unwrap(), PNG);
        assert_eq!(h.services.properties.list().await.unwrap().len(), 1);
        assert_eq!(
            h.services
                .properties
                .list_by_owner(host.subject_id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_guests_must_be_positive() {
        let h = Harness::new().await;
        let host = account(&h, "host@x.com").await;

        let err = h
            .services
            .properties
            .create(
                &host,
                CreatePropertyRequest {
                    guests: 0,
                    ..listing()
                },
                Some(png("house.png").await),
            )
            .await
            .unwrap_err();

        assert!(err.field_errors().unwrap().contains_key("guests"));
        assert_eq!(h.files_in("properties"), 0);
    }

    #[tokio::test]
    async fn test_replacement_image_cleans_old_file() {
        let h = Harness::new().await;
        let host = account(&h, "host@x.com").await;
        let property = h
            .services
            .properties
            .create(&host, listing(), Some(png("old.png").await))
            .await
            .unwrap();

        let updated = h
            .services
            .properties
            .update(
                &host,
                property.id,
                UpdatePropertyRequest {
                    price_per_night: Some(99),
                    ..Default::default()
                },
                Some(png("new.png").await),
            )
            .await
            .unwrap();
        settle().await;

        assert_eq!(updated.price_per_night, 99);
        assert_eq!(updated.title, property.title);
        assert!(!h.storage.exists(&property.image.location).await.unwrap());
        assert!(h.storage.exists(&updated.image.location).await.unwrap());
    }

    #[tokio::test]
    async fn test_non_owner_cannot_update_or_delete() {
        let h = Harness::new().await;
        let host = account(&h, "host@x.com").await;
        let guest = account(&h, "guest@x.com").await;
        let property = h
            .services
            .properties
            .create(&host, listing(), Some(png("house.png").await))
            .await
            .unwrap();

        let err = h
            .services
            .properties
            .update(&guest, property.id, UpdatePropertyRequest::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = h
            .services
            .properties
            .delete(&guest, property.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        h.services
            .properties
            .delete(&host, property.id)
            .await
            .unwrap();
        settle().await;
        assert!(!h.storage.exists(&property.image.location).await.unwrap());
    }
}
