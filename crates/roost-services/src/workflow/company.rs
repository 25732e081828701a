use std::sync::Arc;

use roost_core::models::{Company, NewCompany, RegisterCompanyRequest};
use roost_core::validation::sanitize_text;
use roost_core::{AppError, Identity};
use roost_db::CompanyRepository;
use roost_processing::UploadRequest;
use roost_storage::Destination;
use uuid::Uuid;

use super::{require_file, EntityCreateWorkflow, MediaPolicies};

/// Job board companies, each registered with a logo.
#[derive(Clone)]
pub struct CompanyService {
    companies: Arc<dyn CompanyRepository>,
    workflow: EntityCreateWorkflow,
    policies: MediaPolicies,
}

impl CompanyService {
    pub fn new(
        companies: Arc<dyn CompanyRepository>,
        workflow: EntityCreateWorkflow,
        policies: MediaPolicies,
    ) -> Self {
        Self {
            companies,
            workflow,
            policies,
        }
    }

    /// The email check runs before the upload starts; the unique index still
    /// decides races, and the loser's logo is cleaned up.
    #[tracing::instrument(skip_all, fields(owner_id = %identity.subject_id, email = %form.email))]
    pub async fn register(
        &self,
        identity: &Identity,
        form: RegisterCompanyRequest,
        logo: Option<UploadRequest>,
    ) -> Result<Company, AppError> {
        let logo = require_file(&form, logo, "logo")?;
        let email = form.email.trim().to_lowercase();

        if self.companies.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(
                "A company with this email already exists".to_string(),
            ));
        }

        let logo = self
            .workflow
            .start_upload(logo, &self.policies.image, Destination::companies())
            .wait()
            .await?;

        let company = self
            .workflow
            .persist(
                Some(&logo),
                self.companies.insert(NewCompany {
                    owner_id: identity.subject_id,
                    name: sanitize_text(&form.name),
                    email,
                    description: sanitize_text(&form.description),
                    website: sanitize_text(&form.website),
                    location: sanitize_text(&form.location),
                    logo: logo.clone(),
                }),
            )
            .await?;

        tracing::info!(company_id = %company.id, "Company registered");
        Ok(company)
    }

    pub async fn get(&self, id: Uuid) -> Result<Company, AppError> {
        self.companies
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Company not found".to_string()))
    }

    pub async fn list(&self) -> Result<Vec<Company>, AppError> {
        self.companies.list().await
    }

    #[tracing::instrument(skip_all, fields(company_id = %id))]
    pub async fn delete(&self, identity: &Identity, id: Uuid) -> Result<(), AppError> {
        let existing = self.get(id).await?;
        identity.ensure_owner(existing.owner_id)?;

        if let Some(company) = self.companies.delete(id).await? {
            self.workflow.cleanup().cleanup(company.logo);
            tracing::info!("Company deleted");
        }
        Ok(())
    }
}
