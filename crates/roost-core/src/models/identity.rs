use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// Authenticated caller, decoded from a bearer credential. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    pub subject_id: Uuid,
    pub display_name: String,
    pub email: String,
    pub verified: bool,
    pub avatar: Option<String>,
}

impl Identity {
    /// Forbidden unless this identity owns the resource.
    pub fn ensure_owner(&self, owner_id: Uuid) -> Result<(), AppError> {
        if self.subject_id == owner_id {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You are not allowed to modify this resource".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(id: Uuid) -> Identity {
        Identity {
            subject_id: id,
            display_name: "Ana".to_string(),
            email: "ana@x.com".to_string(),
            verified: true,
            avatar: None,
        }
    }

    #[test]
    fn test_owner_passes() {
        let id = Uuid::new_v4();
        assert!(identity(id).ensure_owner(id).is_ok());
    }

    #[test]
    fn test_non_owner_forbidden() {
        let err = identity(Uuid::new_v4())
            .ensure_owner(Uuid::new_v4())
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
