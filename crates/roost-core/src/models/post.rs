use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::file::StoredFileRef;

/// Short video post owned by an account.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Post {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub text: String,
    pub hashtags: Vec<String>,
    pub music: String,
    pub location: String,
    pub is_private: bool,
    pub video: StoredFileRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Private posts are only visible to their owner.
    pub fn visible_to(&self, viewer: Option<Uuid>) -> bool {
        !self.is_private || viewer == Some(self.owner_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub owner_id: Uuid,
    pub text: String,
    pub hashtags: Vec<String>,
    pub music: String,
    pub location: String,
    pub is_private: bool,
    pub video: StoredFileRef,
}

#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    pub text: Option<String>,
    pub hashtags: Option<Vec<String>>,
    pub music: Option<String>,
    pub location: Option<String>,
    pub is_private: Option<bool>,
}

/// Post form fields (multipart, with a `video` file part)
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreatePostRequest {
    #[validate(
        length(min = 1, max = 255),
        custom(function = "crate::validation::not_blank")
    )]
    pub text: String,
    /// Comma separated, `#` optional: `"#rust, axum"`
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub hashtags: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub music: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub location: String,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePostRequest {
    #[validate(
        length(min = 1, max = 255),
        custom(function = "crate::validation::not_blank")
    )]
    pub text: Option<String>,
    #[validate(length(max = 1000))]
    pub hashtags: Option<String>,
    #[validate(length(max = 255))]
    pub music: Option<String>,
    #[validate(length(max = 255))]
    pub location: Option<String>,
    pub is_private: Option<bool>,
}

/// Split a comma list into tags: trimmed, leading `#` removed, empties dropped.
pub fn parse_hashtags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|tag| tag.trim().trim_start_matches('#').trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hashtags() {
        assert_eq!(
            parse_hashtags(" #rust, axum ,, ##tokio, # "),
            vec!["rust".to_string(), "axum".to_string(), "tokio".to_string()]
        );
        assert!(parse_hashtags("").is_empty());
    }

    #[test]
    fn test_private_post_visible_only_to_owner() {
        let owner = Uuid::new_v4();
        let post = Post {
            id: Uuid::new_v4(),
            owner_id: owner,
            text: "hello".to_string(),
            hashtags: vec![],
            music: String::new(),
            location: String::new(),
            is_private: true,
            video: StoredFileRef::new("posts/clip_1.mp4", 10),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(post.visible_to(Some(owner)));
        assert!(!post.visible_to(Some(Uuid::new_v4())));
        assert!(!post.visible_to(None));
    }
}
