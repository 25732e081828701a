use chrono::{DateTime, Utc};
use roost_core::models::{NewPost, Post, PostUpdate};
use roost_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::{file_ref, missing_owner, size_column};
use crate::repository::PostRepository;

const POST_COLUMNS: &str = "id, owner_id, text, hashtags, music, location, is_private, \
     video_location, video_size_bytes, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    owner_id: Uuid,
    text: String,
    hashtags: Vec<String>,
    music: String,
    location: String,
    is_private: bool,
    video_location: String,
    video_size_bytes: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            owner_id: row.owner_id,
            text: row.text,
            hashtags: row.hashtags,
            music: row.music,
            location: row.location,
            is_private: row.is_private,
            video: file_ref(row.video_location, row.video_size_bytes),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for video posts
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PostRepository for PgPostRepository {
    #[tracing::instrument(skip(self, post), fields(db.table = "posts", db.operation = "insert", owner_id = %post.owner_id))]
    async fn insert(&self, post: NewPost) -> Result<Post, AppError> {
        let row = sqlx::query_as::<Postgres, PostRow>(&format!(
            r#"
            INSERT INTO posts (id, owner_id, text, hashtags, music, location, is_private,
                               video_location, video_size_bytes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(post.owner_id)
        .bind(&post.text)
        .bind(&post.hashtags)
        .bind(&post.music)
        .bind(&post.location)
        .bind(post.is_private)
        .bind(&post.video.location)
        .bind(size_column(&post.video))
        .fetch_one(&self.pool)
        .await
        .map_err(missing_owner)?;

        Ok(row.into())
    }

    #[tracing::instrument(skip(self), fields(db.table = "posts", db.operation = "select", db.record_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, AppError> {
        let row = sqlx::query_as::<Postgres, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Post::from))
    }

    #[tracing::instrument(skip(self), fields(db.table = "posts", db.operation = "select"))]
    async fn list_visible(&self, viewer: Uuid) -> Result<Vec<Post>, AppError> {
        let rows = sqlx::query_as::<Postgres, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE is_private = FALSE OR owner_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(viewer)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    #[tracing::instrument(skip(self, update), fields(db.table = "posts", db.operation = "update", db.record_id = %id))]
    async fn update(&self, id: Uuid, update: PostUpdate) -> Result<Option<Post>, AppError> {
        let row = sqlx::query_as::<Postgres, PostRow>(&format!(
            r#"
            UPDATE posts
            SET text = COALESCE($2, text),
                hashtags = COALESCE($3, hashtags),
                music = COALESCE($4, music),
                location = COALESCE($5, location),
                is_private = COALESCE($6, is_private),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.text)
        .bind(update.hashtags)
        .bind(update.music)
        .bind(update.location)
        .bind(update.is_private)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Post::from))
    }

    #[tracing::instrument(skip(self), fields(db.table = "posts", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<Option<Post>, AppError> {
        let row = sqlx::query_as::<Postgres, PostRow>(&format!(
            "DELETE FROM posts WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Post::from))
    }
}
