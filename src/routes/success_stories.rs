use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::{ensure_admin, MessageResponse};
use crate::auth::Identity;
use crate::error::{not_found, AppError};
use crate::validators::require_text;

#[derive(Deserialize)]
pub struct CreateSuccessStoryRequest {
    pub title: String,
    pub content: String,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct SuccessStory {
    pub id: i32,
    pub title: String,
    pub content: String,
}

/// GET /success-stories
pub async fn list_success_stories(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let stories = sqlx::query_as::<_, SuccessStory>(
        "SELECT id, title, content FROM success_stories ORDER BY id",
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(stories))
}

/// POST /success-stories (admin)
pub async fn create_success_story(
    form: web::Json<CreateSuccessStoryRequest>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    ensure_admin(&identity)?;

    let title = require_text("title", &form.title)?;
    let content = require_text("content", &form.content)?;

    let story = sqlx::query_as::<_, SuccessStory>(
        "INSERT INTO success_stories (title, content) VALUES ($1, $2) RETURNING id, title, content",
    )
    .bind(&title)
    .bind(&content)
    .fetch_one(pool.get_ref())
    .await?;

    tracing::info!(story_id = story.id, admin_id = identity.user_id, "Success story published");

    Ok(HttpResponse::Created().json(story))
}

/// DELETE /success-stories/{story_id} (admin)
pub async fn delete_success_story(
    path: web::Path<i32>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let story_id = path.into_inner();
    ensure_admin(&identity)?;

    let result = sqlx::query("DELETE FROM success_stories WHERE id = $1")
        .bind(story_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(not_found("Story"));
    }

    Ok(HttpResponse::Ok().json(MessageResponse::new("Story deleted successfully")))
}
