/// Fundraiser Routes
///
/// Campaign submission (with document uploads), browsing and admin review.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::{ensure_admin, MessageResponse};
use crate::auth::Identity;
use crate::error::{not_found, AppError, ErrorContext};
use crate::image_client::ImageStorageClient;
use crate::validators::{
    is_valid_patient_age, parse_fundraiser_status, require_positive_amount, require_text,
};

const FUNDRAISER_COLUMNS: &str = r#"
    fundraiser_id, user_id, campaign_title, target_amount, category, location,
    patient_name, patient_age, patient_relation, hospital_name, story_text,
    medical_report_url, hospital_report_url, id_proof_url, campaign_image_url,
    bank_account_number, ifsc_code, phone_number, pan_number, agreed_terms, status
"#;

/// Campaign submission
///
/// The four document fields may hold base64 `data:` URIs, which are uploaded
/// before the row is written, or already-hosted URLs, which are kept.
#[derive(Deserialize)]
pub struct CreateFundraiserRequest {
    pub user_id: i32,
    pub campaign_title: String,
    pub target_amount: f64,
    pub category: String,
    pub location: String,
    pub patient_name: String,
    pub patient_age: i32,
    pub patient_relation: String,
    pub hospital_name: String,
    pub story_text: String,
    pub medical_report_url: Option<String>,
    pub hospital_report_url: Option<String>,
    pub id_proof_url: Option<String>,
    pub campaign_image_url: Option<String>,
    pub bank_account_number: String,
    pub ifsc_code: String,
    pub phone_number: Option<String>,
    pub pan_number: Option<String>,
    #[serde(default)]
    pub agreed_terms: bool,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct Fundraiser {
    pub fundraiser_id: i32,
    pub user_id: i32,
    pub campaign_title: String,
    pub target_amount: f64,
    pub category: String,
    pub location: String,
    pub patient_name: String,
    pub patient_age: i32,
    pub patient_relation: String,
    pub hospital_name: String,
    pub story_text: String,
    pub medical_report_url: Option<String>,
    pub hospital_report_url: Option<String>,
    pub id_proof_url: Option<String>,
    pub campaign_image_url: Option<String>,
    pub bank_account_number: String,
    pub ifsc_code: String,
    pub phone_number: Option<String>,
    pub pan_number: Option<String>,
    pub agreed_terms: bool,
    pub status: String,
}

#[derive(Serialize)]
pub struct CreateFundraiserResponse {
    pub fundraiser_id: i32,
    pub status: &'static str,
    pub message: &'static str,
}

/// Query string of `PATCH /fundraiser/{id}/status`
#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: String,
    pub story_text: Option<String>,
}

/// Resolve one document field to the value that gets stored
///
/// `data:` URIs are uploaded; a failed upload stores nothing rather than
/// the raw base64 payload.
async fn store_document(
    client: &ImageStorageClient,
    field: &'static str,
    value: Option<String>,
) -> Option<String> {
    let value = value.filter(|v| !v.trim().is_empty())?;
    if !value.starts_with("data:") {
        return Some(value);
    }

    match client.upload(&value).await {
        Ok(url) => {
            tracing::info!(field = field, "Document uploaded");
            Some(url)
        }
        Err(e) => {
            tracing::error!(field = field, error = %e, "Document upload failed, storing no URL");
            None
        }
    }
}

/// POST /fundraiser
///
/// # Errors
/// - 400: invalid field, or `user_id` does not reference a user
pub async fn create_fundraiser(
    form: web::Json<CreateFundraiserRequest>,
    pool: web::Data<PgPool>,
    image_client: web::Data<ImageStorageClient>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("fundraiser_create").with_user_id(form.user_id);
    let form = form.into_inner();

    let campaign_title = require_text("campaign_title", &form.campaign_title)?;
    let target_amount = require_positive_amount("target_amount", form.target_amount)?;
    let category = require_text("category", &form.category)?;
    let location = require_text("location", &form.location)?;
    let patient_name = require_text("patient_name", &form.patient_name)?;
    let patient_age = is_valid_patient_age(form.patient_age)?;
    let patient_relation = require_text("patient_relation", &form.patient_relation)?;
    let hospital_name = require_text("hospital_name", &form.hospital_name)?;
    let story_text = require_text("story_text", &form.story_text)?;
    let bank_account_number = require_text("bank_account_number", &form.bank_account_number)?;
    let ifsc_code = require_text("ifsc_code", &form.ifsc_code)?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = form.user_id,
        "Received campaign submission"
    );

    let client = image_client.get_ref();
    let (medical_report_url, hospital_report_url, id_proof_url, campaign_image_url) = futures::join!(
        store_document(client, "medical_report_url", form.medical_report_url),
        store_document(client, "hospital_report_url", form.hospital_report_url),
        store_document(client, "id_proof_url", form.id_proof_url),
        store_document(client, "campaign_image_url", form.campaign_image_url),
    );

    let fundraiser_id = sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO fundraiser_master (
            user_id, campaign_title, target_amount, category, location,
            patient_name, patient_age, patient_relation, hospital_name, story_text,
            medical_report_url, hospital_report_url, id_proof_url, campaign_image_url,
            bank_account_number, ifsc_code, phone_number, pan_number, agreed_terms, status
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, 'pending')
        RETURNING fundraiser_id
        "#,
    )
    .bind(form.user_id)
    .bind(&campaign_title)
    .bind(target_amount)
    .bind(&category)
    .bind(&location)
    .bind(&patient_name)
    .bind(patient_age)
    .bind(&patient_relation)
    .bind(&hospital_name)
    .bind(&story_text)
    .bind(&medical_report_url)
    .bind(&hospital_report_url)
    .bind(&id_proof_url)
    .bind(&campaign_image_url)
    .bind(&bank_account_number)
    .bind(&ifsc_code)
    .bind(&form.phone_number)
    .bind(&form.pan_number)
    .bind(form.agreed_terms)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        let e = AppError::from(e);
        context.log_error(&e);
        e
    })?;

    tracing::info!(
        request_id = %context.request_id,
        fundraiser_id = fundraiser_id,
        "Campaign created"
    );

    Ok(HttpResponse::Created().json(CreateFundraiserResponse {
        fundraiser_id,
        status: "success",
        message: "Campaign created successfully",
    }))
}

async fn fetch_fundraisers(pool: &PgPool, status: Option<&str>) -> Result<Vec<Fundraiser>, AppError> {
    let fundraisers = match status {
        Some(status) => {
            let sql = format!(
                "SELECT {} FROM fundraiser_master WHERE status = $1 ORDER BY fundraiser_id",
                FUNDRAISER_COLUMNS
            );
            sqlx::query_as::<_, Fundraiser>(&sql)
                .bind(status)
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!(
                "SELECT {} FROM fundraiser_master ORDER BY fundraiser_id",
                FUNDRAISER_COLUMNS
            );
            sqlx::query_as::<_, Fundraiser>(&sql).fetch_all(pool).await?
        }
    };

    Ok(fundraisers)
}

/// GET /fundraiser
pub async fn list_fundraisers(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let fundraisers = fetch_fundraisers(pool.get_ref(), None).await?;
    Ok(HttpResponse::Ok().json(fundraisers))
}

/// GET /fundraiser/status/pending
pub async fn list_pending_fundraisers(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let fundraisers = fetch_fundraisers(pool.get_ref(), Some("pending")).await?;
    Ok(HttpResponse::Ok().json(fundraisers))
}

/// GET /fundraiser/status/approved
pub async fn list_approved_fundraisers(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let fundraisers = fetch_fundraisers(pool.get_ref(), Some("approved")).await?;
    Ok(HttpResponse::Ok().json(fundraisers))
}

/// GET /fundraiser/{fundraiser_id}
pub async fn get_fundraiser(
    path: web::Path<i32>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let sql = format!(
        "SELECT {} FROM fundraiser_master WHERE fundraiser_id = $1",
        FUNDRAISER_COLUMNS
    );
    let fundraiser = sqlx::query_as::<_, Fundraiser>(&sql)
        .bind(path.into_inner())
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| not_found("Fundraiser"))?;

    Ok(HttpResponse::Ok().json(fundraiser))
}

/// PATCH /fundraiser/{fundraiser_id}/status?status=approved&story_text=...
///
/// Admin review. A non-empty `story_text` replaces the campaign story.
pub async fn update_fundraiser_status(
    path: web::Path<i32>,
    query: web::Query<StatusUpdate>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let fundraiser_id = path.into_inner();
    let context = ErrorContext::new("fundraiser_review").with_user_id(identity.user_id);
    ensure_admin(&identity)?;

    let query = query.into_inner();
    let status = parse_fundraiser_status(&query.status)?;
    let story_text = query.story_text.filter(|s| !s.trim().is_empty());

    let result = sqlx::query(
        r#"
        UPDATE fundraiser_master
        SET status = $1, story_text = COALESCE($2, story_text)
        WHERE fundraiser_id = $3
        "#,
    )
    .bind(status)
    .bind(&story_text)
    .bind(fundraiser_id)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(not_found("Fundraiser"));
    }

    tracing::info!(
        request_id = %context.request_id,
        fundraiser_id = fundraiser_id,
        status = status,
        story_replaced = story_text.is_some(),
        "Campaign reviewed"
    );

    Ok(HttpResponse::Ok().json(MessageResponse::new(format!("Fundraiser is now {}", status))))
}

/// DELETE /fundraiser/{fundraiser_id} (admin)
pub async fn delete_fundraiser(
    path: web::Path<i32>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let fundraiser_id = path.into_inner();
    ensure_admin(&identity)?;

    let result = sqlx::query("DELETE FROM fundraiser_master WHERE fundraiser_id = $1")
        .bind(fundraiser_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(not_found("Fundraiser"));
    }

    tracing::info!(
        fundraiser_id = fundraiser_id,
        admin_id = identity.user_id,
        "Campaign deleted"
    );

    Ok(HttpResponse::Ok().json(MessageResponse::new("Success")))
}
