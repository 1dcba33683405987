use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::{not_found, AppError, ErrorContext};
use crate::validators::{require_positive_amount, require_text};

/// Donation record request; `user_id` is absent for anonymous donors
#[derive(Deserialize)]
pub struct CreateDonationRequest {
    pub user_id: Option<i32>,
    pub fundraiser_id: Option<i32>,
    pub donor_name: String,
    pub amount: f64,
    pub payment_method: String,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct Donation {
    pub donation_id: i32,
    pub user_id: Option<i32>,
    pub fundraiser_id: Option<i32>,
    pub donor_name: String,
    pub amount: f64,
    pub payment_method: String,
    pub donation_date: DateTime<Utc>,
}

const DONATION_COLUMNS: &str =
    "donation_id, user_id, fundraiser_id, donor_name, amount, payment_method, donation_date";

/// POST /donations
///
/// # Errors
/// - 400: invalid amount or text, or unknown `user_id`/`fundraiser_id`
pub async fn create_donation(
    form: web::Json<CreateDonationRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("donation_create");
    let form = form.into_inner();

    let donor_name = require_text("donor_name", &form.donor_name)?;
    let amount = require_positive_amount("amount", form.amount)?;
    let payment_method = require_text("payment_method", &form.payment_method)?;

    let sql = format!(
        r#"
        INSERT INTO donations (user_id, fundraiser_id, donor_name, amount, payment_method)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {}
        "#,
        DONATION_COLUMNS
    );
    let donation = sqlx::query_as::<_, Donation>(&sql)
        .bind(form.user_id)
        .bind(form.fundraiser_id)
        .bind(&donor_name)
        .bind(amount)
        .bind(&payment_method)
        .fetch_one(pool.get_ref())
        .await?;

    tracing::info!(
        request_id = %context.request_id,
        donation_id = donation.donation_id,
        fundraiser_id = ?donation.fundraiser_id,
        amount = donation.amount,
        "Donation recorded"
    );

    Ok(HttpResponse::Created().json(donation))
}

/// GET /donations
pub async fn list_donations(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let sql = format!("SELECT {} FROM donations ORDER BY donation_id", DONATION_COLUMNS);
    let donations = sqlx::query_as::<_, Donation>(&sql)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(donations))
}

/// GET /donations/{donation_id}
pub async fn get_donation(
    path: web::Path<i32>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let sql = format!("SELECT {} FROM donations WHERE donation_id = $1", DONATION_COLUMNS);
    let donation = sqlx::query_as::<_, Donation>(&sql)
        .bind(path.into_inner())
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| not_found("Donation"))?;

    Ok(HttpResponse::Ok().json(donation))
}
