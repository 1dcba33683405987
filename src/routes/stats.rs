/// Statistics Routes
///
/// `/stats` is computed on every request. `/platform-stats` is a single
/// stored row whose manual figures are edited by admins; its funds total is
/// always recomputed from donations.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::ensure_admin;
use crate::auth::Identity;
use crate::error::AppError;
use crate::validators::require_text;

const SEED_LIVES_IMPACTED: &str = "15,240";
const SEED_SUCCESSFUL_CAMPAIGNS: &str = "2,847";
const SEED_SUCCESS_RATE: &str = "98.5%";

#[derive(Serialize, sqlx::FromRow)]
pub struct Stats {
    pub total_fundraisers: i64,
    pub verified_fundraisers: i64,
    pub pending_fundraisers: i64,
    pub total_donations: f64,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct PlatformStats {
    pub id: i32,
    pub total_funds_raised: String,
    pub lives_impacted: String,
    pub successful_campaigns: String,
    pub success_rate: String,
}

/// Admin edit of the manual figures
///
/// Any `total_funds_raised` in the body is ignored.
#[derive(Deserialize)]
pub struct PlatformStatsUpdate {
    pub lives_impacted: String,
    pub successful_campaigns: String,
    pub success_rate: String,
}

/// `₹` followed by the amount rounded to whole rupees, grouped in thousands
pub fn format_rupees(amount: f64) -> String {
    let whole = if amount.is_finite() && amount > 0.0 {
        amount.round() as u64
    } else {
        0
    };
    let digits = whole.to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("₹{}", grouped)
}

async fn donation_total(pool: &PgPool) -> Result<f64, AppError> {
    let total = sqlx::query_scalar::<_, f64>("SELECT COALESCE(SUM(amount), 0) FROM donations")
        .fetch_one(pool)
        .await?;
    Ok(total)
}

/// GET /stats
pub async fn get_stats(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let stats = sqlx::query_as::<_, Stats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM fundraiser_master) AS total_fundraisers,
            (SELECT COUNT(*) FROM fundraiser_master WHERE status = 'approved') AS verified_fundraisers,
            (SELECT COUNT(*) FROM fundraiser_master WHERE status = 'pending') AS pending_fundraisers,
            (SELECT COALESCE(SUM(amount), 0) FROM donations) AS total_donations
        "#,
    )
    .fetch_one(pool.get_ref())
    .await?;

    tracing::debug!(
        total_fundraisers = stats.total_fundraisers,
        verified_fundraisers = stats.verified_fundraisers,
        pending_fundraisers = stats.pending_fundraisers,
        total_donations = stats.total_donations,
        "Computed dashboard stats"
    );

    Ok(HttpResponse::Ok().json(stats))
}

/// GET /platform-stats
///
/// Seeds the row on first use and re-syncs the funds total every time.
pub async fn get_platform_stats(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let total_funds_raised = format_rupees(donation_total(pool.get_ref()).await?);

    let stats = sqlx::query_as::<_, PlatformStats>(
        r#"
        INSERT INTO platform_stats (id, total_funds_raised, lives_impacted, successful_campaigns, success_rate)
        VALUES (1, $1, $2, $3, $4)
        ON CONFLICT (id) DO UPDATE SET total_funds_raised = EXCLUDED.total_funds_raised
        RETURNING id, total_funds_raised, lives_impacted, successful_campaigns, success_rate
        "#,
    )
    .bind(&total_funds_raised)
    .bind(SEED_LIVES_IMPACTED)
    .bind(SEED_SUCCESSFUL_CAMPAIGNS)
    .bind(SEED_SUCCESS_RATE)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(stats))
}

/// PUT /platform-stats (admin)
pub async fn update_platform_stats(
    form: web::Json<PlatformStatsUpdate>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    ensure_admin(&identity)?;

    let lives_impacted = require_text("lives_impacted", &form.lives_impacted)?;
    let successful_campaigns = require_text("successful_campaigns", &form.successful_campaigns)?;
    let success_rate = require_text("success_rate", &form.success_rate)?;
    let total_funds_raised = format_rupees(donation_total(pool.get_ref()).await?);

    let stats = sqlx::query_as::<_, PlatformStats>(
        r#"
        INSERT INTO platform_stats (id, total_funds_raised, lives_impacted, successful_campaigns, success_rate)
        VALUES (1, $1, $2, $3, $4)
        ON CONFLICT (id) DO UPDATE SET
            total_funds_raised = EXCLUDED.total_funds_raised,
            lives_impacted = EXCLUDED.lives_impacted,
            successful_campaigns = EXCLUDED.successful_campaigns,
            success_rate = EXCLUDED.success_rate
        RETURNING id, total_funds_raised, lives_impacted, successful_campaigns, success_rate
        "#,
    )
    .bind(&total_funds_raised)
    .bind(&lives_impacted)
    .bind(&successful_campaigns)
    .bind(&success_rate)
    .fetch_one(pool.get_ref())
    .await?;

    tracing::info!(admin_id = identity.user_id, "Platform stats updated");

    Ok(HttpResponse::Ok().json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rupees_groups_thousands() {
        assert_eq!(format_rupees(0.0), "₹0");
        assert_eq!(format_rupees(999.0), "₹999");
        assert_eq!(format_rupees(1000.0), "₹1,000");
        assert_eq!(format_rupees(1234567.8), "₹1,234,568");
        assert_eq!(format_rupees(100000000.0), "₹100,000,000");
    }

    #[test]
    fn test_format_rupees_rounds_to_whole_rupees() {
        assert_eq!(format_rupees(499.4), "₹499");
        assert_eq!(format_rupees(999.6), "₹1,000");
    }

    #[test]
    fn test_format_rupees_degenerate_input() {
        assert_eq!(format_rupees(-5.0), "₹0");
        assert_eq!(format_rupees(f64::NAN), "₹0");
    }
}
