/// HTTP route handlers
///
/// Authorization helpers live here since every protected handler needs them
/// after the JWT middleware has attached the caller's `Identity`.

mod donations;
mod fundraisers;
mod health_check;
mod stats;
mod success_stories;
mod users;

pub use donations::{create_donation, get_donation, list_donations};
pub use fundraisers::{
    create_fundraiser, delete_fundraiser, get_fundraiser, list_approved_fundraisers,
    list_fundraisers, list_pending_fundraisers, update_fundraiser_status,
};
pub use health_check::{greet, health_check};
pub use stats::{format_rupees, get_platform_stats, get_stats, update_platform_stats};
pub use success_stories::{create_success_story, delete_success_story, list_success_stories};
pub use users::{current_user, delete_user, list_users, login, register, update_user};

use serde::Serialize;

use crate::auth::Identity;
use crate::error::AppError;

/// Plain acknowledgement body
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Reject callers that are not admins
pub fn ensure_admin(identity: &Identity) -> Result<(), AppError> {
    if identity.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "user {} is not an admin",
            identity.user_id
        )))
    }
}

/// Allow the account owner or any admin
pub fn ensure_owner_or_admin(identity: &Identity, user_id: i32) -> Result<(), AppError> {
    if identity.user_id == user_id || identity.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "user {} may not act on user {}",
            identity.user_id, user_id
        )))
    }
}
