/// User Routes
///
/// Registration, login, the caller's own profile and account management.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::{ensure_admin, ensure_owner_or_admin, MessageResponse};
use crate::auth::{
    hash_password, verify_password, verify_unknown_account, HashedCredential, Identity, Role,
    TokenIssuer,
};
use crate::error::{not_found, AppError, AuthError, ErrorContext};
use crate::validators::{is_valid_fullname, is_valid_password, is_valid_phone_number, parse_role};

/// User registration request
///
/// `role` may be omitted or `user`; admins are promoted by another admin.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub fullname: String,
    pub phone_number: String,
    pub password: String,
    pub role: Option<String>,
}

/// Profile update request
///
/// `role` is optional; leaving it out keeps the stored role.
#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub fullname: String,
    pub phone_number: String,
    pub password: String,
    pub role: Option<String>,
}

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub phone_number: String,
    pub password: String,
}

/// Successful login
#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user_id: i32,
    pub fullname: String,
    pub role: String,
}

/// Public view of a user; never carries the password hash
#[derive(Serialize, sqlx::FromRow)]
pub struct UserResponse {
    pub user_id: i32,
    pub fullname: String,
    pub phone_number: String,
    pub role: String,
}

impl From<Identity> for UserResponse {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: identity.user_id,
            fullname: identity.fullname,
            phone_number: identity.phone_number,
            role: identity.role.to_string(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    user_id: i32,
    fullname: String,
    role: String,
    password_hash: String,
}

/// Hash on the blocking pool
async fn hash_off_thread(password: String) -> Result<HashedCredential, AppError> {
    let hashed = web::block(move || hash_password(&password)).await??;
    Ok(hashed)
}

/// POST /users
///
/// # Errors
/// - 400: invalid phone number, name, password or role
/// - 403: any role other than `user`
/// - 409: phone number already registered
pub async fn register(
    form: web::Json<RegisterRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");
    let form = form.into_inner();

    let fullname = is_valid_fullname(&form.fullname)?;
    let phone_number = is_valid_phone_number(&form.phone_number)?;
    is_valid_password(&form.password)?;
    let role = parse_role(form.role.as_deref())?;
    if role != Role::User {
        return Err(AppError::Forbidden(format!(
            "registration may not request role {}",
            role
        )));
    }

    let password_hash = hash_off_thread(form.password).await?;

    let user = sqlx::query_as::<_, UserResponse>(
        r#"
        INSERT INTO users (fullname, phone_number, password_hash, role)
        VALUES ($1, $2, $3, $4)
        RETURNING user_id, fullname, phone_number, role
        "#,
    )
    .bind(&fullname)
    .bind(&phone_number)
    .bind(password_hash.as_str())
    .bind(role.as_str())
    .fetch_one(pool.get_ref())
    .await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = user.user_id,
        role = %role,
        "User registered successfully"
    );

    Ok(HttpResponse::Created().json(user))
}

/// POST /users/login
///
/// Unknown phone number and wrong password produce the same 401, and both
/// pay for one bcrypt verification.
pub async fn login(
    form: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
    issuer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");
    let form = form.into_inner();
    let phone_number = form.phone_number.trim().to_string();

    let user = sqlx::query_as::<_, CredentialRow>(
        "SELECT user_id, fullname, role, password_hash FROM users WHERE phone_number = $1",
    )
    .bind(&phone_number)
    .fetch_optional(pool.get_ref())
    .await?;

    let password = form.password;
    let user = match user {
        Some(user) => user,
        None => {
            web::block(move || verify_unknown_account(&password)).await?;
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    let stored = HashedCredential::from_stored(user.password_hash);
    let password_valid = web::block(move || verify_password(&password, &stored)).await?;
    if !password_valid {
        return Err(AuthError::InvalidCredentials.into());
    }

    let access_token = issuer.issue(&phone_number)?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = user.user_id,
        "User logged in successfully"
    );

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        token_type: "bearer",
        user_id: user.user_id,
        fullname: user.fullname,
        role: user.role,
    }))
}

/// GET /users/me
pub async fn current_user(identity: web::ReqData<Identity>) -> HttpResponse {
    HttpResponse::Ok().json(UserResponse::from(identity.into_inner()))
}

/// GET /users (admin)
pub async fn list_users(
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    ensure_admin(&identity)?;

    let users = sqlx::query_as::<_, UserResponse>(
        "SELECT user_id, fullname, phone_number, role FROM users ORDER BY user_id",
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(users))
}

/// PUT /users/{user_id}
///
/// Owners may edit their own profile; only admins may change a role.
/// Changing the phone number leaves outstanding tokens unresolvable.
pub async fn update_user(
    path: web::Path<i32>,
    form: web::Json<UpdateUserRequest>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let identity = identity.into_inner();
    let context = ErrorContext::new("user_update").with_user_id(identity.user_id);
    ensure_owner_or_admin(&identity, user_id)?;

    let form = form.into_inner();
    let fullname = is_valid_fullname(&form.fullname)?;
    let phone_number = is_valid_phone_number(&form.phone_number)?;
    is_valid_password(&form.password)?;

    let role = match form.role.as_deref() {
        None => None,
        Some(requested) => {
            let role = parse_role(Some(requested))?;
            if role != identity.role {
                ensure_admin(&identity)?;
            }
            Some(role)
        }
    };

    let password_hash = hash_off_thread(form.password).await?;

    let updated = sqlx::query_as::<_, UserResponse>(
        r#"
        UPDATE users
        SET fullname = $1, phone_number = $2, password_hash = $3, role = COALESCE($4, role)
        WHERE user_id = $5
        RETURNING user_id, fullname, phone_number, role
        "#,
    )
    .bind(&fullname)
    .bind(&phone_number)
    .bind(password_hash.as_str())
    .bind(role.map(|r| r.as_str()))
    .bind(user_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| not_found("User"))?;

    tracing::info!(
        request_id = %context.request_id,
        actor = identity.user_id,
        user_id = updated.user_id,
        "User profile updated"
    );

    Ok(HttpResponse::Ok().json(MessageResponse::new("Update successful")))
}

/// DELETE /users/{user_id}
pub async fn delete_user(
    path: web::Path<i32>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let context = ErrorContext::new("user_delete").with_user_id(identity.user_id);
    ensure_owner_or_admin(&identity, user_id)?;

    let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
        .bind(user_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(not_found("User"));
    }

    tracing::info!(
        request_id = %context.request_id,
        actor = identity.user_id,
        user_id = user_id,
        "User deleted"
    );

    Ok(HttpResponse::Ok().json(MessageResponse::new("User deleted successfully")))
}
