/// Authentication module
///
/// Password hashing, access token issuance/validation and resolution of the
/// caller's identity from a bearer token.

mod claims;
mod identity;
mod jwt;
mod password;

pub use claims::Claims;
pub use identity::{resolve, Identity, IdentityStore, Role};
pub use jwt::TokenIssuer;
pub use password::{
    hash_password, verify_password, verify_unknown_account, HashedCredential, MAX_PASSWORD_BYTES,
};

use crate::error::AuthError;

/// Extract the token from an `Authorization: Bearer <token>` header value
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() && !token.contains(' ') {
        Some(token)
    } else {
        None
    }
}

/// Header → token → subject
///
/// A missing header, a non-bearer scheme and a token that fails validation
/// all yield the same `InvalidCredentials`.
pub fn subject_from_header(
    authorization: Option<&str>,
    issuer: &TokenIssuer,
) -> Result<String, AuthError> {
    let token = authorization
        .and_then(bearer_token)
        .ok_or(AuthError::InvalidCredentials)?;

    issuer.validate(token)
}

/// Run the whole request authentication sequence against `store`
pub async fn authenticate<S>(
    authorization: Option<&str>,
    issuer: &TokenIssuer,
    store: &mut S,
) -> Result<Identity, AuthError>
where
    S: IdentityStore + ?Sized,
{
    let subject = subject_from_header(authorization, issuer)?;
    resolve(store, &subject).await
}
