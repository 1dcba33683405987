/// Identity Resolution
///
/// Maps a validated token subject (a phone number) to the persisted user
/// record. The store is supplied by the caller; there is no cache.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use crate::error::{AuthError, ValidationError};

/// Role of a registered user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(ValidationError::InvalidFormat("role".to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated caller, as loaded from storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: i32,
    pub fullname: String,
    pub phone_number: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(sqlx::FromRow)]
struct IdentityRow {
    user_id: i32,
    fullname: String,
    phone_number: String,
    role: String,
}

impl TryFrom<IdentityRow> for Identity {
    type Error = AuthError;

    fn try_from(row: IdentityRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse()
            .map_err(|_| AuthError::Internal(format!("Unknown role {:?} for user {}", row.role, row.user_id)))?;

        Ok(Identity {
            user_id: row.user_id,
            fullname: row.fullname,
            phone_number: row.phone_number,
            role,
        })
    }
}

/// Lookup capability the resolver needs from persistence
#[async_trait]
pub trait IdentityStore: Send {
    /// Find the identity whose phone number equals `subject` exactly
    async fn find_by_subject(&mut self, subject: &str) -> Result<Option<Identity>, AuthError>;
}

#[async_trait]
impl IdentityStore for PgConnection {
    async fn find_by_subject(&mut self, subject: &str) -> Result<Option<Identity>, AuthError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            "SELECT user_id, fullname, phone_number, role FROM users WHERE phone_number = $1",
        )
        .bind(subject)
        .fetch_optional(&mut *self)
        .await
        .map_err(|e| AuthError::Internal(format!("Identity lookup failed: {}", e)))?;

        row.map(Identity::try_from).transpose()
    }
}

/// Takes a connection from the pool for the duration of one lookup
#[async_trait]
impl IdentityStore for PgPool {
    async fn find_by_subject(&mut self, subject: &str) -> Result<Option<Identity>, AuthError> {
        let mut conn = self
            .acquire()
            .await
            .map_err(|e| AuthError::Internal(format!("No database connection available: {}", e)))?;

        IdentityStore::find_by_subject(&mut *conn, subject).await
    }
}

/// Resolve a token subject to its identity
///
/// # Errors
/// `InvalidCredentials` when no identity matches, so a valid token for a
/// deleted account looks exactly like a bad token.
pub async fn resolve<S>(store: &mut S, subject: &str) -> Result<Identity, AuthError>
where
    S: IdentityStore + ?Sized,
{
    match store.find_by_subject(subject).await? {
        Some(identity) => Ok(identity),
        None => {
            tracing::debug!("Token subject did not resolve to a user");
            Err(AuthError::InvalidCredentials)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory store keyed by phone number
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        pub(crate) identities: HashMap<String, Identity>,
        pub(crate) lookups: usize,
        pub(crate) fail: bool,
    }

    impl MemoryStore {
        pub(crate) fn with(identities: Vec<Identity>) -> Self {
            Self {
                identities: identities
                    .into_iter()
                    .map(|i| (i.phone_number.clone(), i))
                    .collect(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl IdentityStore for MemoryStore {
        async fn find_by_subject(&mut self, subject: &str) -> Result<Option<Identity>, AuthError> {
            self.lookups += 1;
            if self.fail {
                return Err(AuthError::Internal("store offline".to_string()));
            }
            Ok(self.identities.get(subject).cloned())
        }
    }

    pub(crate) fn alice() -> Identity {
        Identity {
            user_id: 1,
            fullname: "Alice Example".to_string(),
            phone_number: "+15551234567".to_string(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn test_resolve_known_subject() {
        let mut store = MemoryStore::with(vec![alice()]);

        let identity = resolve(&mut store, "+15551234567").await.expect("Failed to resolve");

        assert_eq!(identity, alice());
    }

    #[tokio::test]
    async fn test_resolve_unknown_subject_is_invalid_credentials() {
        let mut store = MemoryStore::with(vec![alice()]);

        let result = resolve(&mut store, "+15550000000").await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_resolve_is_exact_match() {
        let mut store = MemoryStore::with(vec![alice()]);

        for near_miss in ["15551234567", " +15551234567", "+15551234567 ", ""] {
            let result = resolve(&mut store, near_miss).await;
            assert!(
                matches!(result, Err(AuthError::InvalidCredentials)),
                "{:?} should not resolve",
                near_miss
            );
        }
    }

    #[tokio::test]
    async fn test_resolve_does_not_cache() {
        let mut store = MemoryStore::with(vec![alice()]);

        resolve(&mut store, "+15551234567").await.expect("Failed to resolve");
        store.identities.clear();
        let second = resolve(&mut store, "+15551234567").await;

        assert!(matches!(second, Err(AuthError::InvalidCredentials)));
        assert_eq!(store.lookups, 2);
    }

    #[tokio::test]
    async fn test_store_failure_is_internal() {
        let mut store = MemoryStore {
            fail: true,
            ..MemoryStore::default()
        };

        let result = resolve(&mut store, "+15551234567").await;

        assert!(matches!(result, Err(AuthError::Internal(_))));
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("Admin".parse::<Role>().is_err());
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_unknown_stored_role_is_internal() {
        let row = IdentityRow {
            user_id: 9,
            fullname: "Mallory".to_string(),
            phone_number: "+15559999999".to_string(),
            role: "superuser".to_string(),
        };

        assert!(matches!(Identity::try_from(row), Err(AuthError::Internal(_))));
    }
}
