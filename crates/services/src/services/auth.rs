//! Session claims and the single role/tenant guard every action goes through.

use db::models::{
    organisation::Organisation,
    user::{Role, User},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use utils::session::{SessionCodec, SessionError};
use uuid::Uuid;

use super::error::{ActionError, StoreContext};

pub const ADMIN: &[Role] = &[Role::Admin];
pub const STAFF: &[Role] = &[Role::Admin, Role::Supervisor];
pub const JANITOR: &[Role] = &[Role::Janitor];
pub const CLIENT: &[Role] = &[Role::Client];
pub const ANY_ROLE: &[Role] = &[Role::Admin, Role::Supervisor, Role::Janitor, Role::Client];

/// Claims issued by the identity provider. Trusted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub org: Uuid,
    pub role: Role,
    #[serde(default)]
    pub client: Option<Uuid>,
    pub exp: i64,
}

impl SessionClaims {
    pub fn new(codec: &SessionCodec, user_id: Uuid, organisation_id: Uuid, role: Role) -> Self {
        Self {
            sub: user_id,
            org: organisation_id,
            role,
            client: None,
            exp: codec.expiry_from_now(),
        }
    }

    pub fn with_client(mut self, client_id: Option<Uuid>) -> Self {
        self.client = client_id;
        self
    }

    pub fn decode(codec: &SessionCodec, token: &str) -> Result<Self, SessionError> {
        codec.verify(token)
    }
}

/// Authorized caller inside one organisation.
#[derive(Debug, Clone)]
pub struct Scope {
    pub organisation: Organisation,
    pub user_id: Uuid,
    pub role: Role,
    pub client_id: Option<Uuid>,
}

impl Scope {
    pub fn org_id(&self) -> Uuid {
        self.organisation.id
    }

    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn is_staff(&self) -> bool {
        STAFF.contains(&self.role)
    }

    /// Re-check the role inside an action, independent of the route it came through.
    pub fn require(&self, allowed: &[Role]) -> Result<(), ActionError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(ActionError::Unauthorized)
        }
    }
}

/// Check that the session belongs to the organisation named by `org_slug` and
/// that its user currently holds one of `allowed`. Any mismatch is reported
/// uniformly as `Unauthorized`.
///
/// Role and client come from the user row, so role changes and deactivation
/// take effect before the session expires.
pub async fn authorize(
    pool: &SqlitePool,
    claims: &SessionClaims,
    org_slug: &str,
    allowed: &[Role],
) -> Result<Scope, ActionError> {
    let organisation = Organisation::find_by_slug(pool, org_slug)
        .await
        .store("Failed to load organisation")?
        .ok_or(ActionError::Unauthorized)?;

    if organisation.id != claims.org {
        debug!(user_id = %claims.sub, org_slug, "Session belongs to another organisation");
        return Err(ActionError::Unauthorized);
    }

    let user = match User::find_by_id(pool, organisation.id, claims.sub)
        .await
        .store("Failed to load user")?
    {
        Some(user) if user.is_active => user,
        _ => {
            debug!(user_id = %claims.sub, org_slug, "User is missing or deactivated");
            return Err(ActionError::Unauthorized);
        }
    };
    if !allowed.contains(&user.role) {
        debug!(user_id = %user.id, role = %user.role, org_slug, "Role not allowed");
        return Err(ActionError::Unauthorized);
    }

    Ok(Scope {
        organisation,
        user_id: user.id,
        role: user.role,
        client_id: user.client_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::Fixture;

    #[tokio::test]
    async fn matching_org_and_role_is_authorized() {
        let fx = Fixture::new().await;
        let claims = fx.claims(fx.admin_id, Role::Admin);
        let scope = authorize(&fx.pool(), &claims, "acme", STAFF).await.unwrap();
        assert_eq!(scope.org_id(), fx.org.id);
        assert!(scope.is_staff());
    }

    #[tokio::test]
    async fn wrong_role_is_unauthorized() {
        let fx = Fixture::new().await;
        let claims = fx.claims(fx.janitor_id, Role::Janitor);
        let err = authorize(&fx.pool(), &claims, "acme", ADMIN).await.unwrap_err();
        assert!(matches!(err, ActionError::Unauthorized));
    }

    #[tokio::test]
    async fn deactivated_user_is_unauthorized() {
        let fx = Fixture::new().await;
        User::set_active(&fx.pool(), fx.org.id, fx.janitor_id, false)
            .await
            .unwrap();
        let claims = fx.claims(fx.janitor_id, Role::Janitor);
        let err = authorize(&fx.pool(), &claims, "acme", JANITOR).await.unwrap_err();
        assert!(matches!(err, ActionError::Unauthorized));
    }

    #[tokio::test]
    async fn other_tenant_is_unauthorized() {
        let fx = Fixture::new().await;
        let mut claims = fx.claims(fx.admin_id, Role::Admin);
        claims.org = Uuid::new_v4();
        let err = authorize(&fx.pool(), &claims, "acme", ADMIN).await.unwrap_err();
        assert!(matches!(err, ActionError::Unauthorized));

        let claims = fx.claims(fx.admin_id, Role::Admin);
        let err = authorize(&fx.pool(), &claims, "unknown-org", ADMIN)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Unauthorized));
    }

    #[tokio::test]
    async fn role_changes_apply_to_existing_sessions() {
        let fx = Fixture::new().await;
        let claims = fx.claims(fx.janitor_id, Role::Janitor);
        User::update_role(&fx.pool(), fx.org.id, fx.janitor_id, Role::Supervisor, None)
            .await
            .unwrap();

        let scope = authorize(&fx.pool(), &claims, "acme", STAFF).await.unwrap();
        assert_eq!(scope.role, Role::Supervisor);
        let err = authorize(&fx.pool(), &claims, "acme", JANITOR).await.unwrap_err();
        assert!(matches!(err, ActionError::Unauthorized));
    }

    #[tokio::test]
    async fn client_scope_follows_the_user_row() {
        let fx = Fixture::new().await;
        let client = fx.client();
        let claims = fx
            .claims(client.user_id, Role::Client)
            .with_client(Some(Uuid::new_v4()));
        let scope = authorize(&fx.pool(), &claims, "acme", &[Role::Client])
            .await
            .unwrap();
        assert_eq!(scope.client_id, client.client_id);
    }
}
