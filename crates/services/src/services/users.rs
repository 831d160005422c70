//! Organisation members and invitations.

use chrono::{Duration, Utc};
use db::models::{
    client::Client,
    invitation::{CreateInvitation, Invitation},
    organisation::Organisation,
    user::{CreateUser, Role, User},
};
use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;
use ts_rs::TS;
use utils::session::SessionCodec;
use uuid::Uuid;

use super::{
    auth::{ADMIN, Scope, SessionClaims},
    error::{ActionError, Found, StoreContext},
    validation::{email, required_text},
};

pub const DEFAULT_INVITATION_TTL_HOURS: i64 = 7 * 24;
const INVITATION_TOKEN_LEN: usize = 48;

/// Newly created invitation with the token the invitee needs. The token is
/// only ever returned here.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct IssuedInvitation {
    pub invitation: Invitation,
    pub token: String,
    pub accept_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ChangeRole {
    pub role: Role,
    pub client_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct SetActive {
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AcceptedInvitation {
    pub user: User,
    pub organisation_slug: String,
    pub session_token: String,
}

fn invitation_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(INVITATION_TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[derive(Clone)]
pub struct UserService {
    pool: SqlitePool,
    invitation_ttl: Duration,
}

impl UserService {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_invitation_ttl(pool, Duration::hours(DEFAULT_INVITATION_TTL_HOURS))
    }

    pub fn with_invitation_ttl(pool: SqlitePool, invitation_ttl: Duration) -> Self {
        Self {
            pool,
            invitation_ttl,
        }
    }

    /// Client users must name a client of the organisation; everyone else must not.
    async fn check_client(
        &self,
        organisation_id: Uuid,
        role: Role,
        client_id: Option<Uuid>,
    ) -> Result<Option<Uuid>, ActionError> {
        match (role, client_id) {
            (Role::Client, Some(client_id)) => {
                Client::find_by_id(&self.pool, organisation_id, client_id)
                    .await
                    .store("Failed to load client")?
                    .found("Client")?;
                Ok(Some(client_id))
            }
            (Role::Client, None) => Err(ActionError::validation("Client users need a client")),
            (_, _) => Ok(None),
        }
    }

    pub async fn list(&self, scope: &Scope, role: Option<Role>) -> Result<Vec<User>, ActionError> {
        scope.require(&[Role::Admin, Role::Supervisor])?;
        // Supervisors only need the janitor roster for assignments.
        let role = if scope.is(Role::Admin) { role } else { Some(Role::Janitor) };
        User::find_by_organisation(&self.pool, scope.org_id(), role)
            .await
            .store("Failed to load users")
    }

    pub async fn invite(
        &self,
        scope: &Scope,
        data: &CreateInvitation,
    ) -> Result<IssuedInvitation, ActionError> {
        scope.require(ADMIN)?;
        let data = CreateInvitation {
            email: email(&data.email)?,
            full_name: required_text("Full name", &data.full_name, 120)?,
            role: data.role,
            client_id: self.check_client(scope.org_id(), data.role, data.client_id).await?,
        };
        let existing = User::find_by_email(&self.pool, scope.org_id(), &data.email)
            .await
            .store("Failed to create invitation")?;
        if existing.is_some() {
            return Err(ActionError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }

        let token = invitation_token();
        let expires_at = Utc::now() + self.invitation_ttl;
        let invitation = Invitation::create(
            &self.pool,
            scope.org_id(),
            &data,
            &token,
            scope.user_id,
            expires_at,
        )
        .await
        .store("Failed to create invitation")?;
        info!(
            invitation_id = %invitation.id,
            role = %invitation.role,
            expires_at = %invitation.expires_at,
            "Invitation created"
        );

        Ok(IssuedInvitation {
            invitation,
            accept_path: format!("/invitations/{token}"),
            token,
        })
    }

    pub async fn pending_invitations(&self, scope: &Scope) -> Result<Vec<Invitation>, ActionError> {
        scope.require(ADMIN)?;
        Invitation::find_pending(&self.pool, scope.org_id())
            .await
            .store("Failed to load invitations")
    }

    pub async fn revoke_invitation(&self, scope: &Scope, invitation_id: Uuid) -> Result<(), ActionError> {
        scope.require(ADMIN)?;
        let deleted = Invitation::delete(&self.pool, scope.org_id(), invitation_id)
            .await
            .store("Failed to revoke invitation")?;
        if deleted == 0 {
            return Err(ActionError::NotFound("Invitation"));
        }
        Ok(())
    }

    /// Public: turn an invitation into a user and sign them in.
    pub async fn accept_invitation(
        &self,
        codec: &SessionCodec,
        token: &str,
    ) -> Result<AcceptedInvitation, ActionError> {
        let invitation = Invitation::find_by_token(&self.pool, token)
            .await
            .store("Failed to accept invitation")?
            .found("Invitation")?;
        if invitation.accepted_at.is_some() {
            return Err(ActionError::invalid_state("Invitation has already been used"));
        }
        if invitation.is_expired(Utc::now()) {
            return Err(ActionError::invalid_state("Invitation has expired"));
        }
        let organisation = Organisation::find_by_id(&self.pool, invitation.organisation_id)
            .await
            .store("Failed to accept invitation")?
            .found("Organisation")?;

        let mut tx = self.pool.begin().await.store("Failed to accept invitation")?;
        let claimed = Invitation::mark_accepted(&mut *tx, invitation.id)
            .await
            .store("Failed to accept invitation")?;
        if claimed == 0 {
            return Err(ActionError::invalid_state("Invitation has already been used"));
        }
        let user = User::create(
            &mut *tx,
            invitation.organisation_id,
            &CreateUser {
                email: invitation.email.clone(),
                full_name: invitation.full_name.clone(),
                role: invitation.role,
                client_id: invitation.client_id,
            },
            Uuid::new_v4(),
        )
        .await
        .store_or_conflict(
            "Failed to accept invitation",
            "A user with this email already exists",
        )?;
        tx.commit().await.store("Failed to accept invitation")?;

        let claims = SessionClaims::new(codec, user.id, organisation.id, user.role)
            .with_client(user.client_id);
        let session_token = codec
            .sign(&claims)
            .map_err(|_| ActionError::Storage("Failed to sign session".to_string()))?;
        info!(user_id = %user.id, org_id = %organisation.id, role = %user.role, "Invitation accepted");

        Ok(AcceptedInvitation {
            user,
            organisation_slug: organisation.slug,
            session_token,
        })
    }

    pub async fn change_role(
        &self,
        scope: &Scope,
        user_id: Uuid,
        data: &ChangeRole,
    ) -> Result<User, ActionError> {
        scope.require(ADMIN)?;
        if user_id == scope.user_id {
            return Err(ActionError::validation("You cannot change your own role"));
        }
        let client_id = self.check_client(scope.org_id(), data.role, data.client_id).await?;
        let user = User::update_role(&self.pool, scope.org_id(), user_id, data.role, client_id)
            .await
            .store("Failed to change role")?
            .found("User")?;
        info!(user_id = %user.id, role = %user.role, "Role changed");
        Ok(user)
    }

    pub async fn set_active(
        &self,
        scope: &Scope,
        user_id: Uuid,
        data: &SetActive,
    ) -> Result<User, ActionError> {
        scope.require(ADMIN)?;
        if user_id == scope.user_id && !data.is_active {
            return Err(ActionError::validation("You cannot deactivate yourself"));
        }
        let user = User::set_active(&self.pool, scope.org_id(), user_id, data.is_active)
            .await
            .store("Failed to update user")?
            .found("User")?;
        info!(user_id = %user.id, is_active = user.is_active, "User activation changed");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::Fixture;

    fn invite(email: &str, role: Role, client_id: Option<Uuid>) -> CreateInvitation {
        CreateInvitation {
            email: email.to_string(),
            full_name: "New Person".to_string(),
            role,
            client_id,
        }
    }

    #[tokio::test]
    async fn invitation_is_accepted_once() {
        let fx = Fixture::new().await;
        let service = UserService::new(fx.pool());
        let issued = service
            .invite(&fx.admin(), &invite("New@Acme.test", Role::Janitor, None))
            .await
            .unwrap();
        assert_eq!(issued.token.len(), INVITATION_TOKEN_LEN);
        assert_eq!(issued.invitation.email, "new@acme.test");
        assert_eq!(service.pending_invitations(&fx.admin()).await.unwrap().len(), 1);

        let accepted = service.accept_invitation(&fx.codec, &issued.token).await.unwrap();
        assert_eq!(accepted.user.role, Role::Janitor);
        assert_eq!(accepted.organisation_slug, "acme");
        let claims = SessionClaims::decode(&fx.codec, &accepted.session_token).unwrap();
        assert_eq!(claims.sub, accepted.user.id);
        assert_eq!(claims.org, fx.org.id);

        let err = service.accept_invitation(&fx.codec, &issued.token).await.unwrap_err();
        assert_eq!(err.to_string(), "Invitation has already been used");
        assert!(service.pending_invitations(&fx.admin()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn expired_invitations_are_rejected() {
        let fx = Fixture::new().await;
        let service = UserService::with_invitation_ttl(fx.pool(), Duration::hours(-1));
        let issued = service
            .invite(&fx.admin(), &invite("late@acme.test", Role::Supervisor, None))
            .await
            .unwrap();
        let err = service.accept_invitation(&fx.codec, &issued.token).await.unwrap_err();
        assert_eq!(err.to_string(), "Invitation has expired");
    }

    #[tokio::test]
    async fn client_invitations_need_a_client() {
        let fx = Fixture::new().await;
        let service = UserService::new(fx.pool());
        let err = service
            .invite(&fx.admin(), &invite("c@client.test", Role::Client, None))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Client users need a client");

        let issued = service
            .invite(&fx.admin(), &invite("c@client.test", Role::Client, Some(fx.client_id)))
            .await
            .unwrap();
        let accepted = service.accept_invitation(&fx.codec, &issued.token).await.unwrap();
        let claims = SessionClaims::decode(&fx.codec, &accepted.session_token).unwrap();
        assert_eq!(claims.client, Some(fx.client_id));
    }

    #[tokio::test]
    async fn existing_members_cannot_be_invited_again() {
        let fx = Fixture::new().await;
        let service = UserService::new(fx.pool());
        let err = service
            .invite(&fx.admin(), &invite("jan@acme.test", Role::Janitor, None))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Conflict(_)));
    }

    #[tokio::test]
    async fn admins_cannot_deactivate_themselves() {
        let fx = Fixture::new().await;
        let service = UserService::new(fx.pool());
        let err = service
            .set_active(&fx.admin(), fx.admin_id, &SetActive { is_active: false })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "You cannot deactivate yourself");

        let janitor = service
            .set_active(&fx.admin(), fx.janitor_id, &SetActive { is_active: false })
            .await
            .unwrap();
        assert!(!janitor.is_active);
    }

    #[tokio::test]
    async fn role_changes_clear_the_client_link() {
        let fx = Fixture::new().await;
        let service = UserService::new(fx.pool());
        let user = service
            .change_role(
                &fx.admin(),
                fx.client_user_id,
                &ChangeRole {
                    role: Role::Supervisor,
                    client_id: Some(fx.client_id),
                },
            )
            .await
            .unwrap();
        assert_eq!(user.role, Role::Supervisor);
        assert_eq!(user.client_id, None);
    }

    #[tokio::test]
    async fn supervisors_only_see_janitors() {
        let fx = Fixture::new().await;
        let service = UserService::new(fx.pool());
        let users = service.list(&fx.supervisor(), None).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].role, Role::Janitor);
        assert_eq!(service.list(&fx.admin(), None).await.unwrap().len(), 4);
    }
}
