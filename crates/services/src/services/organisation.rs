use db::models::{
    organisation::{CreateOrganisation, Organisation, UpdateOrganisation},
    user::{CreateUser, Role, User},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    auth::{ADMIN, ANY_ROLE, Scope},
    error::{ActionError, Found, StoreContext},
    storage::{ObjectStore, UploadKind, store_upload},
    validation::{email, percentage, required_text},
};

/// First organisation and its initial admin.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct BootstrapOrganisation {
    pub name: String,
    pub slug: String,
    pub admin_email: String,
    pub admin_name: String,
}

#[derive(Clone)]
pub struct OrganisationService {
    pool: SqlitePool,
}

impl OrganisationService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an organisation with its first admin in one transaction.
    pub async fn bootstrap(
        &self,
        data: &BootstrapOrganisation,
    ) -> Result<(Organisation, User), ActionError> {
        let slug = data.slug.trim().to_lowercase();
        if !utils::text::is_valid_slug(&slug) {
            return Err(ActionError::validation(
                "Slug may only contain lowercase letters, digits and hyphens",
            ));
        }
        let organisation = CreateOrganisation {
            name: required_text("Name", &data.name, 120)?,
            slug,
            pass_rate_threshold: None,
        };
        let admin = CreateUser {
            email: email(&data.admin_email)?,
            full_name: required_text("Full name", &data.admin_name, 120)?,
            role: Role::Admin,
            client_id: None,
        };

        let mut tx = self.pool.begin().await.store("Failed to create organisation")?;
        let organisation = Organisation::create(&mut *tx, &organisation, Uuid::new_v4())
            .await
            .store_or_conflict(
                "Failed to create organisation",
                "An organisation with this slug already exists",
            )?;
        let admin = User::create(&mut *tx, organisation.id, &admin, Uuid::new_v4())
            .await
            .store("Failed to create organisation")?;
        tx.commit().await.store("Failed to create organisation")?;

        info!(org_id = %organisation.id, slug = %organisation.slug, admin_id = %admin.id, "Organisation bootstrapped");
        Ok((organisation, admin))
    }

    pub async fn get(&self, scope: &Scope) -> Result<Organisation, ActionError> {
        scope.require(ANY_ROLE)?;
        Ok(scope.organisation.clone())
    }

    pub async fn update_settings(
        &self,
        scope: &Scope,
        data: &UpdateOrganisation,
    ) -> Result<Organisation, ActionError> {
        scope.require(ADMIN)?;
        let data = UpdateOrganisation {
            name: required_text("Name", &data.name, 120)?,
            pass_rate_threshold: percentage("Pass rate threshold", data.pass_rate_threshold)?,
        };
        let organisation = Organisation::update(&self.pool, scope.org_id(), &data)
            .await
            .store("Failed to update organisation")?
            .found("Organisation")?;
        info!(org_id = %organisation.id, threshold = organisation.pass_rate_threshold, "Organisation settings updated");
        Ok(organisation)
    }

    pub async fn upload_logo(
        &self,
        scope: &Scope,
        store: &dyn ObjectStore,
        content_type: &str,
        bytes: &[u8],
        max_bytes: usize,
    ) -> Result<Organisation, ActionError> {
        scope.require(ADMIN)?;
        let key = store_upload(
            store,
            UploadKind::Logo,
            (scope.org_id(), "organisation", scope.org_id()),
            content_type,
            bytes,
            max_bytes,
        )
        .await?;
        let organisation = Organisation::set_logo_path(&self.pool, scope.org_id(), &key)
            .await
            .store("Failed to save logo")?
            .found("Organisation")?;

        if let Some(previous) = &scope.organisation.logo_path {
            if let Err(e) = store.delete(previous).await {
                warn!(error = %e, key = %previous, "Failed to remove replaced logo");
            }
        }
        Ok(organisation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{storage::LocalObjectStore, test_support::Fixture};

    #[tokio::test]
    async fn bootstrap_creates_org_and_admin() {
        let fx = Fixture::new().await;
        let service = OrganisationService::new(fx.pool());
        let (org, admin) = service
            .bootstrap(&BootstrapOrganisation {
                name: "Sparkle Co".to_string(),
                slug: "Sparkle-Co".to_string(),
                admin_email: "Owner@Sparkle.test".to_string(),
                admin_name: "Owner".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(org.slug, "sparkle-co");
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.email, "owner@sparkle.test");

        let err = service
            .bootstrap(&BootstrapOrganisation {
                name: "Again".to_string(),
                slug: "acme".to_string(),
                admin_email: "a@b.test".to_string(),
                admin_name: "A".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Conflict(_)));
    }

    #[tokio::test]
    async fn threshold_must_be_a_percentage() {
        let fx = Fixture::new().await;
        let service = OrganisationService::new(fx.pool());
        let err = service
            .update_settings(
                &fx.admin(),
                &UpdateOrganisation {
                    name: "Acme".to_string(),
                    pass_rate_threshold: 120,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Validation(_)));

        let updated = service
            .update_settings(
                &fx.admin(),
                &UpdateOrganisation {
                    name: "Acme Cleaning".to_string(),
                    pass_rate_threshold: 90,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.pass_rate_threshold, 90);
    }

    #[tokio::test]
    async fn logo_upload_sets_the_path() {
        let fx = Fixture::new().await;
        let service = OrganisationService::new(fx.pool());
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let org = service
            .upload_logo(&fx.admin(), &store, "image/png", b"png", 1024)
            .await
            .unwrap();
        assert!(org.logo_path.unwrap().ends_with(".png"));

        let err = service
            .upload_logo(&fx.supervisor(), &store, "image/png", b"png", 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Unauthorized));
    }
}
