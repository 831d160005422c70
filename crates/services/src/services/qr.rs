//! Room QR codes: the landing URL printed on the code and where a scan lands.

use db::models::{organisation::Organisation, room::Room, user::Role};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::{
    auth::SessionClaims,
    error::{ActionError, Found, StoreContext},
};

pub fn landing_path(room_id: Uuid) -> String {
    format!("/qr/rooms/{room_id}")
}

/// Absolute URL encoded into the room's QR code.
pub fn landing_url(public_base_url: &str, room_id: Uuid) -> String {
    format!("{}{}", public_base_url.trim_end_matches('/'), landing_path(room_id))
}

pub fn login_redirect(room_id: Uuid) -> String {
    format!("/login?next={}", landing_path(room_id))
}

pub fn room_page(org_slug: &str, role: Role, room_id: Uuid) -> String {
    format!("/{org_slug}/{}/rooms/{room_id}", role.segment())
}

/// Where a scan should go. Callers without a usable session are sent to sign in.
pub async fn scan_target(
    pool: &SqlitePool,
    claims: Option<&SessionClaims>,
    room_id: Uuid,
) -> Result<String, ActionError> {
    let Some(claims) = claims else {
        return Ok(login_redirect(room_id));
    };
    let Some(organisation) = Organisation::find_by_id(pool, claims.org)
        .await
        .store("Failed to load organisation")?
    else {
        debug!(org_id = %claims.org, "Session organisation no longer exists");
        return Ok(login_redirect(room_id));
    };

    Room::find_by_id(pool, organisation.id, room_id)
        .await
        .store("Failed to load room")?
        .found("Room")?;
    Ok(room_page(&organisation.slug, claims.role, room_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::Fixture;

    #[test]
    fn landing_url_joins_cleanly() {
        let room = Uuid::nil();
        assert_eq!(
            landing_url("https://clean.example/", room),
            format!("https://clean.example/qr/rooms/{room}")
        );
    }

    #[tokio::test]
    async fn scans_route_by_session() {
        let fx = Fixture::new().await;
        let room = fx.room_ids[0];

        let anonymous = scan_target(&fx.pool(), None, room).await.unwrap();
        assert_eq!(anonymous, format!("/login?next=/qr/rooms/{room}"));

        let claims = fx.claims(fx.janitor_id, Role::Janitor);
        let janitor = scan_target(&fx.pool(), Some(&claims), room).await.unwrap();
        assert_eq!(janitor, format!("/acme/janitor/rooms/{room}"));

        let err = scan_target(&fx.pool(), Some(&claims), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::NotFound("Room")));
    }
}
