use std::sync::Arc;

use db::DBService;
use reqwest::{StatusCode, header};
use serde_json::{Value, json};
use server::{AppState, build_router, config::Config};
use services::services::{
    auth::SessionClaims,
    organisation::{BootstrapOrganisation, OrganisationService},
    storage::{LocalObjectStore, ObjectStore},
};
use tempfile::TempDir;
use tokio::net::TcpListener;

struct TestApp {
    base: String,
    client: reqwest::Client,
    admin_token: String,
    _storage: TempDir,
}

impl TestApp {
    async fn spawn() -> Self {
        let storage_dir = tempfile::tempdir().expect("tempdir");
        let root = storage_dir.path().to_string_lossy().to_string();
        let config = Config::from_lookup(|name| match name {
            "SESSION_SECRET" => Some("integration-secret".to_string()),
            "STORAGE_ROOT" => Some(root.clone()),
            "PUBLIC_BASE_URL" => Some("https://clean.example".to_string()),
            _ => None,
        })
        .expect("config");

        let db = DBService::in_memory().await.expect("db");
        let (organisation, admin) = OrganisationService::new(db.pool.clone())
            .bootstrap(&BootstrapOrganisation {
                name: "Acme Cleaning".to_string(),
                slug: "acme".to_string(),
                admin_email: "admin@acme.test".to_string(),
                admin_name: "Ada Admin".to_string(),
            })
            .await
            .expect("bootstrap");

        let storage: Arc<dyn ObjectStore> = Arc::new(LocalObjectStore::new(storage_dir.path()));
        let state = AppState::new(db, storage, config).expect("state");
        let claims = SessionClaims::new(&state.codec, admin.id, organisation.id, admin.role);
        let admin_token = state.codec.sign(&claims).expect("sign");

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let app = build_router(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("client");

        Self {
            base: format!("http://{addr}"),
            client,
            admin_token,
            _storage: storage_dir,
        }
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = self.client.request(method, format!("{}{}", self.base, path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.expect("request");
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.send(reqwest::Method::GET, path, Some(token), None).await
    }

    async fn post(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::POST, path, Some(token), Some(body))
            .await
    }

    async fn put(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::PUT, path, Some(token), Some(body))
            .await
    }

    /// POST and return `data`, asserting success.
    async fn create(&self, path: &str, token: &str, body: Value) -> Value {
        let (status, body) = self.post(path, token, body).await;
        assert_eq!(status, StatusCode::OK, "POST {path}: {body}");
        body["data"].clone()
    }
}

fn id(value: &Value) -> String {
    value["id"].as_str().expect("id").to_string()
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::spawn().await;
    let (status, body) = app
        .send(reqwest::Method::GET, "/api/health", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], "OK");
}

#[tokio::test]
async fn requests_without_a_session_are_rejected() {
    let app = TestApp::spawn().await;
    let (status, body) = app
        .send(reqwest::Method::GET, "/api/acme/admin/users", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = app.get("/api/acme/admin/users", "not-a-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sessions_do_not_cross_organisations() {
    let app = TestApp::spawn().await;
    let (status, body) = app.get("/api/other-org/admin/users", &app.admin_token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Unauthorized");
}

#[tokio::test]
async fn cleaning_round_from_setup_to_report() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token.as_str();

    // Structure: client, building with one floor, typed rooms and a default checklist.
    let office = app
        .create("/api/acme/admin/room-types", admin, json!({ "name": "Office" }))
        .await;
    let client = app
        .create(
            "/api/acme/admin/clients",
            admin,
            json!({ "name": "Harbour Trust", "contact_email": null }),
        )
        .await;
    let building = app
        .create(
            "/api/acme/admin/buildings",
            admin,
            json!({
                "client_id": id(&client),
                "name": "Harbour House",
                "address": "1 Quay St",
                "floors": [{ "name": "Ground", "level": 0 }]
            }),
        )
        .await;
    let floor_id = building["floors"][0]["id"].as_str().expect("floor").to_string();
    for name in ["G.01", "G.02"] {
        app.create(
            "/api/acme/admin/rooms",
            admin,
            json!({ "floor_id": floor_id, "room_type_id": id(&office), "name": name }),
        )
        .await;
    }

    let checklist = app
        .create(
            "/api/acme/admin/checklists",
            admin,
            json!({ "name": "Office clean", "room_type_id": id(&office) }),
        )
        .await;
    let checklist_id = id(&checklist);
    let item = app
        .create(
            &format!("/api/acme/admin/checklists/{checklist_id}/items"),
            admin,
            json!({ "label": "Empty bins", "requires_note": true }),
        )
        .await;
    let (status, _) = app
        .put(
            &format!("/api/acme/admin/checklists/{checklist_id}/default"),
            admin,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // A janitor joins through an invitation.
    let issued = app
        .create(
            "/api/acme/admin/invitations",
            admin,
            json!({
                "email": "jan@acme.test",
                "full_name": "Jan Itor",
                "role": "janitor",
                "client_id": null
            }),
        )
        .await;
    let token = issued["token"].as_str().expect("token");
    let (status, accepted) = app
        .send(
            reqwest::Method::POST,
            &format!("/api/invitations/{token}/accept"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{accepted}");
    let janitor_id = accepted["data"]["user"]["id"].as_str().expect("user").to_string();
    let janitor = accepted["data"]["session_token"]
        .as_str()
        .expect("session")
        .to_string();

    let (status, body) = app
        .send(
            reqwest::Method::POST,
            &format!("/api/invitations/{token}/accept"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Invitation has already been used");

    // Schedule the round and assign both rooms.
    let activity = app
        .create(
            "/api/acme/supervisor/activities",
            admin,
            json!({
                "floor_id": floor_id,
                "name": "Monday clean",
                "scheduled_date": "2026-10-19",
                "window_start": "18:00:00",
                "window_end": "22:00:00",
                "notes": null,
                "template_id": null
            }),
        )
        .await;
    let activity_id = id(&activity);
    let tasks = activity["tasks"].as_array().expect("tasks").clone();
    assert_eq!(tasks.len(), 2);

    let (status, body) = app
        .post(
            &format!("/api/acme/supervisor/activities/{activity_id}/publish"),
            admin,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Assign at least one janitor before publishing");

    for task in &tasks {
        let (status, body) = app
            .put(
                &format!("/api/acme/supervisor/room-tasks/{}/assignee", id(task)),
                admin,
                json!({ "user_id": janitor_id }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }
    let (status, body) = app
        .post(
            &format!("/api/acme/supervisor/activities/{activity_id}/publish"),
            admin,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "active");

    // The janitor works through the first room.
    let (status, mine) = app.get("/api/acme/janitor/tasks", &janitor).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["data"].as_array().map(Vec::len), Some(2));

    let task_id = id(&tasks[0]);
    let (status, body) = app
        .post(
            &format!("/api/acme/janitor/tasks/{task_id}/complete"),
            &janitor,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        "Complete \"Empty bins\" before finishing the room"
    );

    let (status, body) = app
        .put(
            &format!("/api/acme/janitor/tasks/{task_id}/responses"),
            &janitor,
            json!({ "checklist_item_id": id(&item), "completed": true, "note": "Two bins" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = app
        .post(
            &format!("/api/acme/janitor/tasks/{task_id}/complete"),
            &janitor,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "done");

    // Janitors cannot inspect; supervisors can.
    let inspect_path = format!("/api/acme/supervisor/room-tasks/{task_id}/inspect");
    let (status, _) = app
        .post(&inspect_path, &janitor, json!({ "outcome": "pass" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = app
        .post(
            &inspect_path,
            admin,
            json!({ "outcome": "pass", "note": null, "deficiency": null }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["task"]["status"], "inspected_pass");

    let (status, report) = app
        .get(
            &format!("/api/acme/supervisor/activities/{activity_id}/report"),
            admin,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["data"]["inspected"], 1);
    assert_eq!(report["data"]["pass_rate"], 100.0);
    assert_eq!(report["data"]["counts"]["not_started"], 1);

    let (status, body) = app
        .post(
            &format!("/api/acme/supervisor/activities/{activity_id}/close"),
            admin,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "closed");

    let (status, mine) = app.get("/api/acme/janitor/tasks", &janitor).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["data"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn qr_scan_redirects_by_session() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token.as_str();

    let client = app
        .create(
            "/api/acme/admin/clients",
            admin,
            json!({ "name": "Harbour Trust", "contact_email": null }),
        )
        .await;
    let building = app
        .create(
            "/api/acme/admin/buildings",
            admin,
            json!({
                "client_id": id(&client),
                "name": "Harbour House",
                "address": null,
                "floors": [{ "name": "Ground", "level": 0 }]
            }),
        )
        .await;
    let room = app
        .create(
            "/api/acme/admin/rooms",
            admin,
            json!({
                "floor_id": building["floors"][0]["id"],
                "room_type_id": null,
                "name": "Lobby"
            }),
        )
        .await;
    let room_id = id(&room);

    let (status, qr) = app
        .get(&format!("/api/acme/admin/rooms/{room_id}/qr"), admin)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        qr["data"]["url"],
        format!("https://clean.example/qr/rooms/{room_id}")
    );

    let scan = format!("{}/qr/rooms/{room_id}", app.base);
    let anonymous = app.client.get(&scan).send().await.expect("scan");
    assert_eq!(anonymous.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        anonymous.headers()[header::LOCATION],
        format!("/login?next=/qr/rooms/{room_id}").as_str()
    );

    let signed_in = app
        .client
        .get(&scan)
        .bearer_auth(admin)
        .send()
        .await
        .expect("scan");
    assert_eq!(signed_in.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        signed_in.headers()[header::LOCATION],
        format!("/acme/admin/rooms/{room_id}").as_str()
    );
}

#[tokio::test]
async fn logo_upload_is_served_back_to_members() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token.as_str();
    let png = b"\x89PNG\r\n\x1a\nnot-really-a-png".to_vec();

    let response = app
        .client
        .put(format!("{}/api/acme/admin/organisation/logo", app.base))
        .bearer_auth(admin)
        .header(header::CONTENT_TYPE, "image/png")
        .body(png.clone())
        .send()
        .await
        .expect("upload");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("json");
    let key = body["data"]["logo_path"].as_str().expect("logo path").to_string();

    let served = app
        .client
        .get(format!("{}/api/acme/files/{key}", app.base))
        .bearer_auth(admin)
        .send()
        .await
        .expect("download");
    assert_eq!(served.status(), StatusCode::OK);
    assert_eq!(served.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(served.bytes().await.expect("bytes").to_vec(), png);

    let rejected = app
        .client
        .put(format!("{}/api/acme/admin/organisation/logo", app.base))
        .bearer_auth(admin)
        .header(header::CONTENT_TYPE, "text/plain")
        .body("hello")
        .send()
        .await
        .expect("upload");
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
}
