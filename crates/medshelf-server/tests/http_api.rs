//! End-to-end API tests over a live server.
//!
//! Each test spawns its own server on an ephemeral port with a fresh
//! in-memory store and drives it through a real HTTP client.

use std::net::SocketAddr;
use std::sync::Arc;

use medshelf_core::{Identity, MedicationService, SqliteStore};
use medshelf_server::auth::issue_token;
use medshelf_server::build_router;
use medshelf_server::config::{ServerConfig, StoreBackend};
use medshelf_server::state::AppState;
use serde_json::{json, Value};
use tempfile::TempDir;

const SECRET: &str = "test-secret";

async fn spawn_server() -> (SocketAddr, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let upload_dir = dir.path().join("uploads");
    std::fs::create_dir_all(&upload_dir).unwrap();

    let config = ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        backend: StoreBackend::Sqlite,
        sqlite_path: dir.path().join("medshelf.db"),
        sled_path: dir.path().join("medshelf.sled"),
        upload_dir,
        jwt_secret: SECRET.into(),
    };

    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let service = Arc::new(MedicationService::new(store));
    let state = AppState {
        service,
        config: Arc::new(config),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });

    (addr, dir)
}

fn bearer(user_id: &str) -> String {
    let identity = Identity {
        user_id: user_id.into(),
        fullname: format!("User {}", user_id),
        email: format!("{}@example.com", user_id),
    };
    format!("Bearer {}", issue_token(SECRET, &identity, 3600).unwrap())
}

fn medication_body(name: &str) -> Value {
    json!({
        "name": name,
        "generic_name": "generic",
        "medication_class": "class",
        "availability": "OTC",
        "images": [],
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let (addr, _dir) = spawn_server().await;
    let resp = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_mutations_require_a_valid_token() {
    let (addr, _dir) = spawn_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{}/medications", addr))
        .json(&medication_body("Aspirin"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Missing or invalid token");

    let resp = client
        .post(format!("http://{}/medications", addr))
        .header("Authorization", "Bearer not-a-token")
        .json(&medication_body("Aspirin"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Invalid token");
}

#[tokio::test]
async fn test_medication_crud_and_ownership() {
    let (addr, _dir) = spawn_server().await;
    let client = reqwest::Client::new();
    let base = format!("http://{}/medications", addr);

    // Create as alice
    let resp = client
        .post(&base)
        .header("Authorization", bearer("alice"))
        .json(&medication_body("Aspirin"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["first_letter"], "A");
    assert_eq!(body["data"]["added_by"]["user_id"], "alice");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // Default listing letter is A
    let body: Value = client.get(&base).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["name"], "Aspirin");

    // Listing input is case-insensitive
    let body: Value = client
        .get(format!("{}?first_letter=a", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Read is public
    let body: Value = client
        .get(format!("{}/{}", base, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["name"], "Aspirin");

    // Update as bob: 404 without revealing existence
    let resp = client
        .put(format!("{}/{}", base, id))
        .header("Authorization", bearer("bob"))
        .json(&medication_body("Hijacked"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // Update as alice
    let resp = client
        .put(format!("{}/{}", base, id))
        .header("Authorization", bearer("alice"))
        .json(&medication_body("Tylenol"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"], true);

    // Rename moved the shelf letter
    let body: Value = client
        .get(format!("{}?first_letter=T", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"][0]["name"], "Tylenol");

    // Blank name is a validation error
    let resp = client
        .put(format!("{}/{}", base, id))
        .header("Authorization", bearer("alice"))
        .json(&medication_body("   "))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Delete as bob: 404; as alice: gone
    let resp = client
        .delete(format!("{}/{}", base, id))
        .header("Authorization", bearer("bob"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .delete(format!("{}/{}", base, id))
        .header("Authorization", bearer("alice"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Absent record reads as null data, not an error
    let resp = client.get(format!("{}/{}", base, id)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_review_flow() {
    let (addr, _dir) = spawn_server().await;
    let client = reqwest::Client::new();
    let base = format!("http://{}/medications", addr);

    let body: Value = client
        .post(&base)
        .header("Authorization", bearer("alice"))
        .json(&medication_body("Aspirin"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let med_id = body["data"]["id"].as_str().unwrap().to_string();

    // Reviewing a missing medication is a 404
    let resp = client
        .post(format!("{}/missing/reviews", base))
        .header("Authorization", bearer("bob"))
        .json(&json!({ "review": "Nice", "rating": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // Blank review text fails validation with the error envelope
    let resp = client
        .post(format!("{}/{}/reviews", base, med_id))
        .header("Authorization", bearer("bob"))
        .json(&json!({ "review": "   ", "rating": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Review text is required");

    // Bob reviews alice's medication
    let resp = client
        .post(format!("{}/{}/reviews", base, med_id))
        .header("Authorization", bearer("bob"))
        .json(&json!({ "review": "Decent", "rating": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    let review_id = body["data"].as_str().unwrap().to_string();

    let body: Value = client
        .get(format!("{}/{}/reviews", base, med_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["rating"], 3);
    assert_eq!(body["data"][0]["by"]["user_id"], "bob");

    // Only the author may edit
    let resp = client
        .put(format!("{}/{}/reviews/{}", base, med_id, review_id))
        .header("Authorization", bearer("alice"))
        .json(&json!({ "review": "Mine now", "rating": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .put(format!("{}/{}/reviews/{}", base, med_id, review_id))
        .header("Authorization", bearer("bob"))
        .json(&json!({ "review": "Excellent", "rating": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = client
        .get(format!("{}/{}/reviews/{}", base, med_id, review_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["review"], "Excellent");
    assert_eq!(body["data"]["rating"], 5);

    // Delete is author-bound and quiet when already gone
    let resp = client
        .delete(format!("{}/{}/reviews/{}", base, med_id, review_id))
        .header("Authorization", bearer("bob"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"], true);

    let body: Value = client
        .delete(format!("{}/{}/reviews/{}", base, med_id, review_id))
        .header("Authorization", bearer("bob"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"], false);
}

#[tokio::test]
async fn test_exists_and_search() {
    let (addr, _dir) = spawn_server().await;
    let client = reqwest::Client::new();
    let base = format!("http://{}/medications", addr);

    for name in ["Aspirin", "Aspirin-Complex", "Tylenol"] {
        client
            .post(&base)
            .header("Authorization", bearer("alice"))
            .json(&medication_body(name))
            .send()
            .await
            .unwrap();
    }

    // Bare shape, matching what the form validator consumes
    let resp = client
        .get(format!("{}/exists?name=Aspirin", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "exists": true }));

    let body: Value = client
        .get(format!("{}/exists?name=Advil", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["exists"], false);

    let resp = client.get(format!("{}/exists", base)).send().await.unwrap();
    assert_eq!(resp.status(), 400);

    let body: Value = client
        .get(format!("{}/search?query=asp", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let resp = client.get(format!("{}/search", base)).send().await.unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_image_serving_is_contained_to_the_upload_root() {
    let (addr, dir) = spawn_server().await;
    let client = reqwest::Client::new();

    std::fs::write(dir.path().join("uploads").join("pill.png"), b"png-bytes").unwrap();
    std::fs::write(dir.path().join("secret.txt"), b"top secret").unwrap();

    let resp = client
        .get(format!("http://{}/medications/images/pill.png", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()["content-type"].to_str().unwrap(),
        "image/png"
    );
    assert_eq!(resp.bytes().await.unwrap().as_ref(), b"png-bytes");

    let resp = client
        .get(format!("http://{}/medications/images/missing.png", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // An encoded traversal segment must not reach the sibling file
    let resp = client
        .get(format!("http://{}/medications/images/..%2Fsecret.txt", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}
