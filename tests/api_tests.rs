// tests/api_tests.rs

use codeshack::{config::Config, realtime::Broadcaster, routes, state::AppState};
use sqlx::postgres::PgPoolOptions;

const MENTOR_SECRET: &str = "test_mentor_secret";
const ADMIN_SECRET: &str = "test_admin_secret";

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    // Note: For Postgres, you must have a running database.
    // We'll read from DATABASE_URL environment variable.
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        mentor_secret_key: MENTOR_SECRET.to_string(),
        admin_secret_key: ADMIN_SECRET.to_string(),
    };

    let state = AppState {
        pool,
        config,
        broadcaster: Broadcaster::new(),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

fn unique_email(prefix: &str) -> String {
    format!("{}_{}@test.dev", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

/// Registers a junior and returns (token, user_id).
async fn register_junior(client: &reqwest::Client, address: &str) -> (String, i64) {
    let body: serde_json::Value = client
        .post(format!("{}/api/users/register", address))
        .json(&serde_json::json!({
            "name": "Test Junior",
            "email": unique_email("junior"),
            "password": "password123"
        }))
        .send()
        .await
        .expect("Register failed")
        .json()
        .await
        .expect("Failed to parse register json");

    let token = body["token"].as_str().expect("Token not found").to_string();
    let user_id = body["data"]["userId"].as_i64().expect("userId not found");
    (token, user_id)
}

/// Registers a mentor through the secret-key route. Starts unapproved.
async fn register_mentor(client: &reqwest::Client, address: &str) -> (String, i64) {
    let body: serde_json::Value = client
        .post(format!("{}/api/mentor-profiles/register", address))
        .json(&serde_json::json!({
            "name": "Test Mentor",
            "email": unique_email("mentor"),
            "password": "password123",
            "secret_key": MENTOR_SECRET
        }))
        .send()
        .await
        .expect("Mentor register failed")
        .json()
        .await
        .expect("Failed to parse mentor register json");

    let token = body["token"].as_str().expect("Token not found").to_string();
    let user_id = body["data"]["userId"].as_i64().expect("userId not found");
    (token, user_id)
}

async fn register_admin(client: &reqwest::Client, address: &str) -> (String, i64) {
    let body: serde_json::Value = client
        .post(format!("{}/api/admin/register", address))
        .json(&serde_json::json!({
            "name": "Test Admin",
            "email": unique_email("admin"),
            "password": "password123",
            "secret_key": ADMIN_SECRET
        }))
        .send()
        .await
        .expect("Admin register failed")
        .json()
        .await
        .expect("Failed to parse admin register json");

    let token = body["token"].as_str().expect("Token not found").to_string();
    let user_id = body["data"]["userId"].as_i64().expect("userId not found");
    (token, user_id)
}

async fn create_doubt(client: &reqwest::Client, address: &str, token: &str) -> i64 {
    let body: serde_json::Value = client
        .post(format!("{}/api/doubts", address))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "title": "How do I structure async error handling?",
            "description": "I keep nesting match statements and it gets unreadable.",
            "tags": ["Async", "errors"]
        }))
        .send()
        .await
        .expect("Create doubt failed")
        .json()
        .await
        .expect("Failed to parse doubt json");

    body["data"]["id"].as_i64().expect("doubt id not found")
}

#[tokio::test]
async fn health_check_works() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);

    let missing = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn register_works_and_duplicate_email_conflicts() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email("dup");

    let response = client
        .post(format!("{}/api/users/register", address))
        .json(&serde_json::json!({
            "name": "First User",
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert!(body["token"].is_string());
    assert_eq!(body["data"]["role"], "junior");
    assert_eq!(body["data"]["isMentorApproved"], true);

    let duplicate = client
        .post(format!("{}/api/users/register", address))
        .json(&serde_json::json!({
            "name": "Second User",
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(duplicate.status().as_u16(), 409);

    let body: serde_json::Value = duplicate.json().await.unwrap();
    assert_eq!(body["code"], "EMAIL_EXISTS");
}

#[tokio::test]
async fn register_fails_validation() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Password too short
    let response = client
        .post(format!("{}/api/users/register", address))
        .json(&serde_json::json!({
            "name": "Shorty",
            "email": unique_email("short"),
            "password": "abc"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email("login");

    client
        .post(format!("{}/api/users/register", address))
        .json(&serde_json::json!({
            "name": "Login User",
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Register failed");

    let response = client
        .post(format!("{}/api/users/login", address))
        .json(&serde_json::json!({
            "email": email,
            "password": "wrong-password"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn secret_key_gates_mentor_and_admin_registration() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let mentor = client
        .post(format!("{}/api/mentor-profiles/register", address))
        .json(&serde_json::json!({
            "name": "Wannabe Mentor",
            "email": unique_email("badkey"),
            "password": "password123",
            "secret_key": "not-the-secret"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(mentor.status().as_u16(), 403);
    let body: serde_json::Value = mentor.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_SECRET_KEY");

    let admin = client
        .post(format!("{}/api/admin/register", address))
        .json(&serde_json::json!({
            "name": "Wannabe Admin",
            "email": unique_email("badkey"),
            "password": "password123",
            "secret_key": "not-the-secret"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(admin.status().as_u16(), 403);
}

#[tokio::test]
async fn unapproved_mentor_cannot_answer_until_approved() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (junior_token, _) = register_junior(&client, &address).await;
    let (mentor_token, mentor_id) = register_mentor(&client, &address).await;
    let (admin_token, _) = register_admin(&client, &address).await;

    let doubt_id = create_doubt(&client, &address, &junior_token).await;

    // Unapproved mentor is blocked.
    let blocked = client
        .post(format!("{}/api/answers/doubt/{}", address, doubt_id))
        .bearer_auth(&mentor_token)
        .json(&serde_json::json!({
            "content": "Flatten the matches with the question mark operator."
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(blocked.status().as_u16(), 403);
    let body: serde_json::Value = blocked.json().await.unwrap();
    assert_eq!(body["code"], "NOT_APPROVED");

    // Juniors can never answer, regardless of approval.
    let junior_try = client
        .post(format!("{}/api/answers/doubt/{}", address, doubt_id))
        .bearer_auth(&junior_token)
        .json(&serde_json::json!({
            "content": "Let me answer my own doubt with enough characters."
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(junior_try.status().as_u16(), 403);

    // Admin approves the mentor.
    let approve = client
        .post(format!("{}/api/admin/approve-mentor/{}", address, mentor_id))
        .bearer_auth(&admin_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(approve.status().as_u16(), 200);

    // Now the answer lands and the doubt flips to 'answered'.
    let answered = client
        .post(format!("{}/api/answers/doubt/{}", address, doubt_id))
        .bearer_auth(&mentor_token)
        .json(&serde_json::json!({
            "content": "Flatten the matches with the question mark operator."
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(answered.status().as_u16(), 201);

    let doubt: serde_json::Value = client
        .get(format!("{}/api/doubts/{}", address, doubt_id))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();
    assert_eq!(doubt["data"]["doubt"]["status"], "answered");
    assert_eq!(doubt["data"]["answers"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn upvote_flow_counts_and_rejects_duplicates() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (junior_token, _) = register_junior(&client, &address).await;
    let (mentor_token, mentor_id) = register_mentor(&client, &address).await;
    let (admin_token, _) = register_admin(&client, &address).await;

    client
        .post(format!("{}/api/admin/approve-mentor/{}", address, mentor_id))
        .bearer_auth(&admin_token)
        .send()
        .await
        .expect("Approve failed");

    let doubt_id = create_doubt(&client, &address, &junior_token).await;

    let answer: serde_json::Value = client
        .post(format!("{}/api/answers/doubt/{}", address, doubt_id))
        .bearer_auth(&mentor_token)
        .json(&serde_json::json!({
            "content": "Use the question mark operator and a shared error enum."
        }))
        .send()
        .await
        .expect("Answer failed")
        .json()
        .await
        .unwrap();
    let answer_id = answer["data"]["id"].as_i64().unwrap();

    let (voter_a, _) = register_junior(&client, &address).await;
    let (voter_b, _) = register_junior(&client, &address).await;

    let first = client
        .post(format!("{}/api/upvotes/{}", address, answer_id))
        .bearer_auth(&voter_a)
        .send()
        .await
        .expect("Upvote failed");
    assert_eq!(first.status().as_u16(), 201);
    let body: serde_json::Value = first.json().await.unwrap();
    assert_eq!(body["data"]["upvoteCount"], 1);

    let second = client
        .post(format!("{}/api/upvotes/{}", address, answer_id))
        .bearer_auth(&voter_b)
        .send()
        .await
        .expect("Upvote failed");
    assert_eq!(second.status().as_u16(), 201);
    let body: serde_json::Value = second.json().await.unwrap();
    assert_eq!(body["data"]["upvoteCount"], 2);

    // Same voter again: conflict, count unchanged.
    let duplicate = client
        .post(format!("{}/api/upvotes/{}", address, answer_id))
        .bearer_auth(&voter_a)
        .send()
        .await
        .expect("Upvote failed");
    assert_eq!(duplicate.status().as_u16(), 409);
    let body: serde_json::Value = duplicate.json().await.unwrap();
    assert_eq!(body["code"], "ALREADY_UPVOTED");

    let fetched: serde_json::Value = client
        .get(format!("{}/api/answers/{}", address, answer_id))
        .send()
        .await
        .expect("Fetch failed")
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["data"]["upvote_count"], 2);

    // Removing drops the count; removing twice is a 404.
    let removed = client
        .delete(format!("{}/api/upvotes/{}", address, answer_id))
        .bearer_auth(&voter_a)
        .send()
        .await
        .expect("Remove failed");
    assert_eq!(removed.status().as_u16(), 200);
    let body: serde_json::Value = removed.json().await.unwrap();
    assert_eq!(body["data"]["upvoteCount"], 1);

    let gone = client
        .delete(format!("{}/api/upvotes/{}", address, answer_id))
        .bearer_auth(&voter_a)
        .send()
        .await
        .expect("Remove failed");
    assert_eq!(gone.status().as_u16(), 404);
    let body: serde_json::Value = gone.json().await.unwrap();
    assert_eq!(body["code"], "UPVOTE_NOT_FOUND");
}

#[tokio::test]
async fn only_owner_or_admin_can_modify_a_doubt() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (owner_token, _) = register_junior(&client, &address).await;
    let (other_token, _) = register_junior(&client, &address).await;

    let doubt_id = create_doubt(&client, &address, &owner_token).await;

    let forbidden = client
        .patch(format!("{}/api/doubts/{}", address, doubt_id))
        .bearer_auth(&other_token)
        .json(&serde_json::json!({ "title": "Hijacked title" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(forbidden.status().as_u16(), 403);

    let allowed = client
        .patch(format!("{}/api/doubts/{}", address, doubt_id))
        .bearer_auth(&owner_token)
        .json(&serde_json::json!({ "title": "Clarified title" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(allowed.status().as_u16(), 200);

    // Unauthenticated writes are rejected outright.
    let anonymous = client
        .patch(format!("{}/api/doubts/{}", address, doubt_id))
        .json(&serde_json::json!({ "title": "Anonymous edit" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(anonymous.status().as_u16(), 401);
}

#[tokio::test]
async fn admin_delete_cascades_and_is_audited() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (junior_token, _) = register_junior(&client, &address).await;
    let (mentor_token, mentor_id) = register_mentor(&client, &address).await;
    let (admin_token, _) = register_admin(&client, &address).await;

    client
        .post(format!("{}/api/admin/approve-mentor/{}", address, mentor_id))
        .bearer_auth(&admin_token)
        .send()
        .await
        .expect("Approve failed");

    let doubt_id = create_doubt(&client, &address, &junior_token).await;

    let answer: serde_json::Value = client
        .post(format!("{}/api/answers/doubt/{}", address, doubt_id))
        .bearer_auth(&mentor_token)
        .json(&serde_json::json!({
            "content": "An answer that is about to be moderated away."
        }))
        .send()
        .await
        .expect("Answer failed")
        .json()
        .await
        .unwrap();
    let answer_id = answer["data"]["id"].as_i64().unwrap();

    let comment: serde_json::Value = client
        .post(format!("{}/api/comments/doubt/{}", address, doubt_id))
        .bearer_auth(&junior_token)
        .json(&serde_json::json!({ "content": "Following this thread." }))
        .send()
        .await
        .expect("Comment failed")
        .json()
        .await
        .unwrap();
    let comment_id = comment["data"]["id"].as_i64().unwrap();

    // A non-admin cannot reach the moderation surface at all.
    let not_admin = client
        .delete(format!("{}/api/admin/doubts/{}", address, doubt_id))
        .bearer_auth(&junior_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(not_admin.status().as_u16(), 403);

    let deleted = client
        .delete(format!("{}/api/admin/doubts/{}", address, doubt_id))
        .bearer_auth(&admin_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(deleted.status().as_u16(), 200);

    // The whole subtree is gone.
    for url in [
        format!("{}/api/doubts/{}", address, doubt_id),
        format!("{}/api/answers/{}", address, answer_id),
        format!("{}/api/comments/{}", address, comment_id),
    ] {
        let resp = client.get(url).send().await.expect("Fetch failed");
        assert_eq!(resp.status().as_u16(), 404);
    }

    // And the ledger recorded it.
    let actions: serde_json::Value = client
        .get(format!(
            "{}/api/admin/actions?action_type=delete_doubt",
            address
        ))
        .bearer_auth(&admin_token)
        .send()
        .await
        .expect("Actions failed")
        .json()
        .await
        .unwrap();
    let recorded = actions["data"]
        .as_array()
        .unwrap()
        .iter()
        .any(|a| a["target_id"].as_i64() == Some(doubt_id));
    assert!(recorded, "delete_doubt should appear in the audit ledger");
}

#[tokio::test]
async fn comment_threads_are_one_level_deep() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (token, _) = register_junior(&client, &address).await;
    let doubt_id = create_doubt(&client, &address, &token).await;

    let top: serde_json::Value = client
        .post(format!("{}/api/comments/doubt/{}", address, doubt_id))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "content": "Top-level comment." }))
        .send()
        .await
        .expect("Comment failed")
        .json()
        .await
        .unwrap();
    let top_id = top["data"]["id"].as_i64().unwrap();

    let reply: serde_json::Value = client
        .post(format!("{}/api/comments/doubt/{}", address, doubt_id))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "content": "A reply.",
            "parent_comment_id": top_id
        }))
        .send()
        .await
        .expect("Reply failed")
        .json()
        .await
        .unwrap();
    let reply_id = reply["data"]["id"].as_i64().unwrap();

    // Replying to a reply is rejected.
    let nested = client
        .post(format!("{}/api/comments/doubt/{}", address, doubt_id))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "content": "Too deep.",
            "parent_comment_id": reply_id
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(nested.status().as_u16(), 400);

    let thread: serde_json::Value = client
        .get(format!("{}/api/comments/doubt/{}", address, doubt_id))
        .send()
        .await
        .expect("List failed")
        .json()
        .await
        .unwrap();
    let top_level = thread["data"].as_array().unwrap();
    assert_eq!(top_level.len(), 1);
    assert_eq!(top_level[0]["replies"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn mentor_profile_lifecycle() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (mentor_token, mentor_id) = register_mentor(&client, &address).await;
    let (admin_token, _) = register_admin(&client, &address).await;

    let created = client
        .post(format!("{}/api/mentor-profiles/{}", address, mentor_id))
        .bearer_auth(&mentor_token)
        .json(&serde_json::json!({
            "expertise_tags": ["Rust", "databases"]
        }))
        .send()
        .await
        .expect("Create profile failed");
    assert_eq!(created.status().as_u16(), 201);
    let body: serde_json::Value = created.json().await.unwrap();
    assert_eq!(body["data"]["badge"], "Mentor");
    assert_eq!(body["data"]["expertise_tags"][0], "rust");

    let duplicate = client
        .post(format!("{}/api/mentor-profiles/{}", address, mentor_id))
        .bearer_auth(&mentor_token)
        .json(&serde_json::json!({ "expertise_tags": ["rust"] }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(duplicate.status().as_u16(), 409);
    let body: serde_json::Value = duplicate.json().await.unwrap();
    assert_eq!(body["code"], "PROFILE_EXISTS");

    // Approval flips both the user flag and the profile flag.
    client
        .post(format!("{}/api/admin/approve-mentor/{}", address, mentor_id))
        .bearer_auth(&admin_token)
        .send()
        .await
        .expect("Approve failed");

    let profile: serde_json::Value = client
        .get(format!("{}/api/mentor-profiles/{}", address, mentor_id))
        .send()
        .await
        .expect("Fetch failed")
        .json()
        .await
        .unwrap();
    assert_eq!(profile["data"]["profile"]["approved_by_admin"], true);
    assert_eq!(profile["data"]["user"]["isMentorApproved"], true);
}

#[tokio::test]
async fn reconcile_repairs_drifted_upvote_counters() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test DB");

    let (junior_token, _) = register_junior(&client, &address).await;
    let (mentor_token, mentor_id) = register_mentor(&client, &address).await;
    let (admin_token, _) = register_admin(&client, &address).await;

    client
        .post(format!("{}/api/admin/approve-mentor/{}", address, mentor_id))
        .bearer_auth(&admin_token)
        .send()
        .await
        .expect("Approve failed");

    let doubt_id = create_doubt(&client, &address, &junior_token).await;
    let answer: serde_json::Value = client
        .post(format!("{}/api/answers/doubt/{}", address, doubt_id))
        .bearer_auth(&mentor_token)
        .json(&serde_json::json!({
            "content": "An answer whose counter we will corrupt directly."
        }))
        .send()
        .await
        .expect("Answer failed")
        .json()
        .await
        .unwrap();
    let answer_id = answer["data"]["id"].as_i64().unwrap();

    client
        .post(format!("{}/api/upvotes/{}", address, answer_id))
        .bearer_auth(&junior_token)
        .send()
        .await
        .expect("Upvote failed");

    // Corrupt the cached counter behind the API's back.
    sqlx::query("UPDATE answers SET upvote_count = 99 WHERE id = $1")
        .bind(answer_id)
        .execute(&pool)
        .await
        .unwrap();

    let reconciled = client
        .post(format!("{}/api/admin/reconcile-upvotes", address))
        .bearer_auth(&admin_token)
        .send()
        .await
        .expect("Reconcile failed");
    assert_eq!(reconciled.status().as_u16(), 200);

    let fetched: serde_json::Value = client
        .get(format!("{}/api/answers/{}", address, answer_id))
        .send()
        .await
        .expect("Fetch failed")
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["data"]["upvote_count"], 1);
}
