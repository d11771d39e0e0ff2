//! Artist CRUD integration tests.
//!
//! Runs the real router against a migrated database and a mock JWKS
//! endpoint. Write requests carry RS256 tokens signed by the fixture key.

use atelier_test_utils::{bearer_with_permissions, TestAtelierServer};
use serde_json::{json, Value};
use sqlx::PgPool;

async fn create_artist(
    server: &TestAtelierServer,
    body: Value,
) -> Result<reqwest::Response, anyhow::Error> {
    Ok(reqwest::Client::new()
        .post(format!("{}/artists", server.url()))
        .header("Authorization", bearer_with_permissions(&["post:artist"]))
        .json(&body)
        .send()
        .await?)
}

async fn seeded_artist_id(server: &TestAtelierServer) -> Result<i64, anyhow::Error> {
    let response = create_artist(server, json!({"name": "Nina", "age": 40, "style": "Soul"})).await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    body["artists"]["id"]
        .as_i64()
        .ok_or_else(|| anyhow::anyhow!("created artist has no id: {body}"))
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_list_empty_is_success(pool: PgPool) -> Result<(), anyhow::Error> {
    let server = TestAtelierServer::spawn(pool).await?;

    let response = reqwest::get(format!("{}/artists", server.url())).await?;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await?;
    assert_eq!(body, json!({"success": true, "artists": []}));

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_then_get_and_list(pool: PgPool) -> Result<(), anyhow::Error> {
    let server = TestAtelierServer::spawn(pool).await?;

    let response = create_artist(&server, json!({"name": "Nina", "age": 40, "style": "Soul"})).await?;
    assert_eq!(response.status(), 200);

    let created: Value = response.json().await?;
    assert_eq!(created["success"], true);
    assert_eq!(created["artists"]["name"], "Nina");
    assert_eq!(created["artists"]["age"], 40);
    let id = created["artists"]["id"].as_i64().unwrap_or_default();

    let fetched: Value = reqwest::get(format!("{}/artists/{id}", server.url()))
        .await?
        .json()
        .await?;
    assert_eq!(fetched["artists"], created["artists"]);

    let listed: Value = reqwest::get(format!("{}/artists", server.url()))
        .await?
        .json()
        .await?;
    assert_eq!(listed["artists"], json!([created["artists"]]));

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_requires_post_artist(pool: PgPool) -> Result<(), anyhow::Error> {
    let server = TestAtelierServer::spawn(pool.clone()).await?;
    let client = reqwest::Client::new();
    let body = json!({"name": "Nina", "age": 40, "style": "Soul"});

    let response = client
        .post(format!("{}/artists", server.url()))
        .json(&body)
        .send()
        .await?;
    assert_eq!(response.status(), 401);

    let response = client
        .post(format!("{}/artists", server.url()))
        .header("Authorization", bearer_with_permissions(&["post:video"]))
        .json(&body)
        .send()
        .await?;
    assert_eq!(response.status(), 403);

    // Neither rejected request wrote anything.
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM artists")
        .fetch_one(&pool)
        .await?;
    assert_eq!(count, 0);

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_with_invalid_body_is_400(pool: PgPool) -> Result<(), anyhow::Error> {
    let server = TestAtelierServer::spawn(pool).await?;

    for body in [
        json!({"name": "Nina", "style": "Soul"}),
        json!({"name": "Nina", "age": "forty", "style": "Soul"}),
        json!([]),
    ] {
        let response = create_artist(&server, body.clone()).await?;
        assert_eq!(response.status(), 400, "{body}");

        let error: Value = response.json().await?;
        assert_eq!(error["code"], "bad_request");
    }

    let response = reqwest::Client::new()
        .post(format!("{}/artists", server.url()))
        .header("Authorization", bearer_with_permissions(&["post:artist"]))
        .body("not json")
        .send()
        .await?;
    assert_eq!(response.status(), 400);

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_get_unknown_is_404(pool: PgPool) -> Result<(), anyhow::Error> {
    let server = TestAtelierServer::spawn(pool).await?;

    let response = reqwest::get(format!("{}/artists/999", server.url())).await?;
    assert_eq!(response.status(), 404);

    let body: Value = response.json().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Artist 999 not found");

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_non_integer_id_is_404_without_token(pool: PgPool) -> Result<(), anyhow::Error> {
    let server = TestAtelierServer::spawn(pool).await?;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/artists/nina", server.url()))
        .send()
        .await?;
    assert_eq!(response.status(), 404);

    let response = client
        .delete(format!("{}/artists/nina", server.url()))
        .send()
        .await?;
    assert_eq!(response.status(), 404);

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_patch_updates_only_given_fields(pool: PgPool) -> Result<(), anyhow::Error> {
    let server = TestAtelierServer::spawn(pool).await?;
    let id = seeded_artist_id(&server).await?;

    let response = reqwest::Client::new()
        .patch(format!("{}/artists/{id}", server.url()))
        .header("Authorization", bearer_with_permissions(&["patch:artist"]))
        .json(&json!({"style": "Jazz"}))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await?;
    assert_eq!(
        body,
        json!({
            "success": true,
            "artists": {"id": id, "name": "Nina", "age": 40, "style": "Jazz"}
        })
    );

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_patch_empty_object_leaves_record(pool: PgPool) -> Result<(), anyhow::Error> {
    let server = TestAtelierServer::spawn(pool).await?;
    let id = seeded_artist_id(&server).await?;

    let response = reqwest::Client::new()
        .patch(format!("{}/artists/{id}", server.url()))
        .header("Authorization", bearer_with_permissions(&["patch:artist"]))
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await?;
    assert_eq!(body["artists"]["style"], "Soul");

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_patch_unknown_is_404(pool: PgPool) -> Result<(), anyhow::Error> {
    let server = TestAtelierServer::spawn(pool).await?;

    let response = reqwest::Client::new()
        .patch(format!("{}/artists/77", server.url()))
        .header("Authorization", bearer_with_permissions(&["patch:artist"]))
        .json(&json!({"age": 50}))
        .send()
        .await?;
    assert_eq!(response.status(), 404);

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_delete_then_gone(pool: PgPool) -> Result<(), anyhow::Error> {
    let server = TestAtelierServer::spawn(pool).await?;
    let id = seeded_artist_id(&server).await?;
    let client = reqwest::Client::new();

    let response = client
        .delete(format!("{}/artists/{id}", server.url()))
        .header("Authorization", bearer_with_permissions(&["delete:artist"]))
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body, json!({"success": true, "delete": id}));

    let response = client
        .get(format!("{}/artists/{id}", server.url()))
        .send()
        .await?;
    assert_eq!(response.status(), 404);

    let response = client
        .delete(format!("{}/artists/{id}", server.url()))
        .header("Authorization", bearer_with_permissions(&["delete:artist"]))
        .send()
        .await?;
    assert_eq!(response.status(), 404);

    Ok(())
}
