//! Integration tests for the contact, block and mute lists.

mod common;

use axum::http::StatusCode;
use common::{expect_status, get, hex_id, post_json, salt};
use serde_json::json;
use sqlx::SqlitePool;

// ---------------------------------------------------------------------------
// Test: contacts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn contacts_add_list_remove(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let secret = hex_id(0x5E);
    let add = json!({
        "action": "add",
        "combinedId": hex_id(0x01),
        "secretId": secret,
        "userId": "b3BhcXVl",
        "userIdSalt": salt(0x02),
    });

    let first = post_json(app.clone(), "/api/v1/contacts", add.clone()).await;
    assert_eq!(first.status(), StatusCode::OK);
    let again = post_json(app.clone(), "/api/v1/contacts", add).await;
    assert_eq!(again.status(), StatusCode::OK);

    let list = get(app.clone(), &format!("/api/v1/contacts?secretId={secret}")).await;
    let json = expect_status(list, StatusCode::OK).await;
    assert_eq!(
        json["data"],
        json!([{ "userId": "b3BhcXVl", "userIdSalt": salt(0x02) }])
    );

    let remove = post_json(
        app.clone(),
        "/api/v1/contacts",
        json!({ "action": "remove", "combinedId": hex_id(0x01) }),
    )
    .await;
    assert_eq!(remove.status(), StatusCode::OK);

    let list = get(app, &format!("/api/v1/contacts?secretId={secret}")).await;
    let json = expect_status(list, StatusCode::OK).await;
    assert_eq!(json["data"], json!([]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn contact_add_requires_all_fields(pool: SqlitePool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/contacts",
        json!({ "action": "add", "combinedId": hex_id(0x01), "secretId": hex_id(0x5E) }),
    )
    .await;

    let json = expect_status(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(json["error"], "Missing 'userId'");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn contact_rejects_unknown_action(pool: SqlitePool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/contacts",
        json!({ "action": "block", "combinedId": hex_id(0x01) }),
    )
    .await;

    let json = expect_status(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(json["error"], "Invalid value for 'action'");
}

// ---------------------------------------------------------------------------
// Test: blocks and mutes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn block_and_unblock(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let secret = hex_id(0x6A);
    let request = |action: &str, combined: u8| {
        json!({ "action": action, "combinedId": hex_id(combined), "secretId": secret })
    };

    for combined in [0x11, 0x12] {
        let response = post_json(app.clone(), "/api/v1/blocks", request("block", combined)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = post_json(app.clone(), "/api/v1/blocks", request("unblock", 0x11)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let list = get(app, &format!("/api/v1/blocks?secretId={secret}")).await;
    let json = expect_status(list, StatusCode::OK).await;
    assert_eq!(json["data"], json!([{ "combinedId": hex_id(0x12) }]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn mutes_are_separate_from_blocks(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let secret = hex_id(0x6B);

    let muted = post_json(
        app.clone(),
        "/api/v1/mutes",
        json!({ "action": "mute", "combinedId": hex_id(0x21), "secretId": secret }),
    )
    .await;
    assert_eq!(muted.status(), StatusCode::OK);

    let mutes = get(app.clone(), &format!("/api/v1/mutes?secretId={secret}")).await;
    assert_eq!(
        expect_status(mutes, StatusCode::OK).await["data"],
        json!([{ "combinedId": hex_id(0x21) }])
    );

    let blocks = get(app, &format!("/api/v1/blocks?secretId={secret}")).await;
    assert_eq!(expect_status(blocks, StatusCode::OK).await["data"], json!([]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_verbs_are_not_interchangeable(pool: SqlitePool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/v1/blocks",
        json!({ "action": "mute", "combinedId": hex_id(0x31), "secretId": hex_id(0x6C) }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(
        app,
        "/api/v1/mutes",
        json!({ "action": "block", "combinedId": hex_id(0x31), "secretId": hex_id(0x6C) }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_requires_secret_id(pool: SqlitePool) {
    let app = common::build_test_app(pool);

    let response = get(app, "/api/v1/blocks").await;

    let json = expect_status(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(json["error"], "Missing 'secretId'");
}
