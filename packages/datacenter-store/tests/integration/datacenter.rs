use datacenter_store::dispatch::{DELETED_MESSAGE, Verb};
use datacenter_store::entity::datacenter;
use datacenter_store::models::SensitivityPolicy;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::{Value, json};

use crate::common::{TestApp, is_not_found};

fn names(reply: &Value) -> Vec<&str> {
    reply
        .as_array()
        .expect("find returns a list")
        .iter()
        .map(|d| d["name"].as_str().unwrap_or_default())
        .collect()
}

#[tokio::test]
async fn test_create_get_update_delete_scenario() {
    let app = TestApp::spawn().await;

    let id = app
        .create(json!({"name": "fred", "type": "aws", "access_key_id": "foo"}))
        .await;

    let got = app.call(Verb::Get, json!({"id": id})).await;
    assert_eq!(got["name"], "fred");
    let ciphertext = got["access_key_id"].clone();
    assert_ne!(ciphertext, "foo");
    assert_eq!(app.decrypt(&ciphertext), "foo");

    let updated = app.call(Verb::Set, json!({"id": id, "name": "fred2"})).await;
    assert_eq!(updated["name"], "fred2");

    let got = app.call(Verb::Get, json!({"id": id})).await;
    assert_eq!(got["name"], "fred2");
    assert_eq!(got["access_key_id"], ciphertext);
    assert_eq!(got["type"], "aws");

    let reply = app.handler.handle(Verb::Del, format!(r#"{{"id":{id}}}"#).as_bytes()).await;
    assert_eq!(reply, DELETED_MESSAGE);

    let got = app.call(Verb::Get, json!({"id": id})).await;
    assert!(is_not_found(&got), "{got}");
}

#[tokio::test]
async fn test_get_by_name_and_unknown_lookups() {
    let app = TestApp::spawn().await;
    let id = app
        .create(json!({"name": "supu", "type": "vcloud", "group_id": 3, "region": "lon"}))
        .await;

    let got = app.call(Verb::Get, json!({"name": "supu"})).await;
    assert_eq!(got["id"], id);
    assert_eq!(got["region"], "lon");
    assert_eq!(got["group_id"], 3);

    let got = app.call(Verb::Get, json!({"name": "supu", "group_id": 4})).await;
    assert!(is_not_found(&got), "{got}");

    for body in [json!({"id": 32}), json!({"name": "unknown"}), json!({})] {
        let got = app.call(Verb::Get, body).await;
        assert!(is_not_found(&got), "{got}");
    }
}

#[tokio::test]
async fn test_delete_unknown_is_not_found() {
    let app = TestApp::spawn().await;
    let reply = app.call(Verb::Del, json!({"id": 32})).await;
    assert!(is_not_found(&reply), "{reply}");
}

#[tokio::test]
async fn test_delete_removes_row_physically() {
    let app = TestApp::spawn().await;
    let id = app.create(json!({"name": "gone", "type": "aws"})).await;

    app.call(Verb::Del, json!({"name": "gone"})).await;

    let row = datacenter::Entity::find_by_id(id)
        .one(&app.db)
        .await
        .expect("query succeeds");
    assert!(row.is_none());
}

#[tokio::test]
async fn test_update_unknown_id_is_not_found() {
    let app = TestApp::spawn().await;
    let reply = app
        .call(Verb::Set, json!({"id": 1000, "name": "test-100", "type": "fake"}))
        .await;
    assert!(is_not_found(&reply), "{reply}");
}

#[tokio::test]
async fn test_update_preserves_omitted_and_empty_secrets() {
    let app = TestApp::spawn().await;
    let id = app
        .create(json!({
            "name": "azure",
            "type": "azure",
            "client_id": "cid",
            "client_secret": "csecret",
            "tenant_id": "tid",
        }))
        .await;
    let before = app.call(Verb::Get, json!({"id": id})).await;

    // A client echoing the fetched record with secrets blanked must not wipe them.
    app.call(
        Verb::Set,
        json!({"id": id, "client_id": "", "client_secret": "", "environment": "public"}),
    )
    .await;

    let after = app.call(Verb::Get, json!({"id": id})).await;
    assert_eq!(after["client_id"], before["client_id"]);
    assert_eq!(after["client_secret"], before["client_secret"]);
    assert_eq!(after["tenant_id"], before["tenant_id"]);
    assert_eq!(after["environment"], "public");
    assert_eq!(after["name"], "azure");
}

#[tokio::test]
async fn test_update_overwrites_non_empty_secret_with_ciphertext() {
    let app = TestApp::spawn().await;
    let id = app
        .create(json!({"name": "rotate", "type": "aws", "secret_access_key": "old"}))
        .await;

    let updated = app
        .call(Verb::Set, json!({"id": id, "secret_access_key": "new"}))
        .await;
    assert_ne!(updated["secret_access_key"], "new");
    assert_eq!(app.decrypt(&updated["secret_access_key"]), "new");

    let stored = app.call(Verb::Get, json!({"id": id})).await;
    assert_eq!(stored["secret_access_key"], updated["secret_access_key"]);
}

#[tokio::test]
async fn test_fetched_record_sent_back_keeps_secrets() {
    let app = TestApp::spawn().await;
    let id = app
        .create(json!({
            "name": "fred",
            "type": "aws",
            "password": "pw",
            "access_key_id": "foo",
            "secret_access_key": "bar",
            "token": "tok",
        }))
        .await;

    let mut fetched = app.call(Verb::Get, json!({"id": id})).await;
    let before = fetched.clone();
    fetched["name"] = json!("fred2");
    let updated = app.call(Verb::Set, fetched).await;
    assert_eq!(updated["name"], "fred2");

    let after = app.call(Verb::Get, json!({"id": id})).await;
    for (field, plain) in [
        ("password", "pw"),
        ("access_key_id", "foo"),
        ("secret_access_key", "bar"),
        ("token", "tok"),
    ] {
        assert_eq!(after[field], before[field], "{field} changed");
        assert_eq!(app.decrypt(&after[field]), plain, "{field}");
    }
    assert_eq!(after["client_secret"], "");
}

#[tokio::test]
async fn test_login_fields_follow_policy() {
    let app = TestApp::spawn().await;
    let got = app
        .call(
            Verb::Set,
            json!({"name": "vc", "type": "vcloud", "username": "admin", "password": "pw"}),
        )
        .await;
    assert_eq!(got["username"], "admin");
    assert_eq!(app.decrypt(&got["password"]), "pw");

    let app = TestApp::spawn_with_policy(SensitivityPolicy {
        encrypt_username: true,
        encrypt_password: true,
    })
    .await;
    let got = app
        .call(
            Verb::Set,
            json!({"name": "vc", "type": "vcloud", "username": "admin", "password": "pw"}),
        )
        .await;
    assert_eq!(app.decrypt(&got["username"]), "admin");
}

#[tokio::test]
async fn test_duplicate_name_is_a_conflict() {
    let app = TestApp::spawn().await;
    app.create(json!({"name": "dup", "type": "aws", "group_id": 1}))
        .await;

    let reply = app
        .call(Verb::Set, json!({"name": "dup", "type": "aws", "group_id": 1}))
        .await;
    assert_eq!(reply["_error"], "Conflict");

    // Same name in another group or of another type is allowed.
    app.create(json!({"name": "dup", "type": "aws", "group_id": 2}))
        .await;
    app.create(json!({"name": "dup", "type": "azure", "group_id": 1}))
        .await;

    let all = app.call(Verb::Find, json!({"name": "dup"})).await;
    assert_eq!(names(&all).len(), 3);
}

#[tokio::test]
async fn test_soft_deleted_row_still_blocks_its_name() {
    let app = TestApp::spawn().await;
    let now = chrono::Utc::now();
    datacenter::ActiveModel {
        group_id: Set(1),
        name: Set("legacy".into()),
        r#type: Set("aws".into()),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(Some(now)),
        ..Default::default()
    }
    .insert(&app.db)
    .await
    .expect("insert soft-deleted row");

    let got = app.call(Verb::Get, json!({"name": "legacy"})).await;
    assert!(is_not_found(&got), "{got}");

    let reply = app
        .call(Verb::Set, json!({"name": "legacy", "type": "aws", "group_id": 1}))
        .await;
    assert_eq!(reply["_error"], "Conflict");
    let message = reply["message"].as_str().unwrap_or_default();
    assert!(message.contains("already exists in group 1"), "{message}");
}

#[tokio::test]
async fn test_rename_onto_existing_is_a_conflict() {
    let app = TestApp::spawn().await;
    app.create(json!({"name": "a", "type": "aws"})).await;
    let b = app.create(json!({"name": "b", "type": "aws"})).await;

    let reply = app.call(Verb::Set, json!({"id": b, "name": "a"})).await;
    assert_eq!(reply["_error"], "Conflict");

    let got = app.call(Verb::Get, json!({"id": b})).await;
    assert_eq!(got["name"], "b");
}

#[tokio::test]
async fn test_find_precedence() {
    let app = TestApp::spawn().await;
    let a = app
        .create(json!({"name": "a", "type": "aws", "group_id": 1}))
        .await;
    let b = app
        .create(json!({"name": "b", "type": "aws", "group_id": 1}))
        .await;
    app.create(json!({"name": "c", "type": "aws", "group_id": 2}))
        .await;

    // ids win over name.
    let found = app
        .call(Verb::Find, json!({"ids": [a.to_string(), b.to_string()], "name": "c"}))
        .await;
    assert_eq!(names(&found), ["a", "b"]);

    // names win over name + group.
    let found = app
        .call(Verb::Find, json!({"names": ["a", "c"], "name": "b", "group_id": 1}))
        .await;
    assert_eq!(names(&found), ["a", "c"]);

    let found = app.call(Verb::Find, json!({"name": "a", "group_id": 2})).await;
    assert!(names(&found).is_empty());

    let found = app.call(Verb::Find, json!({"group_id": 1})).await;
    assert_eq!(names(&found), ["a", "b"]);

    let found = app.call(Verb::Find, json!({})).await;
    assert_eq!(names(&found), ["a", "b", "c"]);
}

#[tokio::test]
async fn test_find_without_matches_is_empty_list() {
    let app = TestApp::spawn().await;
    let found = app.call(Verb::Find, json!({"name": "nobody"})).await;
    assert_eq!(found, json!([]));

    let found = app.call_raw(Verb::Find, b"not json").await;
    assert_eq!(found, json!([]));
}

#[tokio::test]
async fn test_nested_credentials_are_stored_flat() {
    let app = TestApp::spawn().await;
    let got = app
        .call(
            Verb::Set,
            json!({
                "name": "legacy",
                "type": "aws",
                "credentials": {"region": "eu-west-1", "access_key_id": "legacy-id"},
            }),
        )
        .await;
    assert_eq!(got["region"], "eu-west-1");
    assert_eq!(app.decrypt(&got["access_key_id"]), "legacy-id");
    assert!(got.get("credentials").is_none());
}
