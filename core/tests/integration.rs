//! Full session lifecycle against the live mock server.
//!
//! Starts the mock server on a random port, then drives `SchoolClient` over
//! real HTTP through `ReqwestTransport` with a file-backed session store.

use std::sync::Arc;

use schoolhub_core::{
    roles, ApiError, ClientConfig, ErrorKind, FileImage, FileStore, ReqwestTransport,
    RequestOptions, SchoolClient,
};
use serde_json::{json, Value};

async fn start_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { mock_server::run(listener).await });
    format!("http://{addr}/api")
}

fn client(base_url: &str, store: Arc<FileStore>) -> SchoolClient {
    SchoolClient::new(
        ClientConfig::new(base_url),
        Arc::new(ReqwestTransport::new().unwrap()),
        store,
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn session_lifecycle() {
    let base_url = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path().join("session.json")));
    let c = client(&base_url, store.clone());

    // Step 1: anonymous calls to protected routes fail with the server message.
    let err = c.get_profile().await.unwrap_err();
    assert!(matches!(err, ApiError::Request { status: 401, .. }));
    assert_eq!(err.to_string(), "Authentication required");

    // Step 2: registration does not sign in.
    let registered = c
        .register(&json!({"userId": "STF777", "password": "s3cret", "name": "Yaw", "role": "Staff"}))
        .await
        .unwrap();
    assert!(registered.success());
    assert_eq!(c.stored_session().await, None);

    // Step 3: login persists the session to disk.
    let envelope = c.login("STF777", "s3cret").await.unwrap();
    let token = envelope.token().unwrap().to_string();
    let user = c.stored_session().await.unwrap();
    assert_eq!(user.name(), Some("Yaw"));
    assert!(roles::can_perform_admin_actions(Some(&user)));
    assert_eq!(roles::role_display_name(Some(&user)), "Staff");

    // A second client over the same file sees the same session.
    let reopened = client(&base_url, Arc::new(FileStore::new(store.path())));
    assert_eq!(reopened.stored_token().await.as_deref(), Some(token.as_str()));

    // Step 4: authenticated profile round-trip.
    let profile = c.get_profile().await.unwrap();
    assert_eq!(profile.user().unwrap().id().as_deref(), Some("STF777"));
    let updated = c.update_profile(&json!({"phone": "0200000000"})).await.unwrap();
    assert_eq!(updated.user().unwrap().phone(), Some("0200000000"));

    // Step 5: profile image travels as a data URI.
    let image_path = dir.path().join("me.png");
    std::fs::write(&image_path, [0x89, b'P', b'N', b'G']).unwrap();
    let uploaded = c.upload_profile_image(&FileImage::new(&image_path)).await.unwrap();
    let image = uploaded.user().unwrap().get("profileImage").cloned().unwrap();
    assert!(image.as_str().unwrap().starts_with("data:image/png;base64,"));

    // Step 6: notice CRUD through the convenience methods.
    let created = c
        .create_notice(&json!({"title": "Closing early", "audience": "all"}))
        .await
        .unwrap();
    let id = created.data().unwrap()["id"].as_str().unwrap().to_string();

    let listed = c.notices(Some("all")).await.unwrap().into_data().unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert!(c.notices(Some("staff")).await.unwrap().into_data().unwrap().as_array().unwrap().is_empty());

    let patched = c.update_notice(&id, &json!({"title": "Closing at noon"})).await.unwrap();
    assert_eq!(patched.data().unwrap()["title"], "Closing at noon");

    c.delete_notice(&id).await.unwrap();
    let err = c.request(&format!("/notices/{id}"), RequestOptions::get()).await.unwrap_err();
    assert_eq!(err.to_string(), "Not found");

    // Step 7: logout clears the file and later calls are anonymous again.
    c.logout().await;
    assert_eq!(c.stored_session().await, None);
    assert_eq!(reopened.stored_token().await, None);
    let err = c.events(None, None).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
}

#[tokio::test(flavor = "multi_thread")]
async fn echo_round_trip_preserves_payload() {
    let base_url = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let c = client(&base_url, Arc::new(FileStore::new(dir.path().join("s.json"))));

    let payloads = [
        json!("plain string"),
        json!(42),
        json!(-3.5),
        json!(true),
        Value::Null,
        json!([1, "two", null, [false]]),
        json!({"nested": {"list": [{"a": 1}, {"b": [null]}], "empty": {}}, "unicode": "Akwaaba ✓"}),
    ];
    for payload in payloads {
        let echoed = c
            .call("/echo", RequestOptions::post(&payload).unwrap())
            .await
            .unwrap()
            .into_data()
            .unwrap();
        assert_eq!(echoed, payload);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn wrong_password_is_a_request_error() {
    let base_url = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let c = client(&base_url, Arc::new(FileStore::new(dir.path().join("s.json"))));

    let err = c.login("STU001", "wrong").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Request);
    assert_eq!(err.to_string(), "Invalid credentials");
    assert_eq!(c.stored_session().await, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_is_a_network_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let c = client(
        &format!("http://{addr}/api"),
        Arc::new(FileStore::new(dir.path().join("s.json"))),
    );
    let err = c.events(None, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}
