use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use terminal_command_server_lib::auth::LoginCheck;
use terminal_command_server_lib::http::{build_router, AppState};
use terminal_command_server_lib::service::CommandService;
use terminal_command_server_lib::store::{CommandMap, CommandStore, JsonFileStore, MemoryStore};
use tower::ServiceExt;

const PASSWORD: &str = "kiosk-admin";

fn app_with(initial: Value) -> (Router, Arc<MemoryStore>) {
    let commands: CommandMap = serde_json::from_value(initial).expect("initial commands");
    let store = Arc::new(MemoryStore::new(commands));
    let service = CommandService::new(store.clone(), true);
    let app = build_router(AppState::new(service, LoginCheck::new(Some(PASSWORD.to_string()))));
    (app, store)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    match body {
        Some(body) => send_raw(app, method, uri, Some("application/json"), body.to_string()).await,
        None => send_raw(app, method, uri, None, String::new()).await,
    }
}

async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    content_type: Option<&str>,
    body: String,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    let request = builder.body(Body::from(body)).expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body bytes");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };
    (status, value)
}

fn stored(store: &MemoryStore) -> Value {
    store.snapshot().expect("snapshot").to_json()
}

#[tokio::test]
async fn list_returns_mapping_in_store_order() {
    let (app, _) = app_with(json!({"zz": {"text": "1"}, "aa": {"text": "2"}}));
    let (status, body) = send(&app, Method::GET, "/command", None).await;
    assert_eq!(status, StatusCode::OK);
    let keys: Vec<_> = body.as_object().expect("object").keys().cloned().collect();
    assert_eq!(keys, vec!["zz", "aa"]);

    let (status, body) = send(&app, Method::GET, "/command?shape=list", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"zz": {"text": "1"}}, {"aa": {"text": "2"}}]));
}

#[tokio::test]
async fn get_one_and_missing() {
    let (app, _) = app_with(json!({"help": {"text": "usage"}}));
    let (status, body) = send(&app, Method::GET, "/command/help", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"text": "usage"}));

    let (status, body) = send(&app, Method::GET, "/command/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!("Command with id nope not found"));
}

#[tokio::test]
async fn post_adds_placeholder_then_conflicts() {
    let (app, store) = app_with(json!({}));
    let (status, body) = send(&app, Method::POST, "/command", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["key"], json!("command_name"));
    assert_eq!(body["command"]["terminal_num"], json!([1]));

    let (status, _) = send(&app, Method::POST, "/command", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(store.snapshot().expect("snapshot").len(), 1);
}

#[tokio::test]
async fn post_with_single_entry_body_uses_its_key() {
    let (app, store) = app_with(json!({"a": {"text": "a"}}));
    let (status, body) = send(&app, Method::POST, "/command", Some(json!({"boot": {"text": "booting"}}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["key"], json!("boot"));
    assert_eq!(stored(&store), json!({"a": {"text": "a"}, "boot": {"text": "booting"}}));

    let (status, _) = send(&app, Method::POST, "/command", Some(json!({"x": {}, "y": {}}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn post_with_malformed_json_is_rejected() {
    let (app, store) = app_with(json!({"a": {"text": "a"}}));
    let (status, body) = send_raw(
        &app,
        Method::POST,
        "/command",
        Some("application/json"),
        r#"{"boot": {"text": "booting"#.to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
    assert_eq!(stored(&store), json!({"a": {"text": "a"}}));

    let (status, body) = send(&app, Method::POST, "/command", Some(json!({"boot": {"set_session_data": "door"}}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().expect("message").contains("invalid command data"));
    assert_eq!(stored(&store), json!({"a": {"text": "a"}}));
}

#[tokio::test]
async fn update_one_with_bad_body_answers_json_400() {
    let (app, store) = app_with(json!({"a": {"text": "hi"}}));
    let (status, body) = send(&app, Method::PUT, "/command/updateone/a", Some(json!({"key": "a"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().expect("message").contains("objectData"));

    let (status, body) = send_raw(
        &app,
        Method::PUT,
        "/command/updateone/a",
        None,
        json!({"key": "a", "objectData": {}}).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, body) = send_raw(&app, Method::PATCH, "/command/a", Some("application/json"), "{".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, body) = send_raw(&app, Method::PUT, "/command/updateall", None, "{}".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
    assert_eq!(stored(&store), json!({"a": {"text": "hi"}}));
}

#[tokio::test]
async fn update_one_renames_in_place() {
    let (app, store) = app_with(json!({"a": {"text": "hi"}, "b": {"text": "bye"}}));
    let (status, body) = send(
        &app,
        Method::PUT,
        "/command/updateone/a",
        Some(json!({"key": "z", "objectData": {"text": "hi2"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["command"], json!({"text": "hi2"}));
    assert_eq!(serde_json::to_string(&stored(&store)).expect("json"), r#"{"z":{"text":"hi2"},"b":{"text":"bye"}}"#);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/command/updateone/a",
        Some(json!({"key": "a", "objectData": {}})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_one_drops_blanked_session_data() {
    let (app, store) = app_with(json!({
        "door": {"text": "x", "set_session_data": {"name": "door", "value": "open"}}
    }));
    let (status, _) = send(
        &app,
        Method::PUT,
        "/command/updateone/door",
        Some(json!({"key": "door", "objectData": {"text": "x", "set_session_data": {"name": "", "value": ""}}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored(&store), json!({"door": {"text": "x"}}));
}

#[tokio::test]
async fn update_all_accepts_mapping_or_rows() {
    let (app, store) = app_with(json!({"a": 1}));
    let (status, _) = send(&app, Method::PUT, "/command/updateall", Some(json!({"b": {"text": "b"}}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored(&store), json!({"b": {"text": "b"}}));

    let rows = json!([{"y": {"text": "y"}}, {"x": {"text": "x"}}]);
    let (status, _) = send(&app, Method::PUT, "/command/updateall", Some(rows)).await;
    assert_eq!(status, StatusCode::OK);
    let keys: Vec<_> = store.snapshot().expect("snapshot").keys().map(str::to_string).collect();
    assert_eq!(keys, vec!["y", "x"]);

    let (status, _) = send(&app, Method::PUT, "/command/updateall", Some(json!([{"a": 1}, {"a": 2}]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, Method::PUT, "/command/updateall", Some(json!("nope"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.snapshot().expect("snapshot").len(), 2);
}

#[tokio::test]
async fn patch_sets_single_field() {
    let (app, store) = app_with(json!({"a": {"text": "hi"}}));
    let (status, body) = send(
        &app,
        Method::PATCH,
        "/command/a",
        Some(json!({"path": "required_session_data.name", "value": "power"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["command"]["required_session_data"], json!({"name": "power"}));
    assert_eq!(stored(&store)["a"]["required_session_data"]["name"], json!("power"));
}

#[tokio::test]
async fn delete_existing_and_missing() {
    let (app, store) = app_with(json!({"a": 1, "b": 2}));
    let (status, body) = send(&app, Method::DELETE, "/command/b", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Command deleted"));
    assert_eq!(stored(&store), json!({"a": 1}));

    let (status, _) = send(&app, Method::DELETE, "/command/c", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(stored(&store), json!({"a": 1}));
}

#[tokio::test]
async fn login_accepts_only_stored_password() {
    let (app, _) = app_with(json!({}));
    let (status, _) = send(&app, Method::GET, &format!("/login/{}", PASSWORD), None).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, body) = send(&app, Method::GET, "/login/guess", None).await;
    assert_ne!(status, StatusCode::ACCEPTED);
    assert_eq!(body["message"], json!("Invalid password"));
}

#[tokio::test]
async fn unreadable_store_is_500_and_server_keeps_serving() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("commands-data.json");
    std::fs::write(&path, "{broken").expect("write broken store");
    let store = Arc::new(JsonFileStore::new(&path));
    let app = build_router(AppState::new(CommandService::new(store.clone(), true), LoginCheck::default()));

    let (status, body) = send(&app, Method::GET, "/command", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].as_str().expect("message").contains("commands-data.json"));
    let (status, _) = send(&app, Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    store.save(&CommandMap::new()).expect("repair store");
    let (status, body) = send(&app, Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "commandCount": 0}));
}
