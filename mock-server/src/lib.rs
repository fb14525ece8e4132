use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct Account {
    pub password: String,
    pub profile: Map<String, Value>,
}

#[derive(Default)]
pub struct Backend {
    /// Keyed by login id.
    pub accounts: HashMap<String, Account>,
    /// Bearer token -> login id.
    pub tokens: HashMap<String, String>,
    /// Collection name -> record id -> record.
    pub collections: HashMap<String, HashMap<String, Value>>,
}

pub type Db = Arc<RwLock<Backend>>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    pub user_id: String,
    pub password: String,
}

/// Accounts available without registering, one per role.
pub fn seeded_backend() -> Backend {
    let mut backend = Backend::default();
    for (id, name, role) in [
        ("STU001", "Ama Mensah", "student"),
        ("STF001", "Kofi Boateng", "staff"),
        ("MGT001", "Esi Owusu", "management"),
    ] {
        let profile = json!({ "id": id, "name": name, "role": role, "email": format!("{}@school.test", id.to_lowercase()) });
        backend.accounts.insert(
            id.to_string(),
            Account {
                password: "password123".to_string(),
                profile: profile.as_object().cloned().unwrap_or_default(),
            },
        );
    }
    backend
}

pub fn app() -> Router {
    app_with(seeded_backend())
}

pub fn app_with(backend: Backend) -> Router {
    let db: Db = Arc::new(RwLock::new(backend));
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/profile", get(get_profile).put(update_profile))
        .route("/api/auth/profile/image", post(upload_profile_image))
        .route("/api/echo", post(echo))
        .route("/api/{collection}", get(list_records).post(create_record))
        .route(
            "/api/{collection}/{id}",
            get(get_record).put(update_record).delete(delete_record),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolve the caller's login id from the bearer token.
async fn authenticate(db: &Db, headers: &HeaderMap) -> Result<String, Response> {
    let token = bearer(headers).ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "Authentication required"))?;
    db.read()
        .await
        .tokens
        .get(token)
        .cloned()
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "Invalid or expired token"))
}

async fn login(State(db): State<Db>, Json(input): Json<LoginInput>) -> Response {
    let mut backend = db.write().await;
    let profile = match backend.accounts.get(&input.user_id) {
        Some(account) if account.password == input.password => account.profile.clone(),
        _ => return failure(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    };
    let token = Uuid::new_v4().to_string();
    backend.tokens.insert(token.clone(), input.user_id.clone());
    info!(user_id = %input.user_id, "login");
    Json(json!({ "success": true, "token": token, "user": profile })).into_response()
}

async fn register(State(db): State<Db>, Json(input): Json<Map<String, Value>>) -> Response {
    let user_id = input.get("userId").and_then(Value::as_str).map(str::to_string);
    let password = input.get("password").and_then(Value::as_str).map(str::to_string);
    let (Some(user_id), Some(password)) = (user_id, password) else {
        return failure(StatusCode::BAD_REQUEST, "userId and password are required");
    };

    let mut backend = db.write().await;
    if backend.accounts.contains_key(&user_id) {
        return failure(StatusCode::CONFLICT, "User already exists");
    }
    let mut profile = input;
    profile.remove("password");
    profile.remove("userId");
    profile.insert("id".to_string(), Value::String(user_id.clone()));
    backend.accounts.insert(
        user_id,
        Account {
            password,
            profile: profile.clone(),
        },
    );
    (
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Registration successful", "user": profile })),
    )
        .into_response()
}

async fn get_profile(State(db): State<Db>, headers: HeaderMap) -> Response {
    let user_id = match authenticate(&db, &headers).await {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let backend = db.read().await;
    match backend.accounts.get(&user_id) {
        Some(account) => Json(json!({ "success": true, "user": account.profile })).into_response(),
        None => failure(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn update_profile(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(patch): Json<Map<String, Value>>,
) -> Response {
    let user_id = match authenticate(&db, &headers).await {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let mut backend = db.write().await;
    let Some(account) = backend.accounts.get_mut(&user_id) else {
        return failure(StatusCode::NOT_FOUND, "User not found");
    };
    for (key, value) in patch {
        if key != "id" && key != "role" {
            account.profile.insert(key, value);
        }
    }
    Json(json!({ "success": true, "message": "Profile updated", "user": account.profile }))
        .into_response()
}

async fn upload_profile_image(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<Map<String, Value>>,
) -> Response {
    let user_id = match authenticate(&db, &headers).await {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let image = match input.get("image").and_then(Value::as_str) {
        Some(uri) if uri.starts_with("data:image/") && uri.contains(";base64,") => uri.to_string(),
        _ => return failure(StatusCode::BAD_REQUEST, "image must be a base64 data URI"),
    };
    let mut backend = db.write().await;
    let Some(account) = backend.accounts.get_mut(&user_id) else {
        return failure(StatusCode::NOT_FOUND, "User not found");
    };
    account
        .profile
        .insert("profileImage".to_string(), Value::String(image));
    Json(json!({ "success": true, "user": account.profile })).into_response()
}

async fn echo(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({ "success": true, "data": body }))
}

fn matches_filters(record: &Value, filters: &HashMap<String, String>) -> bool {
    filters.iter().all(|(key, expected)| match record.get(key) {
        Some(Value::String(s)) => s == expected,
        Some(other) => other.to_string() == *expected,
        None => false,
    })
}

async fn list_records(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(collection): Path<String>,
    Query(filters): Query<HashMap<String, String>>,
) -> Response {
    if let Err(resp) = authenticate(&db, &headers).await {
        return resp;
    }
    let backend = db.read().await;
    let mut records: Vec<Value> = backend
        .collections
        .get(&collection)
        .map(|c| c.values().filter(|r| matches_filters(r, &filters)).cloned().collect())
        .unwrap_or_default();
    records.sort_by(|a, b| a["id"].as_str().cmp(&b["id"].as_str()));
    Json(json!({ "success": true, "data": records })).into_response()
}

async fn create_record(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(collection): Path<String>,
    Json(input): Json<Map<String, Value>>,
) -> Response {
    if let Err(resp) = authenticate(&db, &headers).await {
        return resp;
    }
    let id = Uuid::new_v4().to_string();
    let mut record = input;
    record.insert("id".to_string(), Value::String(id.clone()));
    let record = Value::Object(record);
    db.write()
        .await
        .collections
        .entry(collection)
        .or_default()
        .insert(id, record.clone());
    (StatusCode::CREATED, Json(json!({ "success": true, "data": record }))).into_response()
}

async fn get_record(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    if let Err(resp) = authenticate(&db, &headers).await {
        return resp;
    }
    let backend = db.read().await;
    match backend.collections.get(&collection).and_then(|c| c.get(&id)) {
        Some(record) => Json(json!({ "success": true, "data": record })).into_response(),
        None => failure(StatusCode::NOT_FOUND, "Not found"),
    }
}

async fn update_record(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((collection, id)): Path<(String, String)>,
    Json(patch): Json<Map<String, Value>>,
) -> Response {
    if let Err(resp) = authenticate(&db, &headers).await {
        return resp;
    }
    let mut backend = db.write().await;
    let Some(Value::Object(record)) = backend
        .collections
        .get_mut(&collection)
        .and_then(|c| c.get_mut(&id))
    else {
        return failure(StatusCode::NOT_FOUND, "Not found");
    };
    for (key, value) in patch {
        if key != "id" {
            record.insert(key, value);
        }
    }
    Json(json!({ "success": true, "data": record })).into_response()
}

async fn delete_record(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    if let Err(resp) = authenticate(&db, &headers).await {
        return resp;
    }
    let mut backend = db.write().await;
    match backend.collections.get_mut(&collection).and_then(|c| c.remove(&id)) {
        Some(_) => Json(json!({ "success": true, "message": "Deleted" })).into_response(),
        None => failure(StatusCode::NOT_FOUND, "Not found"),
    }
}
