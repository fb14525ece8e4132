#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use schoolhub_core::{
    ApiError, ClientConfig, HttpRequest, HttpResponse, KeyValueStore, MemoryStore, SchoolClient,
    Transport,
};

pub const BASE_URL: &str = "http://localhost:5000/api";

pub enum Scripted {
    Reply(HttpResponse),
    Fail(String),
}

/// Transport double that records every request and replays scripted
/// replies. With nothing scripted it answers `200 {"success":true}`.
#[derive(Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<HttpRequest>>,
    script: Mutex<VecDeque<Scripted>>,
    blob: Mutex<Option<(Vec<u8>, Option<String>)>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, status: u16, status_text: &str, body: &str) {
        self.script.lock().unwrap().push_back(Scripted::Reply(HttpResponse {
            status,
            status_text: status_text.to_string(),
            headers: Vec::new(),
            body: body.to_string(),
        }));
    }

    pub fn reply_json(&self, body: serde_json::Value) {
        self.reply(200, "OK", &body.to_string());
    }

    pub fn fail(&self, reason: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Fail(reason.to_string()));
    }

    pub fn serve_blob(&self, bytes: &[u8], content_type: Option<&str>) {
        *self.blob.lock().unwrap() = Some((bytes.to_vec(), content_type.map(str::to_string)));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> HttpRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request recorded")
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(request);
        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Reply(resp)) => Ok(resp),
            Some(Scripted::Fail(reason)) => Err(ApiError::Network(reason)),
            None => Ok(HttpResponse {
                status: 200,
                status_text: "OK".to_string(),
                headers: Vec::new(),
                body: r#"{"success":true}"#.to_string(),
            }),
        }
    }

    async fn fetch_bytes(&self, url: &str) -> Result<(Vec<u8>, Option<String>), ApiError> {
        self.blob
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ApiError::Network(format!("no blob at {url}")))
    }
}

/// Store double whose every operation fails, as an unavailable disk would.
pub struct FailingStore;

fn unavailable() -> ApiError {
    ApiError::Storage("storage unavailable".to_string())
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, ApiError> {
        Err(unavailable())
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), ApiError> {
        Err(unavailable())
    }

    async fn remove(&self, _key: &str) -> Result<(), ApiError> {
        Err(unavailable())
    }

    async fn multi_set(&self, _entries: &[(&str, &str)]) -> Result<(), ApiError> {
        Err(unavailable())
    }

    async fn multi_remove(&self, _keys: &[&str]) -> Result<(), ApiError> {
        Err(unavailable())
    }
}

pub fn failing_client() -> (SchoolClient, Arc<RecordingTransport>) {
    let transport = RecordingTransport::new();
    let client = SchoolClient::new(
        ClientConfig::new(BASE_URL),
        transport.clone(),
        Arc::new(FailingStore),
    );
    (client, transport)
}

pub fn client_with(
    config: ClientConfig,
) -> (SchoolClient, Arc<RecordingTransport>, Arc<MemoryStore>) {
    let transport = RecordingTransport::new();
    let store = Arc::new(MemoryStore::new());
    let client = SchoolClient::new(config, transport.clone(), store.clone());
    (client, transport, store)
}

pub fn client() -> (SchoolClient, Arc<RecordingTransport>, Arc<MemoryStore>) {
    client_with(ClientConfig::new(BASE_URL))
}

pub fn login_reply(token: &str) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "token": token,
        "user": {
            "id": "STU001",
            "name": "Ama Mensah",
            "role": "student",
            "email": "stu001@school.test",
            "classId": "JHS2"
        }
    })
}
