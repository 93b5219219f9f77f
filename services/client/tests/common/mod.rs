//! A stub of the indexing/retrieval backend served by axum on an ephemeral port.
//!
//! It keeps folders and documents in memory, answers queries with a fixed
//! shape, records what it received, and can be told to fail the next call to a
//! route with an arbitrary status and body.

#![allow(dead_code)]

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: String,
    pub folder_id: String,
    pub filename: String,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct ReceivedUpload {
    pub folder_id: String,
    pub part_name: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
}

#[derive(Default)]
struct Inner {
    folders: Vec<(String, String)>,
    documents: Vec<StoredDocument>,
    uploads: Vec<ReceivedUpload>,
    queries: Vec<Value>,
    failures: HashMap<&'static str, (u16, String)>,
    next_id: usize,
}

impl Inner {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

#[derive(Default)]
struct StubState {
    inner: Mutex<Inner>,
}

impl StubState {
    fn take_failure(&self, route: &'static str) -> Option<Response> {
        let (status, body) = self.inner.lock().unwrap().failures.remove(route)?;
        let status = StatusCode::from_u16(status).unwrap();
        Some((status, body).into_response())
    }
}

pub struct StubBackend {
    pub base_url: String,
    state: Arc<StubState>,
}

impl StubBackend {
    /// Makes the next call to `route` answer `status` with the raw `body`.
    ///
    /// Routes: `list_folders`, `create_folder`, `rename_folder`,
    /// `list_documents`, `delete_document`, `upload`, `query`.
    pub fn fail_next(&self, route: &'static str, status: u16, body: &str) {
        self.state
            .inner
            .lock()
            .unwrap()
            .failures
            .insert(route, (status, body.to_string()));
    }

    pub fn add_folder(&self, name: &str) -> String {
        let mut inner = self.state.inner.lock().unwrap();
        let id = inner.next_id("folder");
        inner.folders.push((id.clone(), name.to_string()));
        id
    }

    pub fn set_status(&self, document_id: &str, status: &str) {
        let mut inner = self.state.inner.lock().unwrap();
        if let Some(doc) = inner.documents.iter_mut().find(|d| d.id == document_id) {
            doc.status = status.to_string();
        }
    }

    pub fn documents(&self) -> Vec<StoredDocument> {
        self.state.inner.lock().unwrap().documents.clone()
    }

    pub fn uploads(&self) -> Vec<ReceivedUpload> {
        self.state.inner.lock().unwrap().uploads.clone()
    }

    pub fn queries(&self) -> Vec<Value> {
        self.state.inner.lock().unwrap().queries.clone()
    }
}

/// Starts the stub and returns once it is accepting connections.
pub async fn spawn_stub() -> StubBackend {
    let state = Arc::new(StubState::default());
    let app = Router::new()
        .route("/folders", get(list_folders).post(create_folder))
        .route("/folders/{id}", put(rename_folder))
        .route("/folders/{id}/documents", get(list_documents))
        .route("/documents/{id}", delete(delete_document))
        .route("/upload/{folder_id}", post(upload))
        .route("/query", post(query))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StubBackend {
        base_url: format!("http://{}", addr),
        state,
    }
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

async fn list_folders(State(state): State<Arc<StubState>>) -> Response {
    if let Some(failure) = state.take_failure("list_folders") {
        return failure;
    }
    let inner = state.inner.lock().unwrap();
    let folders: Vec<Value> = inner
        .folders
        .iter()
        .map(|(id, name)| json!({ "id": id, "name": name, "created_at": "2024-03-01T09:30:00.123456" }))
        .collect();
    Json(folders).into_response()
}

async fn create_folder(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Response {
    if let Some(failure) = state.take_failure("create_folder") {
        return failure;
    }
    let Some(name) = body.get("name").and_then(Value::as_str) else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": [{ "loc": ["body", "name"], "msg": "Field required" }] })),
        )
            .into_response();
    };
    let mut inner = state.inner.lock().unwrap();
    if inner.folders.iter().any(|(_, n)| n == name) {
        return detail(StatusCode::BAD_REQUEST, "Folder already exists");
    }
    let id = inner.next_id("folder");
    inner.folders.push((id.clone(), name.to_string()));
    Json(json!({ "id": id, "name": name })).into_response()
}

async fn rename_folder(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Some(failure) = state.take_failure("rename_folder") {
        return failure;
    }
    let name = body.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
    let mut inner = state.inner.lock().unwrap();
    if inner.folders.iter().any(|(other, n)| *n == name && *other != id) {
        return detail(StatusCode::BAD_REQUEST, "Folder with this name already exists");
    }
    match inner.folders.iter_mut().find(|(other, _)| *other == id) {
        Some(folder) => {
            folder.1 = name.clone();
            Json(json!({ "id": id, "name": name })).into_response()
        }
        None => detail(StatusCode::NOT_FOUND, "Folder not found"),
    }
}

async fn list_documents(State(state): State<Arc<StubState>>, Path(id): Path<String>) -> Response {
    if let Some(failure) = state.take_failure("list_documents") {
        return failure;
    }
    let inner = state.inner.lock().unwrap();
    let documents: Vec<Value> = inner
        .documents
        .iter()
        .filter(|d| d.folder_id == id)
        .map(|d| {
            json!({
                "id": d.id,
                "filename": d.filename,
                "status": d.status,
                "folder_id": d.folder_id,
                "created_at": "2024-03-01T10:00:00",
            })
        })
        .collect();
    Json(documents).into_response()
}

async fn delete_document(State(state): State<Arc<StubState>>, Path(id): Path<String>) -> Response {
    if let Some(failure) = state.take_failure("delete_document") {
        return failure;
    }
    let mut inner = state.inner.lock().unwrap();
    let before = inner.documents.len();
    inner.documents.retain(|d| d.id != id);
    if inner.documents.len() == before {
        return detail(StatusCode::NOT_FOUND, "Document not found");
    }
    Json(json!({ "status": "deleted" })).into_response()
}

async fn upload(
    State(state): State<Arc<StubState>>,
    Path(folder_id): Path<String>,
    mut multipart: Multipart,
) -> Response {
    if let Some(failure) = state.take_failure("upload") {
        return failure;
    }
    let mut received = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let part_name = field.name().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let size = field.bytes().await.map(|b| b.len()).unwrap_or_default();
        received.push(ReceivedUpload {
            folder_id: folder_id.clone(),
            part_name,
            file_name,
            content_type,
            size,
        });
    }

    let mut inner = state.inner.lock().unwrap();
    if !inner.folders.iter().any(|(id, _)| *id == folder_id) {
        return detail(StatusCode::NOT_FOUND, "Folder not found");
    }
    for upload in &received {
        let id = inner.next_id("doc");
        inner.documents.push(StoredDocument {
            id,
            folder_id: folder_id.clone(),
            filename: upload.file_name.clone().unwrap_or_default(),
            status: "uploaded".to_string(),
        });
    }
    inner.uploads.extend(received);
    Json(json!({ "status": "success", "chunks_indexed": 0 })).into_response()
}

async fn query(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Response {
    if let Some(failure) = state.take_failure("query") {
        return failure;
    }
    let question = body.get("question").and_then(Value::as_str).unwrap_or_default().to_string();
    state.inner.lock().unwrap().queries.push(body);
    Json(json!({
        "answer": format!("Stub answer to: {}", question),
        "sources": [{
            "document_title": "cells.pdf",
            "page_number": 3,
            "snippet": "Mitochondria are the powerhouse of the cell. ".repeat(10),
            "score": 0.87,
        }],
    }))
    .into_response()
}
