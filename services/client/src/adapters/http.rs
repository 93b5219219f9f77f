//! services/client/src/adapters/http.rs
//!
//! This module contains the HTTP adapter for the indexing/retrieval backend.
//! It implements the `RetrievalBackend` port from the `core` crate using `reqwest`.

use crate::adapters::protocol::{
    error_detail, DocumentRecord, FolderPayload, FolderRecord, QueryRequest, QueryResponse,
    UploadAck,
};
use async_trait::async_trait;
use pocket_rag_core::domain::{
    Answer, Document, DocumentId, Scope, ScopeId, UploadFile, UploadReceipt,
};
use pocket_rag_core::ports::{PortError, PortResult, RetrievalBackend};
use reqwest::{multipart, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `RetrievalBackend` over the backend's REST API.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a new `HttpBackend`. The timeout, if any, applies to every request.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, base_url))
    }

    /// Creates an adapter around an existing client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a request and turns non-success statuses into `PortError::Rejected`.
    async fn send(&self, request: RequestBuilder, what: &str) -> PortResult<Response> {
        let response = request.send().await.map_err(|e| {
            warn!("{} failed before a response arrived: {}", what, e);
            PortError::Transport(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            debug!("{} -> {}", what, status);
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(status.as_u16(), &body);
        warn!("{} rejected with {}: {}", what, status, detail);
        Err(PortError::rejected(status.as_u16(), detail))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> PortResult<T> {
        let response = self.send(request, what).await?;
        response.json::<T>().await.map_err(|e| {
            warn!("{} returned an undecodable body: {}", what, e);
            PortError::Transport(format!("Failed to parse response: {}", e))
        })
    }
}

//=========================================================================================
// `RetrievalBackend` Trait Implementation
//=========================================================================================

#[async_trait]
impl RetrievalBackend for HttpBackend {
    async fn list_scopes(&self) -> PortResult<Vec<Scope>> {
        let records: Vec<FolderRecord> = self
            .send_json(self.client.get(self.url("/folders")), "GET /folders")
            .await?;
        Ok(records.into_iter().map(FolderRecord::into_domain).collect())
    }

    async fn create_scope(&self, name: &str) -> PortResult<Scope> {
        let payload = FolderPayload {
            name: name.to_string(),
        };
        let record: FolderRecord = self
            .send_json(
                self.client.post(self.url("/folders")).json(&payload),
                "POST /folders",
            )
            .await?;
        Ok(record.into_domain())
    }

    async fn rename_scope(&self, scope_id: &ScopeId, name: &str) -> PortResult<Scope> {
        let payload = FolderPayload {
            name: name.to_string(),
        };
        let record: FolderRecord = self
            .send_json(
                self.client
                    .put(self.url(&format!("/folders/{}", scope_id)))
                    .json(&payload),
                "PUT /folders/{id}",
            )
            .await?;
        Ok(record.into_domain())
    }

    async fn list_documents(&self, scope_id: &ScopeId) -> PortResult<Vec<Document>> {
        let records: Vec<DocumentRecord> = self
            .send_json(
                self.client
                    .get(self.url(&format!("/folders/{}/documents", scope_id))),
                "GET /folders/{id}/documents",
            )
            .await?;
        Ok(records
            .into_iter()
            .map(|r| r.into_domain(scope_id))
            .collect())
    }

    async fn delete_document(&self, document_id: &DocumentId) -> PortResult<()> {
        self.send(
            self.client
                .delete(self.url(&format!("/documents/{}", document_id))),
            "DELETE /documents/{id}",
        )
        .await?;
        Ok(())
    }

    async fn upload_document(&self, scope_id: &ScopeId, file: &UploadFile) -> PortResult<UploadReceipt> {
        let part = multipart::Part::bytes(file.content.to_vec())
            .file_name(file.filename.clone())
            .mime_str("application/pdf")
            .map_err(|e| PortError::Transport(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .send(
                self.client
                    .post(self.url(&format!("/upload/{}", scope_id)))
                    .multipart(form),
                "POST /upload/{id}",
            )
            .await?;

        // Only the status code is contractual; tolerate any body.
        let body = response.text().await.unwrap_or_default();
        let ack = serde_json::from_str::<UploadAck>(&body).unwrap_or_default();
        Ok(ack.into_domain())
    }

    async fn query(&self, question: &str, scope_id: Option<&ScopeId>) -> PortResult<Answer> {
        let request = QueryRequest {
            question: question.to_string(),
            folder_id: scope_id.map(|id| id.as_str().to_string()),
        };
        let response: QueryResponse = self
            .send_json(self.client.post(self.url("/query")).json(&request), "POST /query")
            .await?;
        Ok(response.into_domain())
    }
}
