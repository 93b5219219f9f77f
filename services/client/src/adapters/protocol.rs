//! services/client/src/adapters/protocol.rs
//!
//! Defines the JSON message shapes exchanged with the retrieval backend and
//! their conversion into core domain types.

use chrono::{DateTime, NaiveDateTime, Utc};
use pocket_rag_core::domain::{
    Answer, Citation, Document, DocumentId, DocumentStatus, Scope, ScopeId, UploadReceipt,
};
use serde::{Deserialize, Deserializer, Serialize};

/// Accepts RFC 3339 timestamps as well as naive ones (taken as UTC). Anything
/// unparseable becomes `None` instead of failing the whole response.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}

//=========================================================================================
// Requests Sent TO the Backend
//=========================================================================================

/// Body of `POST /folders` and `PUT /folders/{id}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FolderPayload {
    pub name: String,
}

/// Body of `POST /query`. A `null` folder means corpus-wide retrieval.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub question: String,
    pub folder_id: Option<String>,
}

//=========================================================================================
// Responses Received FROM the Backend
//=========================================================================================

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FolderRecord {
    pub id: String,
    pub name: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_timestamp"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl FolderRecord {
    pub fn into_domain(self) -> Scope {
        Scope {
            id: ScopeId::new(self.id),
            name: self.name,
            created_at: self.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DocumentRecord {
    pub id: String,
    pub filename: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_timestamp"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl DocumentRecord {
    /// Converts the record, attributing it to the scope it was listed under
    /// when the backend omits `folder_id`.
    pub fn into_domain(self, listed_under: &ScopeId) -> Document {
        let scope_id = self
            .folder_id
            .map(ScopeId::new)
            .unwrap_or_else(|| listed_under.clone());
        Document {
            id: DocumentId::new(self.id),
            scope_id,
            filename: self.filename,
            status: DocumentStatus::new(self.status),
            created_at: self.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SourceRecord {
    pub document_title: String,
    pub page_number: u32,
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl SourceRecord {
    pub fn into_domain(self) -> Citation {
        Citation {
            document_title: self.document_title,
            page_number: self.page_number,
            snippet: self.snippet,
            score: self.score,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QueryResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<SourceRecord>,
}

impl QueryResponse {
    pub fn into_domain(self) -> Answer {
        Answer {
            text: self.answer,
            citations: self.sources.into_iter().map(SourceRecord::into_domain).collect(),
        }
    }
}

/// Acknowledgment of `POST /upload/{id}`. Only the status code is contractual,
/// so every field is optional.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UploadAck {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub chunks_indexed: Option<u32>,
}

impl UploadAck {
    pub fn into_domain(self) -> UploadReceipt {
        UploadReceipt {
            status: self.status,
            chunks_indexed: self.chunks_indexed,
        }
    }
}

//=========================================================================================
// Error Bodies
//=========================================================================================

/// Error body returned by the backend. `detail` is either a plain string or a
/// list of field errors, each carrying a `msg`.
#[derive(Deserialize, Debug, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Extracts a human-readable message, if the body carries one.
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
            serde_json::Value::Array(items) => {
                let messages: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                    .collect();
                if messages.is_empty() {
                    None
                } else {
                    Some(messages.join("; "))
                }
            }
            _ => None,
        }
    }
}

/// The message used when an error response carries no usable detail.
pub fn generic_failure_message(status: u16) -> String {
    format!("Request failed with status {}", status)
}

/// Reads the human-readable detail out of a raw error body.
pub fn error_detail(status: u16, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message())
        .unwrap_or_else(|| generic_failure_message(status))
}
