//! crates/pocket_rag_core/src/ports.rs
//!
//! Defines the service contract (trait) between the session manager and the
//! indexing/retrieval backend. The session manager depends only on this trait,
//! so it stays independent of the concrete transport.

use async_trait::async_trait;
use crate::domain::{Answer, Document, DocumentId, Scope, ScopeId, UploadFile, UploadReceipt};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all backend port operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// The backend answered with an error status and a human-readable detail.
    #[error("{detail}")]
    Rejected { status: u16, detail: String },
    /// The request never produced a usable response (network failure, bad body).
    #[error("Transport error: {0}")]
    Transport(String),
}

impl PortError {
    pub fn rejected(status: u16, detail: impl Into<String>) -> Self {
        PortError::Rejected {
            status,
            detail: detail.into(),
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait RetrievalBackend: Send + Sync {
    // --- Scopes ---
    async fn list_scopes(&self) -> PortResult<Vec<Scope>>;

    async fn create_scope(&self, name: &str) -> PortResult<Scope>;

    async fn rename_scope(&self, scope_id: &ScopeId, name: &str) -> PortResult<Scope>;

    // --- Documents ---
    async fn list_documents(&self, scope_id: &ScopeId) -> PortResult<Vec<Document>>;

    async fn delete_document(&self, document_id: &DocumentId) -> PortResult<()>;

    /// Transfers one file into a scope. Success means "received", not "indexed".
    async fn upload_document(
        &self,
        scope_id: &ScopeId,
        file: &UploadFile,
    ) -> PortResult<UploadReceipt>;

    // --- Retrieval ---
    /// Answers a question from one scope, or from the whole corpus when `scope_id` is `None`.
    async fn query(&self, question: &str, scope_id: Option<&ScopeId>) -> PortResult<Answer>;
}
