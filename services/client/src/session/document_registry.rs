//! services/client/src/session/document_registry.rs
//!
//! Per-scope document listings and their indexing status.
//!
//! Listings are fetched on demand and fully replaced by each fetch. Indexing
//! progress is only observed by fetching again; nothing here polls.

use crate::error::SessionError;
use pocket_rag_core::domain::{Document, DocumentId, ScopeId};
use pocket_rag_core::ports::RetrievalBackend;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub const LOAD_FAILED_MESSAGE: &str = "Could not load documents.";
pub const DELETE_PROMPT: &str =
    "Are you sure you want to delete this document? This cannot be undone.";

/// What the registry knows about one scope's documents.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentListing {
    Loaded(Vec<Document>),
    Failed(String),
}

/// A delete the user still has to confirm. Dropping it cancels the delete.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "a pending delete does nothing until it is confirmed"]
pub struct PendingDelete {
    document: Document,
}

impl PendingDelete {
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn prompt(&self) -> &'static str {
        DELETE_PROMPT
    }
}

pub struct DocumentRegistry {
    backend: Arc<dyn RetrievalBackend>,
    listings: RwLock<HashMap<ScopeId, DocumentListing>>,
}

impl DocumentRegistry {
    pub fn new(backend: Arc<dyn RetrievalBackend>) -> Self {
        Self {
            backend,
            listings: RwLock::new(HashMap::new()),
        }
    }

    /// The cached listing for a scope, if it was ever fetched since the last invalidation.
    pub async fn listing(&self, scope_id: &ScopeId) -> Option<DocumentListing> {
        self.listings.read().await.get(scope_id).cloned()
    }

    /// Fetches the documents of a scope and replaces its cached listing.
    ///
    /// A failed fetch records `DocumentListing::Failed` so the view shows an
    /// error state rather than an outdated list.
    pub async fn list_documents(&self, scope_id: &ScopeId) -> Result<Vec<Document>, SessionError> {
        match self.backend.list_documents(scope_id).await {
            Ok(documents) => {
                info!("Scope {} has {} document(s).", scope_id, documents.len());
                self.listings
                    .write()
                    .await
                    .insert(scope_id.clone(), DocumentListing::Loaded(documents.clone()));
                Ok(documents)
            }
            Err(e) => {
                warn!("Failed to fetch documents of scope {}: {}", scope_id, e);
                self.listings.write().await.insert(
                    scope_id.clone(),
                    DocumentListing::Failed(LOAD_FAILED_MESSAGE.to_string()),
                );
                Err(e.into())
            }
        }
    }

    /// Forgets the cached listing of a scope so the next view fetches it anew.
    pub async fn invalidate(&self, scope_id: &ScopeId) {
        if self.listings.write().await.remove(scope_id).is_some() {
            info!("Invalidated document listing of scope {}.", scope_id);
        }
    }

    /// First step of a delete: finds the document in a loaded listing.
    pub async fn request_delete(&self, document_id: &DocumentId) -> Result<PendingDelete, SessionError> {
        let listings = self.listings.read().await;
        listings
            .values()
            .filter_map(|listing| match listing {
                DocumentListing::Loaded(documents) => Some(documents),
                DocumentListing::Failed(_) => None,
            })
            .flatten()
            .find(|d| &d.id == document_id)
            .cloned()
            .map(|document| PendingDelete { document })
            .ok_or_else(|| SessionError::validation(format!("Unknown document {}.", document_id)))
    }

    /// Second step of a delete: sends it and, once acknowledged, drops the
    /// document from its scope's listing. On failure nothing changes.
    pub async fn confirm_delete(&self, pending: PendingDelete) -> Result<Document, SessionError> {
        let document = pending.document;
        self.backend.delete_document(&document.id).await?;

        if let Some(DocumentListing::Loaded(documents)) =
            self.listings.write().await.get_mut(&document.scope_id)
        {
            documents.retain(|d| d.id != document.id);
        }
        info!("Deleted document {} ('{}').", document.id, document.filename);
        Ok(document)
    }
}
