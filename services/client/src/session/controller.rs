//! services/client/src/session/controller.rs
//!
//! The session controller: the single entry point for user intents. It owns
//! the current scope and the active conversation, and is the only place where
//! the effects of one component reach another.
//!
//! Locks are never held across a backend call. Each operation snapshots what
//! it needs, releases the lock, awaits the backend, then re-locks to apply the
//! result. Answers that arrive for a conversation that is no longer active are
//! dropped.

use crate::error::SessionError;
use crate::session::conversation::PendingQuery;
use crate::session::document_registry::{DocumentListing, DocumentRegistry, PendingDelete};
use crate::session::scope_store::ScopeStore;
use crate::session::state::{SessionSnapshot, SessionState};
use crate::session::upload::{UploadCoordinator, UploadNotice, UploadState};
use pocket_rag_core::domain::{Document, DocumentId, Scope, ScopeId, Turn, UploadFile};
use pocket_rag_core::ports::RetrievalBackend;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// How an `ask` ended.
#[derive(Debug, Clone, PartialEq)]
pub enum AskOutcome {
    /// The backend answered; the turn holds the answer and its citations.
    Answered(Turn),
    /// The query failed; the turn holds the fixed failure message.
    Failed(Turn),
    /// The scope changed while the query was outstanding; nothing was applied.
    Discarded,
}

#[derive(Clone)]
pub struct SessionController {
    backend: Arc<dyn RetrievalBackend>,
    scopes: Arc<ScopeStore>,
    documents: Arc<DocumentRegistry>,
    uploads: Arc<UploadCoordinator>,
    state: Arc<Mutex<SessionState>>,
}

impl SessionController {
    pub fn new(backend: Arc<dyn RetrievalBackend>) -> Self {
        Self {
            scopes: Arc::new(ScopeStore::new(backend.clone())),
            documents: Arc::new(DocumentRegistry::new(backend.clone())),
            uploads: Arc::new(UploadCoordinator::new(backend.clone())),
            backend,
            state: Arc::new(Mutex::new(SessionState::new())),
        }
    }

    //=====================================================================================
    // Scopes
    //=====================================================================================

    pub async fn current_scope(&self) -> Option<Scope> {
        self.state.lock().await.current_scope.clone()
    }

    /// Refetches the scope list and refreshes the held copy of the current scope.
    pub async fn refresh_scopes(&self) -> Result<Vec<Scope>, SessionError> {
        let scopes = self.scopes.list_scopes().await?;
        let mut state = self.state.lock().await;
        let current_id = state.current_scope.as_ref().map(|s| s.id.clone());
        if let Some(current) = current_id.and_then(|id| scopes.iter().find(|s| s.id == id)) {
            state.refresh_current(current);
        }
        Ok(scopes)
    }

    /// Switches to a scope, or to the whole corpus with `None`.
    ///
    /// The conversation is always replaced by an empty one, even when the
    /// selected scope is already current.
    pub async fn select_scope(&self, scope_id: Option<&ScopeId>) -> Result<Option<Scope>, SessionError> {
        let scope = match scope_id {
            Some(id) => Some(
                self.scopes
                    .get(id)
                    .await
                    .ok_or_else(|| SessionError::validation(format!("Unknown subject {}.", id)))?,
            ),
            None => None,
        };
        self.state.lock().await.switch_scope(scope.clone());
        Ok(scope)
    }

    /// Creates a scope and makes it current.
    pub async fn create_scope(&self, name: &str) -> Result<Scope, SessionError> {
        let scope = self.scopes.create_scope(name).await?;
        self.state.lock().await.switch_scope(Some(scope.clone()));
        Ok(scope)
    }

    /// Renames a scope. The conversation is kept; only the displayed name changes.
    pub async fn rename_scope(&self, scope_id: &ScopeId, new_name: &str) -> Result<Scope, SessionError> {
        let renamed = self.scopes.rename_scope(scope_id, new_name).await?;
        self.state.lock().await.refresh_current(&renamed);
        Ok(renamed)
    }

    //=====================================================================================
    // Documents
    //=====================================================================================

    async fn require_scope(&self, action: &str) -> Result<Scope, SessionError> {
        self.current_scope().await.ok_or_else(|| {
            SessionError::validation(format!("Select a subject to {}.", action))
        })
    }

    /// Fetches the current scope's documents. Calling it again is how indexing
    /// progress is observed.
    pub async fn open_documents(&self) -> Result<Vec<Document>, SessionError> {
        let scope = self.require_scope("manage its files").await?;
        self.documents.list_documents(&scope.id).await
    }

    /// The cached listing of the current scope, without fetching.
    pub async fn document_listing(&self) -> Option<DocumentListing> {
        let scope = self.current_scope().await?;
        self.documents.listing(&scope.id).await
    }

    pub async fn request_delete(&self, document_id: &DocumentId) -> Result<PendingDelete, SessionError> {
        self.documents.request_delete(document_id).await
    }

    pub async fn confirm_delete(&self, pending: PendingDelete) -> Result<Document, SessionError> {
        self.documents.confirm_delete(pending).await
    }

    //=====================================================================================
    // Uploads
    //=====================================================================================

    pub async fn upload_state(&self) -> UploadState {
        self.uploads.state().await
    }

    pub async fn select_file(&self, file: UploadFile) -> Result<(), SessionError> {
        self.uploads.select_file(file).await
    }

    pub async fn dismiss_upload(&self) -> Result<(), SessionError> {
        self.uploads.dismiss().await
    }

    /// Uploads the selected file into the current scope.
    ///
    /// On success the scope's document listing is invalidated. The conversation
    /// is not touched.
    pub async fn upload(&self) -> Result<UploadNotice, SessionError> {
        let scope = self.current_scope().await;
        let notice = self.uploads.upload(scope.as_ref()).await?;
        self.documents.invalidate(&notice.scope.id).await;
        Ok(notice)
    }

    //=====================================================================================
    // Conversation
    //=====================================================================================

    /// Asks a question against the current scope (or the whole corpus).
    ///
    /// Blank questions and questions asked while another is outstanding return
    /// `SessionError::Validation` and change nothing. Otherwise the transcript
    /// grows by exactly two turns, unless the scope was switched in between, in
    /// which case the late answer is discarded.
    pub async fn ask(&self, question: &str) -> Result<AskOutcome, SessionError> {
        let pending: PendingQuery = self.state.lock().await.conversation.begin_ask(question)?;
        info!(
            "Asking in {}: '{}'",
            pending.scope_id().map(|id| id.as_str()).unwrap_or("global context"),
            pending.question()
        );

        let result = pending.send(self.backend.as_ref()).await;
        let failed = result.is_err();

        let mut state = self.state.lock().await;
        match state.conversation.complete(&pending, result) {
            Some(turn) if failed => Ok(AskOutcome::Failed(turn.clone())),
            Some(turn) => Ok(AskOutcome::Answered(turn.clone())),
            None => {
                warn!(
                    "Discarding answer for conversation {}; it is no longer active.",
                    pending.session_id()
                );
                Ok(AskOutcome::Discarded)
            }
        }
    }

    //=====================================================================================
    // View
    //=====================================================================================

    pub async fn snapshot(&self) -> SessionSnapshot {
        let scopes = self.scopes.scopes().await;
        let upload = self.uploads.state().await;
        let state = self.state.lock().await;
        SessionSnapshot {
            current_scope: state.current_scope.clone(),
            scopes,
            session_id: state.conversation.id(),
            turns: state.conversation.turns().to_vec(),
            awaiting_answer: state.conversation.is_awaiting_answer(),
            upload,
        }
    }
}
