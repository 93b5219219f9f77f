//! services/client/src/session/upload.rs
//!
//! Lifecycle of a single file transfer into a scope:
//! `Idle -> FileSelected -> Transferring -> Completed | Failed -> Idle`.
//!
//! A completed transfer only means the backend received the file. Indexing
//! happens later and is observed through the document registry.

use crate::error::SessionError;
use pocket_rag_core::domain::{Scope, ScopeId, UploadFile, UploadReceipt};
use pocket_rag_core::ports::RetrievalBackend;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Extension accepted by the file picker. The backend has the final word.
pub const ACCEPTED_EXTENSION: &str = "pdf";
/// Shown next to the picker; not enforced.
pub const SIZE_HINT: &str = "PDFs up to 10MB";
pub const QUEUED_NOTICE: &str = "Upload successful! Document is being indexed.";
pub const FAILED_NOTICE: &str = "Upload failed";

/// Whether the file picker offers this file.
pub fn passes_picker_filter(filename: &str) -> bool {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ACCEPTED_EXTENSION))
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    Idle,
    FileSelected(UploadFile),
    Transferring {
        filename: String,
        scope_id: ScopeId,
    },
    Completed {
        filename: String,
        scope_id: ScopeId,
        receipt: UploadReceipt,
    },
    /// The file is not kept; retrying means picking it again.
    Failed { filename: String, message: String },
}

impl UploadState {
    pub fn label(&self) -> &'static str {
        match self {
            UploadState::Idle => "idle",
            UploadState::FileSelected(_) => "file_selected",
            UploadState::Transferring { .. } => "transferring",
            UploadState::Completed { .. } => "completed",
            UploadState::Failed { .. } => "failed",
        }
    }
}

/// What a completed upload reports back to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadNotice {
    pub scope: Scope,
    pub filename: String,
    pub receipt: UploadReceipt,
}

pub struct UploadCoordinator {
    backend: Arc<dyn RetrievalBackend>,
    state: Mutex<UploadState>,
}

impl UploadCoordinator {
    pub fn new(backend: Arc<dyn RetrievalBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(UploadState::Idle),
        }
    }

    pub async fn state(&self) -> UploadState {
        self.state.lock().await.clone()
    }

    /// Holds `file` for upload, replacing any file selected before.
    pub async fn select_file(&self, file: UploadFile) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        if let UploadState::Transferring { .. } = *state {
            return Err(SessionError::validation("An upload is already in progress."));
        }
        info!("Selected '{}' ({} bytes) for upload.", file.filename, file.size_bytes());
        *state = UploadState::FileSelected(file);
        Ok(())
    }

    /// Drops the selection or the last outcome and returns to `Idle`.
    pub async fn dismiss(&self) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        if let UploadState::Transferring { .. } = *state {
            return Err(SessionError::validation("An upload is already in progress."));
        }
        *state = UploadState::Idle;
        Ok(())
    }

    /// Transfers the selected file into `scope`.
    ///
    /// Without a concrete scope or a selected file nothing is sent and the state
    /// is left as it was. A failed transfer discards the file.
    pub async fn upload(&self, scope: Option<&Scope>) -> Result<UploadNotice, SessionError> {
        let scope = scope.ok_or_else(|| {
            SessionError::validation("Select a subject before uploading a document.")
        })?;
        let file = {
            let mut state = self.state.lock().await;
            let file = match &*state {
                UploadState::FileSelected(file) => file.clone(),
                UploadState::Transferring { .. } => {
                    return Err(SessionError::validation("An upload is already in progress."))
                }
                _ => return Err(SessionError::validation("No file selected.")),
            };
            *state = UploadState::Transferring {
                filename: file.filename.clone(),
                scope_id: scope.id.clone(),
            };
            file
        };

        info!("Uploading '{}' into scope {}.", file.filename, scope.id);
        let result = self.backend.upload_document(&scope.id, &file).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(receipt) => {
                info!("Upload of '{}' received by the backend.", file.filename);
                *state = UploadState::Completed {
                    filename: file.filename.clone(),
                    scope_id: scope.id.clone(),
                    receipt: receipt.clone(),
                };
                Ok(UploadNotice {
                    scope: scope.clone(),
                    filename: file.filename,
                    receipt,
                })
            }
            Err(e) => {
                error!("Upload of '{}' failed: {}", file.filename, e);
                *state = UploadState::Failed {
                    filename: file.filename,
                    message: e.to_string(),
                };
                Err(e.into())
            }
        }
    }
}
