//! In-memory `RetrievalBackend` for unit tests.
//!
//! It mimics the reference backend's validation (duplicate folder names are
//! rejected with 400), records every call by operation name, and can hold
//! queries or uploads open until a `Notify` is signalled.

use async_trait::async_trait;
use pocket_rag_core::domain::{
    Answer, Citation, Document, DocumentId, DocumentStatus, Scope, ScopeId, UploadFile,
    UploadReceipt,
};
use pocket_rag_core::ports::{PortError, PortResult, RetrievalBackend};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Default)]
struct FakeState {
    scopes: Vec<Scope>,
    documents: Vec<Document>,
    calls: HashMap<&'static str, usize>,
    failures: HashMap<&'static str, PortError>,
    queries: Vec<(String, Option<ScopeId>)>,
    next_id: usize,
}

impl FakeState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    state: Mutex<FakeState>,
    query_gate: Option<Arc<Notify>>,
    upload_gate: Option<Arc<Notify>>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_scopes(names: &[&str]) -> Self {
        let backend = Self::new();
        {
            let mut state = backend.state.lock().unwrap();
            for name in names {
                let id = state.next_id("folder");
                state.scopes.push(Scope::new(id, *name));
            }
        }
        backend
    }

    /// Every query waits for one `notify_one` on `gate` before answering.
    pub(crate) fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.query_gate = Some(gate);
        self
    }

    /// Every upload waits for one `notify_one` on `gate` before it is received.
    pub(crate) fn gated_uploads(mut self, gate: Arc<Notify>) -> Self {
        self.upload_gate = Some(gate);
        self
    }

    pub(crate) fn scopes(&self) -> Vec<Scope> {
        self.state.lock().unwrap().scopes.clone()
    }

    pub(crate) fn scope_ids(&self) -> Vec<ScopeId> {
        self.scopes().into_iter().map(|s| s.id).collect()
    }

    pub(crate) fn seed_document(&self, scope_id: &ScopeId, file: UploadFile) -> DocumentId {
        let mut state = self.state.lock().unwrap();
        let id = DocumentId::new(state.next_id("doc"));
        state.documents.push(Document {
            id: id.clone(),
            scope_id: scope_id.clone(),
            filename: file.filename,
            status: DocumentStatus::new(DocumentStatus::UPLOADED),
            created_at: None,
        });
        id
    }

    /// Makes every later call of `op` fail with `err` until cleared.
    pub(crate) fn fail(&self, op: &'static str, err: PortError) {
        self.state.lock().unwrap().failures.insert(op, err);
    }

    pub(crate) fn clear_failures(&self) {
        self.state.lock().unwrap().failures.clear();
    }

    pub(crate) fn calls(&self, op: &str) -> usize {
        self.state.lock().unwrap().calls.get(op).copied().unwrap_or(0)
    }

    pub(crate) fn queries(&self) -> Vec<(String, Option<ScopeId>)> {
        self.state.lock().unwrap().queries.clone()
    }

    fn record(&self, op: &'static str) -> PortResult<()> {
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(op).or_insert(0) += 1;
        match state.failures.get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn name_taken(state: &FakeState, name: &str, except: Option<&ScopeId>) -> bool {
        state
            .scopes
            .iter()
            .any(|s| s.name == name && Some(&s.id) != except)
    }
}

#[async_trait]
impl RetrievalBackend for FakeBackend {
    async fn list_scopes(&self) -> PortResult<Vec<Scope>> {
        self.record("list_scopes")?;
        Ok(self.scopes())
    }

    async fn create_scope(&self, name: &str) -> PortResult<Scope> {
        self.record("create_scope")?;
        let mut state = self.state.lock().unwrap();
        if Self::name_taken(&state, name, None) {
            return Err(PortError::rejected(400, "Folder already exists"));
        }
        let id = state.next_id("folder");
        let scope = Scope::new(id, name);
        state.scopes.push(scope.clone());
        Ok(scope)
    }

    async fn rename_scope(&self, scope_id: &ScopeId, name: &str) -> PortResult<Scope> {
        self.record("rename_scope")?;
        let mut state = self.state.lock().unwrap();
        if Self::name_taken(&state, name, Some(scope_id)) {
            return Err(PortError::rejected(400, "Folder with this name already exists"));
        }
        let scope = state
            .scopes
            .iter_mut()
            .find(|s| &s.id == scope_id)
            .ok_or_else(|| PortError::rejected(404, "Folder not found"))?;
        scope.name = name.to_string();
        Ok(scope.clone())
    }

    async fn list_documents(&self, scope_id: &ScopeId) -> PortResult<Vec<Document>> {
        self.record("list_documents")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .documents
            .iter()
            .filter(|d| &d.scope_id == scope_id)
            .cloned()
            .collect())
    }

    async fn delete_document(&self, document_id: &DocumentId) -> PortResult<()> {
        self.record("delete_document")?;
        let mut state = self.state.lock().unwrap();
        let before = state.documents.len();
        state.documents.retain(|d| &d.id != document_id);
        if state.documents.len() == before {
            return Err(PortError::rejected(404, "Document not found"));
        }
        Ok(())
    }

    async fn upload_document(&self, scope_id: &ScopeId, file: &UploadFile) -> PortResult<UploadReceipt> {
        if let Some(gate) = &self.upload_gate {
            gate.notified().await;
        }
        self.record("upload_document")?;
        self.seed_document(scope_id, file.clone());
        Ok(UploadReceipt {
            status: Some("success".to_string()),
            chunks_indexed: Some(3),
        })
    }

    async fn query(&self, question: &str, scope_id: Option<&ScopeId>) -> PortResult<Answer> {
        {
            let mut state = self.state.lock().unwrap();
            state.queries.push((question.to_string(), scope_id.cloned()));
        }
        if let Some(gate) = &self.query_gate {
            gate.notified().await;
        }
        self.record("query")?;
        Ok(Answer {
            text: format!("Answer to: {}", question),
            citations: vec![Citation {
                document_title: "cells.pdf".to_string(),
                page_number: 2,
                snippet: "A cell is the smallest unit of life.".to_string(),
                score: Some(0.9),
            }],
        })
    }
}
