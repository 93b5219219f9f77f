//! services/client/src/session/conversation.rs
//!
//! The transcript of the current scope and its single-outstanding-query rule.
//!
//! Asking is a two-phase append: `begin_ask` commits the user turn at once and
//! raises the `awaiting answer` flag, `complete` appends the assistant turn
//! (the answer, or a fixed failure message) and lowers it again. The user turn
//! is never retracted, so the transcript needs no rollback.

use crate::error::SessionError;
use pocket_rag_core::domain::{Answer, ScopeId, Turn};
use pocket_rag_core::ports::{PortResult, RetrievalBackend};
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Shown in place of an answer when the query fails for any reason.
pub const QUERY_FAILED_MESSAGE: &str = "Error: Could not get response.";

/// The ordered transcript bound to one scope (or to the whole corpus).
#[derive(Debug, Clone)]
pub struct ConversationSession {
    id: Uuid,
    scope_id: Option<ScopeId>,
    turns: Vec<Turn>,
    awaiting_answer: bool,
}

/// A question that has been committed to a transcript and still needs an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    session_id: Uuid,
    question: String,
    scope_id: Option<ScopeId>,
}

impl PendingQuery {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn scope_id(&self) -> Option<&ScopeId> {
        self.scope_id.as_ref()
    }

    /// Issues the retrieval-augmented query for this question.
    pub async fn send(&self, backend: &dyn RetrievalBackend) -> PortResult<Answer> {
        let started = Instant::now();
        let result = backend.query(&self.question, self.scope_id.as_ref()).await;
        match &result {
            Ok(answer) => info!(
                "Query answered in {:?} with {} citation(s).",
                started.elapsed(),
                answer.citations.len()
            ),
            Err(e) => warn!("Query failed after {:?}: {}", started.elapsed(), e),
        }
        result
    }
}

impl ConversationSession {
    /// Creates an empty session. `None` means corpus-wide retrieval.
    pub fn new(scope_id: Option<ScopeId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            scope_id,
            turns: Vec::new(),
            awaiting_answer: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn scope_id(&self) -> Option<&ScopeId> {
        self.scope_id.as_ref()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_awaiting_answer(&self) -> bool {
        self.awaiting_answer
    }

    /// Commits the user turn and marks the session as awaiting an answer.
    ///
    /// Blank questions and questions asked while another one is outstanding are
    /// rejected without touching the transcript.
    pub fn begin_ask(&mut self, question: &str) -> Result<PendingQuery, SessionError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(SessionError::validation("Question must not be empty."));
        }
        if self.awaiting_answer {
            return Err(SessionError::validation(
                "Still waiting for the answer to the previous question.",
            ));
        }

        self.turns.push(Turn::user(question));
        self.awaiting_answer = true;
        Ok(PendingQuery {
            session_id: self.id,
            question: question.to_string(),
            scope_id: self.scope_id.clone(),
        })
    }

    /// Appends the assistant turn for `pending` and clears the awaiting flag.
    ///
    /// Returns `None` without changing anything when `pending` belongs to
    /// another session.
    pub fn complete(&mut self, pending: &PendingQuery, outcome: PortResult<Answer>) -> Option<&Turn> {
        if pending.session_id != self.id {
            return None;
        }
        let turn = match outcome {
            Ok(answer) => Turn::from(answer),
            Err(_) => Turn::assistant(QUERY_FAILED_MESSAGE, Vec::new()),
        };
        self.turns.push(turn);
        self.awaiting_answer = false;
        self.turns.last()
    }
}
