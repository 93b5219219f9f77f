//! services/client/src/session/state.rs
//!
//! Defines the session-specific state owned by the controller and the
//! read-only snapshot handed to the view.

use crate::session::conversation::ConversationSession;
use crate::session::upload::UploadState;
use pocket_rag_core::domain::{Scope, Turn};
use tracing::info;
use uuid::Uuid;

//=========================================================================================
// SessionState (Owned by the Controller)
//=========================================================================================

/// Which scope is current and the conversation bound to it.
#[derive(Debug)]
pub struct SessionState {
    /// `None` means the whole corpus.
    pub current_scope: Option<Scope>,
    pub conversation: ConversationSession,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Starts with no scope selected and an empty corpus-wide conversation.
    pub fn new() -> Self {
        Self {
            current_scope: None,
            conversation: ConversationSession::new(None),
        }
    }

    /// Makes `scope` current and replaces the conversation with a fresh, empty
    /// one bound to it. Returns the new conversation's id.
    pub fn switch_scope(&mut self, scope: Option<Scope>) -> Uuid {
        let discarded = self.conversation.turns().len();
        self.conversation = ConversationSession::new(scope.as_ref().map(|s| s.id.clone()));
        info!(
            "Switched to {} (discarded {} turn(s)).",
            scope.as_ref().map(|s| s.name.as_str()).unwrap_or("all documents"),
            discarded
        );
        self.current_scope = scope;
        self.conversation.id()
    }

    /// Refreshes the held copy of the current scope if `scope` is the same scope.
    pub fn refresh_current(&mut self, scope: &Scope) {
        if let Some(current) = self.current_scope.as_mut() {
            if current.id == scope.id {
                *current = scope.clone();
            }
        }
    }
}

//=========================================================================================
// SessionSnapshot (Read-Only View)
//=========================================================================================

/// Everything the view needs to draw one frame.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub current_scope: Option<Scope>,
    pub scopes: Vec<Scope>,
    pub session_id: Uuid,
    pub turns: Vec<Turn>,
    pub awaiting_answer: bool,
    pub upload: UploadState,
}
