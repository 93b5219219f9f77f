//! crates/pocket_rag_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any transport or serialization format.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fmt;

//=========================================================================================
// Identifiers
//=========================================================================================

/// Opaque identifier of a scope, assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(String);

impl ScopeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of a document, assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//=========================================================================================
// Scopes and Documents
//=========================================================================================

/// A named collection of documents ("subject"). Names are not guaranteed unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub id: ScopeId,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Scope {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ScopeId::new(id),
            name: name.into(),
            created_at: None,
        }
    }
}

/// Indexing status of a document, exactly as reported by the backend.
///
/// The label set belongs to the backend; the client only renders it verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStatus(String);

impl DocumentStatus {
    pub const UPLOADED: &'static str = "uploaded";
    pub const INDEXED: &'static str = "indexed";
    pub const ERROR: &'static str = "error";

    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn label(&self) -> &str {
        &self.0
    }

    /// Whether the backend will not move this document to another status on its own.
    pub fn is_final(&self) -> bool {
        self.0.eq_ignore_ascii_case(Self::INDEXED) || self.0.eq_ignore_ascii_case(Self::ERROR)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document known to belong to a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub scope_id: ScopeId,
    pub filename: String,
    pub status: DocumentStatus,
    pub created_at: Option<DateTime<Utc>>,
}

/// A single file picked by the user for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub content: Bytes,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.content.len()
    }
}

/// What the backend tells us after receiving an upload. It says nothing about
/// whether the document is searchable yet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadReceipt {
    pub status: Option<String>,
    pub chunks_indexed: Option<u32>,
}

//=========================================================================================
// Conversation
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A passage of an indexed document backing an answer.
///
/// `snippet` is always the full text the backend returned.
#[derive(Debug, Clone, PartialEq)]
pub struct Citation {
    pub document_title: String,
    pub page_number: u32,
    pub snippet: String,
    pub score: Option<f32>,
}

/// An answer produced by the retrieval backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// One immutable entry of a conversation transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    role: Role,
    content: String,
    citations: Vec<Citation>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            citations: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>, citations: Vec<Citation>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            citations,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn citations(&self) -> &[Citation] {
        &self.citations
    }
}

impl From<Answer> for Turn {
    fn from(answer: Answer) -> Self {
        Turn::assistant(answer.text, answer.citations)
    }
}
