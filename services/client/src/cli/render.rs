//! services/client/src/cli/render.rs
//!
//! Plain-text rendering of session state. Every function here is pure and
//! returns the text to print.

use crate::session::document_registry::DocumentListing;
use crate::session::upload::{UploadState, FAILED_NOTICE, QUEUED_NOTICE, SIZE_HINT};
use pocket_rag_core::domain::{Scope, Turn, UploadFile};

pub const NO_SCOPES: &str = "No folders yet";
pub const NO_DOCUMENTS: &str = "No documents found in this folder.";
pub const STILL_INDEXING: &str = "Some documents are still being indexed. Type /refresh to check again.";

/// The title line: the scope name with its badge, or the corpus-wide view.
pub fn header(current: Option<&Scope>) -> String {
    match current {
        Some(scope) => format!("== {} [SUBJECT] ==", scope.name),
        None => "== All Documents [GLOBAL CONTEXT] ==".to_string(),
    }
}

pub fn prompt(current: Option<&Scope>) -> String {
    format!(
        "Ask about {}... > ",
        current.map(|s| s.name.as_str()).unwrap_or("all documents")
    )
}

/// Numbered scope list; the current scope is marked with `*`.
pub fn scope_list(scopes: &[Scope], current: Option<&Scope>) -> String {
    if scopes.is_empty() {
        return NO_SCOPES.to_string();
    }
    scopes
        .iter()
        .enumerate()
        .map(|(i, scope)| {
            let marker = if current.is_some_and(|c| c.id == scope.id) { '*' } else { ' ' };
            format!("{} {:>2}. {}", marker, i + 1, scope.name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Numbered document list with each status shown as the backend reported it.
pub fn document_list(listing: &DocumentListing) -> String {
    match listing {
        DocumentListing::Failed(message) => message.clone(),
        DocumentListing::Loaded(documents) if documents.is_empty() => NO_DOCUMENTS.to_string(),
        DocumentListing::Loaded(documents) => {
            let mut out = documents
                .iter()
                .enumerate()
                .map(|(i, doc)| format!("  {:>2}. {} [{}]", i + 1, doc.filename, doc.status))
                .collect::<Vec<_>>()
                .join("\n");
            if documents.iter().any(|doc| !doc.status.is_final()) {
                out.push('\n');
                out.push_str(STILL_INDEXING);
            }
            out
        }
    }
}

/// First `max_chars` characters of a snippet, with `...` when cut.
pub fn snippet_preview(snippet: &str, max_chars: usize) -> String {
    match snippet.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &snippet[..cut]),
        None => snippet.to_string(),
    }
}

pub fn turn(turn: &Turn, snippet_chars: usize) -> String {
    let mut out = format!("{}> {}", turn.role().as_str(), turn.content());
    let citations = turn.citations();
    if !citations.is_empty() {
        out.push_str(&format!("\n  {} Sources", citations.len()));
        for citation in citations {
            out.push_str(&format!(
                "\n  - {} (Page {})\n    \"{}\"",
                citation.document_title,
                citation.page_number,
                snippet_preview(&citation.snippet, snippet_chars)
            ));
        }
    }
    out
}

/// Size in megabytes with two decimals, as shown next to a picked file.
pub fn file_size(file: &UploadFile) -> String {
    format!("{:.2} MB • PDF", file.size_bytes() as f64 / 1024.0 / 1024.0)
}

pub fn upload_state(state: &UploadState) -> String {
    match state {
        UploadState::Idle => format!("No file selected ({}).", SIZE_HINT),
        UploadState::FileSelected(file) => {
            format!("Selected {} ({}). Type /upload to send it.", file.filename, file_size(file))
        }
        UploadState::Transferring { filename, .. } => format!("Uploading {}...", filename),
        UploadState::Completed { filename, .. } => format!("{}: {}", filename, QUEUED_NOTICE),
        UploadState::Failed { filename, message } => {
            format!("{}: {}: {}", filename, FAILED_NOTICE, message)
        }
    }
}
