pub mod controller;
pub mod conversation;
pub mod document_registry;
pub mod scope_store;
pub mod state;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

// The controller is the entry point the binary and the integration tests use.
pub use controller::{AskOutcome, SessionController};
pub use document_registry::{DocumentListing, PendingDelete};
pub use state::SessionSnapshot;
pub use upload::{UploadNotice, UploadState};
