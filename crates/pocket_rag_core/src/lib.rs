pub mod domain;
pub mod ports;

pub use domain::{
    Answer, Citation, Document, DocumentId, DocumentStatus, Role, Scope, ScopeId, Turn,
    UploadFile, UploadReceipt,
};
pub use ports::{PortError, PortResult, RetrievalBackend};
