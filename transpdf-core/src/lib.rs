use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use bytes::Bytes;
use uuid::Uuid;

pub mod config;
pub mod editor;
pub mod error;
pub mod paginator;
pub mod runtime;
pub mod selection;
pub mod session;
pub mod translation;
pub mod viewer;

pub use config::{Config, ServerConfig, TranslationConfig};
pub use editor::{EditorMode, PageNumberEditor};
pub use error::ServiceError;
pub use paginator::Paginator;
pub use runtime::{Completion, EffectRunner, Services};
pub use selection::{Selection, SelectionCapture, SelectionSource};
pub use session::{Document, DocumentSession, LoadTicket, SessionError};
pub use translation::{TranslationRequest, TranslationRequestManager, TranslationStatus};
pub use viewer::{Command, Effect, OverlayView, Viewer, ViewerStatus};

/// Identity of one loaded document. Fresh for every successful upload so a
/// late engine callback for an older upload of the same file never matches.
pub type DocumentId = Uuid;

/// Monotonic selection sequence number.
pub type SelectionSeq = u64;

/// Opaque handle the rendering engine uses to fetch a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef(String);

impl DocumentRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A file picked by the user, ready to be handed to the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// What the upload endpoint hands back on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    pub file_name: String,
    pub reference: DocumentRef,
}

#[async_trait::async_trait]
pub trait UploadService: Send + Sync {
    async fn upload(&self, file: UploadFile) -> Result<UploadedDocument, ServiceError>;
}

#[async_trait::async_trait]
pub trait TranslationService: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, ServiceError>;
}

/// Retrieves the raw bytes behind a document reference.
#[async_trait::async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, reference: &DocumentRef) -> Result<Bytes>;
}

/// A document opened by the rendering engine.
pub trait DocumentBackend: Send + Sync {
    fn page_count(&self) -> usize;
    /// Text of a page, 0-based.
    fn page_text(&self, page_index: usize) -> Result<String>;
}

#[async_trait::async_trait]
pub trait DocumentProvider: Send + Sync {
    async fn open(&self, reference: &DocumentRef) -> Result<Arc<dyn DocumentBackend>>;
}
