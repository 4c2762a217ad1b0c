use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{DocumentId, DocumentRef, ServiceError, UploadedDocument};

/// Identifies one upload attempt. Results carrying an older ticket are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub file_name: String,
    pub reference: DocumentRef,
    /// Unknown until the rendering engine reports it.
    pub page_count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Shown next to the upload control.
    Upload(String),
    /// Shown in place of the viewer.
    Load(String),
}

#[derive(Debug, Default)]
pub struct DocumentSession {
    document: Option<Document>,
    uploading: Option<(LoadTicket, String)>,
    error: Option<SessionError>,
    next_ticket: u64,
}

impl DocumentSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Known page count of the current document.
    pub fn page_count(&self) -> Option<usize> {
        self.document.as_ref().and_then(|doc| doc.page_count)
    }

    /// File name of the upload in flight, if any.
    pub fn uploading(&self) -> Option<&str> {
        self.uploading.as_ref().map(|(_, name)| name.as_str())
    }

    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    /// Starts an upload. The current document is dropped right away and any
    /// earlier upload still in flight becomes stale.
    pub fn begin_load(&mut self, file_name: &str) -> LoadTicket {
        self.next_ticket += 1;
        let ticket = LoadTicket(self.next_ticket);
        self.document = None;
        self.error = None;
        self.uploading = Some((ticket, file_name.to_owned()));
        info!(file = file_name, ?ticket, "upload started");
        ticket
    }

    /// Applies the upload collaborator's answer. Returns the new document when
    /// the ticket is current and the upload succeeded.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<UploadedDocument, ServiceError>,
    ) -> Option<&Document> {
        match &self.uploading {
            Some((current, _)) if *current == ticket => {}
            _ => {
                debug!(?ticket, "discarding result of superseded upload");
                return None;
            }
        }
        self.uploading = None;

        match result {
            Ok(uploaded) => {
                let document = Document {
                    id: Uuid::new_v4(),
                    file_name: uploaded.file_name,
                    reference: uploaded.reference,
                    page_count: None,
                };
                info!(id = %document.id, reference = %document.reference, "document uploaded");
                self.document = Some(document);
                self.document.as_ref()
            }
            Err(err) => {
                warn!(%err, "upload failed");
                self.error = Some(SessionError::Upload(err.to_string()));
                None
            }
        }
    }

    /// The rendering engine finished opening `document`. Only writer of the
    /// page count; ignored when `document` is no longer current.
    pub fn on_ready(&mut self, document: DocumentId, page_count: usize) -> bool {
        if !self.is_current(document) {
            debug!(%document, "ignoring ready signal for superseded document");
            return false;
        }
        if page_count == 0 {
            return self.on_load_error(document, "the document has no pages");
        }
        if let Some(current) = self.document.as_mut() {
            current.page_count = Some(page_count);
        }
        info!(%document, page_count, "document ready");
        true
    }

    /// The rendering engine could not open `document`. Clears the reference
    /// when it is still current.
    pub fn on_load_error(&mut self, document: DocumentId, message: &str) -> bool {
        if !self.is_current(document) {
            debug!(%document, "ignoring load failure for superseded document");
            return false;
        }
        warn!(%document, message, "document failed to load");
        self.document = None;
        self.error = Some(SessionError::Load(format!(
            "Failed to load the PDF file: {message}"
        )));
        false
    }

    pub fn is_current(&self, document: DocumentId) -> bool {
        self.document.as_ref().map(|doc| doc.id) == Some(document)
    }

    /// Closes the viewer. An upload in flight is abandoned.
    pub fn close(&mut self) {
        if let Some(doc) = self.document.take() {
            info!(id = %doc.id, "document closed");
        }
        self.uploading = None;
    }
}
