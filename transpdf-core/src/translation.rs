use tracing::{debug, warn};

use crate::selection::Selection;
use crate::{SelectionSeq, ServiceError};

pub const UNKNOWN_TRANSLATION_ERROR: &str = "An unknown error occurred during translation.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranslationStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TranslationRequest {
    pub for_selection: Option<SelectionSeq>,
    pub status: TranslationStatus,
    pub translated_text: Option<String>,
    pub error_message: Option<String>,
}

/// Tracks the single current translation request.
///
/// Results are keyed by the selection sequence number they were issued for;
/// anything that no longer matches the current request is dropped.
#[derive(Debug, Default)]
pub struct TranslationRequestManager {
    current: TranslationRequest,
}

impl TranslationRequestManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &TranslationRequest {
        &self.current
    }

    /// Marks the request for `selection` pending. Returns the text to send.
    pub fn begin(&mut self, selection: &Selection) -> String {
        self.current = TranslationRequest {
            for_selection: Some(selection.captured_at),
            status: TranslationStatus::Pending,
            translated_text: None,
            error_message: None,
        };
        selection.text.clone()
    }

    /// Applies a response. Returns `false` when the response is stale.
    pub fn complete(&mut self, sequence: SelectionSeq, result: Result<String, ServiceError>) -> bool {
        if self.current.for_selection != Some(sequence)
            || self.current.status != TranslationStatus::Pending
        {
            debug!(
                sequence,
                current = ?self.current.for_selection,
                "discarding stale translation result"
            );
            return false;
        }
        match result {
            Ok(translated) => {
                self.current.status = TranslationStatus::Success;
                self.current.translated_text = Some(translated);
            }
            Err(err) => {
                warn!(sequence, %err, "translation failed");
                let message = err.to_string();
                self.current.status = TranslationStatus::Failure;
                self.current.error_message = Some(if message.trim().is_empty() {
                    UNKNOWN_TRANSLATION_ERROR.to_owned()
                } else {
                    message
                });
            }
        }
        true
    }

    /// Back to idle. An in-flight call keeps running but its result is inert.
    pub fn dismiss(&mut self) {
        self.current = TranslationRequest::default();
    }
}
