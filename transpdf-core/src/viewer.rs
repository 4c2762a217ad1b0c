use crate::editor::PageNumberEditor;
use crate::paginator::Paginator;
use crate::selection::SelectionCapture;
use crate::session::{Document, DocumentSession, LoadTicket, SessionError};
use crate::translation::{TranslationRequest, TranslationRequestManager, TranslationStatus};
use crate::{DocumentId, DocumentRef, SelectionSeq, ServiceError, UploadFile, UploadedDocument};

/// Inputs to the viewer, applied strictly in delivery order.
#[derive(Debug, Clone)]
pub enum Command {
    Load(UploadFile),
    UploadFinished {
        ticket: LoadTicket,
        result: Result<UploadedDocument, ServiceError>,
    },
    DocumentReady {
        document: DocumentId,
        page_count: usize,
    },
    DocumentFailed {
        document: DocumentId,
        message: String,
    },
    Close,
    GoTo {
        page: i64,
    },
    NextPage,
    PrevPage,
    EditPage,
    PageInputChanged {
        value: String,
    },
    ConfirmPageInput,
    PageInputBlurred,
    CancelPageInput,
    PointerReleased {
        within_content_area: bool,
        text: Option<String>,
    },
    Translated {
        sequence: SelectionSeq,
        result: Result<String, ServiceError>,
    },
    DismissOverlay,
}

/// Work the viewer asks its surroundings to do after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Upload {
        ticket: LoadTicket,
        file: UploadFile,
    },
    OpenDocument {
        document: DocumentId,
        reference: DocumentRef,
    },
    Translate {
        sequence: SelectionSeq,
        text: String,
    },
    /// Reset the content view's scroll position to the top of the page.
    ScrollToTop,
    /// Select all text in the page input so the next keystroke replaces it.
    SelectPageInput,
}

/// What the translation overlay shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayView<'a> {
    pub original: &'a str,
    pub status: TranslationStatus,
    pub translated_text: Option<&'a str>,
    pub error_message: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerStatus<'a> {
    Empty,
    Uploading { file_name: &'a str },
    UploadFailed { message: &'a str },
    LoadFailed { message: &'a str },
    /// Uploaded, waiting for the rendering engine.
    Preparing(&'a Document),
    Ready(&'a Document),
}

#[derive(Debug, Default)]
pub struct Viewer {
    session: DocumentSession,
    paginator: Paginator,
    editor: PageNumberEditor,
    selection: SelectionCapture,
    translation: TranslationRequestManager,
}

impl Viewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, command: Command) -> Vec<Effect> {
        let mut effects = Vec::new();
        match command {
            Command::Load(file) => {
                self.reset_dependents();
                let ticket = self.session.begin_load(&file.name);
                effects.push(Effect::Upload { ticket, file });
            }
            Command::UploadFinished { ticket, result } => {
                if let Some(doc) = self.session.finish_load(ticket, result) {
                    effects.push(Effect::OpenDocument {
                        document: doc.id,
                        reference: doc.reference.clone(),
                    });
                }
            }
            Command::DocumentReady {
                document,
                page_count,
            } => {
                if self.session.on_ready(document, page_count) {
                    self.paginator.reset();
                    effects.push(Effect::ScrollToTop);
                } else {
                    self.reset_if_unloaded();
                }
            }
            Command::DocumentFailed { document, message } => {
                self.session.on_load_error(document, &message);
                self.reset_if_unloaded();
            }
            Command::Close => {
                self.session.close();
                self.reset_dependents();
            }
            Command::GoTo { page } => {
                let page_count = self.session.page_count();
                scroll_on_change(self.paginator.go_to(page_count, page), &mut effects);
            }
            Command::NextPage => {
                let page_count = self.session.page_count();
                scroll_on_change(self.paginator.next(page_count), &mut effects);
            }
            Command::PrevPage => {
                let page_count = self.session.page_count();
                scroll_on_change(self.paginator.previous(page_count), &mut effects);
            }
            Command::EditPage => {
                if self.session.document().is_some() && !self.editor.is_editing() {
                    self.editor.activate(self.paginator.current_page());
                    effects.push(Effect::SelectPageInput);
                }
            }
            Command::PageInputChanged { value } => self.editor.set_input(value),
            Command::ConfirmPageInput | Command::PageInputBlurred => {
                let page_count = self.session.page_count();
                let changed = self.editor.commit(&mut self.paginator, page_count);
                scroll_on_change(changed, &mut effects);
            }
            Command::CancelPageInput => self.editor.cancel(),
            Command::PointerReleased {
                within_content_area,
                text,
            } => {
                if self.session.document().is_none() {
                    return effects;
                }
                if let Some(selection) = self.selection.on_pointer_release(within_content_area, &text) {
                    let sequence = selection.captured_at;
                    let text = self.translation.begin(selection);
                    effects.push(Effect::Translate { sequence, text });
                }
            }
            Command::Translated { sequence, result } => {
                self.translation.complete(sequence, result);
            }
            Command::DismissOverlay => {
                self.selection.clear();
                self.translation.dismiss();
            }
        }
        effects
    }

    pub fn document(&self) -> Option<&Document> {
        self.session.document()
    }

    pub fn current_page(&self) -> usize {
        self.paginator.current_page()
    }

    pub fn page_count(&self) -> Option<usize> {
        self.session.page_count()
    }

    pub fn editor(&self) -> &PageNumberEditor {
        &self.editor
    }

    pub fn translation(&self) -> &TranslationRequest {
        self.translation.current()
    }

    /// "Page X of N", with "..." while the page count is unknown.
    pub fn page_indicator(&self) -> String {
        match self.page_count() {
            Some(count) => format!("Page {} of {}", self.current_page(), count),
            None => format!("Page {} of ...", self.current_page()),
        }
    }

    pub fn status(&self) -> ViewerStatus<'_> {
        if let Some(file_name) = self.session.uploading() {
            return ViewerStatus::Uploading { file_name };
        }
        if let Some(doc) = self.session.document() {
            return match doc.page_count {
                Some(_) => ViewerStatus::Ready(doc),
                None => ViewerStatus::Preparing(doc),
            };
        }
        match self.session.error() {
            Some(SessionError::Upload(message)) => ViewerStatus::UploadFailed { message },
            Some(SessionError::Load(message)) => ViewerStatus::LoadFailed { message },
            None => ViewerStatus::Empty,
        }
    }

    /// The overlay is open exactly while a selection is held.
    pub fn overlay(&self) -> Option<OverlayView<'_>> {
        let selection = self.selection.current()?;
        let request = self.translation.current();
        Some(OverlayView {
            original: &selection.text,
            status: request.status,
            translated_text: request.translated_text.as_deref(),
            error_message: request.error_message.as_deref(),
        })
    }

    fn reset_if_unloaded(&mut self) {
        if self.session.document().is_none() {
            self.reset_dependents();
        }
    }

    fn reset_dependents(&mut self) {
        self.paginator.reset();
        self.editor.cancel();
        self.selection.clear();
        self.translation.dismiss();
    }
}

fn scroll_on_change(changed: bool, effects: &mut Vec<Effect>) {
    if changed {
        effects.push(Effect::ScrollToTop);
    }
}
