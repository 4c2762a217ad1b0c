use tracing::debug;

use crate::paginator::Paginator;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditorMode {
    /// Read-only "page X of N" indicator.
    #[default]
    Display,
    /// Editable field holding the user's pending input.
    Editing { pending_input: String },
}

/// Toggles the page indicator between display and an editable field.
///
/// Confirm and blur both funnel into [`PageNumberEditor::commit`]; a commit
/// that fails to parse or lands out of range silently reverts to display.
#[derive(Debug, Clone, Default)]
pub struct PageNumberEditor {
    mode: EditorMode,
}

impl PageNumberEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, EditorMode::Editing { .. })
    }

    pub fn pending_input(&self) -> Option<&str> {
        match &self.mode {
            EditorMode::Editing { pending_input } => Some(pending_input),
            EditorMode::Display => None,
        }
    }

    /// Display → Editing, seeded with the current page. The caller is expected
    /// to select the seeded text so the next keystroke replaces it.
    pub fn activate(&mut self, current_page: usize) {
        self.mode = EditorMode::Editing {
            pending_input: current_page.to_string(),
        };
    }

    /// Replaces the pending input. Ignored outside of editing.
    pub fn set_input(&mut self, value: String) {
        if let EditorMode::Editing { pending_input } = &mut self.mode {
            *pending_input = value;
        }
    }

    /// Escape: drops the pending input, page unchanged.
    pub fn cancel(&mut self) {
        self.mode = EditorMode::Display;
    }

    /// Editing → Committing → Display. Returns whether the page changed.
    pub fn commit(&mut self, paginator: &mut Paginator, page_count: Option<usize>) -> bool {
        let EditorMode::Editing { pending_input } = std::mem::take(&mut self.mode) else {
            return false;
        };
        match pending_input.trim().parse::<i64>() {
            Ok(page) => paginator.go_to(page_count, page),
            Err(_) => {
                debug!(input = %pending_input, "page input is not a number");
                false
            }
        }
    }
}
