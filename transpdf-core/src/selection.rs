use tracing::debug;

use crate::SelectionSeq;

/// Whatever currently holds the user's text selection (the rendering surface).
pub trait SelectionSource {
    fn selected_text(&self) -> Option<String>;
}

impl SelectionSource for str {
    fn selected_text(&self) -> Option<String> {
        Some(self.to_owned())
    }
}

impl SelectionSource for Option<String> {
    fn selected_text(&self) -> Option<String> {
        self.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Trimmed, never empty.
    pub text: String,
    pub captured_at: SelectionSeq,
}

#[derive(Debug, Default)]
pub struct SelectionCapture {
    current: Option<Selection>,
    last_seq: SelectionSeq,
}

impl SelectionCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Selection> {
        self.current.as_ref()
    }

    /// Pointer released. Captures a new selection when the release happened
    /// inside the content area and the surface holds non-blank text; the new
    /// selection always replaces the previous one.
    pub fn on_pointer_release<S>(&mut self, within_content_area: bool, source: &S) -> Option<&Selection>
    where
        S: SelectionSource + ?Sized,
    {
        if !within_content_area {
            return None;
        }
        let text = source.selected_text()?;
        let text = text.trim();
        if text.is_empty() {
            debug!("ignoring blank selection");
            return None;
        }
        self.last_seq += 1;
        self.current = Some(Selection {
            text: text.to_owned(),
            captured_at: self.last_seq,
        });
        self.current.as_ref()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_trimmed_text() {
        let mut capture = SelectionCapture::new();
        let selection = capture
            .on_pointer_release(true, "  hello world\n")
            .cloned()
            .unwrap();
        assert_eq!(selection.text, "hello world");
        assert_eq!(selection.captured_at, 1);
    }

    #[test]
    fn blank_selections_take_no_action() {
        let mut capture = SelectionCapture::new();
        capture.on_pointer_release(true, "first");
        for blank in ["", " ", "\n\t  \r\n"] {
            assert!(capture.on_pointer_release(true, blank).is_none());
        }
        assert!(capture.on_pointer_release(true, &None::<String>).is_none());
        assert_eq!(capture.current().unwrap().text, "first");
        assert_eq!(capture.current().unwrap().captured_at, 1);
    }

    #[test]
    fn release_outside_content_area_is_ignored() {
        let mut capture = SelectionCapture::new();
        assert!(capture.on_pointer_release(false, "word").is_none());
        assert!(capture.current().is_none());
    }

    #[test]
    fn newest_selection_wins_with_increasing_sequence() {
        let mut capture = SelectionCapture::new();
        capture.on_pointer_release(true, "one");
        capture.on_pointer_release(true, "two");
        let current = capture.current().unwrap();
        assert_eq!(current.text, "two");
        assert_eq!(current.captured_at, 2);
    }

    #[test]
    fn sequence_keeps_growing_after_clear() {
        let mut capture = SelectionCapture::new();
        capture.on_pointer_release(true, "one");
        capture.clear();
        assert!(capture.current().is_none());
        let next = capture.on_pointer_release(true, "two").unwrap();
        assert_eq!(next.captured_at, 2);
    }
}
