#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Insert(char),
    Backspace,
}

/// Terminal-side state of the page number input. The value itself lives in
/// the viewer; this only tracks whether the text is selected so the first
/// keystroke after activation replaces it.
#[derive(Debug, Default)]
pub struct EditField {
    selected: bool,
}

impl EditField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_all(&mut self) {
        self.selected = true;
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Applies `key` to `current` and returns the new value.
    pub fn apply(&mut self, current: &str, key: EditKey) -> String {
        let selected = std::mem::take(&mut self.selected);
        let mut value = if selected {
            String::new()
        } else {
            current.to_owned()
        };
        match key {
            EditKey::Insert(c) => value.push(c),
            EditKey::Backspace => {
                if !selected {
                    value.pop();
                }
            }
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_keystroke_replaces_selected_text() {
        let mut field = EditField::new();
        field.select_all();
        assert_eq!(field.apply("12", EditKey::Insert('4')), "4");
        assert!(!field.is_selected());
        assert_eq!(field.apply("4", EditKey::Insert('2')), "42");
    }

    #[test]
    fn backspace_on_selection_clears_everything() {
        let mut field = EditField::new();
        field.select_all();
        assert_eq!(field.apply("123", EditKey::Backspace), "");
    }

    #[test]
    fn backspace_removes_last_character() {
        let mut field = EditField::new();
        assert_eq!(field.apply("123", EditKey::Backspace), "12");
        assert_eq!(field.apply("", EditKey::Backspace), "");
    }
}
