use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use transpdf_core::Command;

mod draw;
mod field;
mod surface;

pub use draw::{
    overlay_lines, overlay_rect, status_line, Rect, StatusLine, TextRenderer, NO_TRANSLATION_MESSAGE,
};
pub use field::{EditField, EditKey};
pub use surface::{PageSurface, TextPosition};

#[derive(Debug, Clone)]
pub enum UiEvent {
    Command(Command),
    /// Keystroke for the page number field.
    Edit(EditKey),
    PointerDown { column: u16, row: u16 },
    PointerDrag { column: u16, row: u16 },
    PointerUp { column: u16, row: u16 },
    Scroll { lines: isize },
    BeginOpen,
    OpenInputChanged { path: String },
    OpenSubmit { path: String },
    OpenCancel,
    Resize,
    Quit,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// The page number field has focus.
    PageInput,
    /// The translation overlay is open.
    Overlay,
    /// Typing a path for a new upload.
    Open,
}

#[derive(Debug, Default)]
pub struct EventMapper {
    mode: InputMode,
    open_buffer: String,
}

impl EventMapper {
    pub const SCROLL_STEP: isize = 3;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_mode(&mut self, mode: InputMode) {
        if self.mode != mode {
            if matches!(self.mode, InputMode::Open) {
                self.open_buffer.clear();
            }
            self.mode = mode;
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn map_event(&mut self, event: Event) -> UiEvent {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Release => UiEvent::None,
            Event::Key(key) => match self.mode {
                InputMode::Normal => self.map_key_normal(key),
                InputMode::PageInput => self.map_key_page_input(key),
                InputMode::Overlay => self.map_key_overlay(key),
                InputMode::Open => self.map_key_open(key),
            },
            Event::Mouse(mouse) => self.map_mouse(mouse),
            Event::Resize(..) => UiEvent::Resize,
            _ => UiEvent::None,
        }
    }

    fn map_key_normal(&mut self, KeyEvent { code, modifiers, .. }: KeyEvent) -> UiEvent {
        match (code, modifiers) {
            (KeyCode::Char('j'), KeyModifiers::NONE)
            | (KeyCode::Down, KeyModifiers::NONE)
            | (KeyCode::Right, KeyModifiers::NONE)
            | (KeyCode::PageDown, _) => UiEvent::Command(Command::NextPage),
            (KeyCode::Char('k'), KeyModifiers::NONE)
            | (KeyCode::Up, KeyModifiers::NONE)
            | (KeyCode::Left, KeyModifiers::NONE)
            | (KeyCode::PageUp, _) => UiEvent::Command(Command::PrevPage),
            (KeyCode::Char('J'), _) | (KeyCode::Char('e'), KeyModifiers::CONTROL) => {
                UiEvent::Scroll { lines: 1 }
            }
            (KeyCode::Char('K'), _) | (KeyCode::Char('y'), KeyModifiers::CONTROL) => {
                UiEvent::Scroll { lines: -1 }
            }
            (KeyCode::Char('g'), KeyModifiers::NONE) | (KeyCode::Home, _) => {
                UiEvent::Command(Command::GoTo { page: 1 })
            }
            (KeyCode::Char('p'), KeyModifiers::NONE) | (KeyCode::Char(':'), _) => {
                UiEvent::Command(Command::EditPage)
            }
            (KeyCode::Char('o'), KeyModifiers::NONE) => {
                self.set_mode(InputMode::Open);
                UiEvent::BeginOpen
            }
            (KeyCode::Char('c'), KeyModifiers::NONE) => UiEvent::Command(Command::Close),
            (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => UiEvent::Quit,
            _ => UiEvent::None,
        }
    }

    fn map_key_page_input(&mut self, KeyEvent { code, modifiers, .. }: KeyEvent) -> UiEvent {
        match (code, modifiers) {
            (KeyCode::Enter, _) => UiEvent::Command(Command::ConfirmPageInput),
            (KeyCode::Esc, _) => UiEvent::Command(Command::CancelPageInput),
            (KeyCode::Tab, _) => UiEvent::Command(Command::PageInputBlurred),
            (KeyCode::Backspace, _) => UiEvent::Edit(EditKey::Backspace),
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => UiEvent::Quit,
            (KeyCode::Char(c), mods) if mods.is_empty() || mods == KeyModifiers::SHIFT => {
                UiEvent::Edit(EditKey::Insert(c))
            }
            _ => UiEvent::None,
        }
    }

    fn map_key_overlay(&mut self, KeyEvent { code, modifiers, .. }: KeyEvent) -> UiEvent {
        match (code, modifiers) {
            (KeyCode::Esc, _)
            | (KeyCode::Enter, _)
            | (KeyCode::Char('x'), KeyModifiers::NONE) => UiEvent::Command(Command::DismissOverlay),
            (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => UiEvent::Quit,
            _ => UiEvent::None,
        }
    }

    fn map_key_open(&mut self, KeyEvent { code, modifiers, .. }: KeyEvent) -> UiEvent {
        match (code, modifiers) {
            (KeyCode::Esc, _) => {
                self.set_mode(InputMode::Normal);
                UiEvent::OpenCancel
            }
            (KeyCode::Enter, _) => {
                let path = std::mem::take(&mut self.open_buffer);
                self.set_mode(InputMode::Normal);
                UiEvent::OpenSubmit { path }
            }
            (KeyCode::Backspace, _) => {
                self.open_buffer.pop();
                UiEvent::OpenInputChanged {
                    path: self.open_buffer.clone(),
                }
            }
            (KeyCode::Char(c), mods) if mods.is_empty() || mods == KeyModifiers::SHIFT => {
                self.open_buffer.push(c);
                UiEvent::OpenInputChanged {
                    path: self.open_buffer.clone(),
                }
            }
            _ => UiEvent::None,
        }
    }

    fn map_mouse(&mut self, MouseEvent { kind, column, row, .. }: MouseEvent) -> UiEvent {
        match kind {
            // Clicking anywhere moves focus away from the page field.
            MouseEventKind::Down(MouseButton::Left) if self.mode == InputMode::PageInput => {
                UiEvent::Command(Command::PageInputBlurred)
            }
            _ if self.mode == InputMode::Open => UiEvent::None,
            MouseEventKind::Down(MouseButton::Left) => UiEvent::PointerDown { column, row },
            MouseEventKind::Drag(MouseButton::Left) => UiEvent::PointerDrag { column, row },
            MouseEventKind::Up(MouseButton::Left) => UiEvent::PointerUp { column, row },
            MouseEventKind::ScrollDown => UiEvent::Scroll {
                lines: Self::SCROLL_STEP,
            },
            MouseEventKind::ScrollUp => UiEvent::Scroll {
                lines: -Self::SCROLL_STEP,
            },
            _ => UiEvent::None,
        }
    }

    /// Text of the open prompt while it is active.
    pub fn pending_input(&self) -> Option<String> {
        match self.mode {
            InputMode::Open => Some(format!("open: {}", self.open_buffer)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key_event(code: KeyCode) -> Event {
        key_event_with_modifiers(code, KeyModifiers::NONE)
    }

    fn key_event_with_modifiers(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn mouse_event(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn normal_mode_maps_page_navigation() {
        let mut mapper = EventMapper::new();
        for code in [KeyCode::Char('j'), KeyCode::Down, KeyCode::Right] {
            assert!(matches!(
                mapper.map_event(key_event(code)),
                UiEvent::Command(Command::NextPage)
            ));
        }
        for code in [KeyCode::Char('k'), KeyCode::Up, KeyCode::Left] {
            assert!(matches!(
                mapper.map_event(key_event(code)),
                UiEvent::Command(Command::PrevPage)
            ));
        }
        match mapper.map_event(key_event(KeyCode::Char('g'))) {
            UiEvent::Command(Command::GoTo { page }) => assert_eq!(page, 1),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn p_activates_page_editor() {
        let mut mapper = EventMapper::new();
        assert!(matches!(
            mapper.map_event(key_event(KeyCode::Char('p'))),
            UiEvent::Command(Command::EditPage)
        ));
    }

    #[test]
    fn page_input_mode_routes_keys_to_field() {
        let mut mapper = EventMapper::new();
        mapper.set_mode(InputMode::PageInput);

        match mapper.map_event(key_event(KeyCode::Char('7'))) {
            UiEvent::Edit(EditKey::Insert(c)) => assert_eq!(c, '7'),
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(matches!(
            mapper.map_event(key_event(KeyCode::Backspace)),
            UiEvent::Edit(EditKey::Backspace)
        ));
        assert!(matches!(
            mapper.map_event(key_event(KeyCode::Enter)),
            UiEvent::Command(Command::ConfirmPageInput)
        ));
        assert!(matches!(
            mapper.map_event(key_event(KeyCode::Esc)),
            UiEvent::Command(Command::CancelPageInput)
        ));
        // 'j' is text here, not navigation.
        assert!(matches!(
            mapper.map_event(key_event(KeyCode::Char('j'))),
            UiEvent::Edit(EditKey::Insert('j'))
        ));
    }

    #[test]
    fn click_while_editing_blurs_the_field() {
        let mut mapper = EventMapper::new();
        mapper.set_mode(InputMode::PageInput);
        assert!(matches!(
            mapper.map_event(mouse_event(MouseEventKind::Down(MouseButton::Left), 4, 4)),
            UiEvent::Command(Command::PageInputBlurred)
        ));
    }

    #[test]
    fn overlay_mode_dismisses_on_escape_and_enter() {
        let mut mapper = EventMapper::new();
        mapper.set_mode(InputMode::Overlay);
        for code in [KeyCode::Esc, KeyCode::Enter, KeyCode::Char('x')] {
            assert!(matches!(
                mapper.map_event(key_event(code)),
                UiEvent::Command(Command::DismissOverlay)
            ));
        }
        assert!(matches!(
            mapper.map_event(key_event(KeyCode::Char('j'))),
            UiEvent::None
        ));
    }

    #[test]
    fn mouse_drag_sequence_is_forwarded() {
        let mut mapper = EventMapper::new();
        assert!(matches!(
            mapper.map_event(mouse_event(MouseEventKind::Down(MouseButton::Left), 1, 2)),
            UiEvent::PointerDown { column: 1, row: 2 }
        ));
        assert!(matches!(
            mapper.map_event(mouse_event(MouseEventKind::Drag(MouseButton::Left), 5, 2)),
            UiEvent::PointerDrag { column: 5, row: 2 }
        ));
        assert!(matches!(
            mapper.map_event(mouse_event(MouseEventKind::Up(MouseButton::Left), 5, 3)),
            UiEvent::PointerUp { column: 5, row: 3 }
        ));
    }

    #[test]
    fn mouse_selection_still_works_with_overlay_open() {
        let mut mapper = EventMapper::new();
        mapper.set_mode(InputMode::Overlay);
        assert!(matches!(
            mapper.map_event(mouse_event(MouseEventKind::Up(MouseButton::Left), 0, 0)),
            UiEvent::PointerUp { column: 0, row: 0 }
        ));
    }

    #[test]
    fn open_prompt_collects_path() {
        let mut mapper = EventMapper::new();
        assert!(matches!(
            mapper.map_event(key_event(KeyCode::Char('o'))),
            UiEvent::BeginOpen
        ));
        assert_eq!(mapper.pending_input().as_deref(), Some("open: "));

        for c in "a.pdx".chars() {
            mapper.map_event(key_event(KeyCode::Char(c)));
        }
        match mapper.map_event(key_event(KeyCode::Backspace)) {
            UiEvent::OpenInputChanged { ref path } => assert_eq!(path, "a.pd"),
            other => panic!("unexpected event: {:?}", other),
        }
        mapper.map_event(key_event(KeyCode::Char('f')));
        assert_eq!(mapper.pending_input().as_deref(), Some("open: a.pdf"));

        match mapper.map_event(key_event(KeyCode::Enter)) {
            UiEvent::OpenSubmit { ref path } => assert_eq!(path, "a.pdf"),
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(mapper.mode(), InputMode::Normal);
        assert!(mapper.pending_input().is_none());
    }

    #[test]
    fn open_prompt_cancel_drops_buffer() {
        let mut mapper = EventMapper::new();
        mapper.map_event(key_event(KeyCode::Char('o')));
        mapper.map_event(key_event(KeyCode::Char('x')));
        assert!(matches!(
            mapper.map_event(key_event(KeyCode::Esc)),
            UiEvent::OpenCancel
        ));
        mapper.set_mode(InputMode::Open);
        assert_eq!(mapper.pending_input().as_deref(), Some("open: "));
    }

    #[test]
    fn ctrl_c_quits_from_every_mode() {
        for mode in [InputMode::Normal, InputMode::PageInput, InputMode::Overlay] {
            let mut mapper = EventMapper::new();
            mapper.set_mode(mode);
            assert!(matches!(
                mapper.map_event(key_event_with_modifiers(
                    KeyCode::Char('c'),
                    KeyModifiers::CONTROL
                )),
                UiEvent::Quit
            ));
        }
    }

    #[test]
    fn key_release_events_are_ignored() {
        let mut mapper = EventMapper::new();
        let event = Event::Key(KeyEvent {
            code: KeyCode::Char('j'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        });
        assert!(matches!(mapper.map_event(event), UiEvent::None));
    }
}
