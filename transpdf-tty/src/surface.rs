use std::ops::Range;

use transpdf_core::SelectionSource;
use unicode_width::UnicodeWidthChar;

use crate::Rect;

/// A cell in the wrapped page text: line index and char offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TextPosition {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone)]
struct Line {
    text: String,
    /// The source text had a newline after this line.
    hard_break: bool,
}

/// The content area: the current page's text wrapped to the terminal width,
/// a scroll offset, and the mouse-driven text selection.
#[derive(Debug, Default)]
pub struct PageSurface {
    text: String,
    lines: Vec<Line>,
    area: Rect,
    scroll: usize,
    anchor: Option<TextPosition>,
    head: Option<TextPosition>,
}

impl PageSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.clear_selection();
        self.rewrap();
    }

    pub fn set_area(&mut self, area: Rect) {
        let width_changed = area.width != self.area.width;
        self.area = area;
        if width_changed {
            self.clear_selection();
            self.rewrap();
        }
        self.clamp_scroll();
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn scroll_by(&mut self, lines: isize) {
        self.scroll = self.scroll.saturating_add_signed(lines);
        self.clamp_scroll();
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
    }

    pub fn contains(&self, column: u16, row: u16) -> bool {
        self.area.contains(column, row)
    }

    /// Starts a selection at the cell under the pointer. Returns false when
    /// the pointer is outside the content area.
    pub fn begin_selection(&mut self, column: u16, row: u16) -> bool {
        self.clear_selection();
        if !self.contains(column, row) {
            return false;
        }
        let Some(position) = self.position_at(column, row) else {
            return false;
        };
        self.anchor = Some(position);
        self.head = Some(position);
        true
    }

    /// Moves the selection head, clamping the pointer to the content area.
    pub fn extend_selection(&mut self, column: u16, row: u16) {
        if self.anchor.is_none() {
            return;
        }
        let (column, row) = self.area.clamp(column, row);
        if let Some(position) = self.position_at(column, row) {
            self.head = Some(position);
        }
    }

    pub fn clear_selection(&mut self) {
        self.anchor = None;
        self.head = None;
    }

    pub fn has_selection(&self) -> bool {
        self.anchor.is_some()
    }

    /// Visible lines paired with the selected char range on each.
    pub fn visible_lines(&self) -> impl Iterator<Item = (&str, Option<Range<usize>>)> + '_ {
        let bounds = self.bounds();
        self.lines
            .iter()
            .enumerate()
            .skip(self.scroll)
            .take(self.area.height as usize)
            .map(move |(index, line)| {
                let highlight = bounds.and_then(|(start, end)| {
                    line_range(index, line.text.chars().count(), start, end)
                });
                (line.text.as_str(), highlight)
            })
    }

    fn rewrap(&mut self) {
        let width = usize::from(self.area.width.max(1));
        self.lines.clear();
        for paragraph in self.text.lines() {
            let wrapped = textwrap::wrap(paragraph, width);
            let last = wrapped.len().saturating_sub(1);
            if wrapped.is_empty() {
                self.lines.push(Line {
                    text: String::new(),
                    hard_break: true,
                });
            }
            for (index, piece) in wrapped.into_iter().enumerate() {
                self.lines.push(Line {
                    text: piece.into_owned(),
                    hard_break: index == last,
                });
            }
        }
        self.clamp_scroll();
    }

    fn clamp_scroll(&mut self) {
        let max = self
            .lines
            .len()
            .saturating_sub(usize::from(self.area.height));
        self.scroll = self.scroll.min(max);
    }

    fn position_at(&self, column: u16, row: u16) -> Option<TextPosition> {
        if self.lines.is_empty() {
            return None;
        }
        let line = (self.scroll + usize::from(row.saturating_sub(self.area.y)))
            .min(self.lines.len() - 1);
        let column = char_at_column(
            &self.lines[line].text,
            usize::from(column.saturating_sub(self.area.x)),
        );
        Some(TextPosition { line, column })
    }

    /// Ordered, inclusive selection bounds. A click without movement selects
    /// nothing.
    fn bounds(&self) -> Option<(TextPosition, TextPosition)> {
        let (anchor, head) = (self.anchor?, self.head?);
        if anchor == head {
            return None;
        }
        Some(if anchor < head {
            (anchor, head)
        } else {
            (head, anchor)
        })
    }
}

impl SelectionSource for PageSurface {
    fn selected_text(&self) -> Option<String> {
        let (start, end) = self.bounds()?;
        let mut text = String::new();
        for index in start.line..=end.line {
            let line = &self.lines[index];
            if index > start.line {
                text.push(if self.lines[index - 1].hard_break {
                    '\n'
                } else {
                    ' '
                });
            }
            let length = line.text.chars().count();
            if let Some(range) = line_range(index, length, start, end) {
                text.extend(line.text.chars().skip(range.start).take(range.len()));
            }
        }
        Some(text)
    }
}

/// Index of the char drawn at terminal `column`; wide chars span two
/// columns. Past the end of the line this is the char count.
fn char_at_column(text: &str, column: usize) -> usize {
    let mut right = 0;
    for (index, c) in text.chars().enumerate() {
        right += c.width().unwrap_or(0);
        if column < right {
            return index;
        }
    }
    text.chars().count()
}

fn line_range(
    index: usize,
    length: usize,
    start: TextPosition,
    end: TextPosition,
) -> Option<Range<usize>> {
    if index < start.line || index > end.line {
        return None;
    }
    let from = if index == start.line { start.column } else { 0 };
    let to = if index == end.line {
        (end.column + 1).min(length)
    } else {
        length
    };
    (from < to).then_some(from..to)
}
