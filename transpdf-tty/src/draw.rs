use std::io::Write;

use anyhow::Result;
use crossterm::{
    cursor, queue,
    style::{Attribute, Print, SetAttribute},
    terminal::{Clear, ClearType},
};
use transpdf_core::{OverlayView, TranslationStatus, Viewer, ViewerStatus};

use crate::PageSurface;

pub const NO_TRANSLATION_MESSAGE: &str = "No translation available.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, column: u16, row: u16) -> bool {
        column >= self.x
            && row >= self.y
            && u32::from(column) < u32::from(self.x) + u32::from(self.width)
            && u32::from(row) < u32::from(self.y) + u32::from(self.height)
    }

    pub fn clamp(&self, column: u16, row: u16) -> (u16, u16) {
        let right = self.x.saturating_add(self.width.saturating_sub(1));
        let bottom = self.y.saturating_add(self.height.saturating_sub(1));
        (column.clamp(self.x, right), row.clamp(self.y, bottom))
    }
}

/// Header text: document state on the left, page indicator on the right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub left: String,
    pub right: String,
}

pub fn status_line(viewer: &Viewer) -> StatusLine {
    let left = match viewer.status() {
        ViewerStatus::Empty => "No document. Press o to open a PDF.".to_owned(),
        ViewerStatus::Uploading { file_name } => format!("Uploading {file_name}..."),
        ViewerStatus::UploadFailed { message } | ViewerStatus::LoadFailed { message } => {
            message.to_owned()
        }
        ViewerStatus::Preparing(doc) => format!("{}: loading...", doc.file_name),
        ViewerStatus::Ready(doc) => doc.file_name.clone(),
    };
    let right = if viewer.document().is_none() {
        String::new()
    } else if let Some(input) = viewer.editor().pending_input() {
        match viewer.page_count() {
            Some(count) => format!("Page [{input}] of {count}"),
            None => format!("Page [{input}] of ..."),
        }
    } else {
        viewer.page_indicator()
    };
    StatusLine { left, right }
}

/// Box for the translation overlay, centred on a `columns` x `rows` screen.
pub fn overlay_rect(columns: u16, rows: u16) -> Rect {
    let width = (columns.saturating_mul(2) / 3).clamp(columns.min(20), columns);
    let height = (rows / 2).clamp(rows.min(6), rows);
    Rect::new(
        (columns - width) / 2,
        (rows - height) / 2,
        width,
        height,
    )
}

/// Body of the translation overlay wrapped to `width` columns.
pub fn overlay_lines(view: &OverlayView<'_>, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = vec!["Original:".to_owned()];
    lines.extend(wrap(view.original, width));
    lines.push(String::new());
    match view.status {
        TranslationStatus::Idle => {}
        TranslationStatus::Pending => lines.push("Translating...".to_owned()),
        TranslationStatus::Success => {
            let translated = view
                .translated_text
                .filter(|text| !text.trim().is_empty())
                .unwrap_or(NO_TRANSLATION_MESSAGE);
            lines.push("Translation:".to_owned());
            lines.extend(wrap(translated, width));
        }
        TranslationStatus::Failure => {
            let message = view.error_message.unwrap_or_default();
            lines.extend(wrap(&format!("Error: {message}"), width));
        }
    }
    lines
}

fn fit(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    textwrap::wrap(text, width)
        .into_iter()
        .map(|line| line.into_owned())
        .collect()
}

pub struct TextRenderer<W: Write> {
    writer: W,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn writer(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn begin_sync_update(&mut self) -> Result<()> {
        write!(self.writer, "\u{1b}[?2026h")?;
        Ok(())
    }

    /// The terminal renders all buffered changes at once.
    pub fn end_sync_update(&mut self) -> Result<()> {
        write!(self.writer, "\u{1b}[?2026l")?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn clear_all(&mut self) -> Result<()> {
        queue!(
            &mut self.writer,
            Clear(ClearType::All),
            cursor::MoveTo(0, 0)
        )?;
        Ok(())
    }

    pub fn draw_status(&mut self, row: u16, columns: u16, status: &StatusLine) -> Result<()> {
        let columns = usize::from(columns);
        let right_len = status.right.chars().count();
        let left: String = status
            .left
            .chars()
            .take(columns.saturating_sub(right_len + 1))
            .collect();
        let gap = columns.saturating_sub(left.chars().count() + right_len);
        queue!(
            &mut self.writer,
            cursor::MoveTo(0, row),
            SetAttribute(Attribute::Reverse),
            Print(&left),
            Print(" ".repeat(gap)),
            Print(&status.right),
            SetAttribute(Attribute::Reset)
        )?;
        Ok(())
    }

    pub fn draw_page(&mut self, surface: &PageSurface) -> Result<()> {
        let area = surface.area();
        let mut row = area.y;
        for (line, highlight) in surface.visible_lines() {
            queue!(&mut self.writer, cursor::MoveTo(area.x, row))?;
            match highlight {
                Some(range) => {
                    let before: String = line.chars().take(range.start).collect();
                    let selected: String =
                        line.chars().skip(range.start).take(range.len()).collect();
                    let after: String = line.chars().skip(range.end).collect();
                    queue!(
                        &mut self.writer,
                        Print(before),
                        SetAttribute(Attribute::Reverse),
                        Print(selected),
                        SetAttribute(Attribute::Reset),
                        Print(after)
                    )?;
                }
                None => queue!(&mut self.writer, Print(line))?,
            }
            row += 1;
        }
        Ok(())
    }

    /// Bordered box with `lines` inside; lines beyond the box are cut.
    pub fn draw_overlay(&mut self, area: Rect, title: &str, lines: &[String]) -> Result<()> {
        if area.width < 2 || area.height < 2 {
            return Ok(());
        }
        let inner = usize::from(area.width - 2);
        let top = format!("┌{:─<inner$}┐", fit(&format!(" {title} "), inner));
        let bottom = format!("└{:─<inner$}┘", fit(" Esc to close ", inner));
        queue!(&mut self.writer, cursor::MoveTo(area.x, area.y), Print(top))?;
        for offset in 1..area.height - 1 {
            let text = lines
                .get(usize::from(offset - 1))
                .map(String::as_str)
                .unwrap_or_default();
            let text = fit(text, inner);
            queue!(
                &mut self.writer,
                cursor::MoveTo(area.x, area.y + offset),
                Print(format!("│{text:<inner$}│"))
            )?;
        }
        queue!(
            &mut self.writer,
            cursor::MoveTo(area.x, area.y + area.height - 1),
            Print(bottom)
        )?;
        Ok(())
    }

    pub fn draw_prompt(&mut self, row: u16, text: &str) -> Result<()> {
        queue!(
            &mut self.writer,
            cursor::MoveTo(0, row),
            Clear(ClearType::CurrentLine),
            Print(text)
        )?;
        Ok(())
    }
}
