use anyhow::{anyhow, Context, Result};
use transpdf_core::DocumentBackend;

#[cfg(feature = "pdf")]
mod pdfium;

#[cfg(feature = "pdf")]
pub use pdfium::PdfiumProvider;

/// An opened document reduced to what the viewer displays: one text block
/// per page.
#[derive(Debug, Clone, Default)]
pub struct TextDocument {
    pages: Vec<String>,
}

impl TextDocument {
    pub fn new(pages: Vec<String>) -> Self {
        Self { pages }
    }
}

impl DocumentBackend for TextDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, page_index: usize) -> Result<String> {
        self.pages
            .get(page_index)
            .cloned()
            .ok_or_else(|| anyhow!("page {} out of range", page_index))
    }
}

/// Runs CPU-bound document parsing on tokio's blocking pool so the async
/// workers stay free.
#[cfg_attr(not(feature = "pdf"), allow(dead_code))]
pub(crate) async fn extract_blocking<F>(extract: F) -> Result<TextDocument>
where
    F: FnOnce() -> Result<TextDocument> + Send + 'static,
{
    tokio::task::spawn_blocking(extract)
        .await
        .context("document extraction task failed")?
}
