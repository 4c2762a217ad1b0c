use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use pdfium_render::prelude::*;
use tracing::{instrument, warn};
use transpdf_core::{DocumentBackend, DocumentProvider, DocumentRef, DocumentSource};

use crate::{extract_blocking, TextDocument};

/// Rendering engine backed by Pdfium. Documents are fetched through a
/// [`DocumentSource`] and reduced to their page text on open.
pub struct PdfiumProvider {
    pdfium: Arc<Pdfium>,
    source: Arc<dyn DocumentSource>,
}

impl PdfiumProvider {
    pub fn new(source: Arc<dyn DocumentSource>) -> Result<Self> {
        let pdfium = match bind_pdfium_from_env() {
            Some(pdfium) => pdfium,
            None => bind_pdfium_default()?,
        };
        Ok(Self {
            pdfium: Arc::new(pdfium),
            source,
        })
    }
}

fn extract_pages(pdfium: &Pdfium, bytes: Vec<u8>) -> Result<TextDocument> {
    let document = pdfium
        .load_pdf_from_byte_vec(bytes, None)
        .context("failed to parse the document")?;
    let mut pages = Vec::new();
    for (index, page) in document.pages().iter().enumerate() {
        let text = page
            .text()
            .with_context(|| format!("failed to extract text for page {}", index + 1))?;
        pages.push(text.all());
    }
    Ok(TextDocument::new(pages))
}

#[async_trait]
impl DocumentProvider for PdfiumProvider {
    #[instrument(skip(self))]
    async fn open(&self, reference: &DocumentRef) -> Result<Arc<dyn DocumentBackend>> {
        let bytes = self.source.fetch(reference).await?;
        let pdfium = Arc::clone(&self.pdfium);
        let document = extract_blocking(move || extract_pages(&pdfium, bytes.to_vec())).await?;
        Ok(Arc::new(document))
    }
}

fn bind_pdfium_from_env() -> Option<Pdfium> {
    let path = std::env::var("TRANSPDF_PDFIUM_LIBRARY_PATH").ok()?;
    if path.is_empty() {
        return None;
    }
    match Pdfium::bind_to_library(&path) {
        Ok(bindings) => Some(Pdfium::new(bindings)),
        Err(err) => {
            warn!("failed to load Pdfium from {}: {}", path, err);
            None
        }
    }
}

fn bind_pdfium_default() -> Result<Pdfium> {
    let mut errors = Vec::new();

    let cwd_path = Pdfium::pdfium_platform_library_name_at_path("./");
    match Pdfium::bind_to_library(&cwd_path) {
        Ok(bindings) => return Ok(Pdfium::new(bindings)),
        Err(err) => errors.push(format!("{}: {}", cwd_path.display(), err)),
    }

    match Pdfium::bind_to_system_library() {
        Ok(bindings) => Ok(Pdfium::new(bindings)),
        Err(err) => {
            errors.push(format!("system: {err}"));
            Err(anyhow!(
                "failed to bind to a pdfium library; set TRANSPDF_PDFIUM_LIBRARY_PATH or install it ({})",
                errors.join(", ")
            ))
        }
    }
}
