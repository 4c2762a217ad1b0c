use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};
use transpdf_core::{
    Config, DocumentRef, DocumentSource, ServiceError, TranslationService, UploadFile,
    UploadService, UploadedDocument,
};
use url::Url;

/// Endpoint paths, relative to the configured base URL.
pub const UPLOAD_PATH: &str = "upload-pdf-and-get-content/";
pub const TRANSLATE_PATH: &str = "translate/";

pub const UPLOAD_FAILED_MESSAGE: &str = "Failed to upload the PDF file.";
pub const TRANSLATION_FAILED_MESSAGE: &str = "Translation failed.";
pub const PDF_ONLY_MESSAGE: &str = "Only PDF files are allowed.";

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
    /// Plain text of the whole document as extracted by the server.
    pub content: String,
    /// Path of the stored document, relative to the server origin.
    pub pdf_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslationResponse {
    pub original_word: String,
    pub translated_word: String,
}

/// Talks to the upload/translate server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
    target_language: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self> {
        let mut base = Url::parse(&config.server.base_url)
            .with_context(|| format!("invalid server url {:?}", config.server.base_url))?;
        // Relative joins keep a path prefix such as `/api` only under a trailing slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder()
            .timeout(config.server.timeout)
            .user_agent(concat!("transpdf/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            client,
            base,
            target_language: config.translation.target_language.clone(),
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Turns the server's `pdf_url` into a reference the engine can fetch.
    /// Server-rooted paths are placed under the base URL's path.
    pub fn resolve(&self, pdf_url: &str) -> Result<DocumentRef, ServiceError> {
        let relative = match pdf_url.strip_prefix('/') {
            Some(rest) if !rest.starts_with('/') => rest,
            _ => pdf_url,
        };
        self.base
            .join(relative)
            .map(|url| DocumentRef::new(url.as_str()))
            .map_err(|err| ServiceError::Decode(format!("invalid pdf_url {pdf_url:?}: {err}")))
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base
            .join(path)
            .map_err(|err| ServiceError::Transport(format!("invalid endpoint {path}: {err}")))
    }
}

#[async_trait]
impl UploadService for HttpBackend {
    #[instrument(skip(self, file), fields(file = %file.name, size = file.bytes.len()))]
    async fn upload(&self, file: UploadFile) -> Result<UploadedDocument, ServiceError> {
        if !file.name.ends_with(".pdf") {
            return Err(ServiceError::rejected(PDF_ONLY_MESSAGE));
        }
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str("application/pdf")
            .map_err(transport)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint(UPLOAD_PATH)?)
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(rejection(response, UPLOAD_FAILED_MESSAGE).await);
        }

        let body: UploadResponse = response.json().await.map_err(decode)?;
        debug!(pdf_url = %body.pdf_url, chars = body.content.len(), "upload accepted");
        Ok(UploadedDocument {
            file_name: body.filename,
            reference: self.resolve(&body.pdf_url)?,
        })
    }
}

#[async_trait]
impl TranslationService for HttpBackend {
    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    async fn translate(&self, text: &str) -> Result<String, ServiceError> {
        let mut query = vec![("text_to_translate", text)];
        if let Some(language) = self.target_language.as_deref() {
            query.push(("target_language", language));
        }

        let response = self
            .client
            .post(self.endpoint(TRANSLATE_PATH)?)
            .query(&query)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(rejection(response, TRANSLATION_FAILED_MESSAGE).await);
        }

        let body: TranslationResponse = response.json().await.map_err(decode)?;
        debug!(original = %body.original_word, "translation received");
        Ok(body.translated_word)
    }
}

#[async_trait]
impl DocumentSource for HttpBackend {
    #[instrument(skip(self))]
    async fn fetch(&self, reference: &DocumentRef) -> Result<Bytes> {
        let response = self
            .client
            .get(reference.as_str())
            .send()
            .await
            .with_context(|| format!("failed to request {reference}"))?
            .error_for_status()
            .with_context(|| format!("server refused {reference}"))?;
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("failed to read {reference}"))?;
        Ok(bytes)
    }
}

/// Builds the user-facing error for a non-2xx response: the JSON `detail`
/// string when present, otherwise `fallback`.
async fn rejection(response: Response, fallback: &str) -> ServiceError {
    let status = response.status();
    let detail = response
        .bytes()
        .await
        .ok()
        .and_then(|body| detail_message(&body));
    debug!(%status, ?detail, "request rejected");
    ServiceError::Rejected(detail.unwrap_or_else(|| fallback.to_owned()))
}

fn detail_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .get("detail")
        .and_then(Value::as_str)
        .filter(|detail| !detail.trim().is_empty())
        .map(str::to_owned)
}

fn transport(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Transport("the request timed out".into())
    } else {
        ServiceError::Transport(err.to_string())
    }
}

fn decode(err: reqwest::Error) -> ServiceError {
    ServiceError::Decode(err.to_string())
}
