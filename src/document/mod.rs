//! Document acquisition: format gate, streamed download, text extraction.

mod docx;
mod pdf;

use crate::errors::AppError;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Allowed document formats, detected from the locator's file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Detect the format from a URL, ignoring query string and fragment.
    /// Anything outside the allow-list is rejected before any network fetch.
    pub fn detect(url: &str) -> Result<Self, AppError> {
        let path = url
            .split(['?', '#'])
            .next()
            .unwrap_or(url)
            .to_ascii_lowercase();
        if path.ends_with(".pdf") {
            Ok(Self::Pdf)
        } else if path.ends_with(".docx") {
            Ok(Self::Docx)
        } else {
            let ext = path
                .rsplit('/')
                .next()
                .and_then(|name| name.rsplit_once('.').map(|(_, e)| format!(".{e}")))
                .unwrap_or_else(|| "no extension".to_string());
            Err(AppError::UnsupportedFormat(ext))
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

/// A downloaded document on disk. The file is removed when the guard drops,
/// on success and failure paths alike.
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove temp artifact");
            }
        }
    }
}

/// Fetches remote documents into uniquely named temp files.
pub struct DocumentAcquirer {
    client: reqwest::Client,
}

impl DocumentAcquirer {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::AcquisitionFailed(format!("HTTP client setup: {e}")))?;
        Ok(Self { client })
    }

    /// Validate the format, then stream the remote body to a temp file.
    /// UUID-suffixed names keep concurrent ingestions from colliding.
    pub async fn fetch(&self, url: &str) -> Result<(DocumentFormat, TempArtifact), AppError> {
        let format = DocumentFormat::detect(url)?;

        let path = std::env::temp_dir().join(format!("docqa-{}.{}", Uuid::new_v4(), format.extension()));

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::AcquisitionFailed(format!("download of {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::AcquisitionFailed(format!(
                "download of {url}: HTTP {}",
                response.status()
            )));
        }

        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| AppError::AcquisitionFailed(format!("temp file create: {e}")))?;
        // Guard exists before the first byte lands, so a failed stream still
        // cleans the partial file up.
        let artifact = TempArtifact { path };

        let mut stream = response.bytes_stream();
        let mut bytes_written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| AppError::AcquisitionFailed(format!("download stream: {e}")))?;
            bytes_written += chunk.len() as u64;
            file.write_all(&chunk)
                .await
                .map_err(|e| AppError::AcquisitionFailed(format!("temp file write: {e}")))?;
        }
        file.flush()
            .await
            .map_err(|e| AppError::AcquisitionFailed(format!("temp file flush: {e}")))?;

        tracing::debug!(url, bytes = bytes_written, path = %artifact.path().display(), "Document downloaded");

        Ok((format, artifact))
    }
}

/// Extract the full text of a downloaded document.
pub fn extract_text(format: DocumentFormat, path: &Path) -> Result<String, AppError> {
    let text = match format {
        DocumentFormat::Pdf => pdf::extract_text(path)?,
        DocumentFormat::Docx => docx::extract_text(path)?,
    };
    if text.trim().is_empty() {
        return Err(AppError::AcquisitionFailed(format!(
            "no text content extracted from {}",
            path.display()
        )));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_allowed_formats() {
        assert_eq!(
            DocumentFormat::detect("https://example.com/policy.pdf").unwrap(),
            DocumentFormat::Pdf
        );
        assert_eq!(
            DocumentFormat::detect("https://example.com/terms.DOCX").unwrap(),
            DocumentFormat::Docx
        );
        // Query strings do not fool the gate.
        assert_eq!(
            DocumentFormat::detect("https://example.com/a.pdf?sig=x.txt").unwrap(),
            DocumentFormat::Pdf
        );
    }

    #[test]
    fn rejects_disallowed_formats() {
        for url in [
            "https://example.com/notes.txt",
            "https://example.com/sheet.xlsx",
            "https://example.com/noextension",
        ] {
            assert!(matches!(
                DocumentFormat::detect(url),
                Err(AppError::UnsupportedFormat(_))
            ));
        }
    }

    #[test]
    fn temp_artifact_removes_file_on_drop() {
        let path = std::env::temp_dir().join(format!("docqa-test-{}.pdf", Uuid::new_v4()));
        std::fs::write(&path, b"dummy").unwrap();
        assert!(path.exists());
        drop(TempArtifact { path: path.clone() });
        assert!(!path.exists());
    }
}
