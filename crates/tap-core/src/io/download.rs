//! Streaming download with SHA256 verification.
//!
//! The archive is hashed while it is written, so verification costs no
//! second pass over the file. A mismatching file is deleted before the
//! error is returned.

use std::path::Path;

use futures::StreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};
use tap_schema::{FormulaName, Sha256Digest, Version};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::Reporter;

/// Errors from fetching and verifying an archive.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Transport failure or non-success HTTP status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Writing the archive to disk failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The downloaded bytes do not hash to the recorded digest.
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        /// Digest recorded in the formula.
        expected: String,
        /// Digest of the downloaded bytes.
        actual: String,
    },
}

/// Request for a download operation
#[derive(Debug)]
pub struct DownloadRequest<'a, R: Reporter + ?Sized> {
    /// Shared HTTP client.
    pub client: &'a Client,
    /// Formula being installed, for progress lines.
    pub name: &'a FormulaName,
    /// Version being installed, for progress lines.
    pub version: &'a Version,
    /// Archive URL.
    pub url: &'a str,
    /// Where the archive is written.
    pub dest: &'a Path,
    /// Digest the archive must hash to.
    pub expected: &'a Sha256Digest,
    /// Progress sink.
    pub reporter: &'a R,
}

impl<R: Reporter + ?Sized> DownloadRequest<'_, R> {
    /// Execute the download, returning the verified hex digest.
    ///
    /// # Errors
    ///
    /// See [`download_and_verify`].
    pub async fn execute(self) -> Result<String, DownloadError> {
        download_and_verify(self).await
    }
}

/// Perform a simple, sequential download with streaming verification.
///
/// # Errors
///
/// Returns [`DownloadError::Http`] on transport errors or non-2xx status,
/// [`DownloadError::Io`] if the destination cannot be written, and
/// [`DownloadError::HashMismatch`] if the content does not match.
pub async fn download_and_verify<R: Reporter + ?Sized>(
    req: DownloadRequest<'_, R>,
) -> Result<String, DownloadError> {
    tracing::debug!("GET {}", req.url);

    let response = req
        .client
        .get(req.url)
        .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
        .send()
        .await?
        .error_for_status()?;

    let total_size = response.content_length();
    req.reporter
        .downloading(req.name, req.version, 0, total_size);

    let mut file = File::create(req.dest).await?;
    let mut stream = response.bytes_stream();
    let mut hasher = Sha256::new();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        hasher.update(&chunk);
        downloaded += chunk.len() as u64;
        req.reporter
            .downloading(req.name, req.version, downloaded, total_size);
    }

    file.flush().await?;
    drop(file);
    let actual_hash = hex::encode(hasher.finalize());

    if !req.expected.matches(&actual_hash) {
        req.reporter.failed(req.name, req.version, "hash mismatch");
        tokio::fs::remove_file(req.dest).await.ok();
        return Err(DownloadError::HashMismatch {
            expected: req.expected.to_string(),
            actual: actual_hash,
        });
    }

    tracing::debug!("Verified {} ({downloaded} bytes)", req.dest.display());
    Ok(actual_hash)
}

/// SHA256 of a local file, as lowercase hex.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read.
pub fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// SHA256 of an in-memory buffer, as lowercase hex.
pub fn sha256_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
