//! Analyze command - submit a file to the analysis server

use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};
use clap::Args;

use adlens_common::AnalysisResult;

use super::open_store;

#[derive(Args)]
pub struct AnalyzeCommand {
    /// Media file to analyze
    pub file: PathBuf,

    /// Analysis server base URL
    #[arg(long, default_value = "http://127.0.0.1:8080", env = "ADLENS_SERVER")]
    pub server: String,

    /// Declared MIME type (inferred from the file extension when omitted)
    #[arg(long)]
    pub mime: Option<String>,

    /// Print the result without saving it to the local store
    #[arg(long)]
    pub no_save: bool,
}

impl AnalyzeCommand {
    pub async fn execute(self) -> Result<()> {
        let bytes = tokio::fs::read(&self.file)
            .await
            .with_context(|| format!("Failed to read {}", self.file.display()))?;

        let file_name = self
            .file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let mime = match self.mime {
            Some(mime) => mime,
            None => infer_mime(&file_name)?,
        };

        tracing::debug!("Uploading {} ({} bytes) as {}", file_name, bytes.len(), mime);

        // The server accepts any file-carrying field; `video` matches the
        // original web client's form
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str(&mime)
            .context("Invalid MIME type")?;
        let form = reqwest::multipart::Form::new().part("video", part);

        let url = format!("{}/api/v1/analyze", self.server.trim_end_matches('/'));
        let response = reqwest::Client::new()
            .post(&url)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let message = body
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("unknown error");
            bail!("Server rejected the upload ({status}): {message}");
        }

        let analysis: AnalysisResult = response
            .json()
            .await
            .context("Failed to parse server response")?;

        println!("{}", serde_json::to_string_pretty(&analysis)?);

        if !self.no_save {
            let saved = open_store().insert(analysis, &file_name).await;
            println!("Saved as {}", saved.id);
        }

        Ok(())
    }
}

/// Infer a MIME type from the file extension
fn infer_mime(file_name: &str) -> Result<String> {
    let extension = file_name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase();

    let mime = match extension.as_str() {
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => bail!("Cannot infer a MIME type for {file_name}; pass --mime"),
    };

    Ok(mime.to_string())
}
