// External dependencies
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, Response};
use serde::Serialize;
use std::path::Path;
use url::Url;

// Internal dependencies
use crate::ai::model::{LanguageModel, RemoteFile};
use crate::ai::response::{GenerateContentResponse, ResponseParser, UploadResponse};
use crate::config::Settings;

// ============================================================================
// Gemini API Structures
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileDataPayload,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileDataPayload {
    mime_type: String,
    file_uri: String,
}

#[derive(Debug, Serialize)]
struct UploadStartRequest {
    file: UploadStartFile,
}

#[derive(Debug, Serialize)]
struct UploadStartFile {
    display_name: String,
}

pub struct GeminiClient {
    client: Client,
    base_url: Url,
    model_name: String,
    api_key: String,
}

// ============================================================================
// Client Implementation
// ============================================================================

impl GeminiClient {
    /// Creates a client for the configured model. Model calls carry no
    /// overall timeout; only connection establishment is bounded.
    pub fn new(settings: &Settings, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(&settings.model.api_base).context("Invalid Gemini base URL")?;

        Ok(Self {
            client,
            base_url,
            model_name: settings.model.name.clone(),
            api_key: api_key.into(),
        })
    }

    // ========================================================================
    // Connection
    // ========================================================================

    /// Fetches the configured model's metadata to prove key and endpoint work.
    pub async fn verify_connection(&self) -> Result<()> {
        debug!("Verifying Gemini connection");

        let url = self.endpoint(&format!("/v1beta/models/{}", self.model_name))?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to connect to Gemini API")?;

        Self::ensure_success(response).await?;
        info!("Gemini connection verified");
        Ok(())
    }

    // ========================================================================
    // Generation
    // ========================================================================

    async fn generate_content(&self, parts: Vec<Part>) -> Result<String> {
        let url = self.endpoint(&format!(
            "/v1beta/models/{}:generateContent",
            self.model_name
        ))?;

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
        };

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .context("Failed to send generate request")?;

        let response = Self::ensure_success(response).await?;
        let parsed: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to parse generate response")?;

        let text = ResponseParser::extract_text(parsed)?;
        debug!("Generated response length: {}", text.len());
        Ok(text)
    }

    // ========================================================================
    // Files API
    // ========================================================================

    /// Resumable upload in two requests: open a session, then send the bytes
    /// and finalize in one go.
    async fn upload_bytes(
        &self,
        display_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<RemoteFile> {
        let start_url = self.endpoint("/upload/v1beta/files")?;
        let start = UploadStartRequest {
            file: UploadStartFile {
                display_name: display_name.to_string(),
            },
        };

        let response = self
            .client
            .post(start_url)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&start)
            .send()
            .await
            .context("Failed to start file upload")?;

        let response = Self::ensure_success(response).await?;
        let upload_url = response
            .headers()
            .get("x-goog-upload-url")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Gemini did not return an upload URL"))?;

        let response = self
            .client
            .post(upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await
            .context("Failed to send file contents")?;

        let response = Self::ensure_success(response).await?;
        let uploaded: UploadResponse = response
            .json()
            .await
            .context("Failed to parse upload response")?;

        Ok(RemoteFile {
            name: uploaded.file.name,
            uri: uploaded.file.uri,
            mime_type: uploaded
                .file
                .mime_type
                .unwrap_or_else(|| mime_type.to_string()),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .with_context(|| format!("Failed to build URL for {path}"))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    async fn ensure_success(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
        Err(anyhow!(ResponseParser::describe_http_error(status, &body)))
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!("Sending prompt to {}, length: {}", self.model_name, prompt.len());
        self.generate_content(vec![Part::Text {
            text: prompt.to_string(),
        }])
        .await
    }

    async fn upload_file(&self, path: &Path) -> Result<RemoteFile> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        info!(
            "Uploading {} ({} bytes, {mime_type})",
            path.display(),
            bytes.len()
        );
        self.upload_bytes(&display_name, &mime_type, bytes).await
    }

    async fn analyze_file(&self, file: &RemoteFile, instruction: &str) -> Result<String> {
        debug!("Analyzing uploaded file {}", file.name);
        self.generate_content(vec![
            Part::Text {
                text: instruction.to_string(),
            },
            Part::FileData {
                file_data: FileDataPayload {
                    mime_type: file.mime_type.clone(),
                    file_uri: file.uri.clone(),
                },
            },
        ])
        .await
    }
}
