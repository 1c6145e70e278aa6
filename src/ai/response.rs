use anyhow::{anyhow, Result};
use reqwest::StatusCode;
use serde::Deserialize;

// ============================================================================
// generateContent response
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

// ============================================================================
// Files API response
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    pub file: UploadedFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub name: String,
    pub uri: String,
    pub mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

pub struct ResponseParser;

impl ResponseParser {
    /// Joins the text parts of the first candidate, trimmed.
    pub fn extract_text(response: GenerateContentResponse) -> Result<String> {
        let text = response
            .candidates
            .and_then(|candidates| candidates.into_iter().next())
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| anyhow!("Gemini returned no text in the response candidates"))?;

        Ok(text.trim().to_string())
    }

    /// Turns a non-success HTTP response into a readable message.
    pub fn describe_http_error(status: StatusCode, body: &str) -> String {
        let detail = serde_json::from_str::<ErrorWrapper>(body)
            .ok()
            .map(|wrapper| {
                let message = wrapper.error.message.unwrap_or_else(|| body.to_string());
                match wrapper.error.status {
                    Some(status_text) if !status_text.is_empty() => {
                        format!("{status_text}: {message}")
                    }
                    _ => message,
                }
            })
            .unwrap_or_else(|| body.trim().to_string());

        if detail.is_empty() {
            format!("Gemini API returned {status}")
        } else {
            format!("Gemini API returned {status}: {detail}")
        }
    }
}
