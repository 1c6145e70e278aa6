use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// Handle to a file that was uploaded to the model provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub name: String,
    pub uri: String,
    pub mime_type: String,
}

/// The generative model as the rest of the crate sees it: text in, text out,
/// plus the upload-and-analyze round trip used for binary files.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;

    async fn upload_file(&self, path: &Path) -> Result<RemoteFile>;

    async fn analyze_file(&self, file: &RemoteFile, instruction: &str) -> Result<String>;
}
