use log::{debug, info};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::ai::{LanguageModel, RemoteFile};
use crate::session::Message;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

const TEXT_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "html", "css", "txt", "md", "rs", "go", "c", "cpp", "h", "java", "json",
    "xml", "csv", "yaml", "yml", "toml", "sh",
];

pub const IMAGE_INSTRUCTION: &str = "Analyze this image in detail";
pub const FILE_INSTRUCTION: &str = "Analyze this file";
pub const DETAIL_INSTRUCTION: &str = "Analyze this in detail";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Error reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Upload failed: {0}")]
    Upload(String),
    #[error("Analysis failed: {0}")]
    Analysis(String),
}

/// How a file is brought into the conversation, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Text,
    Binary,
}

impl FileKind {
    pub fn classify(path: &Path) -> Self {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            FileKind::Image
        } else if TEXT_EXTENSIONS.contains(&extension.as_str()) {
            FileKind::Text
        } else {
            FileKind::Binary
        }
    }
}

/// Result of a successful ingestion, for the caller to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ingested {
    /// The model's analysis of an uploaded file.
    Analysis { title: String, text: String },
    /// File contents placed verbatim into the transcript.
    Context { path: PathBuf, content: String },
}

pub struct FileIngestor {
    model: Arc<dyn LanguageModel>,
}

impl FileIngestor {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Images and unknown files are uploaded and analyzed; text is inlined.
    pub async fn process_auto(
        &self,
        path: &Path,
        history: &mut Vec<Message>,
    ) -> Result<Ingested, IngestError> {
        let kind = FileKind::classify(path);
        debug!("Processing {} as {kind:?}", path.display());

        match kind {
            FileKind::Image => {
                let title = "Ayre - Image Analysis";
                self.upload_and_analyze(path, IMAGE_INSTRUCTION, "Image", title, history)
                    .await
            }
            FileKind::Text => self.add_context(path, history).await,
            FileKind::Binary => {
                let title = "Ayre - File Analysis";
                self.upload_and_analyze(path, FILE_INSTRUCTION, "File", title, history)
                    .await
            }
        }
    }

    pub async fn analyze(
        &self,
        path: &Path,
        history: &mut Vec<Message>,
    ) -> Result<Ingested, IngestError> {
        self.upload_and_analyze(path, DETAIL_INSTRUCTION, "Analyzed", "Ayre - Analysis", history)
            .await
    }

    /// Reads a text file and appends it as a user message.
    pub async fn add_context(
        &self,
        path: &Path,
        history: &mut Vec<Message>,
    ) -> Result<Ingested, IngestError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| match source.kind() {
                io::ErrorKind::NotFound => IngestError::NotFound(path.to_path_buf()),
                _ => IngestError::Read {
                    path: path.to_path_buf(),
                    source,
                },
            })?;

        history.push(Message::user(format!(
            "Code from {}:\n{content}",
            path.display()
        )));
        info!("Added {} ({} chars) to context", path.display(), content.len());

        Ok(Ingested::Context {
            path: path.to_path_buf(),
            content,
        })
    }

    /// Checks the path up front so the model is never asked about a missing file.
    pub fn ensure_exists(path: &Path) -> Result<(), IngestError> {
        if path.is_file() {
            Ok(())
        } else {
            Err(IngestError::NotFound(path.to_path_buf()))
        }
    }

    pub async fn upload_only(&self, path: &Path) -> Result<RemoteFile, IngestError> {
        Self::ensure_exists(path)?;
        self.model
            .upload_file(path)
            .await
            .map_err(|e| IngestError::Upload(format!("{e:#}")))
    }

    /// Runs an instruction against an uploaded file and records the exchange
    /// as `"{label}: {path}"` plus the analysis. Nothing is recorded on failure.
    pub async fn analyze_remote(
        &self,
        path: &Path,
        file: &RemoteFile,
        instruction: &str,
        label: &str,
        title: &str,
        history: &mut Vec<Message>,
    ) -> Result<Ingested, IngestError> {
        let text = self
            .model
            .analyze_file(file, instruction)
            .await
            .map_err(|e| IngestError::Analysis(format!("{e:#}")))?;

        history.push(Message::user(format!("{label}: {}", path.display())));
        history.push(Message::assistant(text.clone()));

        Ok(Ingested::Analysis {
            title: title.to_string(),
            text,
        })
    }

    async fn upload_and_analyze(
        &self,
        path: &Path,
        instruction: &str,
        label: &str,
        title: &str,
        history: &mut Vec<Message>,
    ) -> Result<Ingested, IngestError> {
        let file = self.upload_only(path).await?;
        self.analyze_remote(path, &file, instruction, label, title, history)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeModel;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn classifies_by_extension_case_insensitively() {
        assert_eq!(FileKind::classify(Path::new("a/photo.JPG")), FileKind::Image);
        assert_eq!(FileKind::classify(Path::new("x.webp")), FileKind::Image);
        assert_eq!(FileKind::classify(Path::new("main.rs")), FileKind::Text);
        assert_eq!(FileKind::classify(Path::new("notes.md")), FileKind::Text);
        assert_eq!(FileKind::classify(Path::new("report.pdf")), FileKind::Binary);
        assert_eq!(FileKind::classify(Path::new("Makefile")), FileKind::Binary);
    }

    #[tokio::test]
    async fn text_files_are_inlined_without_model_calls() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "hello.py", "print('hi')\n");
        let model = Arc::new(FakeModel::replying("unused"));
        let ingestor = FileIngestor::new(model.clone());
        let mut history = Vec::new();

        let result = ingestor.process_auto(&path, &mut history).await.unwrap();

        assert!(matches!(result, Ingested::Context { .. }));
        assert_eq!(
            history,
            vec![Message::user(format!(
                "Code from {}:\nprint('hi')\n",
                path.display()
            ))]
        );
        assert!(model.uploads().is_empty());
    }

    #[tokio::test]
    async fn images_are_uploaded_and_analyzed() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "shot.png", "not really a png");
        let model = Arc::new(FakeModel::replying("A red mech."));
        let ingestor = FileIngestor::new(model.clone());
        let mut history = Vec::new();

        let result = ingestor.process_auto(&path, &mut history).await.unwrap();

        assert_eq!(
            result,
            Ingested::Analysis {
                title: "Ayre - Image Analysis".to_string(),
                text: "A red mech.".to_string()
            }
        );
        assert_eq!(history[0], Message::user(format!("Image: {}", path.display())));
        assert_eq!(history[1], Message::assistant("A red mech."));
        assert_eq!(model.instructions(), vec![IMAGE_INSTRUCTION.to_string()]);
    }

    #[tokio::test]
    async fn other_files_use_generic_instruction() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "data.bin", "\u{0}\u{1}");
        let model = Arc::new(FakeModel::replying("Binary blob."));
        let ingestor = FileIngestor::new(model.clone());
        let mut history = Vec::new();

        ingestor.process_auto(&path, &mut history).await.unwrap();

        assert_eq!(history[0].content, format!("File: {}", path.display()));
        assert_eq!(model.instructions(), vec![FILE_INSTRUCTION.to_string()]);
    }

    #[tokio::test]
    async fn upload_and_analyze_commands_label_history() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "manual.pdf", "%PDF");
        let model = Arc::new(FakeModel::replying("Done."));
        let ingestor = FileIngestor::new(model.clone());
        let mut history = Vec::new();

        let remote = ingestor.upload_only(&path).await.unwrap();
        ingestor
            .analyze_remote(&path, &remote, "Summarize it", "Uploaded", "t", &mut history)
            .await
            .unwrap();
        ingestor.analyze(&path, &mut history).await.unwrap();

        assert_eq!(history.len(), 4);
        assert_eq!(history[0].content, format!("Uploaded: {}", path.display()));
        assert_eq!(history[2].content, format!("Analyzed: {}", path.display()));
        assert_eq!(
            model.instructions(),
            vec!["Summarize it".to_string(), DETAIL_INSTRUCTION.to_string()]
        );
    }

    #[tokio::test]
    async fn missing_file_leaves_history_unchanged() {
        let model = Arc::new(FakeModel::replying("unused"));
        let ingestor = FileIngestor::new(model.clone());
        let mut history = vec![Message::system("sys")];

        let err = ingestor
            .analyze(Path::new("missingfile.txt"), &mut history)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::NotFound(_)));

        let err = ingestor
            .add_context(Path::new("missingfile.txt"), &mut history)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::NotFound(_)));

        assert_eq!(history.len(), 1);
        assert!(model.uploads().is_empty());
    }

    #[tokio::test]
    async fn failed_upload_or_analysis_appends_nothing() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "pic.gif", "GIF89a");
        let mut history = Vec::new();

        let uploads_fail = FileIngestor::new(Arc::new(FakeModel::failing_upload()));
        let err = uploads_fail
            .process_auto(&path, &mut history)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Upload(_)));

        let analysis_fails = FileIngestor::new(Arc::new(FakeModel::failing()));
        let err = analysis_fails
            .process_auto(&path, &mut history)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Analysis(_)));

        assert!(history.is_empty());
    }
}
