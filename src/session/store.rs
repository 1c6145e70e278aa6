use chrono::{Local, NaiveDateTime};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::defaults::DEFAULT_SYSTEM_PROMPT;
use crate::session::Message;

const SESSION_EXTENSION: &str = "json";
const DEFAULT_SESSION_NAME: &str = "default";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Chat '{0}' not found")]
    NotFound(String),
    #[error("Chat file {} is malformed: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to serialize chat '{name}': {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

impl SessionError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// On-disk shape of one chat transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub name: String,
    pub created: NaiveDateTime,
    pub last_modified: NaiveDateTime,
    pub message_history: Vec<Message>,
}

#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub name: String,
    /// `None` when the file could not be read or parsed.
    pub created: Option<NaiveDateTime>,
    pub last_modified: Option<NaiveDateTime>,
    /// Non-system messages only.
    pub message_count: Option<usize>,
    pub is_current: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The active chat was removed; the caller has to select another one.
    DeletedCurrent,
}

/// Text source for the system prompt seeded into new chats.
#[derive(Debug, Clone)]
pub struct SystemPrompt {
    path: Option<PathBuf>,
}

impl SystemPrompt {
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn builtin() -> Self {
        Self { path: None }
    }

    pub fn load(&self) -> String {
        self.path
            .as_deref()
            .and_then(|path| match fs::read_to_string(path) {
                Ok(content) => Some(content.trim().to_string()),
                Err(e) => {
                    debug!("System prompt {} unavailable: {e}", path.display());
                    None
                }
            })
            .filter(|content| !content.is_empty())
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string())
    }
}

/// Reduces a user-supplied chat name to a filesystem-safe one.
pub fn sanitize_name(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    kept.trim_end().replace(' ', "_")
}

fn timestamp_name() -> String {
    format!("chat_{}", Local::now().format("%Y-%m-%d_%H-%M-%S"))
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// File-per-chat transcript store with a single "current" chat.
pub struct SessionStore {
    chats_dir: PathBuf,
    system_prompt: SystemPrompt,
    current: Option<String>,
}

impl SessionStore {
    pub fn new(
        chats_dir: impl Into<PathBuf>,
        system_prompt: SystemPrompt,
    ) -> Result<Self, SessionError> {
        let chats_dir = chats_dir.into();
        fs::create_dir_all(&chats_dir).map_err(|e| SessionError::io(&chats_dir, e))?;

        Ok(Self {
            chats_dir,
            system_prompt,
            current: None,
        })
    }

    pub fn chats_dir(&self) -> &Path {
        &self.chats_dir
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn exists(&self, name: &str) -> bool {
        let name = sanitize_name(name);
        !name.is_empty() && self.path_for(&name).is_file()
    }

    /// Creates a chat seeded with the system prompt and makes it current.
    pub fn create(&mut self, name: Option<&str>) -> Result<Vec<Message>, SessionError> {
        let requested = name.map(sanitize_name).filter(|n| !n.is_empty());
        let base = requested.unwrap_or_else(timestamp_name);

        let mut name = base.clone();
        let mut counter = 1;
        while self.path_for(&name).exists() {
            name = format!("{base}_{counter}");
            counter += 1;
        }

        let created = now();
        let record = SessionRecord {
            name: name.clone(),
            created,
            last_modified: created,
            message_history: vec![Message::system(self.system_prompt.load())],
        };
        self.write_record(&record)?;

        info!("Created chat '{name}'");
        self.current = Some(name);
        Ok(record.message_history)
    }

    pub fn load(&mut self, name: &str) -> Result<Vec<Message>, SessionError> {
        let name = sanitize_name(name);
        let path = self.path_for(&name);
        if name.is_empty() || !path.is_file() {
            return Err(SessionError::NotFound(name));
        }

        let record = Self::read_record(&path)?;
        debug!(
            "Loaded chat '{name}' with {} messages",
            record.message_history.len()
        );
        self.current = Some(name);
        Ok(record.message_history)
    }

    /// Loads the chat with the newest `last_modified`, creating `default` when
    /// no readable chat exists.
    pub fn load_latest(&mut self) -> Result<Vec<Message>, SessionError> {
        let mut latest: Option<(String, SessionRecord)> = None;

        for path in self.session_files()? {
            let record = match Self::read_record(&path) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping unreadable chat: {e}");
                    continue;
                }
            };
            let is_newer = latest
                .as_ref()
                .map_or(true, |(_, best)| record.last_modified > best.last_modified);
            if is_newer {
                latest = Some((file_stem(&path), record));
            }
        }

        match latest {
            Some((name, record)) => {
                info!("Loaded latest chat '{name}'");
                self.current = Some(name);
                Ok(record.message_history)
            }
            None => self.create(Some(DEFAULT_SESSION_NAME)),
        }
    }

    /// Overwrites the current chat with `messages`. No-op without a current chat.
    pub fn save(&self, messages: &[Message]) -> Result<(), SessionError> {
        let Some(name) = self.current.as_deref() else {
            return Ok(());
        };

        let path = self.path_for(name);
        let created = match Self::read_record(&path) {
            Ok(existing) => existing.created,
            Err(e) => {
                debug!("Rewriting chat '{name}' from scratch: {e}");
                now()
            }
        };

        let record = SessionRecord {
            name: name.to_string(),
            created,
            last_modified: now(),
            message_history: messages.to_vec(),
        };
        self.write_record(&record)
    }

    /// Summaries of every chat, newest first.
    pub fn list(&self) -> Result<Vec<SessionSummary>, SessionError> {
        let mut summaries: Vec<SessionSummary> = self
            .session_files()?
            .into_iter()
            .map(|path| {
                let stem = file_stem(&path);
                let is_current = self.current.as_deref() == Some(stem.as_str());
                match Self::read_record(&path) {
                    Ok(record) => SessionSummary {
                        name: stem,
                        created: Some(record.created),
                        last_modified: Some(record.last_modified),
                        message_count: Some(
                            record
                                .message_history
                                .iter()
                                .filter(|m| !m.is_system())
                                .count(),
                        ),
                        is_current,
                    },
                    Err(e) => {
                        warn!("Listing unreadable chat: {e}");
                        SessionSummary {
                            name: stem,
                            created: None,
                            last_modified: None,
                            message_count: None,
                            is_current,
                        }
                    }
                }
            })
            .collect();

        summaries.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(summaries)
    }

    /// Removes a chat. Confirmation is the caller's job.
    pub fn delete(&mut self, name: &str) -> Result<DeleteOutcome, SessionError> {
        let name = sanitize_name(name);
        let path = self.path_for(&name);
        if name.is_empty() || !path.is_file() {
            return Err(SessionError::NotFound(name));
        }

        fs::remove_file(&path).map_err(|e| SessionError::io(&path, e))?;
        info!("Deleted chat '{name}'");

        if self.current.as_deref() == Some(name.as_str()) {
            self.current = None;
            Ok(DeleteOutcome::DeletedCurrent)
        } else {
            Ok(DeleteOutcome::Deleted)
        }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.chats_dir.join(format!("{name}.{SESSION_EXTENSION}"))
    }

    fn session_files(&self) -> Result<Vec<PathBuf>, SessionError> {
        let entries =
            fs::read_dir(&self.chats_dir).map_err(|e| SessionError::io(&self.chats_dir, e))?;

        Ok(entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|ext| ext.to_str()) == Some(SESSION_EXTENSION)
            })
            .collect())
    }

    fn read_record(path: &Path) -> Result<SessionRecord, SessionError> {
        let content = fs::read_to_string(path).map_err(|e| SessionError::io(path, e))?;
        serde_json::from_str(&content).map_err(|source| SessionError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_record(&self, record: &SessionRecord) -> Result<(), SessionError> {
        let path = self.path_for(&record.name);
        let tmp_path = path.with_extension("json.tmp");
        let content =
            serde_json::to_string_pretty(record).map_err(|source| SessionError::Serialize {
                name: record.name.clone(),
                source,
            })?;

        // Write then rename so a crash never leaves a half-written transcript
        fs::write(&tmp_path, content).map_err(|e| SessionError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &path).map_err(|e| SessionError::io(&path, e))?;
        Ok(())
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
