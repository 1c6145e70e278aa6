use anyhow::{Context, Result};
use log::{debug, info, warn};
use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::time::Duration;

/// Waits this long for writes to settle before a file is reported.
const DEBOUNCE: Duration = Duration::from_millis(500);
const QUEUE_CAPACITY: usize = 32;

/// What the main loop should do with a dropped file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropAction {
    Process,
}

pub type DropEvent = (DropAction, PathBuf);

/// Watches a folder and queues files that appear in it.
///
/// Only files created or moved in after the zone starts are reported. Events
/// wait in a bounded queue until the main loop drains them.
pub struct DropZone {
    dir: PathBuf,
    debouncer: Option<Debouncer<RecommendedWatcher, RecommendedCache>>,
    receiver: Receiver<DropEvent>,
}

impl DropZone {
    pub fn start(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_debounce(dir, DEBOUNCE)
    }

    pub fn with_debounce(dir: impl Into<PathBuf>, debounce: Duration) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create drop folder {}", dir.display()))?;

        let (sender, receiver) = mpsc::sync_channel(QUEUE_CAPACITY);
        let mut queue = DropQueue::new(dir.clone(), sender);

        let mut debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    for event in events {
                        queue.handle(&event.kind, &event.paths);
                    }
                }
                Err(errors) => {
                    for error in errors {
                        warn!("Drop zone watcher error: {error}");
                    }
                }
            }
        })
        .context("Failed to create drop zone watcher")?;

        debouncer
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch drop folder {}", dir.display()))?;

        info!("Drop zone watching {}", dir.display());
        Ok(Self {
            dir,
            debouncer: Some(debouncer),
            receiver,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_running(&self) -> bool {
        self.debouncer.is_some()
    }

    /// Everything queued since the last call, without blocking.
    pub fn drain(&self) -> Vec<DropEvent> {
        self.receiver.try_iter().collect()
    }

    pub fn stop(&mut self) {
        if self.debouncer.take().is_some() {
            info!("Drop zone closed");
        }
    }
}

/// Turns debounced watcher events into queue entries, once per file.
struct DropQueue {
    dir: PathBuf,
    queued: HashSet<PathBuf>,
    sender: SyncSender<DropEvent>,
}

impl DropQueue {
    fn new(dir: PathBuf, sender: SyncSender<DropEvent>) -> Self {
        Self {
            dir,
            queued: HashSet::new(),
            sender,
        }
    }

    fn handle(&mut self, kind: &EventKind, paths: &[PathBuf]) {
        match kind {
            EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                for path in paths {
                    self.offer(path);
                }
            }
            // Both carries [from, to]
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                if let Some(to) = paths.last() {
                    self.offer(to);
                }
            }
            // Removed files may be dropped again later
            EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                for path in paths {
                    self.queued.remove(path);
                }
            }
            _ => {}
        }
    }

    fn offer(&mut self, path: &Path) {
        if path.parent() != Some(self.dir.as_path()) || !path.is_file() {
            return;
        }
        if self.queued.contains(path) {
            return;
        }

        match self.sender.try_send((DropAction::Process, path.to_path_buf())) {
            Ok(()) => {
                debug!("Queued dropped file {}", path.display());
                self.queued.insert(path.to_path_buf());
            }
            Err(TrySendError::Full(_)) => {
                warn!("Drop queue full, skipping {}", path.display());
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}
