pub mod file;
pub mod web;

pub use file::{FileIngestor, FileKind, IngestError, Ingested};
pub use web::{PageLink, ScrapedPage, WebError, WebIngestor};
