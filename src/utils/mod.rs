pub mod links;
pub mod paths;

pub use links::{
    extract_links, has_http_scheme, looks_like_url, normalize_url, BrowserOpener, LinkOpener,
};
pub use paths::clean_dropped_path;
