use anyhow::{Context, Result};
use log::debug;
use regex::Regex;
use std::sync::OnceLock;

const URL_PATTERN: &str =
    r"(?i)https?://[-\w.]+(?::\d+)?(?:/[-\w/_.~%]*(?:\?[-\w&=%.]*)?(?:#[-\w]*)?)?";

fn url_regex() -> &'static Regex {
    static URL_REGEX: OnceLock<Regex> = OnceLock::new();
    URL_REGEX.get_or_init(|| Regex::new(URL_PATTERN).expect("URL pattern is valid"))
}

/// Prepends `https://` to anything that does not already carry an http(s) scheme.
pub fn normalize_url(raw: &str) -> String {
    let url = raw.trim();
    if has_http_scheme(url) {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

pub fn has_http_scheme(text: &str) -> bool {
    let lower = text.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// A single token that reads as a link: an http(s) URL or a `www.` host.
pub fn looks_like_url(input: &str) -> bool {
    let input = input.trim();
    if input.is_empty() || input.contains(char::is_whitespace) {
        return false;
    }
    has_http_scheme(input) || input.to_ascii_lowercase().starts_with("www.")
}

/// Every distinct http(s) link in `text`, in order of appearance.
pub fn extract_links(text: &str) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();
    for found in url_regex().find_iter(text) {
        let link = found.as_str().trim_end_matches(['.', ',']).to_string();
        if !links.contains(&link) {
            links.push(link);
        }
    }
    links
}

/// Hands URLs to something that can show them to the user.
pub trait LinkOpener: Send {
    fn open(&mut self, url: &str) -> Result<()>;
}

/// Opens links in the system browser.
#[derive(Debug, Default)]
pub struct BrowserOpener;

impl LinkOpener for BrowserOpener {
    fn open(&mut self, url: &str) -> Result<()> {
        debug!("Opening {url} in browser");
        webbrowser::open(url).with_context(|| format!("Failed to open {url}"))
    }
}
