use anyhow::Context;
use log::{debug, info};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::ai::LanguageModel;
use crate::config::settings::WebConfig;
use crate::session::Message;
use crate::utils::normalize_url;

/// Subtrees that never count as page text or links.
const EXCLUDED_TAGS: [&str; 6] = ["script", "style", "nav", "header", "footer", "aside"];

/// Tried in order; `body` when none match.
const MAIN_SELECTORS: [&str; 7] = [
    "main",
    "article",
    ".content",
    "#content",
    ".post-content",
    ".entry-content",
    ".article-content",
];

const DESCRIPTION_PREVIEW_CHARS: usize = 200;
const LINKS_IN_PROMPT: usize = 5;

#[derive(Debug, Error)]
pub enum WebError {
    #[error("Request timed out")]
    Timeout,
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
    #[error("Parsing error: {0}")]
    Parse(String),
    #[error("Error analyzing web content: {0}")]
    Model(String),
}

impl From<reqwest::Error> for WebError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WebError::Timeout
        } else if let Some(status) = err.status() {
            WebError::Status {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            WebError::Network(err.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub url: String,
    pub text: String,
}

/// What survives of a fetched page; lives only until it is folded into a message.
#[derive(Debug, Clone)]
pub struct ScrapedPage {
    pub url: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub links: Vec<PageLink>,
}

pub struct WebIngestor {
    client: Client,
    model: Arc<dyn LanguageModel>,
    timeout: Duration,
    max_content_chars: usize,
    max_links: usize,
}

impl WebIngestor {
    pub fn new(config: &WebConfig, model: Arc<dyn LanguageModel>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            model,
            timeout: config.timeout()?,
            max_content_chars: config.max_content_chars,
            max_links: config.max_links,
        })
    }

    /// Downloads and extracts a page. Scheme-less URLs are fetched over https.
    pub async fn fetch(&self, raw_url: &str) -> Result<ScrapedPage, WebError> {
        let url = normalize_url(raw_url);
        let parsed = Url::parse(&url).map_err(|e| WebError::Parse(format!("{url}: {e}")))?;
        info!("Fetching content from {parsed}");

        let response = self
            .client
            .get(parsed.clone())
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        let html = response.text().await?;
        debug!("Fetched {} bytes from {parsed}", html.len());

        parse_page(&parsed, &html, self.max_content_chars, self.max_links)
    }

    /// Folds a page into the transcript and asks the model about it.
    ///
    /// The page prompt is appended before the call and stays even if the call
    /// fails; the reply is appended only on success.
    pub async fn analyze_page(
        &self,
        page: &ScrapedPage,
        question: Option<&str>,
        history: &mut Vec<Message>,
    ) -> Result<String, WebError> {
        let prompt = build_prompt(page, question);
        history.push(Message::user(prompt.clone()));

        let reply = self
            .model
            .generate(&prompt)
            .await
            .map_err(|e| WebError::Model(e.to_string()))?;
        history.push(Message::assistant(reply.clone()));
        Ok(reply)
    }
}

/// Extracts title, description, main text and links from an HTML document.
pub fn parse_page(
    url: &Url,
    html: &str,
    max_content_chars: usize,
    max_links: usize,
) -> Result<ScrapedPage, WebError> {
    let document = Html::parse_document(html);

    Ok(ScrapedPage {
        url: url.to_string(),
        title: extract_title(&document)?,
        description: extract_description(&document)?,
        content: extract_main_content(&document, max_content_chars)?,
        links: extract_links(&document, url, max_links)?,
    })
}

fn selector(css: &str) -> Result<Selector, WebError> {
    Selector::parse(css).map_err(|e| WebError::Parse(format!("invalid selector {css}: {e}")))
}

fn first_text(document: &Html, css: &str) -> Result<Option<String>, WebError> {
    Ok(document
        .select(&selector(css)?)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .find(|text| !text.is_empty()))
}

fn first_attr(document: &Html, css: &str, attr: &str) -> Result<Option<String>, WebError> {
    Ok(document
        .select(&selector(css)?)
        .filter_map(|el| el.value().attr(attr))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty()))
}

fn extract_title(document: &Html) -> Result<String, WebError> {
    Ok(first_text(document, "title")?
        .or(first_text(document, "h1")?)
        .unwrap_or_else(|| "No title found".to_string()))
}

fn extract_description(document: &Html) -> Result<String, WebError> {
    if let Some(content) = first_attr(document, r#"meta[name="description"]"#, "content")? {
        return Ok(content);
    }
    if let Some(content) = first_attr(document, r#"meta[property="og:description"]"#, "content")? {
        return Ok(content);
    }
    if let Some(text) = first_text(document, "p")? {
        return Ok(truncate_chars(&text, DESCRIPTION_PREVIEW_CHARS, "..."));
    }
    Ok("No description found".to_string())
}

fn extract_main_content(document: &Html, max_chars: usize) -> Result<String, WebError> {
    let mut root = None;
    for css in MAIN_SELECTORS.iter().copied().chain(std::iter::once("body")) {
        root = document.select(&selector(css)?).find(|el| !is_excluded(*el));
        if root.is_some() {
            break;
        }
    }

    let Some(root) = root else {
        return Ok("No main content found".to_string());
    };

    let mut raw = String::new();
    collect_text(root, &mut raw);
    let text = collapse_whitespace(&raw);

    Ok(truncate_chars(
        &text,
        max_chars,
        "...\n[Content truncated for analysis]",
    ))
}

fn extract_links(document: &Html, base: &Url, max_links: usize) -> Result<Vec<PageLink>, WebError> {
    Ok(document
        .select(&selector("a[href]")?)
        .filter(|el| !is_excluded(*el))
        .take(max_links)
        .filter_map(|el| {
            let href = el.value().attr("href")?.trim();
            let text = collapse_whitespace(&el.text().collect::<String>());
            if href.is_empty() || text.is_empty() {
                return None;
            }
            let url = base.join(href).ok()?;
            Some(PageLink {
                url: url.to_string(),
                text,
            })
        })
        .collect())
}

fn is_excluded(element: ElementRef) -> bool {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .any(|el| EXCLUDED_TAGS.contains(&el.value().name()))
}

fn collect_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if !EXCLUDED_TAGS.contains(&child_element.value().name()) {
                collect_text(child_element, out);
            }
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max_chars: usize, marker: &str) -> String {
    if text.chars().count() > max_chars {
        let kept: String = text.chars().take(max_chars).collect();
        format!("{kept}{marker}")
    } else {
        text.to_string()
    }
}

/// Markdown block describing the page, as handed to the model.
pub fn format_page(page: &ScrapedPage) -> String {
    let mut formatted = format!(
        "🌐 **Web Page Analysis**\n\n\
         **URL:** {}\n\
         **Title:** {}\n\
         **Description:** {}\n\n\
         **Main Content:**\n{}\n",
        page.url, page.title, page.description, page.content
    );

    if !page.links.is_empty() {
        formatted.push_str("\n**Important Links:**\n");
        for (i, link) in page.links.iter().take(LINKS_IN_PROMPT).enumerate() {
            formatted.push_str(&format!("{}. [{}]({})\n", i + 1, link.text, link.url));
        }
    }

    formatted
}

pub fn build_prompt(page: &ScrapedPage, question: Option<&str>) -> String {
    let content = format_page(page);
    match question.map(str::trim).filter(|q| !q.is_empty()) {
        Some(question) => format!(
            "Based on the following web page content, please answer this question: {question}\n\n{content}"
        ),
        None => format!("Please analyze and summarize the following web page content:\n\n{content}"),
    }
}
