use std::path::{Path, PathBuf};

use crate::utils::{clean_dropped_path, has_http_scheme, looks_like_url, normalize_url};

/// One line of user input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Empty,
    Exit,
    Help,
    /// Fetch a page and ask the model about it.
    AnalyzeUrl {
        url: String,
        question: Option<String>,
    },
    OpenUrl(String),
    /// `open` with nothing after it.
    OpenUsage,
    /// A lone URL; the user picks open, analyze or both.
    BareUrl(String),
    ListChats,
    NewChat(Option<String>),
    LoadChat(Option<String>),
    DeleteChat(Option<String>),
    /// Limit if given; `Err` carries an unparsable one.
    History(Result<Option<usize>, String>),
    Gui,
    Upload(PathBuf),
    AnalyzeFile(PathBuf),
    Context(PathBuf),
    /// A path to an existing file, typed or dropped onto the terminal.
    DroppedFile(PathBuf),
    Chat(String),
}

/// Classifies a line. The first matching rule wins; command words are
/// case-insensitive. `is_file` decides whether a bare line names a file.
pub fn parse(input: &str, is_file: impl Fn(&Path) -> bool) -> Command {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Command::Empty;
    }

    let (word, rest) = split_word(trimmed);
    let word = word.to_ascii_lowercase();
    let argument = (!rest.is_empty()).then(|| rest.to_string());

    match word.as_str() {
        "exit" | "quit" if rest.is_empty() => return Command::Exit,
        "help" if rest.is_empty() => return Command::Help,
        "analyze" if has_http_scheme(rest) => {
            let (url, question) = split_word(rest);
            return Command::AnalyzeUrl {
                url: url.to_string(),
                question: (!question.is_empty()).then(|| question.to_string()),
            };
        }
        "open" => {
            return if rest.is_empty() {
                Command::OpenUsage
            } else {
                Command::OpenUrl(normalize_url(rest))
            };
        }
        _ => {}
    }

    if looks_like_url(trimmed) {
        return Command::BareUrl(normalize_url(trimmed));
    }

    match word.as_str() {
        "chats" if rest.is_empty() => return Command::ListChats,
        "newchat" => return Command::NewChat(argument),
        "loadchat" => return Command::LoadChat(argument),
        "deletechat" => return Command::DeleteChat(argument),
        "history" => {
            let (limit, _) = split_word(rest);
            return Command::History(if limit.is_empty() {
                Ok(None)
            } else {
                limit.parse().map(Some).map_err(|_| limit.to_string())
            });
        }
        "gui" if rest.is_empty() => return Command::Gui,
        "upload" if !rest.is_empty() => return Command::Upload(clean_dropped_path(rest)),
        "analyze" if !rest.is_empty() => return Command::AnalyzeFile(clean_dropped_path(rest)),
        "context" if !rest.is_empty() => return Command::Context(clean_dropped_path(rest)),
        _ => {}
    }

    let candidate = clean_dropped_path(trimmed);
    if !candidate.as_os_str().is_empty() && is_file(&candidate) {
        return Command::DroppedFile(candidate);
    }

    Command::Chat(trimmed.to_string())
}

fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim();
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    }
}
