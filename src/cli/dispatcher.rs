use anyhow::Result;
use console::Color;
use log::{debug, warn};
use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::ai::{ChatDriver, LanguageModel, PromptBuilder};
use crate::cli::help::render_help;
use crate::cli::router::{self, Command};
use crate::cli::{OutputFormatter, Terminal};
use crate::config::Settings;
use crate::gui::{DropAction, DropZone};
use crate::ingest::file::FILE_INSTRUCTION;
use crate::ingest::{FileIngestor, IngestError, Ingested, WebIngestor};
use crate::session::{DeleteOutcome, Message, SessionError, SessionStore};
use crate::utils::{extract_links, LinkOpener};

/// Whether the REPL keeps going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Owns the live transcript and routes each input line to its handler.
///
/// Handlers report problems to the terminal themselves; only failures of the
/// session store come back as `Err`.
pub struct Dispatcher {
    settings: Settings,
    store: SessionStore,
    history: Vec<Message>,
    terminal: Box<dyn Terminal>,
    opener: Box<dyn LinkOpener>,
    driver: ChatDriver,
    files: FileIngestor,
    web: WebIngestor,
    formatter: OutputFormatter,
    drop_zone: Option<DropZone>,
}

impl Dispatcher {
    pub fn new(
        settings: Settings,
        store: SessionStore,
        model: Arc<dyn LanguageModel>,
        terminal: Box<dyn Terminal>,
        opener: Box<dyn LinkOpener>,
    ) -> Result<Self> {
        let driver = ChatDriver::new(model.clone(), PromptBuilder::new(&settings.persona));
        let files = FileIngestor::new(model.clone());
        let web = WebIngestor::new(&settings.web, model)?;
        let formatter = OutputFormatter::new(settings.output.use_colors);

        Ok(Self {
            settings,
            store,
            history: Vec::new(),
            terminal,
            opener,
            driver,
            files,
            web,
            formatter,
            drop_zone: None,
        })
    }

    /// Selects the starting chat: the requested one if it exists, else the
    /// most recently modified.
    pub fn start(&mut self, chat: Option<&str>) -> Result<()> {
        self.history = match chat.map(|name| self.store.load(name)) {
            Some(Ok(history)) => history,
            Some(Err(e)) => {
                self.warning(&format!("{e}; loading the latest chat instead"));
                self.store.load_latest()?
            }
            None => self.store.load_latest()?,
        };

        let name = self.store.current_name().unwrap_or_default().to_string();
        self.info(&format!(
            "Loaded chat: {name} ({} messages)",
            self.visible_messages()
        ));
        Ok(())
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn current_chat(&self) -> Option<&str> {
        self.store.current_name()
    }

    pub fn save(&self) -> Result<(), SessionError> {
        self.store.save(&self.history)
    }

    pub fn read_input(&mut self) -> io::Result<Option<String>> {
        let prompt = format!("{} >", self.driver.prompt_builder().user_label());
        let prompt = self.formatter.format_prompt(&prompt);
        self.terminal.read_line(&prompt)
    }

    pub fn print(&mut self, text: &str) {
        self.terminal.print(text);
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn formatter(&self) -> &OutputFormatter {
        &self.formatter
    }

    /// Processes files queued by the drop zone since the last call.
    pub async fn drain_drop_zone(&mut self) {
        let Some(zone) = &self.drop_zone else {
            return;
        };
        let events = zone.drain();

        for (action, path) in events {
            match action {
                DropAction::Process => self.process_file(&path).await,
            }
        }
    }

    pub async fn dispatch(&mut self, input: &str) -> Result<Flow> {
        let command = router::parse(input, Path::is_file);
        debug!("Dispatching {command:?}");

        match command {
            Command::Empty => {}
            Command::Exit => {
                if let Some(zone) = self.drop_zone.as_mut() {
                    zone.stop();
                }
                return Ok(Flow::Exit);
            }
            Command::Help => {
                let help = render_help(&self.formatter);
                self.terminal.print(&help);
            }
            Command::AnalyzeUrl { url, question } => {
                self.analyze_url(&url, question.as_deref()).await;
            }
            Command::OpenUrl(url) => {
                if self.terminal.confirm("Also analyze the content? (y/N):")? {
                    self.analyze_url(&url, None).await;
                }
                self.open_link(&url);
            }
            Command::OpenUsage => self.error("Usage: open <url>"),
            Command::BareUrl(url) => self.handle_bare_url(&url).await?,
            Command::ListChats => self.list_chats()?,
            Command::NewChat(name) => {
                self.save()?;
                self.history = self.store.create(name.as_deref())?;
                let name = self.store.current_name().unwrap_or_default().to_string();
                self.success(&format!("Created new chat: {name}"));
            }
            Command::LoadChat(None) => self.error("Usage: loadchat <chat_name>"),
            Command::LoadChat(Some(name)) => self.load_chat(&name)?,
            Command::DeleteChat(None) => self.error("Usage: deletechat <chat_name>"),
            Command::DeleteChat(Some(name)) => self.delete_chat(&name)?,
            Command::History(Ok(limit)) => {
                let persona = &self.settings.persona;
                let output = self.formatter.format_history(
                    self.store.current_name().unwrap_or_default(),
                    &self.history,
                    limit.unwrap_or(self.settings.output.history_limit),
                    &persona.user_label,
                    &persona.assistant_label,
                );
                self.terminal.print(&output);
            }
            Command::History(Err(_)) => self.error("Invalid number for history limit"),
            Command::Gui => self.open_drop_zone(),
            Command::Upload(path) => self.upload(&path).await?,
            Command::AnalyzeFile(path) => {
                let spinner = self.terminal.spinner("Analyzing...");
                let result = self.files.analyze(&path, &mut self.history).await;
                drop(spinner);
                self.report_ingest(result);
            }
            Command::Context(path) => {
                let result = self.files.add_context(&path, &mut self.history).await;
                self.report_ingest(result);
            }
            Command::DroppedFile(path) => self.process_file(&path).await,
            Command::Chat(text) => self.chat(&text).await?,
        }

        Ok(Flow::Continue)
    }

    // ========================================================================
    // Chat
    // ========================================================================

    async fn chat(&mut self, text: &str) -> Result<()> {
        let spinner = self.terminal.spinner("Ayre is resonating...");
        let result = self.driver.reply(text, &mut self.history).await;
        drop(spinner);

        match result {
            Ok(reply) => {
                let title = self.settings.persona.assistant_label.clone();
                self.panel(&title, &reply, Color::Magenta);
                if self.settings.output.offer_links {
                    self.offer_links(&reply)?;
                }
            }
            Err(e) => {
                warn!("Chat call failed: {e:#}");
                self.error(&format!("Chat error: {e:#}"));
                self.warning("💡 Try checking your internet connection and API key");
            }
        }
        Ok(())
    }

    fn offer_links(&mut self, reply: &str) -> io::Result<()> {
        let links = extract_links(reply);
        if links.is_empty() {
            return Ok(());
        }

        let mut listing = format!("🔗 Found {} link(s):", links.len());
        for (i, link) in links.iter().enumerate() {
            listing.push_str(&format!("\n{}. {link}", i + 1));
        }
        self.info(&listing);

        if let [link] = links.as_slice() {
            if self.terminal.confirm("Open this link? (y/N):")? {
                self.open_link(link);
            }
            return Ok(());
        }

        let prompt = format!(
            "Open which link? (1-{}, 'all', or Enter to skip):",
            links.len()
        );
        let answer = self.terminal.read_line(&prompt)?.unwrap_or_default();
        let answer = answer.trim();

        if answer.eq_ignore_ascii_case("all") {
            for link in &links {
                self.open_link(link);
            }
        } else if !answer.is_empty() {
            match answer.parse::<usize>() {
                Ok(n) if (1..=links.len()).contains(&n) => self.open_link(&links[n - 1]),
                _ => self.error("Invalid link number"),
            }
        }
        Ok(())
    }

    // ========================================================================
    // Web
    // ========================================================================

    async fn handle_bare_url(&mut self, url: &str) -> io::Result<()> {
        self.info(&format!("🔗 URL detected: {url}"));
        let action = self
            .terminal
            .read_line("Choose action - [O]pen, [A]nalyze, or [B]oth (O/A/B):")?
            .unwrap_or_default();

        match action.trim().to_ascii_lowercase().as_str() {
            "a" => self.analyze_url(url, None).await,
            "b" => {
                self.open_link(url);
                self.analyze_url(url, None).await;
            }
            _ => self.open_link(url),
        }
        Ok(())
    }

    async fn analyze_url(&mut self, url: &str, question: Option<&str>) {
        self.info(&format!("🌐 Fetching content from: {url}"));

        let spinner = self.terminal.spinner("Fetching page...");
        let fetched = self.web.fetch(url).await;
        drop(spinner);

        let page = match fetched {
            Ok(page) => page,
            Err(e) => {
                self.error(&format!("Failed to fetch {url}: {e}"));
                return;
            }
        };

        self.success(&format!(
            "Successfully scraped: {}\nContent length: {} characters",
            page.title,
            page.content.chars().count()
        ));

        let spinner = self.terminal.spinner("Analyzing web content...");
        let result = self.web.analyze_page(&page, question, &mut self.history).await;
        drop(spinner);

        match result {
            Ok(analysis) => self.panel("Web Content Analysis", &analysis, Color::Cyan),
            Err(e) => self.error(&e.to_string()),
        }
    }

    fn open_link(&mut self, url: &str) {
        match self.opener.open(url) {
            Ok(()) => self.success(&format!("Opened: {url}")),
            Err(e) => self.error(&format!("Failed to open link: {e:#}")),
        }
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    fn list_chats(&mut self) -> Result<()> {
        let summaries = self.store.list()?;
        if summaries.is_empty() {
            self.info("No chats found.");
        } else {
            let table = self.formatter.format_chat_list(&summaries);
            self.terminal.print(&table);
        }
        Ok(())
    }

    fn load_chat(&mut self, name: &str) -> Result<()> {
        self.save()?;
        match self.store.load(name) {
            Ok(history) => {
                self.history = history;
                let name = self.store.current_name().unwrap_or_default().to_string();
                self.success(&format!(
                    "Loaded chat: {name} ({} messages)",
                    self.visible_messages()
                ));
            }
            Err(SessionError::NotFound(name)) => self.error(&format!("Chat '{name}' not found")),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    fn delete_chat(&mut self, name: &str) -> Result<()> {
        if !self.store.exists(name) {
            self.error(&format!("Chat '{name}' not found"));
            return Ok(());
        }

        if !self.terminal.confirm(&format!("Delete chat '{name}'? (y/N):"))? {
            self.info("Deletion cancelled.");
            return Ok(());
        }

        match self.store.delete(name)? {
            DeleteOutcome::Deleted => self.success(&format!("Deleted chat: {name}")),
            DeleteOutcome::DeletedCurrent => {
                self.success(&format!("Deleted chat: {name}"));
                self.history = self.store.load_latest()?;
                let current = self.store.current_name().unwrap_or_default().to_string();
                self.info(&format!("Switched to chat: {current}"));
            }
        }
        Ok(())
    }

    fn visible_messages(&self) -> usize {
        self.history.iter().filter(|m| !m.is_system()).count()
    }

    // ========================================================================
    // Files
    // ========================================================================

    fn open_drop_zone(&mut self) {
        if !self.settings.files.uploads_enabled {
            self.error("File upload is disabled.");
            return;
        }
        if self.drop_zone.as_ref().is_some_and(DropZone::is_running) {
            self.warning("Drop zone is already running!");
            return;
        }

        match DropZone::start(self.settings.drop_dir()) {
            Ok(zone) => {
                self.info(&format!(
                    "🖥️ Drop zone open: files placed in {} are processed automatically",
                    zone.dir().display()
                ));
                self.drop_zone = Some(zone);
            }
            Err(e) => self.error(&format!("Failed to start drop zone: {e:#}")),
        }
    }

    async fn upload(&mut self, path: &Path) -> Result<()> {
        let spinner = self.terminal.spinner("Uploading...");
        let uploaded = self.files.upload_only(path).await;
        drop(spinner);

        let remote = match uploaded {
            Ok(remote) => remote,
            Err(e) => {
                self.report_ingest(Err(e));
                return Ok(());
            }
        };
        self.success(&format!("Uploaded: {}", path.display()));

        let instruction = self
            .terminal
            .read_line("What should Ayre do with this file?")?
            .map(|answer| answer.trim().to_string())
            .filter(|answer| !answer.is_empty())
            .unwrap_or_else(|| FILE_INSTRUCTION.to_string());

        let spinner = self.terminal.spinner("Analyzing...");
        let result = self
            .files
            .analyze_remote(
                path,
                &remote,
                &instruction,
                "Uploaded",
                "Ayre - Analysis",
                &mut self.history,
            )
            .await;
        drop(spinner);

        self.report_ingest(result);
        Ok(())
    }

    async fn process_file(&mut self, path: &Path) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.info(&format!("📁 Processing: {name}"));

        let spinner = self.terminal.spinner("Processing...");
        let result = self.files.process_auto(path, &mut self.history).await;
        drop(spinner);

        self.report_ingest(result);
    }

    fn report_ingest(&mut self, result: Result<Ingested, IngestError>) {
        match result {
            Ok(Ingested::Analysis { title, text }) => self.panel(&title, &text, Color::Cyan),
            Ok(Ingested::Context { path, content }) => {
                self.panel(&format!("Context: {}", path.display()), &content, Color::Cyan)
            }
            Err(e) => self.error(&e.to_string()),
        }
    }

    // ========================================================================
    // Output helpers
    // ========================================================================

    fn panel(&mut self, title: &str, body: &str, color: Color) {
        let panel = self.formatter.format_panel(title, body, color);
        self.terminal.print(&panel);
    }

    fn error(&mut self, message: &str) {
        let line = self.formatter.format_error(message);
        self.terminal.print(&line);
    }

    fn success(&mut self, message: &str) {
        let line = self.formatter.format_success(message);
        self.terminal.print(&line);
    }

    fn warning(&mut self, message: &str) {
        let line = self.formatter.format_warning(message);
        self.terminal.print(&line);
    }

    fn info(&mut self, message: &str) {
        let line = self.formatter.format_info(message);
        self.terminal.print(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SystemPrompt;
    use crate::testing::{printed, FakeModel, HttpStub, RecordingOpener, ScriptedTerminal};
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct Harness {
        dispatcher: Dispatcher,
        output: Arc<Mutex<Vec<String>>>,
        opener: RecordingOpener,
        model: Arc<FakeModel>,
        dir: TempDir,
    }

    impl Harness {
        fn printed(&self) -> String {
            printed(&self.output)
        }
    }

    fn harness_with(
        model: FakeModel,
        answers: &[&str],
        tweak: impl FnOnce(&mut Settings),
    ) -> Harness {
        let dir = TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.output.use_colors = false;
        settings.files.drop_dir = dir.path().join("drop").display().to_string();
        tweak(&mut settings);

        let store = SessionStore::new(dir.path().join("chats"), SystemPrompt::builtin()).unwrap();
        let terminal = ScriptedTerminal::new(answers);
        let output = terminal.output();
        let opener = RecordingOpener::default();
        let model = Arc::new(model);

        let mut dispatcher = Dispatcher::new(
            settings,
            store,
            model.clone(),
            Box::new(terminal),
            Box::new(opener.clone()),
        )
        .unwrap();
        dispatcher.start(None).unwrap();

        Harness {
            dispatcher,
            output,
            opener,
            model,
            dir,
        }
    }

    fn harness(answers: &[&str]) -> Harness {
        harness_with(FakeModel::replying("Understood, Raven."), answers, |_| {})
    }

    #[tokio::test]
    async fn first_start_creates_default_chat() {
        let h = harness(&[]);
        assert_eq!(h.dispatcher.current_chat(), Some("default"));
        assert_eq!(h.dispatcher.history().len(), 1);
        assert!(h.dispatcher.history()[0].is_system());
    }

    #[tokio::test]
    async fn exit_and_empty_input() {
        let mut h = harness(&[]);
        assert_eq!(h.dispatcher.dispatch("   ").await.unwrap(), Flow::Continue);
        assert_eq!(h.dispatcher.dispatch("Quit").await.unwrap(), Flow::Exit);
    }

    #[tokio::test]
    async fn chat_appends_turns_and_persists() {
        let mut h = harness(&[]);
        h.dispatcher.dispatch("Hello there").await.unwrap();
        h.dispatcher.save().unwrap();

        assert_eq!(h.dispatcher.history().len(), 3);
        assert!(h.printed().contains("Understood, Raven."));

        let mut store =
            SessionStore::new(h.dir.path().join("chats"), SystemPrompt::builtin()).unwrap();
        assert_eq!(store.load("default").unwrap().len(), 3);
    }

    #[tokio::test]
    async fn chat_failure_keeps_history_and_continues() {
        let mut h = harness_with(FakeModel::failing(), &[], |_| {});
        let flow = h.dispatcher.dispatch("Hello there").await.unwrap();

        assert_eq!(flow, Flow::Continue);
        assert_eq!(h.dispatcher.history().len(), 1);
        assert!(h.printed().contains("Chat error: model unavailable"));
    }

    #[tokio::test]
    async fn single_link_in_reply_is_offered() {
        let mut h = harness_with(
            FakeModel::replying("See https://example.com/docs for more."),
            &["y"],
            |_| {},
        );
        h.dispatcher.dispatch("where?").await.unwrap();

        assert!(h.printed().contains("Open this link? (y/N):"));
        assert_eq!(h.opener.opened(), vec!["https://example.com/docs".to_string()]);
    }

    #[tokio::test]
    async fn multiple_links_can_be_picked_by_number() {
        let mut h = harness_with(
            FakeModel::replying("Try https://a.test/one or https://b.test/two"),
            &["2"],
            |_| {},
        );
        h.dispatcher.dispatch("links?").await.unwrap();

        assert!(h.printed().contains("Open which link? (1-2, 'all', or Enter to skip):"));
        assert_eq!(h.opener.opened(), vec!["https://b.test/two".to_string()]);
    }

    #[tokio::test]
    async fn missing_upload_reports_and_leaves_history() {
        let mut h = harness(&[]);
        let before = h.dispatcher.history().len();

        let flow = h.dispatcher.dispatch("upload missingfile.txt").await.unwrap();

        assert_eq!(flow, Flow::Continue);
        assert_eq!(h.dispatcher.history().len(), before);
        assert!(h.printed().contains("File not found: missingfile.txt"));
        assert!(h.model.uploads().is_empty());
    }

    #[tokio::test]
    async fn upload_asks_for_instruction() {
        let mut h = harness(&["Summarize the findings"]);
        let file = h.dir.path().join("report.pdf");
        std::fs::write(&file, "%PDF").unwrap();

        h.dispatcher
            .dispatch(&format!("upload {}", file.display()))
            .await
            .unwrap();

        assert!(h.printed().contains("What should Ayre do with this file?"));
        assert_eq!(h.model.instructions(), vec!["Summarize the findings".to_string()]);
        let last = &h.dispatcher.history()[1];
        assert_eq!(last.content, format!("Uploaded: {}", file.display()));
    }

    #[tokio::test]
    async fn bare_existing_path_is_processed() {
        let mut h = harness(&[]);
        let file = h.dir.path().join("notes.md");
        std::fs::write(&file, "# Notes").unwrap();

        h.dispatcher
            .dispatch(&format!("\"{}\"", file.display()))
            .await
            .unwrap();

        assert_eq!(
            h.dispatcher.history().last().unwrap().content,
            format!("Code from {}:\n# Notes", file.display())
        );
    }

    #[tokio::test]
    async fn bare_www_url_defaults_to_open() {
        let mut h = harness(&[""]);
        h.dispatcher.dispatch("www.example.com").await.unwrap();

        assert_eq!(h.opener.opened(), vec!["https://www.example.com".to_string()]);
    }

    #[tokio::test]
    async fn open_command_normalizes_url() {
        let mut h = harness(&["n"]);
        h.dispatcher.dispatch("open example.com").await.unwrap();

        assert!(h.printed().contains("Also analyze the content? (y/N):"));
        assert_eq!(h.opener.opened(), vec!["https://example.com".to_string()]);
    }

    #[tokio::test]
    async fn analyze_url_adds_page_and_reply() {
        let stub = HttpStub::html(200, "<title>Coral</title><main>Coral is life.</main>").await;
        let mut h = harness(&[]);

        h.dispatcher
            .dispatch(&format!("analyze {} what is coral?", stub.base_url()))
            .await
            .unwrap();

        let history = h.dispatcher.history();
        assert_eq!(history.len(), 3);
        assert!(history[1].content.starts_with(
            "Based on the following web page content, please answer this question: what is coral?"
        ));
        assert!(h.printed().contains("Successfully scraped: Coral"));
    }

    #[tokio::test]
    async fn web_timeout_leaves_history_unchanged() {
        let stub = HttpStub::silent().await;
        let mut h = harness_with(FakeModel::replying("unused"), &[], |s| {
            s.web.timeout_secs = 0.2;
        });

        let flow = h
            .dispatcher
            .dispatch(&format!("analyze {}", stub.base_url()))
            .await
            .unwrap();

        assert_eq!(flow, Flow::Continue);
        assert_eq!(h.dispatcher.history().len(), 1);
        assert!(h.printed().contains("Request timed out"));
        assert!(h.model.prompts().is_empty());
    }

    #[tokio::test]
    async fn newchat_and_loadchat_switch_transcripts() {
        let mut h = harness(&[]);
        h.dispatcher.dispatch("hello").await.unwrap();

        h.dispatcher.dispatch("newchat Side Quest").await.unwrap();
        assert_eq!(h.dispatcher.current_chat(), Some("Side_Quest"));
        assert_eq!(h.dispatcher.history().len(), 1);

        h.dispatcher.dispatch("loadchat default").await.unwrap();
        assert_eq!(h.dispatcher.current_chat(), Some("default"));
        assert_eq!(h.dispatcher.history().len(), 3);

        h.dispatcher.dispatch("loadchat nowhere").await.unwrap();
        assert!(h.printed().contains("Chat 'nowhere' not found"));
        assert_eq!(h.dispatcher.current_chat(), Some("default"));
    }

    #[tokio::test]
    async fn deleting_current_chat_switches_to_latest() {
        let mut h = harness(&["y"]);
        h.dispatcher.dispatch("newchat other").await.unwrap();
        assert_eq!(h.dispatcher.current_chat(), Some("other"));

        h.dispatcher.dispatch("deletechat other").await.unwrap();

        assert!(h.printed().contains("Delete chat 'other'? (y/N):"));
        assert_eq!(h.dispatcher.current_chat(), Some("default"));
    }

    #[tokio::test]
    async fn declined_delete_keeps_chat() {
        let mut h = harness(&["n"]);
        h.dispatcher.dispatch("newchat keep").await.unwrap();
        h.dispatcher.dispatch("deletechat keep").await.unwrap();

        assert!(h.printed().contains("Deletion cancelled."));
        assert_eq!(h.dispatcher.current_chat(), Some("keep"));
    }

    #[tokio::test]
    async fn invalid_history_limit_is_reported() {
        let mut h = harness(&[]);
        h.dispatcher.dispatch("history abc").await.unwrap();
        assert!(h.printed().contains("Invalid number for history limit"));
    }

    #[tokio::test]
    async fn gui_respects_upload_switch() {
        let mut h = harness(&[]);
        h.dispatcher.dispatch("gui").await.unwrap();
        assert!(h.printed().contains("File upload is disabled."));

        let mut h = harness_with(FakeModel::replying("ok"), &[], |s| {
            s.files.uploads_enabled = true;
        });
        h.dispatcher.dispatch("gui").await.unwrap();
        h.dispatcher.dispatch("gui").await.unwrap();
        assert!(h.printed().contains("Drop zone open"));
        assert!(h.printed().contains("Drop zone is already running!"));
    }

    #[tokio::test]
    async fn dropped_files_reach_the_transcript() {
        let mut h = harness_with(FakeModel::replying("ok"), &[], |s| {
            s.files.uploads_enabled = true;
        });
        h.dispatcher.dispatch("gui").await.unwrap();

        let dropped = h.dir.path().join("drop").join("notes.md");
        std::fs::write(&dropped, "dropped").unwrap();

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while h.dispatcher.history().len() < 2 && std::time::Instant::now() < deadline {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            h.dispatcher.drain_drop_zone().await;
        }

        let history = h.dispatcher.history();
        assert_eq!(history.len(), 2);
        assert_eq!(
            history[1].content,
            format!("Code from {}:\ndropped", dropped.display())
        );
    }

    #[tokio::test]
    async fn zero_history_limit_lists_whole_chat() {
        let mut h = harness(&[]);
        h.dispatcher.dispatch("hello there").await.unwrap();
        h.dispatcher.dispatch("history 0").await.unwrap();

        let printed = h.printed();
        assert!(printed.contains("Raven: hello there"));
        assert!(!printed.contains("Invalid number for history limit"));
    }
}
