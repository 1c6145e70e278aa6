//! In-process fakes shared by the unit tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::ai::{LanguageModel, RemoteFile};
use crate::cli::Terminal;
use crate::utils::LinkOpener;

// ============================================================================
// Model
// ============================================================================

/// Canned model that records what it was asked.
pub(crate) struct FakeModel {
    reply: Option<String>,
    upload_fails: bool,
    prompts: Mutex<Vec<String>>,
    uploads: Mutex<Vec<PathBuf>>,
    instructions: Mutex<Vec<String>>,
}

impl FakeModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            upload_fails: false,
            prompts: Mutex::default(),
            uploads: Mutex::default(),
            instructions: Mutex::default(),
        }
    }

    /// Every generation and analysis fails; uploads still succeed.
    pub fn failing() -> Self {
        Self {
            reply: None,
            ..Self::replying("")
        }
    }

    pub fn failing_upload() -> Self {
        Self {
            upload_fails: true,
            ..Self::replying("unused")
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<PathBuf> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn instructions(&self) -> Vec<String> {
        self.instructions.lock().unwrap().clone()
    }

    fn answer(&self) -> Result<String> {
        self.reply
            .clone()
            .ok_or_else(|| anyhow!("model unavailable"))
    }
}

#[async_trait]
impl LanguageModel for FakeModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer()
    }

    async fn upload_file(&self, path: &Path) -> Result<RemoteFile> {
        if self.upload_fails {
            return Err(anyhow!("upload rejected"));
        }
        self.uploads.lock().unwrap().push(path.to_path_buf());
        Ok(RemoteFile {
            name: "files/fake".to_string(),
            uri: format!("https://files.test/{}", path.display()),
            mime_type: "application/octet-stream".to_string(),
        })
    }

    async fn analyze_file(&self, _file: &RemoteFile, instruction: &str) -> Result<String> {
        self.instructions
            .lock()
            .unwrap()
            .push(instruction.to_string());
        self.answer()
    }
}

// ============================================================================
// HTTP
// ============================================================================

/// Local HTTP server answering every request with the same canned response.
pub(crate) struct HttpStub {
    addr: SocketAddr,
    requests: Arc<tokio::sync::Mutex<Vec<String>>>,
}

impl HttpStub {
    pub async fn json(status: u16, body: &str) -> Self {
        Self::serve(status, "application/json", body).await
    }

    pub async fn html(status: u16, body: &str) -> Self {
        Self::serve(status, "text/html; charset=utf-8", body).await
    }

    /// Accepts connections and never answers.
    pub async fn silent() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        Self {
            addr,
            requests: Arc::default(),
        }
    }

    /// Gemini's resumable upload: the first request gets an
    /// `x-goog-upload-url` pointing back here, later ones get `file_json`.
    pub async fn resumable_upload(file_json: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let start = format!(
            "HTTP/1.1 200 OK\r\nx-goog-upload-url: http://{addr}/up?id=1\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
        );
        let finish = canned_response(200, "application/json", file_json);
        Self::answer(listener, vec![start, finish])
    }

    async fn serve(status: u16, content_type: &str, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        Self::answer(listener, vec![canned_response(status, content_type, body)])
    }

    /// Request `n` gets `responses[n]`; the last one repeats.
    fn answer(listener: TcpListener, responses: Vec<String>) -> Self {
        let addr = listener.local_addr().unwrap();
        let requests: Arc<tokio::sync::Mutex<Vec<String>>> = Arc::default();

        let recorded = requests.clone();
        tokio::spawn(async move {
            let mut served = 0;
            while let Ok((mut socket, _)) = listener.accept().await {
                if let Ok(request) = read_request(&mut socket).await {
                    recorded.lock().await.push(request);
                }
                let response = &responses[served.min(responses.len() - 1)];
                served += 1;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Self { addr, requests }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// First request received, head and body.
    pub async fn request(&self) -> String {
        self.requests().await.into_iter().next().unwrap_or_default()
    }

    pub async fn requests(&self) -> Vec<String> {
        self.requests.lock().await.clone()
    }
}

fn canned_response(status: u16, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status} {}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        if status < 400 { "OK" } else { "Error" },
        body.len()
    )
}

async fn read_request(socket: &mut TcpStream) -> io::Result<String> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let read = socket.read(&mut chunk).await?;
        if read == 0 {
            return Ok(String::from_utf8_lossy(&buffer).into_owned());
        }
        buffer.extend_from_slice(&chunk[..read]);
        if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..head_end]).to_ascii_lowercase();
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buffer.len() < head_end + content_length {
        let read = socket.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
    }

    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

// ============================================================================
// Terminal and browser
// ============================================================================

/// Terminal fed from a fixed list of answers; output is shared with the test.
pub(crate) struct ScriptedTerminal {
    answers: VecDeque<String>,
    output: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTerminal {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            output: Arc::default(),
        }
    }

    pub fn output(&self) -> Arc<Mutex<Vec<String>>> {
        self.output.clone()
    }
}

impl Terminal for ScriptedTerminal {
    fn print(&mut self, text: &str) {
        self.output.lock().unwrap().push(text.to_string());
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.output.lock().unwrap().push(prompt.to_string());
        Ok(self.answers.pop_front())
    }
}

/// Collects opened URLs instead of launching a browser.
#[derive(Clone, Default)]
pub(crate) struct RecordingOpener {
    opened: Arc<Mutex<Vec<String>>>,
}

impl RecordingOpener {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl LinkOpener for RecordingOpener {
    fn open(&mut self, url: &str) -> Result<()> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

/// Joins everything a scripted terminal printed.
pub(crate) fn printed(output: &Arc<Mutex<Vec<String>>>) -> String {
    output.lock().unwrap().join("\n")
}
