use console::{measure_text_width, style, Color};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::session::{Message, Role, SessionSummary};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

pub struct OutputFormatter {
    use_colors: bool,
}

pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();
        let message = message.to_string();

        let handle = thread::spawn(move || {
            let frames = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
            let mut frame_index = 0;
            let mut stderr = io::stderr();

            while running_clone.load(Ordering::Relaxed) {
                let _ = write!(stderr, "\r{} {}", frames[frame_index], message);
                let _ = stderr.flush();
                frame_index = (frame_index + 1) % frames.len();
                thread::sleep(Duration::from_millis(100));
            }

            // Clear the spinner line
            let _ = write!(stderr, "\r{}\r", " ".repeat(message.len() + 3));
            let _ = stderr.flush();
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.halt();
    }
}

impl OutputFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    pub fn format_error(&self, message: &str) -> String {
        format!("{} {}", self.style_text("✗", Color::Red), message)
    }

    pub fn format_success(&self, message: &str) -> String {
        format!("{} {}", self.style_text("✓", Color::Green), message)
    }

    pub fn format_warning(&self, message: &str) -> String {
        format!("{} {}", self.style_text("⚠", Color::Yellow), message)
    }

    pub fn format_info(&self, message: &str) -> String {
        format!("{} {}", self.style_text("ℹ", Color::Cyan), message)
    }

    pub fn format_prompt(&self, message: &str) -> String {
        self.style_text(message, Color::Yellow)
    }

    /// Boxed block with a title in the top border.
    pub fn format_panel(&self, title: &str, body: &str, color: Color) -> String {
        let body_lines: Vec<&str> = if body.is_empty() {
            vec![""]
        } else {
            body.lines().collect()
        };
        let inner_width = body_lines
            .iter()
            .map(|line| measure_text_width(line))
            .chain(std::iter::once(measure_text_width(title) + 2))
            .max()
            .unwrap_or(0);

        let mut output = String::new();
        let title_segment = if title.is_empty() {
            String::new()
        } else {
            format!(" {title} ")
        };
        let top_fill = inner_width + 2 - measure_text_width(&title_segment);
        output.push_str(&self.style_text(
            &format!("╭─{title_segment}{}╮", "─".repeat(top_fill.saturating_sub(1))),
            color,
        ));
        output.push('\n');

        for line in body_lines {
            let padding = inner_width - measure_text_width(line);
            output.push_str(&self.style_text("│", color));
            output.push_str(&format!(" {line}{} ", " ".repeat(padding)));
            output.push_str(&self.style_text("│", color));
            output.push('\n');
        }

        output.push_str(&self.style_text(&format!("╰{}╯", "─".repeat(inner_width + 2)), color));
        output
    }

    /// Column-aligned table with a title line and a header rule.
    pub fn format_table(&self, title: &str, headers: &[&str], rows: &[Vec<String>]) -> String {
        let mut widths: Vec<usize> = headers.iter().map(|h| measure_text_width(h)).collect();
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(measure_text_width(cell));
                }
            }
        }

        let render_row = |cells: Vec<String>| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| {
                    format!("{cell}{}", " ".repeat(width - measure_text_width(cell)))
                })
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut output = String::new();
        output.push_str(&self.style_text(title, Color::Red));
        output.push('\n');
        output.push_str(&self.style_text(
            &render_row(headers.iter().map(|h| h.to_string()).collect()),
            Color::White,
        ));
        output.push('\n');
        let rule_width = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        output.push_str(&"─".repeat(rule_width));

        for row in rows {
            output.push('\n');
            output.push_str(&render_row(row.clone()));
        }

        output
    }

    pub fn format_chat_list(&self, summaries: &[SessionSummary]) -> String {
        let rows: Vec<Vec<String>> = summaries
            .iter()
            .map(|summary| {
                let stamp = |value: Option<chrono::NaiveDateTime>| {
                    value
                        .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
                        .unwrap_or_else(|| "Error".to_string())
                };
                vec![
                    summary.name.clone(),
                    stamp(summary.created),
                    stamp(summary.last_modified),
                    summary
                        .message_count
                        .map(|count| count.to_string())
                        .unwrap_or_else(|| "?".to_string()),
                    if summary.is_current { "●" } else { "" }.to_string(),
                ]
            })
            .collect();

        self.format_table(
            "💬 Available Chats",
            &["Name", "Created", "Last Modified", "Messages", "Current"],
            &rows,
        )
    }

    /// The last `limit` non-system messages of a transcript; 0 shows them all.
    pub fn format_history(
        &self,
        chat_name: &str,
        messages: &[Message],
        limit: usize,
        user_label: &str,
        assistant_label: &str,
    ) -> String {
        let visible: Vec<&Message> = messages.iter().filter(|m| !m.is_system()).collect();
        let start = match limit {
            0 => 0,
            limit => visible.len().saturating_sub(limit),
        };

        let mut output = self.format_panel("", &format!("Chat History: {chat_name}"), Color::Red);
        for message in &visible[start..] {
            output.push('\n');
            match message.role {
                Role::User => {
                    output.push_str(&self.style_text(&format!("{user_label}:"), Color::Green));
                    output.push(' ');
                    output.push_str(&message.content);
                }
                Role::Assistant => {
                    output.push_str(&self.format_panel(
                        assistant_label,
                        &message.content,
                        Color::Magenta,
                    ));
                }
                Role::System => {}
            }
            output.push('\n');
        }
        output
    }

    fn style_text(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            style(text).fg(color).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(true)
    }
}
