pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_USER_LABEL: &str = "Raven";
pub const DEFAULT_ASSISTANT_LABEL: &str = "Ayre";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Ayre, an AI companion from Armored Core 6.";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub struct DefaultConfig;

impl DefaultConfig {
    pub fn create_default_config_file() -> String {
        format!(
            r#"[model]
name = "{DEFAULT_MODEL}"
api_base = "{GEMINI_API_BASE}"
# api_key = "..."  (GEMINI_API_KEY in the environment takes precedence)

[session]
chats_dir = "~/.ayre/chats"
system_prompt_file = "~/.ayre/system_prompt.txt"

[web]
timeout_secs = 10.0
max_content_chars = 5000
max_links = 10
user_agent = "{DEFAULT_USER_AGENT}"

[files]
uploads_enabled = false
drop_dir = "~/.ayre/drop"

[output]
use_colors = true
history_limit = 10
offer_links = true

[persona]
user_label = "{DEFAULT_USER_LABEL}"
assistant_label = "{DEFAULT_ASSISTANT_LABEL}"
"#
        )
    }
}
