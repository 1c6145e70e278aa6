use crate::config::settings::PersonaConfig;
use crate::session::{Message, Role};

/// Flattens a transcript into the single text prompt sent to the model.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    user_label: String,
    assistant_label: String,
}

impl PromptBuilder {
    pub fn new(persona: &PersonaConfig) -> Self {
        Self {
            user_label: persona.user_label.clone(),
            assistant_label: persona.assistant_label.clone(),
        }
    }

    pub fn user_label(&self) -> &str {
        &self.user_label
    }

    /// System lines are emitted bare; other turns carry their speaker prefix.
    /// The prompt ends with the assistant prefix so the model answers in turn.
    pub fn build_chat_prompt(&self, history: &[Message], user_input: &str) -> String {
        let mut prompt = String::new();

        for message in history {
            match message.role {
                Role::System => prompt.push_str(&message.content),
                Role::User => {
                    prompt.push_str(&self.user_label);
                    prompt.push_str(": ");
                    prompt.push_str(&message.content);
                }
                Role::Assistant => {
                    prompt.push_str(&self.assistant_label);
                    prompt.push_str(": ");
                    prompt.push_str(&message.content);
                }
            }
            prompt.push('\n');
        }

        prompt.push_str(&format!(
            "{}: {user_input}\n{}:",
            self.user_label, self.assistant_label
        ));
        prompt
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(&crate::config::Settings::default().persona)
    }
}
