use anyhow::Result;
use log::debug;
use std::sync::Arc;

use crate::ai::{LanguageModel, PromptBuilder};
use crate::session::Message;

/// Issues one model call per user turn over the whole transcript.
pub struct ChatDriver {
    model: Arc<dyn LanguageModel>,
    prompt_builder: PromptBuilder,
}

impl ChatDriver {
    pub fn new(model: Arc<dyn LanguageModel>, prompt_builder: PromptBuilder) -> Self {
        Self {
            model,
            prompt_builder,
        }
    }

    pub fn prompt_builder(&self) -> &PromptBuilder {
        &self.prompt_builder
    }

    /// Appends the user turn and the reply only once the call succeeded, so a
    /// failed call leaves `history` untouched.
    pub async fn reply(&self, user_input: &str, history: &mut Vec<Message>) -> Result<String> {
        let prompt = self.prompt_builder.build_chat_prompt(history, user_input);
        debug!(
            "Chat prompt built from {} messages ({} chars)",
            history.len(),
            prompt.len()
        );

        let reply = self.model.generate(&prompt).await?;

        history.push(Message::user(user_input));
        history.push(Message::assistant(reply.clone()));
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeModel;

    #[tokio::test]
    async fn successful_reply_appends_both_turns() {
        let model = Arc::new(FakeModel::replying("Hello, Raven."));
        let driver = ChatDriver::new(model.clone(), PromptBuilder::default());
        let mut history = vec![Message::system("sys")];

        let reply = driver.reply("hi", &mut history).await.unwrap();

        assert_eq!(reply, "Hello, Raven.");
        assert_eq!(
            history,
            vec![
                Message::system("sys"),
                Message::user("hi"),
                Message::assistant("Hello, Raven.")
            ]
        );
        assert_eq!(model.prompts(), vec!["sys\nRaven: hi\nAyre:".to_string()]);
    }

    #[tokio::test]
    async fn failed_call_leaves_history_unchanged() {
        let driver = ChatDriver::new(Arc::new(FakeModel::failing()), PromptBuilder::default());
        let mut history = vec![Message::system("sys")];

        assert!(driver.reply("hi", &mut history).await.is_err());
        assert_eq!(history.len(), 1);
    }
}
