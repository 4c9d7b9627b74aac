//! OpenAI chat completions for answers and image captions.

use super::{sniff_image_mime, Captioner, ChatMessage, ChatRole, Completer};
use crate::config::{CompletionSettings, Prompts};
use crate::error::{QaError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::types::{
    ChatCompletionRequestMessage,
    ChatCompletionRequestMessageContentPartImage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
    ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageUrl,
};
use async_trait::async_trait;
use base64::Engine;
use std::time::Duration;
use tracing::{debug, instrument};

/// OpenAI chat client used both for answering and for captioning images.
pub struct OpenAIChat {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    max_tokens: u32,
    temperature: f32,
    caption_max_tokens: u32,
    caption_prompt: String,
}

impl OpenAIChat {
    /// Create a chat client from completion settings and the caption prompt.
    pub fn new(settings: &CompletionSettings, prompts: &Prompts) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(Duration::from_secs(settings.timeout_secs))?,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            caption_max_tokens: settings.caption_max_tokens,
            caption_prompt: prompts.caption.system.clone(),
        })
    }

    async fn create(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
        max_tokens: u32,
    ) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_completion_tokens(max_tokens)
            .temperature(self.temperature)
            .build()
            .map_err(|e| QaError::CompletionProvider(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            QaError::CompletionProvider(format!("Failed to generate response: {}", e))
        })?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| QaError::CompletionProvider("Empty response from LLM".to_string()))?;

        Ok(content.trim().to_string())
    }
}

fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let built: ChatCompletionRequestMessage = match message.role {
        ChatRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(|e| QaError::CompletionProvider(e.to_string()))?
            .into(),
        ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(|e| QaError::CompletionProvider(e.to_string()))?
            .into(),
    };
    Ok(built)
}

#[async_trait]
impl Completer for OpenAIChat {
    #[instrument(skip(self, messages), fields(model = %self.model, count = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request_messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let answer = self.create(request_messages, self.max_tokens).await?;
        debug!("Generated answer of {} chars", answer.len());
        Ok(answer)
    }
}

#[async_trait]
impl Captioner for OpenAIChat {
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    async fn caption(&self, image: &[u8]) -> Result<String> {
        let data_uri = format!(
            "data:{};base64,{}",
            sniff_image_mime(image),
            base64::engine::general_purpose::STANDARD.encode(image)
        );

        let image_part = ChatCompletionRequestUserMessageContentPart::ImageUrl(
            ChatCompletionRequestMessageContentPartImage {
                image_url: ImageUrl {
                    url: data_uri,
                    detail: None,
                },
            },
        );

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.caption_prompt.clone())
                .build()
                .map_err(|e| QaError::CompletionProvider(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Array(vec![image_part]))
                .build()
                .map_err(|e| QaError::CompletionProvider(e.to_string()))?
                .into(),
        ];

        let caption = self.create(messages, self.caption_max_tokens).await?;
        debug!("Image caption: {}", caption);
        Ok(caption)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_creation_from_settings() {
        let settings = CompletionSettings::default();
        let chat = OpenAIChat::new(&settings, &Prompts::default()).unwrap();
        assert_eq!(chat.model, "gpt-4o");
        assert_eq!(chat.max_tokens, 500);
        assert_eq!(chat.caption_max_tokens, 100);
    }

    #[test]
    fn test_message_conversion() {
        let converted = to_request_message(&ChatMessage::system("rules")).unwrap();
        assert!(matches!(converted, ChatCompletionRequestMessage::System(_)));

        let converted = to_request_message(&ChatMessage::user("question")).unwrap();
        assert!(matches!(converted, ChatCompletionRequestMessage::User(_)));
    }
}
