//! Prompt templates for the course assistant.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Marker line placed above fragments that reply to the top-ranked fragment.
pub const PRIMARY_CONTEXT_MARKER: &str = "[[[ PRIMARY CONTEXT DOCUMENT ]]]";

/// Literal answer returned when retrieval finds nothing to answer from.
pub const FALLBACK_ANSWER: &str =
    "The answer is not available in the provided course or forum content.";

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub answer: AnswerPrompts,
    pub caption: CaptionPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for answer synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerPrompts {
    pub system: String,
    pub user: String,
}

impl Default for AnswerPrompts {
    fn default() -> Self {
        Self {
            system: format!(
                r#"You are a virtual teaching assistant for the "Tools in Data Science" course.

Rules:
1. An image supplied by the student is the most authoritative source.
2. Context chunks marked with {marker} are the next most authoritative source.
3. Quote numbers, scores and phrases exactly as they appear in the context.
4. Keep the answer short: 3-6 sentences of markdown.
5. Never guess. If the context does not answer the question, reply:
   '{fallback}'
6. Cite sources: use 'source_url' for course material, and both 'topic_url' and 'post_url' for forum posts."#,
                marker = PRIMARY_CONTEXT_MARKER,
                fallback = FALLBACK_ANSWER,
            ),

            user: "{{context}}\n\nQuestion: {{question}}\n\n{{caption}}".to_string(),
        }
    }
}

/// Prompts for describing an attached image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionPrompts {
    pub system: String,
}

impl Default for CaptionPrompts {
    fn default() -> Self {
        Self {
            system: r#"You describe images for a retrieval system that answers questions about the "Tools in Data Science" course.

Students attach screenshots of exam questions, assignment instructions, code output, error messages, browser windows or forum replies.

Write a short, literal caption of what the image shows: visible text, structure, diagrams and questions. Do not speculate. The caption is embedded together with the student's question to find relevant course material."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let answer_path = custom_path.join("answer.toml");
            if answer_path.exists() {
                let content = std::fs::read_to_string(&answer_path)?;
                prompts.answer = toml::from_str(&content)?;
            }

            let caption_path = custom_path.join("caption.toml");
            if caption_path.exists() {
                let content = std::fs::read_to_string(&caption_path)?;
                prompts.caption = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are resolved in one pass over the template, so substituted
    /// values are never themselves expanded. Unknown placeholders are left as is.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                rest = &rest[start..];
                break;
            };

            let name = &after[..end];
            match vars.get(name) {
                Some(value) => result.push_str(value),
                None => result.push_str(&rest[start..start + 2 + end + 2]),
            }
            rest = &after[end + 2..];
        }

        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
