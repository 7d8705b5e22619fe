//! Prompt templates for Campus Helper.
//!
//! Prompts can be customized by placing a `rag.toml` file in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("valid placeholder pattern"));

/// Institution named in the default system prompt.
pub const DEFAULT_INSTITUTION: &str = "Aditya University";

/// Variables every prompt can rely on, overridable from config.
pub fn default_variables() -> HashMap<String, String> {
    HashMap::from([("institution".to_string(), DEFAULT_INSTITUTION.to_string())])
}

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for answering questions from retrieved context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub system: String,
    pub user: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: "You are Campus Helper Chatbot of {{institution}}. Answer relevant content from provided context.\n\
structured JSON data is provided for upcoming events. Use it to answer event-related queries.\n\
If the answer is not in the context, respond with 'I don't know'. Be concise. \
Use formal language suitable for students and faculty. \
Semantic search the documents for relevant info."
                .to_string(),

            user: "{{documents}}{{events}}\n\nUser question: {{question}}\n\nAnswer using only the context above."
                .to_string(),
        }
    }
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            rag: RagPrompts::default(),
            variables: default_variables(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables.extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are replaced in a single pass over the template, so
    /// substituted values are never expanded again. Unknown placeholders are
    /// left as they are.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// The system instruction with config variables substituted.
    pub fn system(&self) -> String {
        Self::render(&self.rag.system, &self.variables)
    }
}
