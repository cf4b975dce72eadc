//! Prompt templates for Skriv.
//!
//! Templates use `{{name}}` placeholders.

use std::collections::HashMap;

/// Instruction prompt for the hosted summarization model.
pub const DEFAULT_ARTICLE_PROMPT: &str = "Write a detailed, SEO-friendly blog post summarizing the following video transcript:\n{{text}}";

/// Render a prompt template with the given variables.
pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// Render the article prompt, embedding the transcript verbatim.
pub fn article_prompt(template: &str, transcript: &str) -> String {
    let mut vars = HashMap::new();
    vars.insert("text".to_string(), transcript.to_string());
    render(template, &vars)
}
