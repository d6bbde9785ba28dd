//! Final prompt presentation

use chrono::{DateTime, Local};
use eyre::Result;
use regex::Regex;
use tracing::{debug, warn};

use crate::wizard::Department;

/// Normalize whitespace and drop code-fence markers
pub fn clean_prompt_text(text: &str) -> Result<String> {
    debug!(text_len = text.len(), "clean_prompt_text: called");
    if text.trim().is_empty() {
        return Ok(String::new());
    }

    let blank_runs = Regex::new(r"\n\s*\n")?;
    let spaces = Regex::new(r" +")?;
    let fences = Regex::new(r"```\w*\n")?;

    let text = blank_runs.replace_all(text, "\n\n");
    let text = spaces.replace_all(&text, " ");
    let text = fences.replace_all(&text, "");
    Ok(text.trim().to_string())
}

/// Markdown document for a completed session
pub fn format_prompt_output(
    final_prompt: &str,
    department: Department,
    original_request: &str,
    generated_at: DateTime<Local>,
) -> String {
    debug!(%department, "format_prompt_output: called");
    let cleaned = clean_prompt_text(final_prompt).unwrap_or_else(|e| {
        warn!(error = %e, "format_prompt_output: cleaning failed, using raw prompt");
        final_prompt.trim().to_string()
    });

    format!(
        "# AI-Generated Prompt\n\n## Department: {}\n\n## Original Request:\n{}\n\n## Generated Prompt:\n{}\n\n---\n*Generated on: {}*",
        department,
        original_request.trim(),
        cleaned,
        generated_at.format("%Y-%m-%dT%H:%M:%S")
    )
}
