//! Prompt construction for classification and summarization.
//!
//! Known categories get a dedicated layout (repos, notes, values, conversation
//! snippets); anything else is rendered as pretty-printed JSON per entry. Long
//! fields are truncated on char boundaries.

use serde_json::Value;

use super::LlmError;
use crate::classifier::COMPREHENSIVE;
use crate::memory::types::ContextEntry;

const MAX_FILES_PER_REPO: usize = 5;
const FILE_PREVIEW_CHARS: usize = 500;
const NOTE_PREVIEW_CHARS: usize = 1000;
const SNIPPET_CHARS: usize = 500;

/// Prompt asking the model to pick one of `categories` (or `comprehensive`).
pub fn classification_prompt(query: &str, categories: &[String]) -> String {
    format!(
        "Classify the user query into exactly one of these context categories: {}.\n\
         Reply with the category name only. If the query spans several categories \
         or none fits, reply \"{COMPREHENSIVE}\".\n\n\
         Query: {query}",
        categories.join(", ")
    )
}

/// Normalize a classification reply and check it names a known category.
pub fn parse_classification(reply: &str, categories: &[String]) -> Result<String, LlmError> {
    let first_line = reply.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let name = first_line
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '.' || c == '*')
        .trim()
        .to_lowercase();

    if name == COMPREHENSIVE || categories.iter().any(|c| c.eq_ignore_ascii_case(&name)) {
        Ok(name)
    } else {
        Err(LlmError::UnexpectedReply(first_line.trim().to_string()))
    }
}

/// Full summarization prompt for one category's entries.
pub fn summary_prompt(category: &str, entries: &[ContextEntry], query: &str) -> String {
    format!(
        "{}\n\n\
         USER QUERY: {query}\n\n\
         AVAILABLE CONTEXT INFORMATION:\n{}\n\
         Based only on the context information provided above, answer the user query concisely. \
         Focus on extracting directly relevant facts or summaries. If the context doesn't contain \
         the answer, state that explicitly.",
        system_prompt(category),
        format_context(category, entries),
    )
}

fn system_prompt(category: &str) -> String {
    match category {
        "github" => "You are analyzing the user's GitHub repositories and code.".into(),
        "notes" => "You are analyzing the user's personal notes and documents.".into(),
        "values" => "You are analyzing the user's stated personal values and preferences.".into(),
        "conversations" => "You are analyzing the user's past conversation history.".into(),
        other => format!("You are analyzing the user's {other} context."),
    }
}

/// Render entries in the layout for `category`.
pub fn format_context(category: &str, entries: &[ContextEntry]) -> String {
    match category {
        "github" => format_github(entries),
        "notes" => format_notes(entries),
        "values" => format_values(entries),
        "conversations" => format_conversations(entries),
        _ => format_generic(category, entries),
    }
}

fn format_github(entries: &[ContextEntry]) -> String {
    let mut out = String::from("GITHUB REPOSITORIES:\n\n");
    for repo in entries.iter().flat_map(|e| items(&e.content, "repos")) {
        out.push_str(&format!("Repo: {}\n", text(repo, "name").unwrap_or_else(|| "N/A".into())));
        if let Some(desc) = text(repo, "description") {
            out.push_str(&format!("Description: {desc}\n"));
        }
        if let Some(Value::Array(files)) = repo.get("files") {
            out.push_str("Files:\n");
            for file in files.iter().take(MAX_FILES_PER_REPO) {
                let path = text(file, "path").unwrap_or_else(|| "N/A".into());
                out.push_str(&format!("  - Path: {path}\n"));
                if let Some(body) = text(file, "content") {
                    out.push_str(&format!(
                        "    Content Preview: {}\n",
                        truncate(&body, FILE_PREVIEW_CHARS)
                    ));
                }
            }
        }
        out.push('\n');
    }
    out
}

fn format_notes(entries: &[ContextEntry]) -> String {
    let mut out = String::from("PERSONAL NOTES:\n\n");
    for entry in entries {
        for note in items(&entry.content, "notes") {
            let title = text(note, "title").unwrap_or_else(|| entry.source_key.clone());
            let timestamp = text(note, "timestamp").unwrap_or_else(|| entry.updated_at.clone());
            let body = text(note, "content").unwrap_or_default();
            out.push_str(&format!(
                "Note Title: {title}\nTimestamp: {timestamp}\nContent: {}\n\n",
                truncate(&body, NOTE_PREVIEW_CHARS)
            ));
        }
    }
    out
}

fn format_values(entries: &[ContextEntry]) -> String {
    let mut out = String::from("PERSONAL VALUES & PREFERENCES:\n\n");
    for value in entries.iter().flat_map(|e| items(&e.content, "values")) {
        out.push_str(&format!(
            "- {}: {} (Source: {})\n",
            text(value, "key").unwrap_or_else(|| "N/A".into()),
            text(value, "value").unwrap_or_else(|| "N/A".into()),
            text(value, "source").unwrap_or_else(|| "N/A".into()),
        ));
    }
    out
}

fn format_conversations(entries: &[ContextEntry]) -> String {
    let mut out = String::from("CONVERSATION HISTORY SNIPPETS:\n\n");
    for snippet in entries.iter().flat_map(|e| items(&e.content, "messages")) {
        out.push_str(&format!(
            "[{}] {}: {}\n",
            text(snippet, "timestamp").unwrap_or_else(|| "N/A".into()),
            text(snippet, "speaker").unwrap_or_else(|| "N/A".into()),
            truncate(&text(snippet, "text").unwrap_or_default(), SNIPPET_CHARS),
        ));
    }
    out
}

fn format_generic(category: &str, entries: &[ContextEntry]) -> String {
    let mut out = format!("{} CONTEXT:\n\n", category.to_uppercase());
    for entry in entries {
        let body = serde_json::to_string_pretty(&entry.content).unwrap_or_else(|_| entry.content.to_string());
        out.push_str(&format!(
            "--- Entry {} ({}, updated {}) ---\n{body}\n",
            entry.id, entry.source_key, entry.updated_at
        ));
    }
    out
}

/// The array under `key` if present, else the content itself as a single item.
fn items<'a>(content: &'a Value, key: &str) -> Vec<&'a Value> {
    match content.get(key) {
        Some(Value::Array(list)) => list.iter().collect(),
        _ => vec![content],
    }
}

fn text(value: &Value, key: &str) -> Option<String> {
    match value.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

/// Truncate to `max` chars, marking the cut with `...`.
pub fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
