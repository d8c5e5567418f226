//! Output formatting for chats and transcripts.
//!
//! Supports plain-text transcripts, JSON for programmatic use, and table
//! listings.

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};

use crate::domain::{Chat, Message};

/// Output format options.
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Plain-text transcript / listing.
    #[default]
    Text,
    /// JSON format for programmatic use.
    Json,
    /// Compact table listing.
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "table" => Ok(Self::Table),
            _ => Err(format!("Unknown format: {s}. Use: text, json, table")),
        }
    }
}

/// Formats a table listing of chats in recency order.
pub fn format_chats_table(chats: &[Chat]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Name", "Identifier", "Members"]);

    for (i, chat) in chats.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            chat.canonical_name(),
            chat.chat_identifier.clone(),
            chat.members.len().to_string(),
        ]);
    }

    table.to_string()
}

/// Formats a plain listing of chats, one canonical name per line.
pub fn format_chats_text(chats: &[Chat]) -> String {
    chats
        .iter()
        .map(|chat| chat.canonical_name())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Formats chats as JSON.
///
/// # Errors
/// Returns error if serialization fails.
pub fn format_chats_json(chats: &[Chat]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(chats)
}

/// Formats a conversation transcript: the chat name header followed by one
/// `sender: body (date)` line per message.
pub fn format_transcript(chat: &Chat, messages: &[Message]) -> String {
    let mut out = String::new();
    out.push_str(&chat.canonical_name());
    out.push('\n');

    for message in messages {
        out.push_str(&format!(
            "{}: {} ({})\n",
            message.sender.name,
            message.body,
            message.formatted_date()
        ));
    }

    out
}

/// Formats messages as JSON.
///
/// # Errors
/// Returns error if serialization fails.
pub fn format_messages_json(messages: &[Message]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(messages)
}

/// Formats a one-line export summary for terminal display.
pub fn format_export_line(chat_name: &str, exported: bool) -> String {
    if exported {
        format!("{} {}", "✓".green(), chat_name.cyan())
    } else {
        format!("{} {} (no output located)", "-".yellow(), chat_name.cyan())
    }
}
