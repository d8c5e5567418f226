//! Application layer - use cases and orchestration.
//!
//! This layer contains the main business logic for enriching store rows
//! into domain entities and exporting conversations.

pub mod chats;
pub mod contacts;
pub mod decoder;
pub mod exporter;
pub mod formatter;
pub mod messages;

pub use chats::ChatIndex;
pub use contacts::{normalize_phone, ContactDirectory};
pub use decoder::{
    extract_message_body, BodyDecoder, DecodeError, TypedStreamDecoder, ATTACHMENT_PLACEHOLDER,
};
pub use exporter::{sanitize_chat_name, ExportOutcome, ExportService, MatchConfidence};
pub use formatter::{
    format_chats_json, format_chats_table, format_chats_text, format_export_line,
    format_messages_json, format_transcript, OutputFormat,
};
pub use messages::{load_messages, timestamp_from_store};
