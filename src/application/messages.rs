//! Message loading.
//!
//! Converts raw message rows into domain `Message` values: timestamps off
//! the store's 2001 epoch, bodies through the attributed-body decoder,
//! senders through the contact directory.

use chrono::{DateTime, Utc};

use crate::domain::{Contact, Message, Result};
use crate::infrastructure::MessageDbReader;

use super::contacts::ContactDirectory;
use super::decoder::{extract_message_body, BodyDecoder};

/// Unix timestamp of the store epoch, 2001-01-01T00:00:00Z.
const APPLE_EPOCH_UNIX_SECS: i64 = 978_307_200;

/// Convert a store timestamp (nanoseconds since the 2001 epoch) to UTC.
#[must_use]
pub fn timestamp_from_store(date_ns: i64) -> DateTime<Utc> {
    let secs = APPLE_EPOCH_UNIX_SECS + date_ns.div_euclid(1_000_000_000);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let nanos = date_ns.rem_euclid(1_000_000_000) as u32;
    DateTime::from_timestamp(secs, nanos).unwrap_or_default()
}

/// Load all messages of a chat in chronological order.
///
/// Rows that are neither from-me nor attributable to a sender handle are
/// skipped; they carry nothing a transcript could attribute.
///
/// # Errors
/// Returns error if the store cannot be queried.
pub fn load_messages(
    db: &MessageDbReader,
    contacts: &ContactDirectory,
    decoder: &dyn BodyDecoder,
    chat_id: i64,
) -> Result<Vec<Message>> {
    let rows = db.fetch_messages(chat_id)?;

    let messages = rows
        .into_iter()
        .filter_map(|row| {
            let sender = if row.is_from_me {
                Contact::me()
            } else {
                match row.handle.as_deref() {
                    Some(handle) => contacts.contact_for(handle),
                    None => {
                        tracing::debug!(row_id = row.row_id, "Skipping message without sender");
                        return None;
                    }
                }
            };

            let body = extract_message_body(
                row.text.as_deref(),
                row.attributed_body.as_deref(),
                row.has_attachments,
                decoder,
            );

            Some(Message {
                row_id: row.row_id,
                guid: row.guid,
                timestamp: timestamp_from_store(row.date_ns),
                body,
                sender,
                is_from_me: row.is_from_me,
                has_attachments: row.has_attachments,
                associated_message_guid: row.associated_message_guid,
                associated_message_type: row.associated_message_type,
            })
        })
        .collect();

    Ok(messages)
}
