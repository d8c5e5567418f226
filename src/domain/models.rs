//! Domain models for iMessage chat data.
//!
//! These models represent the core entities reconstructed from the Messages
//! `SQLite` database: contacts, chats and individual messages.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Number of member names shown in a derived group chat name.
const GROUP_NAME_MEMBERS: usize = 3;

/// Marker appended to a derived group name when more members exist.
pub const ELLIPSIS_MARKER: &str = "...";

/// Range of `associated_message_type` values used for tapback reactions.
const TAPBACK_RANGE: std::ops::RangeInclusive<i64> = 2000..=3007;

/// A contact with a normalized phone number and display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    /// Phone number normalized to `+1` plus the last 10 digits.
    pub phone_number: String,
    /// Full display name.
    pub name: String,
}

impl Contact {
    /// Fallback contact for a handle that resolved to nothing: the handle
    /// stands in for both number and name.
    #[must_use]
    pub fn unresolved(handle: &str) -> Self {
        Self {
            phone_number: handle.to_string(),
            name: handle.to_string(),
        }
    }

    /// The fixed contact labelling messages sent by the local user.
    #[must_use]
    pub fn me() -> Self {
        Self {
            phone_number: "Me".to_string(),
            name: "Me".to_string(),
        }
    }
}

/// A conversation thread, 1:1 or group.
#[derive(Debug, Clone, Serialize)]
pub struct Chat {
    /// Store-local primary key.
    pub chat_id: i64,
    /// Raw display name; possibly empty or a synthetic `chat<N>` placeholder.
    pub display_name: String,
    /// Stable external identifier (group id or phone number).
    pub chat_identifier: String,
    /// Resolved participants, in store order.
    pub members: Vec<Contact>,
}

impl Chat {
    /// Derives the canonical human-facing name for this chat.
    ///
    /// A real display name wins. Otherwise group chats are named after their
    /// first few members, 1:1 chats after their single member, and anything
    /// left falls back to the stable identifier. Never returns an empty
    /// string.
    #[must_use]
    pub fn canonical_name(&self) -> String {
        if !self.display_name.is_empty() && !is_synthetic_name(&self.display_name) {
            return self.display_name.clone();
        }

        match self.members.len() {
            0 => {
                if self.chat_identifier.is_empty() {
                    format!("chat {}", self.chat_id)
                } else {
                    self.chat_identifier.clone()
                }
            }
            1 => self.members[0].name.clone(),
            n => {
                let mut name = self
                    .members
                    .iter()
                    .take(GROUP_NAME_MEMBERS)
                    .map(|m| m.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                if n > GROUP_NAME_MEMBERS {
                    name.push_str(ELLIPSIS_MARKER);
                }
                name
            }
        }
    }

    /// Whether this chat has more than one participant.
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.members.len() > 1
    }
}

/// Whether a display name is one of the store's synthetic `chat<N>`
/// placeholders rather than a user-assigned name.
#[must_use]
pub fn is_synthetic_name(name: &str) -> bool {
    name.strip_prefix("chat")
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// A single message, constructed transiently from one query row.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Store-local row id.
    pub row_id: i64,
    /// Globally unique message id.
    pub guid: String,
    /// Send time, converted from the store's 2001-epoch nanoseconds.
    pub timestamp: DateTime<Utc>,
    /// Extracted human-readable body.
    pub body: String,
    /// Resolved sender.
    pub sender: Contact,
    /// Whether the local user sent this message.
    pub is_from_me: bool,
    /// Whether the message carries attachments.
    pub has_attachments: bool,
    /// GUID of the message this one reacts to or replies to, if any.
    pub associated_message_guid: Option<String>,
    /// Kind of association (tapback codes live in 2000..=3007).
    pub associated_message_type: Option<i64>,
}

impl Message {
    /// Whether this message is a tapback reaction rather than content.
    #[must_use]
    pub fn is_tapback(&self) -> bool {
        self.associated_message_type
            .is_some_and(|t| TAPBACK_RANGE.contains(&t))
    }

    /// Send time formatted for transcripts.
    #[must_use]
    pub fn formatted_date(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M").to_string()
    }
}
