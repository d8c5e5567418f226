//! Chat identity cache.
//!
//! Enriches raw chat rows into typed `Chat` entities with resolved members
//! and canonical display names, and keeps them in an explicit cache object
//! keyed by the stable chat identifier. The canonical name is a derived
//! view, never the cache key, so name collisions cannot evict a chat.

use std::collections::HashMap;

use crate::domain::{Chat, Result, ELLIPSIS_MARKER};
use crate::infrastructure::MessageDbReader;

use super::contacts::ContactDirectory;

/// Cache of enriched chats in recency order.
#[derive(Debug, Default)]
pub struct ChatIndex {
    chats: Vec<Chat>,
    by_identifier: HashMap<String, usize>,
    loaded: bool,
}

impl ChatIndex {
    /// Create an empty, unpopulated index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All chats in recency order, querying the store on first call and
    /// serving the cache afterwards until `invalidate` or `reload`.
    ///
    /// # Errors
    /// Returns error if the store cannot be queried.
    pub fn get_all_chats(
        &mut self,
        db: &MessageDbReader,
        contacts: &ContactDirectory,
    ) -> Result<&[Chat]> {
        if !self.loaded {
            self.reload(db, contacts)?;
        }
        Ok(&self.chats)
    }

    /// Re-query the store and rebuild the cache.
    ///
    /// # Errors
    /// Returns error if the store cannot be queried.
    pub fn reload(&mut self, db: &MessageDbReader, contacts: &ContactDirectory) -> Result<()> {
        let rows = db.fetch_chats()?;

        self.chats.clear();
        self.by_identifier.clear();

        for row in rows {
            let handles = db.fetch_members(row.chat_id)?;
            let members = handles
                .iter()
                .map(|handle| contacts.contact_for(handle))
                .collect();

            // An absent display name borrows the contact name behind the
            // chat identifier, which for 1:1 chats is a phone number.
            let display_name = if row.display_name.is_empty() {
                contacts.resolve(&row.chat_identifier)
            } else {
                row.display_name
            };

            let mut chat = Chat {
                chat_id: row.chat_id,
                display_name,
                chat_identifier: row.chat_identifier,
                members,
            };
            chat.display_name = chat.canonical_name();

            self.by_identifier
                .insert(chat.chat_identifier.clone(), self.chats.len());
            self.chats.push(chat);
        }

        self.loaded = true;
        tracing::info!(count = self.chats.len(), "Chat index populated");

        Ok(())
    }

    /// Drop the cache; the next `get_all_chats` re-queries.
    pub fn invalidate(&mut self) {
        self.chats.clear();
        self.by_identifier.clear();
        self.loaded = false;
    }

    /// Look up a chat by canonical name. On a name collision the first
    /// match in recency order wins.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&Chat> {
        self.chats.iter().find(|c| c.canonical_name() == name)
    }

    /// Look up a chat by its stable identifier.
    #[must_use]
    pub fn get_by_identifier(&self, identifier: &str) -> Option<&Chat> {
        self.by_identifier
            .get(identifier)
            .and_then(|&idx| self.chats.get(idx))
    }

    /// Case-insensitive substring search over canonical names, with any
    /// trailing ellipsis marker stripped before comparison.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&Chat> {
        let term = term.to_lowercase();
        self.chats
            .iter()
            .filter(|chat| {
                chat.canonical_name()
                    .trim_end_matches(ELLIPSIS_MARKER)
                    .to_lowercase()
                    .contains(&term)
            })
            .collect()
    }

    /// Number of cached chats.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chats.len()
    }

    /// Whether the cache holds no chats.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }
}
