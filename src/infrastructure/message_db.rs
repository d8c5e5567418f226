//! `SQLite` reader for the Messages database (`chat.db`).
//!
//! Provides read-only access to chats, chat membership and message rows.
//! Raw rows are surfaced as named record structs; enrichment into domain
//! entities happens in the application layer.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use crate::domain::{AppError, Result};

/// Raw chat tuple in recency order.
#[derive(Debug)]
pub struct ChatRow {
    pub chat_id: i64,
    /// Raw display name; empty when the store has none.
    pub display_name: String,
    pub chat_identifier: String,
}

/// Raw message row for one chat, in chronological order.
#[derive(Debug)]
pub struct MessageRow {
    pub row_id: i64,
    pub guid: String,
    /// Nanoseconds since the store's 2001-01-01 epoch.
    pub date_ns: i64,
    pub text: Option<String>,
    pub attributed_body: Option<Vec<u8>>,
    pub handle: Option<String>,
    pub is_from_me: bool,
    pub has_attachments: bool,
    pub associated_message_guid: Option<String>,
    pub associated_message_type: Option<i64>,
}

/// Read-only reader over the Messages database.
#[derive(Debug)]
pub struct MessageDbReader {
    conn: Connection,
}

impl MessageDbReader {
    /// Opens the Messages database in read-only mode.
    ///
    /// # Errors
    /// Returns `DatabaseNotFound` if the file is missing, or a database
    /// error if it cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AppError::DatabaseNotFound {
                path: path.to_path_buf(),
            });
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(AppError::database)?;

        // Optimize for read-only access
        conn.execute_batch(
            "PRAGMA query_only = ON;
             PRAGMA temp_store = MEMORY;",
        )
        .map_err(AppError::database)?;

        Ok(Self { conn })
    }

    /// Fetches all chats that contain at least one message, ordered by the
    /// timestamp of their most recent message, newest first. Ties keep the
    /// store's natural row order.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn fetch_chats(&self) -> Result<Vec<ChatRow>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT cmj.chat_id,
                        COALESCE(c.display_name, '') AS display_name,
                        COALESCE(c.chat_identifier, '') AS chat_identifier
                 FROM chat_message_join AS cmj
                 JOIN message AS m ON cmj.message_id = m.ROWID
                 INNER JOIN chat AS c ON cmj.chat_id = c.ROWID
                 GROUP BY cmj.chat_id
                 ORDER BY MAX(m.date) DESC",
            )
            .map_err(AppError::database)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(ChatRow {
                    chat_id: row.get(0)?,
                    display_name: row.get(1)?,
                    chat_identifier: row.get(2)?,
                })
            })
            .map_err(AppError::database)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(AppError::database)?;

        tracing::debug!(count = rows.len(), "Fetched chat rows");

        Ok(rows)
    }

    /// Fetches the raw handle identifier of every participant in a chat.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn fetch_members(&self, chat_id: i64) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT handle.id
                 FROM chat_handle_join
                 JOIN handle ON chat_handle_join.handle_id = handle.ROWID
                 WHERE chat_handle_join.chat_id = ?1",
            )
            .map_err(AppError::database)?;

        let members = stmt
            .query_map([chat_id], |row| row.get(0))
            .map_err(AppError::database)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(AppError::database);
        members
    }

    /// Fetches every message belonging to a chat, ordered by send time
    /// ascending for stable chronological replay.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn fetch_messages(&self, chat_id: i64) -> Result<Vec<MessageRow>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT m.ROWID, m.guid, m.date, m.text, m.attributedBody, h.id,
                        m.is_from_me, m.cache_has_attachments,
                        m.associated_message_guid, m.associated_message_type
                 FROM message AS m
                 LEFT JOIN handle AS h ON m.handle_id = h.ROWID
                 WHERE m.ROWID IN
                     (SELECT message_id FROM chat_message_join WHERE chat_id = ?1)
                 ORDER BY m.date",
            )
            .map_err(AppError::database)?;

        let rows = stmt
            .query_map([chat_id], |row| {
                Ok(MessageRow {
                    row_id: row.get(0)?,
                    guid: row.get(1)?,
                    date_ns: row.get(2)?,
                    text: row.get(3)?,
                    attributed_body: row.get(4)?,
                    handle: row.get(5)?,
                    is_from_me: row.get::<_, i64>(6)? != 0,
                    has_attachments: row.get::<_, i64>(7)? != 0,
                    associated_message_guid: row.get(8)?,
                    associated_message_type: row.get(9)?,
                })
            })
            .map_err(AppError::database)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(AppError::database)?;

        tracing::debug!(chat_id, count = rows.len(), "Fetched message rows");

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, MessageFixture};
    use tempfile::tempdir;

    #[test]
    fn test_open_missing_database() {
        let err = MessageDbReader::open(Path::new("/nonexistent/chat.db")).unwrap_err();
        assert!(matches!(err, AppError::DatabaseNotFound { .. }));
    }

    #[test]
    fn test_fetch_chats_ordered_by_recency() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("chat.db");
        let conn = test_support::create_message_db(&db_path);

        test_support::insert_chat(&conn, 1, "", "+15555550001");
        test_support::insert_chat(&conn, 2, "", "+15555550002");
        // Chat 2 has the more recent message, so it sorts first.
        test_support::insert_message(&conn, &MessageFixture::new(10, 1, 1_000).chat(1));
        test_support::insert_message(&conn, &MessageFixture::new(11, 1, 5_000).chat(2));

        let reader = MessageDbReader::open(&db_path).unwrap();
        let chats = reader.fetch_chats().unwrap();

        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].chat_id, 2);
        assert_eq!(chats[1].chat_id, 1);
    }

    #[test]
    fn test_fetch_chats_skips_chats_without_messages() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("chat.db");
        let conn = test_support::create_message_db(&db_path);

        test_support::insert_chat(&conn, 1, "", "+15555550001");

        let reader = MessageDbReader::open(&db_path).unwrap();
        assert!(reader.fetch_chats().unwrap().is_empty());
    }

    #[test]
    fn test_fetch_members() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("chat.db");
        let conn = test_support::create_message_db(&db_path);

        test_support::insert_chat(&conn, 1, "", "chat12345");
        test_support::insert_handle(&conn, 1, "+15555550001");
        test_support::insert_handle(&conn, 2, "+15555550002");
        test_support::join_chat_handle(&conn, 1, 1);
        test_support::join_chat_handle(&conn, 1, 2);

        let reader = MessageDbReader::open(&db_path).unwrap();
        let members = reader.fetch_members(1).unwrap();

        assert_eq!(members, vec!["+15555550001", "+15555550002"]);
    }

    #[test]
    fn test_fetch_messages_chronological() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("chat.db");
        let conn = test_support::create_message_db(&db_path);

        test_support::insert_chat(&conn, 1, "", "+15555550001");
        test_support::insert_handle(&conn, 1, "+15555550001");
        test_support::insert_message(
            &conn,
            &MessageFixture::new(20, 1, 9_000).chat(1).text("second"),
        );
        test_support::insert_message(
            &conn,
            &MessageFixture::new(21, 1, 4_000).chat(1).text("first"),
        );

        let reader = MessageDbReader::open(&db_path).unwrap();
        let messages = reader.fetch_messages(1).unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text.as_deref(), Some("first"));
        assert_eq!(messages[1].text.as_deref(), Some("second"));
    }
}
