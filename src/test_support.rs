//! Shared fixtures for tests: miniature Messages and AddressBook databases
//! built with rusqlite, an attributed-body encoder, and a scriptable stand-in
//! for the external export tool.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};

/// Create a Messages database with the subset of the schema the reader
/// touches.
pub fn create_message_db(path: &Path) -> Connection {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE chat (
             ROWID INTEGER PRIMARY KEY,
             display_name TEXT,
             chat_identifier TEXT
         );
         CREATE TABLE handle (
             ROWID INTEGER PRIMARY KEY,
             id TEXT
         );
         CREATE TABLE message (
             ROWID INTEGER PRIMARY KEY,
             guid TEXT,
             date INTEGER,
             text TEXT,
             attributedBody BLOB,
             handle_id INTEGER,
             is_from_me INTEGER DEFAULT 0,
             cache_has_attachments INTEGER DEFAULT 0,
             associated_message_guid TEXT,
             associated_message_type INTEGER
         );
         CREATE TABLE chat_message_join (
             chat_id INTEGER,
             message_id INTEGER
         );
         CREATE TABLE chat_handle_join (
             chat_id INTEGER,
             handle_id INTEGER
         );",
    )
    .unwrap();
    conn
}

pub fn insert_chat(conn: &Connection, rowid: i64, display_name: &str, identifier: &str) {
    conn.execute(
        "INSERT INTO chat (ROWID, display_name, chat_identifier) VALUES (?1, ?2, ?3)",
        params![rowid, display_name, identifier],
    )
    .unwrap();
}

pub fn insert_handle(conn: &Connection, rowid: i64, id: &str) {
    conn.execute(
        "INSERT INTO handle (ROWID, id) VALUES (?1, ?2)",
        params![rowid, id],
    )
    .unwrap();
}

pub fn join_chat_handle(conn: &Connection, chat_id: i64, handle_id: i64) {
    conn.execute(
        "INSERT INTO chat_handle_join (chat_id, handle_id) VALUES (?1, ?2)",
        params![chat_id, handle_id],
    )
    .unwrap();
}

/// Builder for message rows.
pub struct MessageFixture {
    row_id: i64,
    handle_id: i64,
    date_ns: i64,
    chat_id: Option<i64>,
    guid: String,
    text: Option<String>,
    attributed_body: Option<Vec<u8>>,
    is_from_me: bool,
    has_attachments: bool,
    associated_message_guid: Option<String>,
    associated_message_type: Option<i64>,
}

impl MessageFixture {
    pub fn new(row_id: i64, handle_id: i64, date_ns: i64) -> Self {
        Self {
            row_id,
            handle_id,
            date_ns,
            chat_id: None,
            guid: format!("guid-{row_id}"),
            text: None,
            attributed_body: None,
            is_from_me: false,
            has_attachments: false,
            associated_message_guid: None,
            associated_message_type: None,
        }
    }

    pub fn chat(mut self, chat_id: i64) -> Self {
        self.chat_id = Some(chat_id);
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn body_blob(mut self, blob: Vec<u8>) -> Self {
        self.attributed_body = Some(blob);
        self
    }

    pub fn from_me(mut self) -> Self {
        self.is_from_me = true;
        self
    }

    pub fn with_attachments(mut self) -> Self {
        self.has_attachments = true;
        self
    }

    pub fn tapback(mut self, target_guid: &str, kind: i64) -> Self {
        self.associated_message_guid = Some(target_guid.to_string());
        self.associated_message_type = Some(kind);
        self
    }
}

pub fn insert_message(conn: &Connection, fixture: &MessageFixture) {
    conn.execute(
        "INSERT INTO message
             (ROWID, guid, date, text, attributedBody, handle_id, is_from_me,
              cache_has_attachments, associated_message_guid, associated_message_type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            fixture.row_id,
            fixture.guid,
            fixture.date_ns,
            fixture.text,
            fixture.attributed_body,
            fixture.handle_id,
            i64::from(fixture.is_from_me),
            i64::from(fixture.has_attachments),
            fixture.associated_message_guid,
            fixture.associated_message_type,
        ],
    )
    .unwrap();

    if let Some(chat_id) = fixture.chat_id {
        conn.execute(
            "INSERT INTO chat_message_join (chat_id, message_id) VALUES (?1, ?2)",
            params![chat_id, fixture.row_id],
        )
        .unwrap();
    }
}

/// Create an AddressBook database with the phone/person tables the reader
/// queries.
pub fn create_address_book_db(path: &Path) -> Connection {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE ZABCDRECORD (
             Z_PK INTEGER PRIMARY KEY,
             ZFIRSTNAME TEXT,
             ZLASTNAME TEXT
         );
         CREATE TABLE ZABCDPHONENUMBER (
             Z_PK INTEGER PRIMARY KEY,
             ZFULLNUMBER TEXT,
             ZOWNER INTEGER
         );",
    )
    .unwrap();
    conn
}

pub fn insert_contact(
    conn: &Connection,
    pk: i64,
    first: Option<&str>,
    last: Option<&str>,
    phone: &str,
) {
    conn.execute(
        "INSERT INTO ZABCDRECORD (Z_PK, ZFIRSTNAME, ZLASTNAME) VALUES (?1, ?2, ?3)",
        params![pk, first, last],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO ZABCDPHONENUMBER (Z_PK, ZFULLNUMBER, ZOWNER) VALUES (?1, ?2, ?3)",
        params![pk, phone, pk],
    )
    .unwrap();
}

/// Encode `text` the way attributed-body blobs carry it: marker, 5-byte
/// preamble, then a single length byte or the 0x81 wide little-endian form.
pub fn encode_attributed_body(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut blob = Vec::new();
    blob.extend_from_slice(b"\x04\x0bstreamtyped\x81\xe8\x03\x84\x01@\x84\x84\x84");
    blob.extend_from_slice(b"NSString");
    blob.extend_from_slice(b"\x01\x94\x84\x01+"); // preamble
    if bytes.len() < 0x80 {
        #[allow(clippy::cast_possible_truncation)]
        blob.push(bytes.len() as u8);
    } else {
        #[allow(clippy::cast_possible_truncation)]
        let len = bytes.len() as u16;
        blob.push(0x81);
        blob.extend_from_slice(&len.to_le_bytes());
    }
    blob.extend_from_slice(bytes);
    blob
}

/// Write an executable shell script standing in for the export tool. The
/// script sees the real argument convention (`-f`, `-o`, `-c`, `-g`) with
/// `$out` and `$id` bound before `body` runs.
#[cfg(unix)]
pub fn write_fake_tool(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-exporter");
    let script = format!(
        "#!/bin/sh\n\
         out=''\n\
         id=''\n\
         while [ $# -gt 0 ]; do\n\
           case \"$1\" in\n\
             -o) out=\"$2\"; shift 2 ;;\n\
             -g) id=\"$2\"; shift 2 ;;\n\
             *) shift ;;\n\
           esac\n\
         done\n\
         {body}\n"
    );
    std::fs::write(&path, script).unwrap();

    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();

    path
}
