//! `SQLite` reader for the AddressBook database.
//!
//! Extracts phone numbers and full names from the macOS contacts store
//! (`AddressBook-v22.abcddb`).

use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use crate::domain::{AppError, Result};

/// Raw contact row: phone number as stored, plus the assembled full name.
#[derive(Debug)]
pub struct ContactRow {
    pub phone: String,
    pub full_name: String,
}

/// Read-only reader over an AddressBook database.
pub struct AddressBookReader {
    conn: Connection,
}

impl AddressBookReader {
    /// Opens an AddressBook database in read-only mode.
    ///
    /// # Errors
    /// Returns error if the database cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(AppError::database)?;

        conn.execute_batch("PRAGMA query_only = ON;")
            .map_err(AppError::database)?;

        Ok(Self { conn })
    }

    /// Fetches every phone number with the owning person's full name.
    ///
    /// The full name is first and last name joined with a space, falling
    /// back to whichever is present. Rows without a usable name or number
    /// are skipped.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn fetch_contacts(&self) -> Result<Vec<ContactRow>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT p.ZFULLNUMBER,
                        TRIM(COALESCE(r.ZFIRSTNAME || ' ' || NULLIF(r.ZLASTNAME, ''),
                                      r.ZFIRSTNAME,
                                      r.ZLASTNAME)) AS FullName
                 FROM ZABCDPHONENUMBER p
                 JOIN ZABCDRECORD r ON p.ZOWNER = r.Z_PK
                 ORDER BY r.ZLASTNAME ASC, r.ZFIRSTNAME ASC",
            )
            .map_err(AppError::database)?;

        let rows = stmt
            .query_map([], |row| {
                let phone: Option<String> = row.get(0)?;
                let full_name: Option<String> = row.get(1)?;
                Ok((phone, full_name))
            })
            .map_err(AppError::database)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(AppError::database)?;

        let contacts = rows
            .into_iter()
            .filter_map(|(phone, full_name)| match (phone, full_name) {
                (Some(phone), Some(full_name)) if !full_name.is_empty() => {
                    Some(ContactRow { phone, full_name })
                }
                _ => None,
            })
            .collect::<Vec<_>>();

        tracing::debug!(count = contacts.len(), "Fetched contact rows");

        Ok(contacts)
    }
}
