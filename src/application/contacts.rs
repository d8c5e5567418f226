//! Contact directory service.
//!
//! Loads the AddressBook database once, normalizes phone numbers and keeps a
//! phone-number-keyed lookup for handle resolution. Loading is best-effort:
//! a missing database yields an empty directory, and unknown handles resolve
//! to themselves.

use std::collections::HashMap;
use std::path::Path;

use crate::domain::{Contact, Result};
use crate::infrastructure::{find_address_book_db, AddressBookReader};

/// Phone-number-keyed contact lookup.
#[derive(Debug, Default)]
pub struct ContactDirectory {
    lookup: HashMap<String, Contact>,
    loaded: bool,
}

impl ContactDirectory {
    /// Create an empty, unloaded directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load contacts from the AddressBook database found under the user's
    /// home. A missing database is not an error; the directory stays empty
    /// and resolution degrades to raw handles. Repeated calls return the
    /// cached result without re-querying.
    ///
    /// # Errors
    /// Returns error if the database exists but cannot be queried.
    pub fn load(&mut self) -> Result<usize> {
        if self.loaded {
            return Ok(self.lookup.len());
        }

        match find_address_book_db() {
            Some(db_path) => self.load_from(&db_path),
            None => {
                tracing::warn!("No AddressBook database found; contact names unavailable");
                self.loaded = true;
                Ok(0)
            }
        }
    }

    /// Load contacts from a specific AddressBook database.
    ///
    /// # Errors
    /// Returns error if the database cannot be queried.
    pub fn load_from(&mut self, db_path: &Path) -> Result<usize> {
        if self.loaded {
            return Ok(self.lookup.len());
        }

        let reader = AddressBookReader::open(db_path)?;
        let rows = reader.fetch_contacts()?;

        self.lookup = rows
            .into_iter()
            .map(|row| {
                let phone = normalize_phone(&row.phone);
                let contact = Contact {
                    phone_number: phone.clone(),
                    name: row.full_name,
                };
                (phone, contact)
            })
            .collect();
        self.loaded = true;

        tracing::info!(count = self.lookup.len(), "Loaded contacts");

        Ok(self.lookup.len())
    }

    /// Resolve a handle to a contact name, falling back to the handle
    /// itself when unknown.
    #[must_use]
    pub fn resolve(&self, handle: &str) -> String {
        self.lookup
            .get(handle)
            .map_or_else(|| handle.to_string(), |c| c.name.clone())
    }

    /// Resolve a handle to a full contact, falling back to an unresolved
    /// placeholder contact when unknown.
    #[must_use]
    pub fn contact_for(&self, handle: &str) -> Contact {
        self.lookup
            .get(handle)
            .cloned()
            .unwrap_or_else(|| Contact::unresolved(handle))
    }

    /// Number of loaded contacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    /// Whether the directory holds no contacts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}

/// Normalize a phone number to `+1` plus its last 10 digits, stripping all
/// punctuation and any country prefix.
#[must_use]
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let tail_start = digits.len().saturating_sub(10);
    format!("+1{}", &digits[tail_start..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use tempfile::tempdir;

    #[test]
    fn test_normalize_phone_strips_punctuation() {
        assert_eq!(normalize_phone("(555) 555-0123"), "+15555550123");
        assert_eq!(normalize_phone("555.555.0123"), "+15555550123");
        assert_eq!(normalize_phone("+1 555 555 0123"), "+15555550123");
        assert_eq!(normalize_phone("5555550123"), "+15555550123");
    }

    #[test]
    fn test_normalize_phone_fixed_width() {
        // "+1" prefix plus exactly 10 trailing digits, whatever the input
        // punctuation looked like.
        for raw in ["(555) 555-0123", "1-555-555-0123", "+15555550123"] {
            let normalized = normalize_phone(raw);
            assert!(normalized.starts_with("+1"));
            assert_eq!(normalized[2..].len(), 10);
            assert!(normalized[2..].bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn test_load_from_and_resolve() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("AddressBook-v22.abcddb");
        let conn = test_support::create_address_book_db(&db_path);
        test_support::insert_contact(&conn, 1, Some("Ada"), Some("Lovelace"), "(555) 555-0123");

        let mut directory = ContactDirectory::new();
        assert_eq!(directory.load_from(&db_path).unwrap(), 1);

        assert_eq!(directory.resolve("+15555550123"), "Ada Lovelace");
        assert_eq!(directory.resolve("+15555559999"), "+15555559999");

        let contact = directory.contact_for("+15555559999");
        assert_eq!(contact.name, "+15555559999");
        assert_eq!(contact.phone_number, "+15555559999");
    }

    #[test]
    fn test_load_is_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("AddressBook-v22.abcddb");
        let conn = test_support::create_address_book_db(&db_path);
        test_support::insert_contact(&conn, 1, Some("Ada"), None, "5555550123");

        let mut directory = ContactDirectory::new();
        directory.load_from(&db_path).unwrap();

        // A second load must not re-query; dropping the file proves it.
        drop(conn);
        std::fs::remove_file(&db_path).unwrap();
        assert_eq!(directory.load_from(&db_path).unwrap(), 1);
    }
}
