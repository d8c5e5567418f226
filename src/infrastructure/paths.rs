//! Local database path discovery.
//!
//! Handles locating the AddressBook database under the user's home. The
//! Messages database path is part of `AppConfig`; contact data has no
//! configured location and is always discovered by scanning.

use std::path::{Path, PathBuf};

/// AddressBook sources directory relative to the home directory.
const ADDRESS_BOOK_SOURCES: &str = "Library/Application Support/AddressBook/Sources";

/// AddressBook database file name inside each source directory.
const ADDRESS_BOOK_DB_NAME: &str = "AddressBook-v22.abcddb";

/// Discovers the AddressBook database under the user's home.
///
/// Returns `None` when no database exists; contact enrichment is
/// best-effort and callers degrade gracefully.
#[must_use]
pub fn find_address_book_db() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    scan_address_book_sources(&home.join(ADDRESS_BOOK_SOURCES))
}

/// Scans an AddressBook `Sources` directory for the first source containing
/// a database file.
#[must_use]
pub fn scan_address_book_sources(sources_dir: &Path) -> Option<PathBuf> {
    let entries = match std::fs::read_dir(sources_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(
                dir = %sources_dir.display(),
                error = %e,
                "AddressBook sources directory not readable"
            );
            return None;
        }
    };

    for entry in entries.filter_map(std::result::Result::ok) {
        let db_path = entry.path().join(ADDRESS_BOOK_DB_NAME);
        if db_path.exists() {
            tracing::debug!(path = %db_path.display(), "Found AddressBook database");
            return Some(db_path);
        }
    }

    tracing::warn!(dir = %sources_dir.display(), "No AddressBook database found");
    None
}
