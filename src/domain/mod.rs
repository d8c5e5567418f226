//! Domain layer - core business logic and types.
//!
//! This layer contains pure domain models and error types
//! without any external dependencies (DB, IO, etc.).

pub mod config;
pub mod error;
pub mod models;

pub use config::{AppConfig, ExporterConfig, PathConfig};
pub use error::{AppError, Result};
pub use models::{is_synthetic_name, Chat, Contact, Message, ELLIPSIS_MARKER};
