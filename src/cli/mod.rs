//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::application::OutputFormat;

/// hermes-export - Browse and export iMessage conversation history.
#[derive(Parser, Debug)]
#[command(name = "hermes-export")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format: text, json, or table.
    #[arg(short, long, default_value = "text")]
    pub format: String,

    /// Messages database path (defaults to ~/Library/Messages/chat.db).
    #[arg(long)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all chats, most recently active first.
    List {
        /// Maximum number of chats to show (0 = all).
        #[arg(short, long, default_value = "0")]
        limit: usize,
    },

    /// Show a chat's transcript.
    Show {
        /// Chat selector: list number, canonical name, or identifier.
        chat: String,

        /// Show only the last N messages.
        #[arg(short, long)]
        last: Option<usize>,

        /// Leave out tapback reactions.
        #[arg(long)]
        skip_reactions: bool,
    },

    /// Search chats by name (case-insensitive substring).
    Search {
        /// Search term.
        term: String,
    },

    /// Export one chat through the external export tool.
    Export {
        /// Chat selector: list number, canonical name, or identifier.
        chat: String,
    },

    /// Export every chat, most recent first.
    ExportAll {
        /// Number of recent chats to export (0 = all).
        #[arg(short, long, default_value = "0")]
        limit: usize,
    },

    /// Show the paths being used.
    Paths,

    /// Write a default configuration file if none exists.
    InitConfig,
}

impl Cli {
    /// Parse the output format argument.
    pub fn output_format(&self) -> Result<OutputFormat, String> {
        self.format.parse()
    }
}
