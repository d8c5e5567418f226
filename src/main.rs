//! hermes-export - Browse and export iMessage conversation history.
//!
//! Reads the macOS Messages database to reconstruct chats, members and
//! messages, resolves contact names from the AddressBook, and produces
//! per-conversation export artifacts by delegating bulk extraction to the
//! external `imessage-exporter` tool.

mod application;
mod cli;
mod domain;
mod infrastructure;
#[cfg(test)]
mod test_support;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{
    format_chats_json, format_chats_table, format_chats_text, format_export_line,
    format_messages_json, format_transcript, load_messages, ChatIndex, ContactDirectory,
    ExportService, OutputFormat, TypedStreamDecoder,
};
use cli::{Cli, Commands};
use domain::{AppConfig, Chat};
use infrastructure::MessageDbReader;

fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Shared handles the commands operate on.
struct App {
    config: AppConfig,
    reader: MessageDbReader,
    contacts: ContactDirectory,
    index: ChatIndex,
}

impl App {
    fn open(cli: &Cli) -> domain::Result<Self> {
        let mut config = infrastructure::load_config()?;
        if let Some(db) = &cli.db {
            config.paths.message_db = Some(db.clone());
        }

        let reader = MessageDbReader::open(&config.message_db_path())?;

        let mut contacts = ContactDirectory::new();
        let loaded = contacts.load()?;
        tracing::info!(contacts = loaded, "Contact directory ready");

        Ok(Self {
            config,
            reader,
            contacts,
            index: ChatIndex::new(),
        })
    }

    fn chats(&mut self) -> domain::Result<&[Chat]> {
        self.index.get_all_chats(&self.reader, &self.contacts)
    }

    /// Resolve a chat selector: 1-based list number, canonical name, chat
    /// identifier, or unique search match, in that order.
    fn select_chat(&mut self, selector: &str) -> domain::Result<Chat> {
        let chats = self.chats()?;

        if let Ok(number) = selector.parse::<usize>() {
            if number == 0 || number > chats.len() {
                return Err(domain::AppError::InvalidData {
                    message: format!("Number {} is out of range (1-{})", number, chats.len()),
                });
            }
            return Ok(chats[number - 1].clone());
        }

        if let Some(chat) = self.index.get_by_name(selector) {
            return Ok(chat.clone());
        }
        if let Some(chat) = self.index.get_by_identifier(selector) {
            return Ok(chat.clone());
        }

        let hits = self.index.search(selector);
        match hits.len() {
            1 => Ok(hits[0].clone()),
            0 => Err(domain::AppError::InvalidData {
                message: format!("Chat '{selector}' not found"),
            }),
            n => Err(domain::AppError::InvalidData {
                message: format!("Chat '{selector}' is ambiguous ({n} matches); try `search`"),
            }),
        }
    }
}

/// Main application logic.
fn run(cli: Cli) -> domain::Result<()> {
    let format = cli
        .output_format()
        .map_err(|e| domain::AppError::Config { message: e })?;

    match &cli.command {
        Commands::List { limit } => {
            let mut app = App::open(&cli)?;
            cmd_list(&mut app, *limit, format)?;
        }
        Commands::Show {
            chat,
            last,
            skip_reactions,
        } => {
            let mut app = App::open(&cli)?;
            cmd_show(&mut app, chat, *last, *skip_reactions, format)?;
        }
        Commands::Search { term } => {
            let mut app = App::open(&cli)?;
            cmd_search(&mut app, term, format)?;
        }
        Commands::Export { chat } => {
            let mut app = App::open(&cli)?;
            cmd_export(&mut app, chat)?;
        }
        Commands::ExportAll { limit } => {
            let mut app = App::open(&cli)?;
            cmd_export_all(&mut app, *limit)?;
        }
        Commands::Paths => {
            cmd_paths(&cli)?;
        }
        Commands::InitConfig => {
            infrastructure::ensure_config_exists()?;
            println!(
                "{} Configuration at {}",
                "✓".green().bold(),
                AppConfig::config_file_path().display()
            );
        }
    }

    Ok(())
}

/// List chats command.
fn cmd_list(app: &mut App, limit: usize, format: OutputFormat) -> domain::Result<()> {
    let chats = app.chats()?;
    let shown = if limit > 0 && limit < chats.len() {
        &chats[..limit]
    } else {
        chats
    };

    let output = match format {
        OutputFormat::Text => format_chats_text(shown),
        OutputFormat::Table => format_chats_table(shown),
        OutputFormat::Json => format_chats_json(shown).map_err(|e| domain::AppError::InvalidData {
            message: format!("Failed to serialize chats: {e}"),
        })?,
    };

    println!("{output}");
    Ok(())
}

/// Show a chat transcript.
fn cmd_show(
    app: &mut App,
    selector: &str,
    last: Option<usize>,
    skip_reactions: bool,
    format: OutputFormat,
) -> domain::Result<()> {
    let chat = app.select_chat(selector)?;

    let decoder = TypedStreamDecoder;
    let mut messages = load_messages(&app.reader, &app.contacts, &decoder, chat.chat_id)?;

    if skip_reactions {
        messages.retain(|m| !m.is_tapback());
    }
    if let Some(n) = last {
        let len = messages.len();
        if n < len {
            messages.drain(..len - n);
        }
    }

    let output = match format {
        OutputFormat::Text | OutputFormat::Table => format_transcript(&chat, &messages),
        OutputFormat::Json => {
            format_messages_json(&messages).map_err(|e| domain::AppError::InvalidData {
                message: format!("Failed to serialize messages: {e}"),
            })?
        }
    };

    println!("{output}");
    Ok(())
}

/// Search chats by name.
fn cmd_search(app: &mut App, term: &str, format: OutputFormat) -> domain::Result<()> {
    app.chats()?;
    let hits: Vec<Chat> = app.index.search(term).into_iter().cloned().collect();

    let output = match format {
        OutputFormat::Text => format_chats_text(&hits),
        OutputFormat::Table => format_chats_table(&hits),
        OutputFormat::Json => format_chats_json(&hits).map_err(|e| domain::AppError::InvalidData {
            message: format!("Failed to serialize chats: {e}"),
        })?,
    };

    println!("{output}");
    println!();
    println!("{} match(es)", hits.len());
    Ok(())
}

/// Export one chat.
fn cmd_export(app: &mut App, selector: &str) -> domain::Result<()> {
    let chat = app.select_chat(selector)?;
    let service = ExportService::new(&app.config);

    let outcome = service.export_chat(&chat)?;
    println!("{}", format_export_line(&outcome.chat_name, !outcome.is_empty()));

    if let Some(transcript) = &outcome.transcript {
        println!("  transcript: {}", transcript.display());
    }
    if let Some(attachments) = &outcome.attachments {
        println!("  attachments: {}", attachments.display());
    }

    Ok(())
}

/// Export every chat, continuing past per-chat failures.
fn cmd_export_all(app: &mut App, limit: usize) -> domain::Result<()> {
    let chats: Vec<Chat> = {
        let all = app.chats()?;
        let shown = if limit > 0 && limit < all.len() {
            &all[..limit]
        } else {
            all
        };
        shown.to_vec()
    };

    let service = ExportService::new(&app.config);
    let mut exported = 0usize;
    let mut failed = 0usize;

    for chat in &chats {
        match service.export_chat(chat) {
            Ok(outcome) => {
                println!("{}", format_export_line(&outcome.chat_name, !outcome.is_empty()));
                if !outcome.is_empty() {
                    exported += 1;
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("{} {}: {}", "✗".red(), chat.canonical_name(), e);
            }
        }
    }

    println!();
    println!(
        "{} Exported {} of {} chats to {} ({} failed)",
        "📁".bold(),
        exported,
        chats.len(),
        app.config.conversations_root().display(),
        failed
    );

    Ok(())
}

/// Show the paths being used.
fn cmd_paths(cli: &Cli) -> domain::Result<()> {
    let mut config = infrastructure::load_config()?;
    if let Some(db) = &cli.db {
        config.paths.message_db = Some(db.clone());
    }

    println!("{}", "📂 Paths".bold());
    println!();
    println!("  messages db:        {}", config.message_db_path().display());
    println!(
        "  address book:       {}",
        infrastructure::find_address_book_db()
            .map_or_else(|| "(not found)".to_string(), |p| p.display().to_string())
    );
    println!("  conversations root: {}", config.conversations_root().display());
    println!("  scratch dir:        {}", config.scratch_dir().display());
    println!(
        "  config file:        {}",
        AppConfig::config_file_path().display()
    );

    Ok(())
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
