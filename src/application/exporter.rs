//! Export orchestration.
//!
//! Delegates bulk conversation export to the external `imessage-exporter`
//! tool and reconciles its output into a canonical per-chat directory
//! layout. The tool runs on a dedicated worker thread per invocation; the
//! caller blocks on a one-shot channel rather than on the child process.
//!
//! The tool's output filename for group chats is not deterministic from the
//! chat identifier alone, so reconciliation locates the transcript with a
//! normalized prefix match and reports how confident that match was.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::mpsc;
use std::thread;

use serde::Serialize;

use crate::domain::{AppConfig, AppError, Chat, Result, ELLIPSIS_MARKER};

/// How the transcript file was matched in the scratch directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchConfidence {
    /// Normalized filename equals the normalized chat name.
    Exact,
    /// Normalized filename starts with the normalized chat name.
    Prefix,
    /// Fell back to the identifier-derived filename.
    Identifier,
}

impl std::fmt::Display for MatchConfidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Prefix => write!(f, "prefix"),
            Self::Identifier => write!(f, "identifier"),
        }
    }
}

/// Result of one chat export after reconciliation.
#[derive(Debug, Clone, Serialize)]
pub struct ExportOutcome {
    /// Canonical name of the exported chat.
    pub chat_name: String,
    /// Final transcript location, when one was produced and found.
    pub transcript: Option<PathBuf>,
    /// Final attachments directory, when the tool produced one.
    pub attachments: Option<PathBuf>,
    /// Confidence of the transcript filename match.
    pub confidence: Option<MatchConfidence>,
}

impl ExportOutcome {
    fn empty(chat_name: String) -> Self {
        Self {
            chat_name,
            transcript: None,
            attachments: None,
            confidence: None,
        }
    }

    /// Whether reconciliation found nothing to move.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.transcript.is_none() && self.attachments.is_none()
    }
}

/// A transcript candidate located in the scratch directory.
struct LocatedTranscript {
    path: PathBuf,
    confidence: MatchConfidence,
}

/// An export tool run in flight on its worker thread.
pub struct ToolInvocation {
    rx: mpsc::Receiver<std::io::Result<Output>>,
}

impl ToolInvocation {
    /// Run the command on a dedicated worker thread, handing the captured
    /// output back through a one-shot channel.
    fn spawn(mut command: Command) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            // Receiver gone means the caller stopped caring; nothing to do.
            let _ = tx.send(command.output());
        });
        Self { rx }
    }

    /// Block until the tool finishes and return its captured output.
    ///
    /// # Errors
    /// Returns error if the tool could not be launched or the worker thread
    /// died before reporting a result.
    pub fn wait(self) -> Result<Output> {
        match self.rx.recv() {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(AppError::io("Failed to launch export tool", e)),
            Err(_) => Err(AppError::Config {
                message: "Export worker thread exited without reporting a result".into(),
            }),
        }
    }
}

/// Orchestrates external tool invocation and output reconciliation.
pub struct ExportService {
    binary: String,
    format: String,
    compatibility: String,
    scratch_dir: PathBuf,
    conversations_root: PathBuf,
}

impl ExportService {
    /// Build the service from configuration.
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        Self {
            binary: config.exporter.binary.clone(),
            format: config.exporter.format.clone(),
            compatibility: config.exporter.compatibility.clone(),
            scratch_dir: config.scratch_dir(),
            conversations_root: config.conversations_root(),
        }
    }

    /// Export one chat: run the tool into a clean scratch directory, then
    /// move its output under `{conversations_root}/{sanitized_name}/`.
    ///
    /// The scratch directory is removed afterwards whether or not the run
    /// succeeded. A transcript the resolver cannot locate after a clean
    /// tool exit is a soft miss: logged, empty outcome, `Ok`.
    ///
    /// # Errors
    /// Returns error if the scratch directory cannot be prepared, the tool
    /// cannot be launched or exits non-zero, or a located file cannot be
    /// moved.
    pub fn export_chat(&self, chat: &Chat) -> Result<ExportOutcome> {
        self.prepare_scratch()?;

        let invocation = self.invoke(&chat.chat_identifier);
        let result = invocation.wait().and_then(|output| {
            if output.status.success() {
                tracing::debug!(
                    chat = %chat.chat_identifier,
                    stdout_bytes = output.stdout.len(),
                    "Export tool finished"
                );
                self.reconcile(chat)
            } else {
                Err(AppError::exporter_failed(&output))
            }
        });

        // Cleanup must not be skipped on partial failure.
        if let Err(e) = fs::remove_dir_all(&self.scratch_dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    dir = %self.scratch_dir.display(),
                    error = %e,
                    "Failed to remove scratch directory"
                );
            }
        }

        result
    }

    fn prepare_scratch(&self) -> Result<()> {
        if let Err(e) = fs::remove_dir_all(&self.scratch_dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(AppError::io("Failed to clear scratch directory", e));
            }
        }
        fs::create_dir_all(&self.scratch_dir)
            .map_err(|e| AppError::io("Failed to create scratch directory", e))
    }

    fn invoke(&self, chat_identifier: &str) -> ToolInvocation {
        let mut command = Command::new(&self.binary);
        command
            .arg("-f")
            .arg(&self.format)
            .arg("-o")
            .arg(&self.scratch_dir)
            .arg("-c")
            .arg(&self.compatibility)
            .arg("-g")
            .arg(chat_identifier);

        tracing::info!(binary = %self.binary, chat = %chat_identifier, "Invoking export tool");

        ToolInvocation::spawn(command)
    }

    /// Move the tool's output into the canonical per-chat layout.
    fn reconcile(&self, chat: &Chat) -> Result<ExportOutcome> {
        let chat_name = chat.canonical_name();
        let sanitized = sanitize_chat_name(&chat_name);

        let Some(located) = self.locate_transcript(chat, &sanitized) else {
            tracing::warn!(chat = %chat_name, "Export tool produced no locatable transcript");
            return Ok(ExportOutcome::empty(chat_name));
        };

        let destination = self.conversations_root.join(&sanitized);
        fs::create_dir_all(&destination)
            .map_err(|e| AppError::io("Failed to create destination directory", e))?;

        let transcript_dest = destination.join(format!("{sanitized}.txt"));
        move_file(&located.path, &transcript_dest)?;
        tracing::info!(
            transcript = %transcript_dest.display(),
            confidence = %located.confidence,
            "Reconciled transcript"
        );

        let attachments = match self.locate_attachments() {
            Some(source) => {
                let attachments_dest = destination.join("attachments");
                move_dir(&source, &attachments_dest)?;
                Some(attachments_dest)
            }
            None => None,
        };

        Ok(ExportOutcome {
            chat_name,
            transcript: Some(transcript_dest),
            attachments,
            confidence: Some(located.confidence),
        })
    }

    /// Find the transcript the tool wrote.
    ///
    /// Single-member chats name the file after the chat identifier. Group
    /// chat filenames derive from member names with whitespace the tool
    /// normalizes its own way, so candidates are matched on normalized
    /// stems, falling back to the identifier-derived name.
    fn locate_transcript(&self, chat: &Chat, sanitized: &str) -> Option<LocatedTranscript> {
        let identifier_path = self
            .scratch_dir
            .join(format!("{}.txt", chat.chat_identifier));

        if !chat.is_group() {
            return identifier_path.exists().then(|| LocatedTranscript {
                path: identifier_path,
                confidence: MatchConfidence::Identifier,
            });
        }

        let target = normalize_for_match(sanitized);
        let mut prefix_hit: Option<PathBuf> = None;

        for path in self.scratch_text_files() {
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            let normalized = normalize_for_match(&stem);

            if normalized == target {
                return Some(LocatedTranscript {
                    path,
                    confidence: MatchConfidence::Exact,
                });
            }
            if prefix_hit.is_none() && normalized.starts_with(&target) {
                prefix_hit = Some(path);
            }
        }

        if let Some(path) = prefix_hit {
            return Some(LocatedTranscript {
                path,
                confidence: MatchConfidence::Prefix,
            });
        }

        identifier_path.exists().then(|| LocatedTranscript {
            path: identifier_path,
            confidence: MatchConfidence::Identifier,
        })
    }

    /// Text files currently sitting in the scratch directory.
    fn scratch_text_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(&self.scratch_dir) else {
            return Vec::new();
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().is_some_and(|ext| ext == "txt")
            })
            .collect();
        files.sort();
        files
    }

    /// The attachments directory the tool wrote, if any.
    fn locate_attachments(&self) -> Option<PathBuf> {
        let entries = fs::read_dir(&self.scratch_dir).ok()?;
        entries
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .find(|path| {
                path.is_dir()
                    && path
                        .file_name()
                        .is_some_and(|name| name.to_string_lossy().ends_with("_attachments"))
            })
    }
}

/// Sanitize a canonical chat name for use as a directory/file name:
/// strip a trailing ellipsis marker, then turn `", "` and `" "` into `"_"`.
/// Idempotent.
#[must_use]
pub fn sanitize_chat_name(name: &str) -> String {
    let name = name.strip_suffix(ELLIPSIS_MARKER).unwrap_or(name);
    name.replace(", ", "_").replace(' ', "_")
}

/// Reduce a name to lowercase alphanumerics for filename comparison, so
/// differing whitespace and separator conventions cannot defeat the match.
fn normalize_for_match(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_lowercase()
}

/// Move a file, falling back to copy+remove across filesystems.
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    fs::copy(from, to)
        .map_err(|e| AppError::io(format!("Failed to copy {} into place", from.display()), e))?;
    fs::remove_file(from)
        .map_err(|e| AppError::io(format!("Failed to remove {}", from.display()), e))?;
    Ok(())
}

/// Move a directory, falling back to recursive copy across filesystems.
fn move_dir(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    copy_dir_recursive(from, to)?;
    fs::remove_dir_all(from)
        .map_err(|e| AppError::io(format!("Failed to remove {}", from.display()), e))?;
    Ok(())
}

fn copy_dir_recursive(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to)
        .map_err(|e| AppError::io(format!("Failed to create {}", to.display()), e))?;

    let entries = fs::read_dir(from)
        .map_err(|e| AppError::io(format!("Failed to read {}", from.display()), e))?;

    for entry in entries.filter_map(std::result::Result::ok) {
        let source = entry.path();
        let target = to.join(entry.file_name());
        if source.is_dir() {
            copy_dir_recursive(&source, &target)?;
        } else {
            fs::copy(&source, &target)
                .map_err(|e| AppError::io(format!("Failed to copy {}", source.display()), e))?;
        }
    }

    Ok(())
}
