//! Plaintext backup of a workspace.
//!
//! The dump holds fully decrypted records and is meant for backups the user keeps
//! themselves. It is never written back into the store in this form.

use serde::{Deserialize, Serialize};

use crate::models::{now_ms, ActivityLog, Deck, Flashcard, Note, Task};
use crate::sdk::Workspace;
use crate::Result;

/// Current dump layout version.
pub const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDump {
    pub version: u32,
    pub timestamp: i64,
    pub tasks: Vec<Task>,
    pub notes: Vec<Note>,
    pub decks: Vec<Deck>,
    pub cards: Vec<Flashcard>,
    pub activity_logs: Vec<ActivityLog>,
}

/// Counts of records written by [`import_dump`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub tasks: usize,
    pub notes: usize,
    pub decks: usize,
    pub cards: usize,
    pub activity_logs: usize,
}

/// Decrypts every exported collection of an unlocked workspace.
pub async fn export_dump(workspace: &Workspace) -> Result<ExportDump> {
    Ok(ExportDump {
        version: EXPORT_VERSION,
        timestamp: now_ms(),
        tasks: workspace.tasks.get_all_tasks().await?,
        notes: workspace.notes.get_all_notes().await?,
        decks: workspace.flashcards.get_all_decks().await?,
        cards: workspace.flashcards.get_all_cards().await?,
        activity_logs: workspace.activities.get_activities().await?,
    })
}

/// Writes every record of `dump` into an unlocked workspace, re-encrypting it
/// under the current key. Records with the same id are overwritten, except activity
/// log entries: the log is append-only, so entries already present are skipped.
pub async fn import_dump(workspace: &Workspace, dump: &ExportDump) -> Result<ImportSummary> {
    if dump.version > EXPORT_VERSION {
        log::warn!("Importing dump version {} with reader version {}", dump.version, EXPORT_VERSION);
    }

    for task in &dump.tasks {
        workspace.tasks.save_task(task).await?;
    }
    for note in &dump.notes {
        workspace.notes.save_note(note).await?;
    }
    for deck in &dump.decks {
        workspace.flashcards.save_deck(deck).await?;
    }
    for card in &dump.cards {
        workspace.flashcards.save_card(card).await?;
    }
    let mut activity_logs = 0;
    for entry in &dump.activity_logs {
        if workspace.activities.contains(&entry.id).await? {
            log::debug!("Activity {} already logged, skipping", entry.id);
            continue;
        }
        workspace.activities.log_activity(entry).await?;
        activity_logs += 1;
    }

    Ok(ImportSummary {
        tasks: dump.tasks.len(),
        notes: dump.notes.len(),
        decks: dump.decks.len(),
        cards: dump.cards.len(),
        activity_logs,
    })
}
