use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tokio::sync::Mutex;

use crate::analytics::{self, HeatmapBucket, StreakStats};
use crate::engine::vault::{self, MasterKey, LEGACY_SALT};
use crate::engine::{EncryptedRecord, EncryptedStore, MemStore, Persistence, VaultMeta};
use crate::models::{now_ms, ActivityLog, ActivityType, Flashcard, Note, Task};
use crate::repository::{
    ActivityRepository, CalendarRepository, FlashcardRepository, NoteRepository, TaskRepository,
};
use crate::scheduler::{self, Rating};
use crate::sdk::{Config, SaltMode};
use crate::{Error, Result};

const KEY_CHECK_ID: &str = "key-check";

/// Streaks and heatmap computed from the full activity history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    #[serde(flatten)]
    pub streak: StreakStats,
    pub heatmap: Vec<HeatmapBucket>,
}

/// The assembled store: key-value engine, encryption wrapper and repositories.
///
/// A workspace starts locked. Call [`Workspace::unlock`] with the passphrase
/// before using any repository.
pub struct Workspace {
    store: Arc<EncryptedStore>,
    persistence: Option<Arc<Persistence>>,
    salt_mode: SaltMode,
    meta: Mutex<Option<VaultMeta>>,

    pub tasks: TaskRepository,
    pub notes: NoteRepository,
    pub flashcards: FlashcardRepository,
    pub activities: ActivityRepository,
    pub calendar: CalendarRepository,
}

impl Workspace {
    /// Opens (or creates) a workspace backed by `config.data_dir`.
    pub fn open(config: &Config) -> Result<Self> {
        let persistence = Arc::new(Persistence::new(&config.data_dir)?);
        let initial_data = persistence.load_all()?;
        let meta = persistence.load_meta()?;
        log::info!(
            "Loaded {} collections from {:?}",
            initial_data.len(),
            persistence.data_dir()
        );

        let kv = Arc::new(MemStore::new(initial_data, Some(persistence.clone())));
        Ok(Self::assemble(kv, Some(persistence), config.salt_mode, meta))
    }

    /// A workspace that lives only in memory.
    pub fn in_memory(salt_mode: SaltMode) -> Self {
        let kv = Arc::new(MemStore::new(HashMap::new(), None));
        Self::assemble(kv, None, salt_mode, None)
    }

    fn assemble(
        kv: Arc<MemStore>,
        persistence: Option<Arc<Persistence>>,
        salt_mode: SaltMode,
        meta: Option<VaultMeta>,
    ) -> Self {
        let store = Arc::new(EncryptedStore::new(kv));
        Self {
            tasks: TaskRepository::new(store.clone()),
            notes: NoteRepository::new(store.clone()),
            flashcards: FlashcardRepository::new(store.clone()),
            activities: ActivityRepository::new(store.clone()),
            calendar: CalendarRepository::new(store.clone()),
            store,
            persistence,
            salt_mode,
            meta: Mutex::new(meta),
        }
    }

    /// Derives the session key from `passphrase` and installs it.
    ///
    /// The first unlock of a vault records an encrypted key check; later unlocks
    /// must open it, otherwise [`Error::InvalidPassphrase`] is returned and the
    /// workspace stays locked. The key is installed only after every step succeeded.
    pub async fn unlock(&self, passphrase: &str) -> Result<()> {
        let mut meta_slot = self.meta.lock().await;
        let mut meta = meta_slot.clone().unwrap_or_default();
        let mut changed = false;

        let salt = match self.salt_mode {
            SaltMode::Legacy => LEGACY_SALT.to_vec(),
            SaltMode::PerInstallation => {
                if meta.salt.is_empty() {
                    meta.salt = hex::encode(vault::generate_salt());
                    changed = true;
                }
                hex::decode(&meta.salt).map_err(|e| Error::Internal(format!("corrupt salt: {}", e)))?
            }
        };

        let passphrase = passphrase.to_string();
        let key = tokio::task::spawn_blocking(move || vault::derive_key(&passphrase, &salt))
            .await
            .map_err(|e| Error::Internal(e.to_string()))??;

        match &meta.key_check {
            Some(raw) => verify_key_check(raw, &key)?,
            None => {
                let check = EncryptedRecord::seal(KEY_CHECK_ID, &json!({ "id": KEY_CHECK_ID, "createdAt": now_ms() }), &key)?;
                meta.key_check = Some(serde_json::to_value(check)?);
                changed = true;
            }
        }

        if changed {
            if let Some(p) = self.persistence.clone() {
                let snapshot = meta.clone();
                tokio::task::spawn_blocking(move || p.save_meta(&snapshot))
                    .await
                    .map_err(|e| Error::Internal(e.to_string()))??;
            }
        }
        *meta_slot = Some(meta);

        self.store.set_key(key);
        Ok(())
    }

    /// Drops the session key.
    pub fn lock(&self) {
        self.store.lock();
    }

    pub fn is_locked(&self) -> bool {
        self.store.is_locked()
    }

    /// Marks a task completed and logs it. Completing a completed task is a no-op.
    pub async fn complete_task(&self, id: &str) -> Result<Task> {
        let task = self
            .tasks
            .get_task(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("task {}", id)))?;
        if task.is_completed() {
            return Ok(task);
        }

        let done = task.complete();
        self.tasks.save_task(&done).await?;
        self.activities
            .log_activity(&ActivityLog::new(
                ActivityType::TaskComplete,
                Some(done.id.clone()),
                i64::from(done.points_value),
                None,
            ))
            .await?;
        Ok(done)
    }

    /// Saves a new note and logs its creation.
    pub async fn create_note(&self, note: &Note) -> Result<()> {
        self.notes.save_note(note).await?;
        self.activities
            .log_activity(&ActivityLog::new(ActivityType::NoteCreated, Some(note.id.clone()), 1, None))
            .await
    }

    /// Applies a review rating to a card, saves the new schedule and logs the review.
    pub async fn review_card(&self, card_id: &str, rating: Rating) -> Result<Flashcard> {
        let card = self
            .flashcards
            .get_card(card_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("card {}", card_id)))?;

        let updated = scheduler::process_review(&card, rating);
        self.flashcards.save_card(&updated).await?;
        self.activities
            .log_activity(&ActivityLog::new(
                ActivityType::FlashcardReview,
                Some(card.id.clone()),
                1,
                Some(json!({ "isNew": card.is_new() })),
            ))
            .await?;
        Ok(updated)
    }

    /// Streaks and heatmap over every logged activity.
    pub async fn analytics(&self) -> Result<Analytics> {
        let logs = self.activities.get_activities().await?;
        Ok(Analytics {
            streak: analytics::calculate_streak(&logs),
            heatmap: analytics::aggregate_heatmap_data(&logs),
        })
    }
}

fn verify_key_check(raw: &serde_json::Value, key: &MasterKey) -> Result<()> {
    let envelope: EncryptedRecord = serde_json::from_value(raw.clone())
        .map_err(|e| Error::Internal(format!("corrupt key check: {}", e)))?;
    envelope
        .open_value::<serde_json::Value>(key)
        .map(|_| ())
        .map_err(|_| Error::InvalidPassphrase)
}
