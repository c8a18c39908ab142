use std::fs;

use kairos_store::engine::vault::{self, LEGACY_SALT};
use kairos_store::export;
use kairos_store::models::{ActivityLog, ActivityType, CalendarEvent, Deck, Flashcard, Note, Quadrant, Task};
use kairos_store::scheduler::Rating;
use kairos_store::sdk::{self, Config, SaltMode, Workspace};
use kairos_store::Error;
use serde_json::Value;
use tempfile::tempdir;

fn read_collection(dir: &std::path::Path, name: &str) -> Value {
    serde_json::from_slice(&fs::read(dir.join(format!("{}.json", name))).unwrap()).unwrap()
}

#[tokio::test]
async fn test_data_survives_restart_and_is_encrypted_on_disk() {
    let dir = tempdir().unwrap();
    let config = Config::new(dir.path());
    let task = Task::new("Study Physics", Quadrant::NotUrgentImportant);

    {
        let ws = Workspace::open(&config).unwrap();
        ws.unlock("hunter2 but longer").await.unwrap();
        ws.tasks.save_task(&task).await.unwrap();
    }

    let on_disk = read_collection(dir.path(), "tasks");
    let envelope = &on_disk[&task.id];
    assert_eq!(envelope["id"], Value::String(task.id.clone()));
    assert!(envelope["cipherText"].is_string());
    assert!(envelope["iv"].is_string());
    assert_eq!(envelope.as_object().unwrap().len(), 3);
    assert!(!on_disk.to_string().contains("Study Physics"));

    let ws = Workspace::open(&config).unwrap();
    assert!(ws.is_locked());
    ws.unlock("hunter2 but longer").await.unwrap();
    assert_eq!(ws.tasks.get_task(&task.id).await.unwrap(), Some(task));
}

#[tokio::test]
async fn test_wrong_passphrase_after_restart() {
    let dir = tempdir().unwrap();
    let config = Config::new(dir.path());
    {
        let ws = Workspace::open(&config).unwrap();
        ws.unlock("right").await.unwrap();
        ws.notes.save_note(&Note::new("secret", "body", None)).await.unwrap();
    }

    let ws = Workspace::open(&config).unwrap();
    assert!(matches!(ws.unlock("wrong").await, Err(Error::InvalidPassphrase)));
    assert!(ws.is_locked());
    assert!(matches!(ws.notes.get_all_notes().await, Err(Error::Locked)));
}

#[tokio::test]
async fn test_salt_is_per_installation() {
    let a = tempdir().unwrap();
    let b = tempdir().unwrap();
    for dir in [&a, &b] {
        let ws = Workspace::open(&Config::new(dir.path())).unwrap();
        ws.unlock("same passphrase").await.unwrap();
    }

    let salt = |dir: &tempfile::TempDir| -> String {
        let meta: Value = serde_json::from_slice(&fs::read(dir.path().join("vault.meta")).unwrap()).unwrap();
        meta["salt"].as_str().unwrap().to_string()
    };
    assert_eq!(salt(&a).len(), 32);
    assert_ne!(salt(&a), salt(&b));
}

#[tokio::test]
async fn test_legacy_salt_matches_fixed_derivation() {
    let dir = tempdir().unwrap();
    let mut config = Config::new(dir.path());
    config.salt_mode = SaltMode::Legacy;
    let card = Flashcard::new("deck_1", "front", "back");
    {
        let ws = Workspace::open(&config).unwrap();
        ws.unlock("legacy").await.unwrap();
        ws.flashcards.save_card(&card).await.unwrap();
    }

    let key = vault::derive_key("legacy", LEGACY_SALT).unwrap();
    let envelope = &read_collection(dir.path(), "flashcards")[&card.id];
    let plaintext = vault::decrypt(
        envelope["cipherText"].as_str().unwrap(),
        envelope["iv"].as_str().unwrap(),
        &key,
    )
    .unwrap();
    let decoded: Flashcard = serde_json::from_slice(&plaintext).unwrap();
    assert_eq!(decoded, card);
}

#[tokio::test]
async fn test_corrupted_record_on_disk_is_skipped() {
    let dir = tempdir().unwrap();
    let config = Config::new(dir.path());
    let mut ids = Vec::new();
    {
        let ws = Workspace::open(&config).unwrap();
        ws.unlock("pw").await.unwrap();
        for i in 0..5 {
            let event = CalendarEvent::new(format!("event {}", i), i * 1_000, i * 1_000 + 500);
            ws.calendar.save_event(&event).await.unwrap();
            ids.push(event.id);
        }
    }

    let mut events = read_collection(dir.path(), "calendar_events");
    events[&ids[0]]["iv"] = Value::String("not base64 at all".to_string());
    fs::write(dir.path().join("calendar_events.json"), serde_json::to_vec(&events).unwrap()).unwrap();

    let ws = Workspace::open(&config).unwrap();
    ws.unlock("pw").await.unwrap();
    let all = ws.calendar.get_all_events().await.unwrap();
    assert_eq!(all.len(), 4);
    assert!(all.iter().all(|e| e.id != ids[0]));
    assert!(matches!(ws.calendar.get_event(&ids[0]).await, Err(Error::DecryptionFailure(_))));
}

#[tokio::test]
async fn test_truncated_collection_file_is_never_overwritten() {
    let dir = tempdir().unwrap();
    let config = Config::new(dir.path());
    let note = Note::new("keep me", "body", None);
    {
        let ws = Workspace::open(&config).unwrap();
        ws.unlock("pw").await.unwrap();
        ws.notes.save_note(&note).await.unwrap();
    }

    let notes_path = dir.path().join("notes.json");
    let mut bytes = fs::read(&notes_path).unwrap();
    bytes.truncate(bytes.len() - 2);
    fs::write(&notes_path, &bytes).unwrap();

    let res = Workspace::open(&config);
    assert!(matches!(res, Err(Error::CorruptCollection { ref path, .. }) if *path == notes_path));
    assert_eq!(fs::read(&notes_path).unwrap(), bytes);
    assert!(String::from_utf8(bytes).unwrap().contains(&note.id));
}

#[tokio::test]
async fn test_foreign_collection_file_fails_open() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("pomodoro_sessions.json"), "{}").unwrap();

    let res = Workspace::open(&Config::new(dir.path()));
    assert!(matches!(res, Err(Error::UnknownCollection(name)) if name == "pomodoro_sessions"));
}

#[tokio::test]
async fn test_get_all_is_idempotent() {
    let ws = Workspace::in_memory(SaltMode::PerInstallation);
    ws.unlock("pw").await.unwrap();
    for i in 0..4 {
        ws.tasks.save_task(&Task::new(format!("t{}", i), Quadrant::Unsorted)).await.unwrap();
    }

    let mut first = ws.tasks.get_all_tasks().await.unwrap();
    let mut second = ws.tasks.get_all_tasks().await.unwrap();
    first.sort_by(|a, b| a.id.cmp(&b.id));
    second.sort_by(|a, b| a.id.cmp(&b.id));
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_study_session_end_to_end() {
    let dir = tempdir().unwrap();
    let ws = sdk::open(dir.path().to_str().unwrap()).unwrap();
    ws.unlock("study hard").await.unwrap();

    let deck = Deck::new("Spanish");
    ws.flashcards.save_deck(&deck).await.unwrap();
    let hola = Flashcard::new(&deck.id, "hola", "hello");
    let adios = Flashcard::new(&deck.id, "adios", "goodbye");
    ws.flashcards.save_card(&hola).await.unwrap();
    ws.flashcards.save_card(&adios).await.unwrap();

    assert_eq!(ws.flashcards.get_due_cards(&deck.id).await.unwrap().len(), 2);

    let passed = ws.review_card(&hola.id, Rating::Easy).await.unwrap();
    assert_eq!(passed.repetition, 1);
    let failed = ws.review_card(&adios.id, Rating::Hard).await.unwrap();
    assert_eq!((failed.repetition, failed.interval), (0, 1));

    assert!(ws.flashcards.get_due_cards(&deck.id).await.unwrap().is_empty());

    let task = Task::new("Vocab list", Quadrant::UrgentImportant);
    ws.tasks.save_task(&task).await.unwrap();
    ws.complete_task(&task.id).await.unwrap();
    ws.activities
        .log_activity(&ActivityLog::new(ActivityType::StreakMaintained, None, 0, None))
        .await
        .unwrap();

    let report = ws.analytics().await.unwrap();
    assert_eq!(report.streak.current_streak, 1);
    assert_eq!(report.streak.longest_streak, 1);
    let bucket = &report.heatmap[0];
    assert_eq!(bucket.count, 4);
    assert_eq!(bucket.details.flashcards_new, 2);
    assert_eq!(bucket.details.tasks_completed, 1);

    let dump = export::export_dump(&ws).await.unwrap();
    assert_eq!(dump.decks.len(), 1);
    assert_eq!(dump.cards.len(), 2);
    assert_eq!(dump.activity_logs.len(), 4);
}
