//! Domain records stored in the encrypted collections.
//!
//! All timestamps are epoch milliseconds. Serialized field names are camelCase,
//! which is also the plaintext layout inside every ciphertext.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Collection, Record};

pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Points awarded for completing any task.
pub const BASE_POINTS: u32 = 10;
/// Bonus multiplier for important-but-not-urgent work.
pub const Q2_MULTIPLIER: f64 = 1.5;

/// Current time in epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Today's calendar day (UTC) as `YYYY-MM-DD`.
pub fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

macro_rules! record {
    ($ty:ty, $collection:expr) => {
        impl Record for $ty {
            const COLLECTION: Collection = $collection;
            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Eisenhower matrix placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    #[serde(rename = "Q1")]
    UrgentImportant,
    #[serde(rename = "Q2")]
    NotUrgentImportant,
    #[serde(rename = "Q3")]
    UrgentNotImportant,
    #[serde(rename = "Q4")]
    NotUrgentNotImportant,
    #[serde(rename = "UNSORTED")]
    Unsorted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
    Snoozed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnergyLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub quadrant: Quadrant,
    /// Position within the quadrant; lower sorts first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_level: Option<EnergyLevel>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// RRULE string, interpreted by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_rule: Option<String>,
    pub points_value: u32,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

record!(Task, Collection::Tasks);

impl Task {
    pub fn new(title: impl Into<String>, quadrant: Quadrant) -> Self {
        let now = now_ms();
        Self {
            id: new_id("task"),
            title: title.into(),
            description: None,
            status: TaskStatus::Todo,
            quadrant,
            sort_order: None,
            due_date: None,
            reminder_time: None,
            energy_level: None,
            tags: Vec::new(),
            recurrence_rule: None,
            points_value: points_for(quadrant),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Returns the completed version of this task.
    pub fn complete(&self) -> Self {
        let now = now_ms();
        Self {
            status: TaskStatus::Completed,
            completed_at: Some(now),
            updated_at: now,
            ..self.clone()
        }
    }
}

/// Points a task in `quadrant` is worth.
pub fn points_for(quadrant: Quadrant) -> u32 {
    match quadrant {
        Quadrant::NotUrgentImportant => (BASE_POINTS as f64 * Q2_MULTIPLIER).ceil() as u32,
        _ => BASE_POINTS,
    }
}

// ---------------------------------------------------------------------------
// Notes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    /// Markdown body.
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub linked_note_ids: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

record!(Note, Collection::Notes);

/// Fields a caller may change on an existing note. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub folder_id: Option<Option<String>>,
}

impl Note {
    pub fn new(title: impl Into<String>, content: impl Into<String>, folder_id: Option<String>) -> Self {
        let now = now_ms();
        Self {
            id: new_id("note"),
            title: title.into(),
            content: content.into(),
            folder_id,
            tags: Vec::new(),
            linked_note_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update(&self, changes: NoteUpdate) -> Self {
        let mut note = self.clone();
        if let Some(title) = changes.title {
            note.title = title;
        }
        if let Some(content) = changes.content {
            note.content = content;
        }
        if let Some(tags) = changes.tags {
            note.tags = tags;
        }
        if let Some(folder_id) = changes.folder_id {
            note.folder_id = folder_id;
        }
        note.updated_at = now_ms();
        note
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

record!(Folder, Collection::Folders);

impl Folder {
    pub fn new(name: impl Into<String>) -> Self {
        let now = now_ms();
        Self { id: new_id("folder"), name: name.into(), created_at: now, updated_at: now }
    }
}

// ---------------------------------------------------------------------------
// Flashcards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardType {
    Basic,
    Cloze,
    Mcq,
}

/// Starting ease for a new card.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: String,
    pub deck_id: String,
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub front: String,
    pub back: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloze_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloze_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Days until the next review.
    pub interval: u32,
    /// Consecutive successful reviews.
    pub repetition: u32,
    pub ease_factor: f64,
    pub next_review_date: i64,

    pub created_at: i64,
    pub updated_at: i64,
}

record!(Flashcard, Collection::Flashcards);

impl Flashcard {
    /// A basic front/back card, due immediately.
    pub fn new(deck_id: impl Into<String>, front: impl Into<String>, back: impl Into<String>) -> Self {
        let now = now_ms();
        Self {
            id: new_id("card"),
            deck_id: deck_id.into(),
            card_type: CardType::Basic,
            front: front.into(),
            back: back.into(),
            options: None,
            correct_answer_index: None,
            cloze_content: None,
            cloze_index: None,
            image_url: None,
            interval: 0,
            repetition: 0,
            ease_factor: DEFAULT_EASE_FACTOR,
            next_review_date: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// A cloze card. The cloze text is the front unless given separately.
    pub fn cloze(
        deck_id: impl Into<String>,
        front: impl Into<String>,
        back: impl Into<String>,
        cloze_content: Option<String>,
        cloze_index: u32,
    ) -> Self {
        let mut card = Self::new(deck_id, front, back);
        card.card_type = CardType::Cloze;
        card.cloze_content = Some(cloze_content.unwrap_or_else(|| card.front.clone()));
        card.cloze_index = Some(cloze_index);
        card
    }

    pub fn multiple_choice(
        deck_id: impl Into<String>,
        front: impl Into<String>,
        back: impl Into<String>,
        options: Vec<String>,
        correct_answer_index: usize,
    ) -> Self {
        let mut card = Self::new(deck_id, front, back);
        card.card_type = CardType::Mcq;
        card.options = Some(options);
        card.correct_answer_index = Some(correct_answer_index);
        card
    }

    /// True until the card has a successful review behind it.
    pub fn is_new(&self) -> bool {
        self.repetition == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub card_ids: Vec<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

record!(Deck, Collection::Decks);

impl Deck {
    pub fn new(title: impl Into<String>) -> Self {
        let now = now_ms();
        Self { id: new_id("deck"), title: title.into(), card_ids: Vec::new(), created_at: now, updated_at: now }
    }
}

// ---------------------------------------------------------------------------
// Activity log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    TaskComplete,
    NoteCreated,
    StreakMaintained,
    FlashcardReview,
}

/// One immutable entry of the append-only activity history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: String,
    /// Calendar day, `YYYY-MM-DD`.
    pub date: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    /// Points earned or a count.
    pub value: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub timestamp: i64,
}

record!(ActivityLog, Collection::Activities);

impl ActivityLog {
    /// A log entry dated today.
    pub fn new(
        activity_type: ActivityType,
        reference_id: Option<String>,
        value: i64,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: new_id("log"),
            date: today(),
            activity_type,
            reference_id,
            value,
            metadata,
            timestamp: now_ms(),
        }
    }

    /// The parsed calendar day, or `None` if `date` is malformed.
    pub fn day(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }

    /// Whether a flashcard review was the card's first.
    pub fn is_new_card(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("isNew"))
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_time: i64,
    pub end_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub is_all_day: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

record!(CalendarEvent, Collection::CalendarEvents);

impl CalendarEvent {
    pub fn new(title: impl Into<String>, start_time: i64, end_time: i64) -> Self {
        let now = now_ms();
        Self {
            id: new_id("event"),
            title: title.into(),
            description: None,
            start_time,
            end_time,
            color: None,
            is_all_day: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether any part of the event falls inside `[start, end)`.
    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        self.start_time < end && self.end_time > start
    }
}
