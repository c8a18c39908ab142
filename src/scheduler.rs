//! SM-2 spaced repetition scheduling.
//!
//! Four review buttons map onto SM-2 quality scores:
//!
//! | Rating | Quality | Outcome |
//! |--------|---------|---------|
//! | Again  | 0       | fail    |
//! | Hard   | 2       | fail    |
//! | Good   | 4       | pass    |
//! | Easy   | 5       | pass    |
//!
//! Hard counts as a failure, so the card comes back tomorrow. Re-showing a failed
//! card later in the same session is up to the caller's queue; the scheduler only
//! makes sure the persisted due date is right if the session ends there.

use serde::{Deserialize, Serialize};

use crate::models::{now_ms, Flashcard, MS_PER_DAY};

/// Lowest ease factor a card can reach.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Qualities at or above this pass.
const PASS_QUALITY: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    /// SM-2 quality score (0-5).
    pub fn quality(self) -> u8 {
        match self {
            Rating::Again => 0,
            Rating::Hard => 2,
            Rating::Good => 4,
            Rating::Easy => 5,
        }
    }

    pub fn passed(self) -> bool {
        self.quality() >= PASS_QUALITY
    }
}

impl std::str::FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "again" | "1" => Ok(Rating::Again),
            "hard" | "2" => Ok(Rating::Hard),
            "good" | "3" => Ok(Rating::Good),
            "easy" | "4" => Ok(Rating::Easy),
            other => Err(format!("unknown rating: {}", other)),
        }
    }
}

/// Schedules the next review of `card`, using the current time.
pub fn process_review(card: &Flashcard, rating: Rating) -> Flashcard {
    process_review_at(card, rating, now_ms())
}

/// Schedules the next review of `card` as if it were reviewed at `now` (epoch ms).
pub fn process_review_at(card: &Flashcard, rating: Rating, now: i64) -> Flashcard {
    let quality = rating.quality();
    let (interval, repetition) = next_interval(card, quality);

    // EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02))
    let miss = f64::from(5 - quality);
    let ease_factor = (card.ease_factor + (0.1 - miss * (0.08 + miss * 0.02))).max(MIN_EASE_FACTOR);

    Flashcard {
        interval,
        repetition,
        ease_factor,
        next_review_date: now + i64::from(interval) * MS_PER_DAY,
        updated_at: now,
        ..card.clone()
    }
}

fn next_interval(card: &Flashcard, quality: u8) -> (u32, u32) {
    if quality < PASS_QUALITY {
        return (1, 0);
    }
    let interval = match card.repetition {
        0 => 1,
        1 => 6,
        _ => (f64::from(card.interval) * card.ease_factor).round() as u32,
    };
    (interval, card.repetition + 1)
}

/// Intervals (days) each rating would give, in [`Rating::ALL`] order.
pub fn preview_intervals(card: &Flashcard) -> [u32; 4] {
    Rating::ALL.map(|r| next_interval(card, r.quality()).0)
}

/// Whether `card` is due at `now`.
pub fn is_due(card: &Flashcard, now: i64) -> bool {
    card.next_review_date <= now
}
