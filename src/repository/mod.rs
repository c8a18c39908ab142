//! Typed repositories over the [`EncryptedStore`](crate::engine::EncryptedStore).
//!
//! The store only ever sees ciphertext, so nothing can be indexed: every query
//! helper here decrypts the whole collection and filters in memory.
pub mod activity;
pub mod calendar;
pub mod flashcard;
pub mod note;
pub mod task;

pub use activity::ActivityRepository;
pub use calendar::CalendarRepository;
pub use flashcard::FlashcardRepository;
pub use note::NoteRepository;
pub use task::TaskRepository;
