//! Spaced-repetition vocabulary trainer.
//!
//! Each user owns a book of words; every review outcome moves the word
//! along a fixed interval ladder and a `new -> learning -> mastered`
//! status machine, with a forgotten word dropping back to the start.

pub mod scheduler;
pub mod types;

pub use scheduler::VocabularyScheduler;
pub use types::{
    INTERVAL_LADDER, VocabularyBook, VocabularyItem, VocabularyStats, WordStatus, advance_interval,
};
