//! Core MCQ library shared by the editor, import, and print surfaces.
//!
//! Provides:
//! - Format A parser turning pasted text into validated records
//! - Fingerprint and similarity based duplicate detection
//! - Two-column page layout with per-section formatting settings
//! - Deterministic seeded shuffling of records and options
//!
//! Everything here is synchronous and pure: no I/O, no shared state.
//! Persistence, rendering, and routing live in the consuming
//! applications.

pub mod dedup;
pub mod error;
pub mod fingerprint;
pub mod layout;
pub mod matching;
pub mod normalize;
pub mod parser;
pub mod shuffle;
pub mod types;

pub use dedup::{
    check_duplicate, find_duplicates, find_duplicates_in_batch, BatchDedup, CorpusDedup,
    DuplicateCheck, DuplicatePair, DEFAULT_NEAR_THRESHOLD,
};
pub use error::{CoreError, Result};
pub use layout::calculate_pages;
pub use matching::{levenshtein_distance, similarity};
pub use normalize::normalize;
pub use parser::parse;
pub use shuffle::{hash_seed, perform_shuffle, shuffle_entries, shuffle_options, SeededRng};
pub use types::{
    InvalidFragment, Mcq, MergedSection, OptionLabel, PageContent, PageLayout, PageSettings,
    ParseReport, SheetEntry, ShuffleMode,
};
