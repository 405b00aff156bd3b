//! Duplicate detection within a batch and against an existing corpus.
//!
//! Nothing is discarded silently: every exclusion comes back to the
//! caller, who decides final retention policy.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fingerprint;
use crate::matching::similarity;
use crate::normalize::normalize;
use crate::types::Mcq;

/// Default question-similarity threshold for near-duplicate checks.
pub const DEFAULT_NEAR_THRESHOLD: f64 = 0.85;

/// Questions at or below this normalized length are never flagged as
/// near-duplicates; short questions collide too easily.
const MIN_NEAR_QUESTION_CHARS: usize = 10;

/// Result of in-batch deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchDedup {
    /// First-seen records, input order preserved.
    pub unique: Vec<Mcq>,
    /// Records whose fingerprint was already seen earlier in the batch.
    pub duplicates: Vec<Mcq>,
}

/// A new record paired with the existing record it duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicatePair {
    pub record: Mcq,
    pub matched: Mcq,
}

/// Result of deduplicating new records against an existing corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusDedup {
    pub unique: Vec<Mcq>,
    pub duplicates: Vec<DuplicatePair>,
}

/// Outcome of a single-record duplicate check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DuplicateCheck {
    Exact { matched: Mcq },
    Near { matched: Mcq, similarity: f64 },
    Unique,
}

/// Single pass over a batch: the first record with a given fingerprint
/// wins, later ones are classified as in-batch duplicates.
pub fn find_duplicates_in_batch(records: Vec<Mcq>) -> BatchDedup {
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    let mut unique = Vec::with_capacity(records.len());
    let mut duplicates = Vec::new();

    for record in records {
        let fp = fingerprint::of(&record).into_owned();
        if seen.insert(fp) {
            unique.push(record);
        } else {
            duplicates.push(record);
        }
    }

    debug!(
        unique = unique.len(),
        duplicates = duplicates.len(),
        "in-batch deduplication finished"
    );
    BatchDedup { unique, duplicates }
}

/// Partition new records into unique vs. duplicate-of-existing, pairing
/// each duplicate with its match. Missing fingerprints on existing
/// records are computed on the fly; the caller's records are never
/// mutated.
pub fn find_duplicates(new_records: &[Mcq], existing: &[Mcq]) -> CorpusDedup {
    let mut by_fingerprint: HashMap<String, &Mcq> = HashMap::with_capacity(existing.len());
    for record in existing {
        by_fingerprint
            .entry(fingerprint::of(record).into_owned())
            .or_insert(record);
    }

    let mut unique = Vec::new();
    let mut duplicates = Vec::new();
    for record in new_records {
        let fp = fingerprint::of(record);
        match by_fingerprint.get(fp.as_ref()) {
            Some(matched) => duplicates.push(DuplicatePair {
                record: record.clone(),
                matched: (*matched).clone(),
            }),
            None => unique.push(record.clone()),
        }
    }

    debug!(
        new = new_records.len(),
        existing = existing.len(),
        duplicates = duplicates.len(),
        "corpus deduplication finished"
    );
    CorpusDedup { unique, duplicates }
}

/// Check a single candidate against the corpus, for add/edit flows.
///
/// The exact pass runs first; `exclude_id` skips the record being
/// edited so an in-place edit never matches itself. The near pass only
/// runs for questions longer than ten normalized characters, and a
/// cheap length pre-filter skips the quadratic distance computation
/// for pairs whose lengths already rule the threshold out.
pub fn check_duplicate(
    candidate: &Mcq,
    existing: &[Mcq],
    exclude_id: Option<&str>,
    threshold: f64,
) -> DuplicateCheck {
    let candidate_fp = fingerprint::of(candidate);

    for record in existing {
        if exclude_id == Some(record.id.as_str()) {
            continue;
        }
        if fingerprint::of(record) == candidate_fp {
            return DuplicateCheck::Exact {
                matched: record.clone(),
            };
        }
    }

    let question = normalize(&candidate.question);
    let question_len = question.chars().count();
    if question_len <= MIN_NEAR_QUESTION_CHARS {
        return DuplicateCheck::Unique;
    }

    for record in existing {
        if exclude_id == Some(record.id.as_str()) {
            continue;
        }

        let other = normalize(&record.question);
        let other_len = other.chars().count();
        let length_gap = question_len.abs_diff(other_len) as f64 / question_len as f64;
        if length_gap > 1.0 - threshold {
            continue;
        }

        let score = similarity(&question, &other);
        if score >= threshold {
            debug!(score, id = %record.id, "near-duplicate found");
            return DuplicateCheck::Near {
                matched: record.clone(),
                similarity: score,
            };
        }
    }

    DuplicateCheck::Unique
}
