//! Exact-match keys derived from an MCQ's semantic fields.

use std::borrow::Cow;

use crate::normalize::normalize;
use crate::types::Mcq;

/// Derive the fingerprint from the record's semantic fields.
///
/// Each field is normalized independently before joining, so whitespace
/// collapse can never merge text across option boundaries. Join order
/// is fixed: question, options A through D, answer label. The pipe
/// separator is stripped by normalization and therefore cannot occur
/// inside a part.
pub fn generate(mcq: &Mcq) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(6);
    parts.push(normalize(&mcq.question));
    for option in &mcq.options {
        parts.push(normalize(option));
    }
    parts.push(normalize(mcq.answer.as_str()));
    parts.join("|")
}

/// Cached fingerprint when present, computed on the fly otherwise.
/// Never mutates the record.
pub fn of(mcq: &Mcq) -> Cow<'_, str> {
    match &mcq.fingerprint {
        Some(cached) => Cow::Borrowed(cached.as_str()),
        None => Cow::Owned(generate(mcq)),
    }
}
