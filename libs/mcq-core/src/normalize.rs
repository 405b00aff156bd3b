//! Text canonicalization used by fingerprinting and similarity checks.

use unicode_normalization::UnicodeNormalization;

const DEVANAGARI_ZERO: u32 = 0x0966;
const DEVANAGARI_NINE: u32 = 0x096F;

/// Punctuation removed before comparison. Includes the danda and double
/// danda sentence terminators, and the pipe so that it stays reserved
/// as the fingerprint field separator.
const STRIPPED_PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', '\'', '"', '(', ')', '[', ']', '{', '}', '-', '|', '।', '॥',
];

/// Canonical lowercase form of a string for equality and similarity
/// comparison.
///
/// Steps, in order: NFC composition, lowercasing, Devanagari digit
/// folding to ASCII, punctuation stripping, whitespace collapsing,
/// trimming. Idempotent: normalizing an already-normalized string
/// returns it unchanged.
pub fn normalize(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let composed: String = input.nfc().collect();
    let lowered = composed.to_lowercase();

    let mut cleaned = String::with_capacity(lowered.len());
    for ch in lowered.chars() {
        let ch = fold_digit(ch);
        if STRIPPED_PUNCTUATION.contains(&ch) {
            continue;
        }
        cleaned.push(ch);
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Map Devanagari digits to ASCII by fixed offset; other characters
/// pass through.
fn fold_digit(ch: char) -> char {
    let code = ch as u32;
    if (DEVANAGARI_ZERO..=DEVANAGARI_NINE).contains(&code) {
        (b'0' + (code - DEVANAGARI_ZERO) as u8) as char
    } else {
        ch
    }
}
