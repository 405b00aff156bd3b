//! Deterministic seeded shuffling of records and their options.
//!
//! The seeded path must produce the same sequence for the same seed on
//! every platform, so the generator is a fixed 32-bit mixing scheme
//! rather than anything from `rand`; `rand` only feeds the unseeded
//! entropy path.

use tracing::debug;

use crate::error::{CoreError, Result};
use crate::fingerprint;
use crate::layout::calculate_pages;
use crate::types::{Mcq, MergedSection, OptionLabel, PageSettings, SheetEntry, ShuffleMode};

/// Reduce an arbitrary seed string to an integer in `[0, 2^53)`.
///
/// Two interleaved 32-bit accumulators with large odd multiplicative
/// constants, cross-mixed in two finalization rounds.
pub fn hash_seed(seed: &str, salt: u32) -> u64 {
    let mut h1: u32 = 0xDEAD_BEEF ^ salt;
    let mut h2: u32 = 0x41C6_CE57 ^ salt;

    for ch in seed.chars() {
        let code = ch as u32;
        h1 = (h1 ^ code).wrapping_mul(2_654_435_761);
        h2 = (h2 ^ code).wrapping_mul(1_597_334_677);
    }

    h1 = (h1 ^ (h1 >> 16)).wrapping_mul(2_246_822_507)
        ^ (h2 ^ (h2 >> 13)).wrapping_mul(3_266_489_909);
    h2 = (h2 ^ (h2 >> 16)).wrapping_mul(2_246_822_507)
        ^ (h1 ^ (h1 >> 13)).wrapping_mul(3_266_489_909);

    (((h2 & 0x001F_FFFF) as u64) << 32) | h1 as u64
}

/// Small deterministic generator over 32-bit state. Each call advances
/// the state by a fixed odd increment and applies two xor-shift and
/// multiply mixing rounds.
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    /// Deterministic initialization from a seed string.
    pub fn from_seed(seed: &str) -> Self {
        Self {
            state: hash_seed(seed, 0) as u32,
        }
    }

    /// Non-deterministic initialization.
    pub fn from_entropy() -> Self {
        Self {
            state: rand::random(),
        }
    }

    /// Next value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        (t ^ (t >> 14)) as f64 / 4_294_967_296.0
    }
}

/// Fisher-Yates shuffle into a new list; the input stays untouched.
pub fn shuffle_entries<T: Clone>(items: &[T], rng: &mut SeededRng) -> Vec<T> {
    let mut shuffled = items.to_vec();
    for i in (1..shuffled.len()).rev() {
        let j = (rng.next_f64() * (i as f64 + 1.0)) as usize;
        shuffled.swap(i, j);
    }
    shuffled
}

/// Shuffle the four (label, text) option pairs of one record and
/// re-derive the answer label from the correct pair's new position.
/// The correct option's text never changes, only its label.
pub fn shuffle_options(mcq: &Mcq, rng: &mut SeededRng) -> Result<Mcq> {
    if mcq.options.iter().any(|o| o.trim().is_empty()) {
        return Err(CoreError::UnresolvableOptions { id: mcq.id.clone() });
    }

    let pairs: Vec<(OptionLabel, String)> = OptionLabel::ALL
        .into_iter()
        .zip(mcq.options.iter().cloned())
        .collect();
    let pairs = shuffle_entries(&pairs, rng);

    let mut shuffled = mcq.clone();
    let mut answer = mcq.answer;
    for (slot, (original_label, text)) in OptionLabel::ALL.into_iter().zip(pairs) {
        if original_label == mcq.answer {
            answer = slot;
        }
        shuffled.options[slot.index()] = text;
    }
    shuffled.answer = answer;
    // Option order is a semantic field, so the cached key must follow.
    shuffled.fingerprint = Some(fingerprint::generate(&shuffled));
    Ok(shuffled)
}

/// Shuffle a sheet according to the requested mode.
///
/// A non-empty seed makes the result reproducible; otherwise the
/// generator starts from entropy. `Sections` needs `settings` to
/// compute page boundaries and falls back to `Simple` without them.
pub fn perform_shuffle(
    entries: &[SheetEntry],
    mode: ShuffleMode,
    seed: Option<&str>,
    settings: Option<&PageSettings>,
    sections: Option<&[MergedSection]>,
) -> Result<Vec<SheetEntry>> {
    let mut rng = match seed {
        Some(seed) if !seed.is_empty() => SeededRng::from_seed(seed),
        _ => SeededRng::from_entropy(),
    };
    debug!(mode = mode.as_str(), seeded = seed.is_some(), "shuffling");

    match mode {
        ShuffleMode::Simple => Ok(shuffle_entries(entries, &mut rng)),
        ShuffleMode::Options => shuffle_all_options(entries, &mut rng),
        ShuffleMode::Full => {
            let reordered = shuffle_entries(entries, &mut rng);
            shuffle_all_options(&reordered, &mut rng)
        }
        ShuffleMode::Sections => match settings {
            None => Ok(shuffle_entries(entries, &mut rng)),
            Some(settings) => shuffle_within_sections(entries, settings, sections, &mut rng),
        },
    }
}

fn shuffle_all_options(entries: &[SheetEntry], rng: &mut SeededRng) -> Result<Vec<SheetEntry>> {
    entries
        .iter()
        .map(|entry| match entry {
            SheetEntry::Content(mcq) => shuffle_options(mcq, rng).map(SheetEntry::Content),
            SheetEntry::Spacer => Ok(SheetEntry::Spacer),
        })
        .collect()
}

/// Group entries by contiguous page-title boundaries: a page carrying
/// a title starts a new group, untitled pages continue the current one
/// (the first group is implicit when the first page has no title).
/// Each group is shuffled independently and the groups concatenate in
/// original order.
fn shuffle_within_sections(
    entries: &[SheetEntry],
    settings: &PageSettings,
    sections: Option<&[MergedSection]>,
    rng: &mut SeededRng,
) -> Result<Vec<SheetEntry>> {
    let layout = calculate_pages(entries, settings, sections)?;

    let mut groups: Vec<Vec<SheetEntry>> = Vec::new();
    for page in &layout.pages {
        if page.title.is_some() || groups.is_empty() {
            groups.push(Vec::new());
        }
        if let Some(group) = groups.last_mut() {
            group.extend(page.column1.iter().cloned());
            group.extend(page.column2.iter().cloned());
        }
    }

    let mut result = Vec::with_capacity(entries.len());
    for group in groups {
        result.extend(shuffle_entries(&group, rng));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(question: &str) -> Mcq {
        Mcq::new(
            question,
            ["alpha", "beta", "gamma", "delta"].map(str::to_string),
            OptionLabel::C,
        )
    }

    fn sheet(n: usize) -> Vec<SheetEntry> {
        (0..n)
            .map(|i| SheetEntry::Content(record(&format!("question {i}"))))
            .collect()
    }

    fn questions(entries: &[SheetEntry]) -> Vec<String> {
        entries
            .iter()
            .filter_map(|e| e.as_mcq().map(|m| m.question.clone()))
            .collect()
    }

    #[test]
    fn hash_is_stable_and_salted() {
        assert_eq!(hash_seed("seed-X", 0), hash_seed("seed-X", 0));
        assert_ne!(hash_seed("seed-X", 0), hash_seed("seed-Y", 0));
        assert_ne!(hash_seed("seed-X", 0), hash_seed("seed-X", 1));
        assert!(hash_seed("", 0) < (1 << 53));
    }

    #[test]
    fn rng_sequence_is_reproducible_and_in_range() {
        let mut a = SeededRng::from_seed("seed");
        let mut b = SeededRng::from_seed("seed");
        for _ in 0..100 {
            let x = a.next_f64();
            assert_eq!(x, b.next_f64());
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = SeededRng::from_seed("seed-1");
        let mut b = SeededRng::from_seed("seed-2");
        let seq_a: Vec<f64> = (0..8).map(|_| a.next_f64()).collect();
        let seq_b: Vec<f64> = (0..8).map(|_| b.next_f64()).collect();
        assert_ne!(seq_a, seq_b);
    }

    #[test]
    fn shuffle_is_a_permutation_and_leaves_input_untouched() {
        let input = sheet(12);
        let before = questions(&input);
        let mut rng = SeededRng::from_seed("seed");
        let shuffled = shuffle_entries(&input, &mut rng);

        assert_eq!(questions(&input), before);
        let mut expected = before.clone();
        let mut actual = questions(&shuffled);
        expected.sort();
        actual.sort();
        assert_eq!(expected, actual);
    }

    #[test]
    fn option_shuffle_preserves_correct_text() {
        let mcq = record("Pick gamma");
        let correct_before = mcq.answer_text().to_string();
        let mut rng = SeededRng::from_seed("options-seed");

        for _ in 0..20 {
            let shuffled = shuffle_options(&mcq, &mut rng).unwrap();
            assert_eq!(shuffled.answer_text(), correct_before);
            let mut sorted = shuffled.options.clone().to_vec();
            sorted.sort();
            assert_eq!(sorted, ["alpha", "beta", "delta", "gamma"]);
        }
    }

    #[test]
    fn option_shuffle_rejects_empty_options() {
        let mut mcq = record("Broken");
        mcq.options[3] = String::new();
        let mut rng = SeededRng::from_seed("seed");
        assert!(matches!(
            shuffle_options(&mcq, &mut rng),
            Err(CoreError::UnresolvableOptions { .. })
        ));
    }

    #[test]
    fn full_shuffle_is_reproducible() {
        let input = sheet(10);
        let once = perform_shuffle(&input, ShuffleMode::Full, Some("seed-X"), None, None).unwrap();
        let twice = perform_shuffle(&input, ShuffleMode::Full, Some("seed-X"), None, None).unwrap();
        assert_eq!(questions(&once), questions(&twice));
        assert_eq!(
            serde_json::to_string(&once).unwrap(),
            serde_json::to_string(&twice).unwrap()
        );

        let other = perform_shuffle(&input, ShuffleMode::Full, Some("seed-Y"), None, None).unwrap();
        assert_ne!(questions(&once), questions(&other));
    }

    #[test]
    fn options_mode_preserves_record_order() {
        let input = sheet(6);
        let shuffled =
            perform_shuffle(&input, ShuffleMode::Options, Some("seed"), None, None).unwrap();
        assert_eq!(questions(&input), questions(&shuffled));
    }

    #[test]
    fn spacers_pass_through_option_shuffles() {
        let mut input = sheet(3);
        input.push(SheetEntry::Spacer);
        let shuffled =
            perform_shuffle(&input, ShuffleMode::Options, Some("seed"), None, None).unwrap();
        assert!(shuffled[3].is_spacer());
    }

    #[test]
    fn section_shuffle_stays_within_boundaries() {
        let input = sheet(8);
        let sections = vec![
            MergedSection {
                count: 4,
                title: Some("One".to_string()),
                settings: None,
            },
            MergedSection {
                count: 4,
                title: Some("Two".to_string()),
                settings: None,
            },
        ];
        let settings = PageSettings::default();

        let shuffled = perform_shuffle(
            &input,
            ShuffleMode::Sections,
            Some("seed"),
            Some(&settings),
            Some(&sections),
        )
        .unwrap();

        let first: Vec<String> = questions(&shuffled[..4]);
        let second: Vec<String> = questions(&shuffled[4..]);
        let mut expected_first = questions(&input[..4]);
        let mut expected_second = questions(&input[4..]);
        let mut first_sorted = first.clone();
        let mut second_sorted = second.clone();
        expected_first.sort();
        expected_second.sort();
        first_sorted.sort();
        second_sorted.sort();
        assert_eq!(first_sorted, expected_first);
        assert_eq!(second_sorted, expected_second);
    }

    #[test]
    fn section_mode_without_settings_falls_back_to_simple() {
        let input = sheet(6);
        let with_sections =
            perform_shuffle(&input, ShuffleMode::Sections, Some("seed"), None, None).unwrap();
        let simple = perform_shuffle(&input, ShuffleMode::Simple, Some("seed"), None, None).unwrap();
        assert_eq!(questions(&with_sections), questions(&simple));
    }

    #[test]
    fn empty_list_shuffles_to_empty() {
        let shuffled =
            perform_shuffle(&[], ShuffleMode::Full, Some("seed"), None, None).unwrap();
        assert!(shuffled.is_empty());
    }
}
