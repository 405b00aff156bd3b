//! Format A parser: freeform pasted MCQ text to structured records.
//!
//! # Format
//! ```text
//! 1. <question text, may span lines until options begin>
//! A) <option A> B) <option B> C) <option C> D) <option D>
//! Answer: A
//! Explanation: <optional, may span lines>
//! Source: <optional single line>
//!
//! 2. <next question...>
//! ```
//!
//! The scanner favors tolerance over strictness: options may be spread
//! across several lines, questions and explanations may span lines, and
//! the `Answer`/`Exp`/`Source` keywords are case-insensitive. Blocks
//! that fail validation come back as [`InvalidFragment`] data, never as
//! errors.
//!
//! Known limitation: an option whose own text contains a literal `"X)"`
//! substring (say a sub-list "a) ... b) ...") mis-segments, because the
//! per-label extraction treats every later-label marker as a boundary.
//! Fixing this is a format decision, not a parsing bug, so the behavior
//! is kept and documented.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use uuid::Uuid;

use crate::dedup;
use crate::fingerprint;
use crate::types::{InvalidFragment, Mcq, OptionLabel, ParseReport};

static RE_QUESTION_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\s+(.*)$").expect("question regex"));
static RE_ANSWER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:answer|ans)\s*:\s*([a-d])\b").expect("answer regex"));
static RE_EXPLANATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:explanation|exp)\s*:\s*(.*)$").expect("explanation regex"));
static RE_SOURCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*source\s*:\s*(.*)$").expect("source regex"));

/// Option markers are case-sensitive as written.
const OPTION_MARKERS: [&str; 4] = ["A)", "B)", "C)", "D)"];

/// Parse one pasted blob into a report of unique records, invalid
/// fragments, and in-batch duplicates.
pub fn parse(content: &str) -> ParseReport {
    let mut scanner = Scanner::new();
    for (idx, line) in content.lines().enumerate() {
        scanner.process_line(line, idx + 1);
    }
    scanner.finish()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    /// Outside any record; lines here are noise.
    Idle,
    /// Inside a record, accumulating question/options/answer.
    InQuestion,
    /// Inside a multi-line explanation.
    InExplanation,
}

/// Accumulator for the record currently being scanned.
struct Draft {
    start_line: usize,
    question_lines: Vec<String>,
    options: [Option<String>; 4],
    answer: Option<OptionLabel>,
    explanation_lines: Vec<String>,
    source: Option<String>,
    raw_lines: Vec<String>,
}

impl Draft {
    fn new(start_line: usize) -> Self {
        Self {
            start_line,
            question_lines: Vec::new(),
            options: [None, None, None, None],
            answer: None,
            explanation_lines: Vec::new(),
            source: None,
            raw_lines: Vec::new(),
        }
    }

    fn has_any_option(&self) -> bool {
        self.options.iter().any(Option::is_some)
    }

    /// Validate the accumulated block. `None` for pure-whitespace noise.
    fn finish(self) -> Option<DraftOutcome> {
        let raw = self.raw_lines.join("\n");
        if raw.trim().is_empty() {
            return None;
        }

        let question = self.question_lines.join("\n").trim().to_string();

        let mut missing: Vec<String> = Vec::new();
        if question.is_empty() {
            missing.push("question".to_string());
        }
        for (label, option) in OptionLabel::ALL.iter().zip(&self.options) {
            let present = option.as_ref().is_some_and(|text| !text.trim().is_empty());
            if !present {
                missing.push(format!("option_{}", label.as_str().to_lowercase()));
            }
        }
        if self.answer.is_none() {
            missing.push("answer".to_string());
        }

        if !missing.is_empty() {
            return Some(DraftOutcome::Invalid(InvalidFragment {
                text: raw,
                line_number: self.start_line,
                reason: format!("missing or invalid fields: {}", missing.join(", ")),
                missing_fields: missing,
            }));
        }

        let explanation = {
            let text = self.explanation_lines.join("\n").trim().to_string();
            (!text.is_empty()).then_some(text)
        };
        let answer = self.answer?;

        let mut mcq = Mcq {
            id: Uuid::new_v4().to_string(),
            question,
            options: self.options.map(Option::unwrap_or_default),
            answer,
            explanation,
            source: self.source.filter(|s| !s.is_empty()),
            fingerprint: None,
            created_at: Some(Utc::now()),
        };
        mcq.fingerprint = Some(fingerprint::generate(&mcq));
        Some(DraftOutcome::Valid(mcq))
    }
}

enum DraftOutcome {
    Valid(Mcq),
    Invalid(InvalidFragment),
}

struct Scanner {
    state: State,
    draft: Option<Draft>,
    valid: Vec<Mcq>,
    invalid: Vec<InvalidFragment>,
}

impl Scanner {
    fn new() -> Self {
        Self {
            state: State::Idle,
            draft: None,
            valid: Vec::new(),
            invalid: Vec::new(),
        }
    }

    fn process_line(&mut self, line: &str, line_number: usize) {
        // A question start wins in every state and finalizes the record
        // in progress. The numeric prefix is positional, not semantic;
        // records are renumbered at render time.
        if let Some(caps) = RE_QUESTION_START.captures(line) {
            self.finalize_draft();
            let mut draft = Draft::new(line_number);
            draft.question_lines.push(caps[1].trim().to_string());
            draft.raw_lines.push(line.to_string());
            self.draft = Some(draft);
            self.state = State::InQuestion;
            return;
        }

        match self.state {
            State::Idle => {} // noise before the first record
            State::InExplanation => self.process_explanation_line(line),
            State::InQuestion => self.process_record_line(line),
        }
    }

    /// Explanation continuation stops only at blank lines, new question
    /// starts (handled above), or `Source:` lines. Everything else,
    /// keyword-looking or not, is explanation text.
    fn process_explanation_line(&mut self, line: &str) {
        let Some(draft) = self.draft.as_mut() else {
            self.state = State::Idle;
            return;
        };

        if line.trim().is_empty() {
            self.state = State::InQuestion;
        } else if let Some(caps) = RE_SOURCE.captures(line) {
            draft.source = Some(caps[1].trim().to_string());
            draft.raw_lines.push(line.to_string());
            self.state = State::InQuestion;
        } else {
            draft.explanation_lines.push(line.trim().to_string());
            draft.raw_lines.push(line.to_string());
        }
    }

    fn process_record_line(&mut self, line: &str) {
        let Some(draft) = self.draft.as_mut() else {
            self.state = State::Idle;
            return;
        };

        if line.trim().is_empty() {
            return;
        }
        draft.raw_lines.push(line.to_string());

        if let Some(caps) = RE_ANSWER.captures(line) {
            draft.answer = caps[1].chars().next().and_then(OptionLabel::from_char);
        } else if let Some(caps) = RE_EXPLANATION.captures(line) {
            let rest = caps[1].trim();
            if !rest.is_empty() {
                draft.explanation_lines.push(rest.to_string());
            }
            self.state = State::InExplanation;
        } else if let Some(caps) = RE_SOURCE.captures(line) {
            draft.source = Some(caps[1].trim().to_string());
        } else if extract_options(line, &mut draft.options) {
            // handled in place; later option lines overwrite or fill
            // only the labels they carry
        } else if !draft.has_any_option() && draft.answer.is_none() {
            // multi-line question text, before options begin
            draft.question_lines.push(line.trim().to_string());
        }
        // anything else after options/answer is noise kept only in the
        // raw text
    }

    fn finalize_draft(&mut self) {
        if let Some(outcome) = self.draft.take().and_then(Draft::finish) {
            match outcome {
                DraftOutcome::Valid(mcq) => self.valid.push(mcq),
                DraftOutcome::Invalid(fragment) => self.invalid.push(fragment),
            }
        }
    }

    fn finish(mut self) -> ParseReport {
        self.finalize_draft();

        let found = self.valid.len() + self.invalid.len();
        let batch = dedup::find_duplicates_in_batch(self.valid);
        debug!(
            found,
            unique = batch.unique.len(),
            invalid = self.invalid.len(),
            "parse finished"
        );

        ParseReport {
            records: batch.unique,
            invalid: self.invalid,
            duplicates: batch.duplicates,
            found,
        }
    }
}

/// Fill `options` from a line carrying one or more `X)` markers. For
/// each label present, the text runs from its marker to the first
/// occurrence of any later label's marker, or to end of line. Returns
/// whether any marker was found.
fn extract_options(line: &str, options: &mut [Option<String>; 4]) -> bool {
    let mut any = false;
    for (index, marker) in OPTION_MARKERS.iter().enumerate() {
        let Some(start) = line.find(marker) else {
            continue;
        };
        any = true;

        let rest = &line[start + marker.len()..];
        let mut end = rest.len();
        for later in &OPTION_MARKERS[index + 1..] {
            if let Some(pos) = rest.find(later) {
                end = end.min(pos);
            }
        }
        options[index] = Some(rest[..end].trim().to_string());
    }
    any
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_single_record() {
        let report = parse("1. What is 2+2?\nA) 3 B) 4 C) 5 D) 6\nAnswer: B\n");
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.found, 1);

        let mcq = &report.records[0];
        assert_eq!(mcq.question, "What is 2+2?");
        assert_eq!(mcq.options, ["3", "4", "5", "6"].map(str::to_string));
        assert_eq!(mcq.answer, OptionLabel::B);
        assert!(mcq.fingerprint.is_some());
        assert!(mcq.created_at.is_some());
    }

    #[test]
    fn numeric_prefix_is_discarded() {
        let report = parse("42. Any question here\nA) a B) b C) c D) d\nAnswer: A\n");
        assert_eq!(report.records[0].question, "Any question here");
    }

    #[test]
    fn options_may_split_across_lines() {
        let input = "1. Capital of Nepal?\nA) Kathmandu B) Pokhara\nC) Lalitpur D) Bhaktapur\nAnswer: A\n";
        let report = parse(input);
        assert_eq!(
            report.records[0].options,
            ["Kathmandu", "Pokhara", "Lalitpur", "Bhaktapur"].map(str::to_string)
        );
    }

    #[test]
    fn later_option_lines_overwrite_labels_they_carry() {
        let input = "1. Pick one\nA) first B) second C) third D) fourth\nB) corrected\nAnswer: B\n";
        let report = parse(input);
        assert_eq!(report.records[0].options[1], "corrected");
        assert_eq!(report.records[0].options[0], "first");
    }

    #[test]
    fn multi_line_question_accumulates() {
        let input = "1. A question that\ncontinues on the next line\nA) w B) x C) y D) z\nAnswer: D\n";
        let report = parse(input);
        assert_eq!(
            report.records[0].question,
            "A question that\ncontinues on the next line"
        );
    }

    #[test]
    fn answer_keyword_is_case_insensitive_and_letter_uppercased() {
        let report = parse("1. Q text here\nA) 1 B) 2 C) 3 D) 4\nans: c\n");
        assert_eq!(report.records[0].answer, OptionLabel::C);
    }

    #[test]
    fn explanation_spans_lines_until_source() {
        let input = "1. Q text\nA) 1 B) 2 C) 3 D) 4\nAnswer: A\nExp: first line\nsecond line\nSource: Old paper\n";
        let report = parse(input);
        let mcq = &report.records[0];
        assert_eq!(mcq.explanation.as_deref(), Some("first line\nsecond line"));
        assert_eq!(mcq.source.as_deref(), Some("Old paper"));
    }

    #[test]
    fn explanation_swallows_answer_looking_lines() {
        let input =
            "1. Q text\nA) 1 B) 2 C) 3 D) 4\nAnswer: A\nExplanation: because\nAnswer: D is wrong\n";
        let report = parse(input);
        let mcq = &report.records[0];
        assert_eq!(mcq.answer, OptionLabel::A);
        assert_eq!(
            mcq.explanation.as_deref(),
            Some("because\nAnswer: D is wrong")
        );
    }

    #[test]
    fn blank_line_ends_explanation() {
        let input = "1. Q text\nA) 1 B) 2 C) 3 D) 4\nExplanation: why it holds\n\nAnswer: B\n";
        let report = parse(input);
        let mcq = &report.records[0];
        assert_eq!(mcq.explanation.as_deref(), Some("why it holds"));
        assert_eq!(mcq.answer, OptionLabel::B);
    }

    #[test]
    fn missing_fields_become_invalid_fragment() {
        let report = parse("1. Only a question line\n");
        assert!(report.records.is_empty());
        assert_eq!(report.invalid.len(), 1);
        assert_eq!(report.found, 1);

        let fragment = &report.invalid[0];
        assert_eq!(fragment.line_number, 1);
        assert!(fragment.missing_fields.contains(&"option_a".to_string()));
        assert!(fragment.missing_fields.contains(&"answer".to_string()));
        assert!(!fragment.missing_fields.contains(&"question".to_string()));
    }

    #[test]
    fn partial_options_are_reported_by_name() {
        let report = parse("1. Q text\nA) yes C) maybe\nAnswer: A\n");
        let fragment = &report.invalid[0];
        assert_eq!(
            fragment.missing_fields,
            vec!["option_b".to_string(), "option_d".to_string()]
        );
    }

    #[test]
    fn empty_and_whitespace_input_yield_empty_report() {
        for input in ["", "   \n\n  \t\n"] {
            let report = parse(input);
            assert!(report.records.is_empty());
            assert!(report.invalid.is_empty());
            assert!(report.duplicates.is_empty());
            assert_eq!(report.found, 0);
        }
    }

    #[test]
    fn noise_before_first_record_is_dropped() {
        let input = "Pasted from somewhere\n\n1. Real question\nA) 1 B) 2 C) 3 D) 4\nAnswer: A\n";
        let report = parse(input);
        assert_eq!(report.records.len(), 1);
        assert!(report.invalid.is_empty());
    }

    #[test]
    fn repeated_input_yields_in_batch_duplicate() {
        let block = "1. What is 2+2?\nA) 3 B) 4 C) 5 D) 6\nAnswer: B\n";
        let doubled = format!("{block}\n2. What is 2+2?\nA) 3 B) 4 C) 5 D) 6\nAnswer: B\n");
        let report = parse(&doubled);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.duplicates.len(), 1);
        assert_eq!(report.found, 2);
    }

    #[test]
    fn multiple_records_with_blank_separators() {
        let input = "1. First one here\nA) 1 B) 2 C) 3 D) 4\nAnswer: A\n\n\n2. Second one here\nA) 5 B) 6 C) 7 D) 8\nAnswer: D\n";
        let report = parse(input);
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[1].answer, OptionLabel::D);
    }

    #[test]
    fn option_text_containing_marker_missegments() {
        // Known limitation: the "C)" inside option B's text acts as a
        // boundary.
        let input = "1. Q text\nA) plain B) list with C) inside D) last\nAnswer: A\n";
        let report = parse(input);
        let mcq = &report.records[0];
        assert_eq!(mcq.options[1], "list with");
        assert_eq!(mcq.options[2], "inside");
    }
}
