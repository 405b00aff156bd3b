//! Core types for the MCQ question bank.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label of one of the four options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    /// All labels in display order.
    pub const ALL: [OptionLabel; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// Position of this label in the options array.
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
        }
    }

    /// Create from array position.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::A),
            1 => Some(Self::B),
            2 => Some(Self::C),
            3 => Some(Self::D),
            _ => None,
        }
    }

    /// Parse from a single letter, case-insensitive.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            _ => None,
        }
    }

    /// Upper-case letter form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

/// A multiple-choice question record.
///
/// The identifier is opaque and caller-assigned; the parser assigns a
/// fresh UUID when creating records itself. The fingerprint is derived
/// data, cached at creation/edit time and recomputed whenever the
/// semantic fields change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mcq {
    pub id: String,
    pub question: String,
    /// Option texts indexed by `OptionLabel::index()`.
    pub options: [String; 4],
    pub answer: OptionLabel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Mcq {
    /// Create a record the way direct user entry does: fresh id,
    /// timestamp, and cached fingerprint.
    pub fn new(question: impl Into<String>, options: [String; 4], answer: OptionLabel) -> Self {
        let mut mcq = Self {
            id: uuid::Uuid::new_v4().to_string(),
            question: question.into(),
            options,
            answer,
            explanation: None,
            source: None,
            fingerprint: None,
            created_at: Some(Utc::now()),
        };
        mcq.fingerprint = Some(crate::fingerprint::generate(&mcq));
        mcq
    }

    /// Text of the option carrying the given label.
    pub fn option(&self, label: OptionLabel) -> &str {
        &self.options[label.index()]
    }

    /// Text of the correct option.
    pub fn answer_text(&self) -> &str {
        self.option(self.answer)
    }

    /// A record is valid when the question and all four options are
    /// non-empty. The answer is a label by construction.
    pub fn is_valid(&self) -> bool {
        !self.question.trim().is_empty() && self.options.iter().all(|o| !o.trim().is_empty())
    }
}

/// One slot in a printable sheet: real content, or a spacer that
/// occupies a layout slot without contributing a question. Spacers are
/// excluded from numbering, fingerprinting, and deduplication by
/// construction, since those operate on `Mcq` directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SheetEntry {
    Content(Mcq),
    Spacer,
}

impl SheetEntry {
    pub fn as_mcq(&self) -> Option<&Mcq> {
        match self {
            Self::Content(mcq) => Some(mcq),
            Self::Spacer => None,
        }
    }

    pub fn is_spacer(&self) -> bool {
        matches!(self, Self::Spacer)
    }
}

impl From<Mcq> for SheetEntry {
    fn from(mcq: Mcq) -> Self {
        Self::Content(mcq)
    }
}

/// A parsed block that failed validation. Not an error: pasted source
/// material is rarely machine-perfect, so rejects are data the caller
/// reviews and corrects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidFragment {
    pub text: String,
    pub line_number: usize,
    pub reason: String,
    pub missing_fields: Vec<String>,
}

/// Outcome of parsing one pasted blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseReport {
    /// Valid records surviving in-batch deduplication, in input order.
    pub records: Vec<Mcq>,
    /// Blocks that failed validation.
    pub invalid: Vec<InvalidFragment>,
    /// Valid records rejected as in-batch duplicates.
    pub duplicates: Vec<Mcq>,
    /// Valid + invalid count, before in-batch deduplication.
    pub found: usize,
}

/// Formatting settings for page layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSettings {
    /// Records per column; a page holds `2 * per_column`.
    pub per_column: usize,
    /// User-facing font step, mapped affinely to pixels.
    pub font_step: i32,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            per_column: 5,
            font_step: 8,
        }
    }
}

impl PageSettings {
    /// Rendering font size derived from the user-facing step.
    pub fn font_size_px(&self) -> f64 {
        8.0 + self.font_step as f64 * 0.25
    }
}

/// A contiguous run of the merged collection belonging to one source
/// document, with its own optional settings override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedSection {
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<PageSettings>,
}

impl MergedSection {
    /// Section settings, falling back to the supplied defaults.
    pub fn effective_settings<'a>(&'a self, defaults: &'a PageSettings) -> &'a PageSettings {
        self.settings.as_ref().unwrap_or(defaults)
    }
}

/// One laid-out page. Renderers must use this page's own `settings`,
/// never a single global value, since sections may override formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContent {
    /// 1-based, globally continuous across sections.
    pub number: usize,
    pub column1: Vec<SheetEntry>,
    pub column2: Vec<SheetEntry>,
    pub settings: PageSettings,
    /// Set on the first page of a titled section.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Full layout result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLayout {
    pub pages: Vec<PageContent>,
    pub total_pages: usize,
}

/// Shuffle modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShuffleMode {
    /// Record order only.
    Simple,
    /// Each record's options only, order preserved.
    Options,
    /// Order, then every record's options.
    Full,
    /// Order within section boundaries only.
    Sections,
}

impl ShuffleMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Options => "options",
            Self::Full => "full",
            Self::Sections => "sections",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "simple" => Some(Self::Simple),
            "options" => Some(Self::Options),
            "full" => Some(Self::Full),
            "sections" => Some(Self::Sections),
            _ => None,
        }
    }
}
