//! Two-column page layout for printable MCQ sheets.

use tracing::debug;

use crate::error::{CoreError, Result};
use crate::types::{MergedSection, PageContent, PageLayout, PageSettings, SheetEntry};

/// Partition an ordered entry sequence into fixed-capacity pages.
///
/// Without sections the whole list is one homogeneous run using the
/// default settings. With sections, each section consumes exactly its
/// `count` entries from the front of the remaining list and is laid
/// out with its own effective settings; page numbers are shifted so
/// global numbering stays continuous. The caller must supply entries
/// and section descriptors in matching order; a total-count mismatch
/// is a contract violation and returns an error.
///
/// Spacer entries occupy slots like any other element; rendering them
/// as empty is a downstream concern.
pub fn calculate_pages(
    entries: &[SheetEntry],
    defaults: &PageSettings,
    sections: Option<&[MergedSection]>,
) -> Result<PageLayout> {
    let pages = match sections {
        None => layout_run(entries, defaults, 0, None),
        Some(sections) => {
            let expected: usize = sections.iter().map(|s| s.count).sum();
            if expected != entries.len() {
                return Err(CoreError::SectionCountMismatch {
                    expected,
                    actual: entries.len(),
                });
            }

            let mut pages = Vec::new();
            let mut offset = 0;
            let mut cursor = 0;
            for section in sections {
                let slice = &entries[cursor..cursor + section.count];
                cursor += section.count;

                let mut run = layout_run(
                    slice,
                    section.effective_settings(defaults),
                    offset,
                    section.title.as_deref(),
                );
                offset += run.len();
                pages.append(&mut run);
            }
            pages
        }
    };

    let total_pages = pages.len();
    debug!(entries = entries.len(), total_pages, "layout finished");
    Ok(PageLayout { pages, total_pages })
}

/// Lay out one homogeneous run, numbering pages from `offset + 1`. The
/// first page of a titled run carries the title.
fn layout_run(
    entries: &[SheetEntry],
    settings: &PageSettings,
    offset: usize,
    title: Option<&str>,
) -> Vec<PageContent> {
    let per_column = settings.per_column.max(1);
    let capacity = per_column * 2;

    entries
        .chunks(capacity)
        .enumerate()
        .map(|(index, chunk)| {
            let split = chunk.len().min(per_column);
            PageContent {
                number: offset + index + 1,
                column1: chunk[..split].to_vec(),
                column2: chunk[split..].to_vec(),
                settings: settings.clone(),
                title: (index == 0).then(|| title.map(str::to_string)).flatten(),
            }
        })
        .collect()
}
