//! Document assembly: join per-page results under page headings.

use crate::output::{PageOutcome, PageResult};
use crate::prompts::{page_heading, page_placeholder};

/// Assemble the final Markdown document.
///
/// Every [`PageResult`] yields exactly one entry, in input order:
/// a `## Page N` heading, a blank line, then the model's text or the
/// blockquoted placeholder. Entries are separated by a blank line.
pub fn assemble(pages: &[PageResult]) -> String {
    pages
        .iter()
        .map(render_entry)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_entry(page: &PageResult) -> String {
    let heading = page_heading(page.page_num);
    match &page.outcome {
        PageOutcome::Success(markdown) => format!("{heading}\n\n{markdown}\n"),
        PageOutcome::Failed(_) => format!("{heading}\n\n> {}\n", page_placeholder(page.page_num)),
    }
}
