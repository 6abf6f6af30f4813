mod bind;
mod classify;
mod footnotes;
mod items;
mod layout;
mod segment;
mod spans;
mod verify;

pub use bind::{BindReport, UNRESOLVED_REFERENCE, bind_proof_texts};
pub use classify::{
    Calibration, FontThresholdClassifier, LabelCounts, TokenClassifier, calibrate, count_labels,
    font_histogram,
};
pub use footnotes::FootnoteTable;
pub use items::parse_item_number;
pub use segment::{StreamItem, TrailingText, segment_clauses};
pub use spans::{PageLimits, Token, load_pdf_tokens, load_span_dump};
pub use verify::{Expectations, IntegrityCheck, IntegrityReport, verify_document};

use anyhow::Result;
use tracing::info;

use crate::model::{Document, Question};
use crate::profile::SourceProfile;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    pub trailing_text: TrailingText,
    pub expected_footnotes: Option<u32>,
}

#[derive(Debug)]
pub struct Extraction {
    pub document: Document,
    pub table: FootnoteTable,
    pub bind_report: BindReport,
    pub integrity: IntegrityReport,
    pub body_labels: LabelCounts,
    pub footnote_labels: LabelCounts,
}

impl Expectations {
    pub fn for_profile(profile: &SourceProfile, expected_footnotes: Option<u32>) -> Self {
        Self {
            items: profile.expected_items,
            chapters: profile.expected_chapters,
            footnotes: expected_footnotes.or(profile.expected_footnotes),
        }
    }
}

pub fn extract_document(
    tokens: &[Token],
    profile: &SourceProfile,
    body_classifier: &dyn TokenClassifier,
    footnote_classifier: &dyn TokenClassifier,
    options: &ExtractOptions,
) -> Result<Extraction> {
    let labeled = body_classifier.label_all(tokens);
    let regions = layout::split_regions(&labeled, profile)?;

    let body_tokens = &labeled[..regions.body_end];
    let footnote_tokens = match regions.footnote_start {
        Some(start) => footnote_classifier.label_all(&tokens[start..]),
        None => Vec::new(),
    };

    let body = layout::assemble_body_stream(body_tokens, profile);
    let drafts = items::split_items(&body, profile)?;
    let numbering = items::item_numbering(profile.kind, &drafts);

    let mut questions = drafts
        .into_iter()
        .zip(numbering)
        .map(|(draft, (number, section))| Question {
            number,
            question: draft.prompt,
            clauses: segment_clauses(&draft.stream, options.trailing_text),
            answer: draft.answer,
            chapter: draft.chapter,
            section,
        })
        .collect::<Vec<Question>>();

    let table = footnotes::build_footnote_table(&footnote_tokens, profile.line_tolerance);
    let bind_report = bind_proof_texts(&mut questions, &table);

    let document = Document {
        title: profile.title.clone(),
        kind: profile.kind,
        questions,
        footnotes: table.to_entries(),
    };

    let integrity = verify_document(
        &document,
        &table,
        &Expectations::for_profile(profile, options.expected_footnotes),
    );

    info!(
        questions = document.questions.len(),
        footnotes = table.len(),
        failed_checks = integrity.summary.failed,
        "extracted document"
    );

    Ok(Extraction {
        document,
        table,
        bind_report,
        integrity,
        body_labels: count_labels(body_tokens),
        footnote_labels: count_labels(&footnote_tokens),
    })
}

#[cfg(test)]
mod tests;
