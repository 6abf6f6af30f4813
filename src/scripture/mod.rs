mod books;
mod rate_limit;
mod reference;
mod store;

pub use rate_limit::RequestWindow;
pub use reference::ReferenceParser;
pub use store::{BibleApi, KjvDataset, VerseSource, VerseStore, is_placeholder};

use tracing::info;

use crate::extract::UNRESOLVED_REFERENCE;
use crate::model::{Document, ProofText};

#[derive(Debug, Clone, Default)]
pub struct FillReport {
    pub filled: usize,
    pub kept: usize,
    pub skipped_unresolved: usize,
    pub placeholders: usize,
}

pub fn fill_proof_texts(document: &mut Document, store: &mut VerseStore, overwrite: bool) -> FillReport {
    let mut report = FillReport::default();

    let clause_proofs = document
        .questions
        .iter_mut()
        .flat_map(|question| question.clauses.iter_mut())
        .flat_map(|clause| clause.proof_texts.iter_mut());
    let footnote_proofs = document
        .footnotes
        .iter_mut()
        .flat_map(|entry| entry.proof_texts.iter_mut());

    for proof in clause_proofs.chain(footnote_proofs) {
        fill_one(proof, store, overwrite, &mut report);
    }

    info!(
        source = store.source_name(),
        filled = report.filled,
        kept = report.kept,
        placeholders = report.placeholders,
        "filled proof texts"
    );
    report
}

fn fill_one(proof: &mut ProofText, store: &mut VerseStore, overwrite: bool, report: &mut FillReport) {
    if proof.reference == UNRESOLVED_REFERENCE {
        report.skipped_unresolved += 1;
        return;
    }
    if !overwrite && !proof.text.trim().is_empty() && !is_placeholder(&proof.text) {
        report.kept += 1;
        return;
    }

    proof.text = store.passage_text(&proof.reference);
    if proof.text.split(" | ").any(is_placeholder) {
        report.placeholders += 1;
    }
    report.filled += 1;
}
