use std::collections::BTreeSet;

use tracing::{info, warn};

use super::footnotes::FootnoteTable;
use crate::model::{ProofText, Question};

pub const UNRESOLVED_REFERENCE: &str = "NOT FOUND";

#[derive(Debug, Clone, Default)]
pub struct BindReport {
    pub bound_clauses: usize,
    pub unmarked_clauses: usize,
    pub attached_proof_texts: usize,
    pub unresolved: Vec<u32>,
}

pub fn unresolved_proof_text(number: u32) -> ProofText {
    ProofText {
        reference: UNRESOLVED_REFERENCE.to_string(),
        text: format!("footnote {number} not found in footnote table"),
    }
}

pub fn bind_proof_texts(questions: &mut [Question], table: &FootnoteTable) -> BindReport {
    let mut report = BindReport::default();
    let mut unresolved = BTreeSet::new();

    for question in questions.iter_mut() {
        for clause in &mut question.clauses {
            let numbers = clause.footnote_numbers().collect::<Vec<u32>>();
            clause.proof_texts.clear();
            if numbers.is_empty() {
                report.unmarked_clauses += 1;
                continue;
            }

            report.bound_clauses += 1;
            for number in numbers {
                match table.get(number) {
                    Some(entry) => {
                        report.attached_proof_texts += entry.proof_texts.len();
                        clause.proof_texts.extend(entry.proof_texts.iter().cloned());
                    }
                    None => {
                        unresolved.insert(number);
                        clause.proof_texts.push(unresolved_proof_text(number));
                    }
                }
            }
        }
    }

    report.unresolved = unresolved.into_iter().collect();
    if !report.unresolved.is_empty() {
        warn!(unresolved = ?report.unresolved, "footnotes missing from table");
    }
    info!(
        bound_clauses = report.bound_clauses,
        proof_texts = report.attached_proof_texts,
        unresolved = report.unresolved.len(),
        "bound proof texts"
    );
    report
}
