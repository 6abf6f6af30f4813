use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::footnotes::FootnoteTable;
use crate::model::{Document, DocumentKind};
use crate::util::truncate_for_display;

const MISMATCH_DISPLAY_CHARS: usize = 120;

#[derive(Debug, Clone, Copy, Default)]
pub struct Expectations {
    pub items: Option<usize>,
    pub chapters: Option<usize>,
    pub footnotes: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntegrityCheck {
    pub check_id: String,
    pub name: String,
    pub result: String,
    pub details: Vec<String>,
}

impl IntegrityCheck {
    fn new(check_id: &str, name: &str, details: Vec<String>, passed: bool) -> Self {
        Self {
            check_id: check_id.to_string(),
            name: name.to_string(),
            result: if passed { "pass" } else { "failed" }.to_string(),
            details,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IntegritySummary {
    pub total_checks: usize,
    pub passed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    pub summary: IntegritySummary,
    pub checks: Vec<IntegrityCheck>,
    pub warnings: Vec<String>,
}

impl IntegrityReport {
    pub fn failed(&self) -> Vec<&IntegrityCheck> {
        self.checks
            .iter()
            .filter(|check| check.result == "failed")
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.summary.failed == 0
    }
}

pub fn verify_document(
    document: &Document,
    table: &FootnoteTable,
    expectations: &Expectations,
) -> IntegrityReport {
    let checks = vec![
        count_check(document, expectations),
        coverage_check(document, table),
        numbering_check(table, expectations.footnotes),
        round_trip_check(document),
    ];

    let passed = checks.iter().filter(|check| check.result == "pass").count();
    IntegrityReport {
        summary: IntegritySummary {
            total_checks: checks.len(),
            passed,
            failed: checks.len() - passed,
        },
        checks,
        warnings: collect_warnings(document),
    }
}

fn count_check(document: &Document, expectations: &Expectations) -> IntegrityCheck {
    let mut details = Vec::new();
    let mut passed = true;

    let (label, actual, expected) = match document.kind {
        DocumentKind::Confession => {
            let chapters = document
                .questions
                .iter()
                .filter_map(|question| question.chapter)
                .collect::<BTreeSet<u32>>();
            ("chapters", chapters.len(), expectations.chapters)
        }
        DocumentKind::ShorterCatechism | DocumentKind::LargerCatechism => {
            ("questions", document.questions.len(), expectations.items)
        }
    };

    match expected {
        Some(expected) if expected != actual => {
            passed = false;
            details.push(format!("expected {expected} {label}, found {actual}"));
        }
        Some(_) => details.push(format!("{actual} {label}")),
        None => details.push(format!("{actual} {label}; no expected count configured")),
    }

    let mut seen = BTreeSet::new();
    for question in &document.questions {
        if !seen.insert(question.number) {
            passed = false;
            details.push(format!("question number {} appears more than once", question.number));
        }
    }
    let gaps = (1..=seen.last().copied().unwrap_or(0))
        .filter(|number| !seen.contains(number))
        .collect::<Vec<u32>>();
    if !gaps.is_empty() {
        passed = false;
        details.push(format!("question numbers missing: {gaps:?}"));
    }

    IntegrityCheck::new("V-001", "Item count matches source", details, passed)
}

fn coverage_check(document: &Document, table: &FootnoteTable) -> IntegrityCheck {
    let referenced = document
        .questions
        .iter()
        .flat_map(|question| question.clauses.iter())
        .flat_map(|clause| clause.footnote_numbers())
        .collect::<BTreeSet<u32>>();
    let available = table.numbers().collect::<BTreeSet<u32>>();

    let missing = referenced.difference(&available).copied().collect::<Vec<u32>>();
    let unused = available.difference(&referenced).copied().collect::<Vec<u32>>();

    let mut details = vec![format!(
        "{} footnotes referenced, {} in table",
        referenced.len(),
        available.len()
    )];
    if !missing.is_empty() {
        details.push(format!("referenced but not in table: {missing:?}"));
    }
    if !unused.is_empty() {
        details.push(format!("in table but never referenced: {unused:?}"));
    }

    IntegrityCheck::new(
        "V-002",
        "Clause footnotes match footnote table",
        details,
        missing.is_empty() && unused.is_empty(),
    )
}

fn numbering_check(table: &FootnoteTable, expected: Option<u32>) -> IntegrityCheck {
    let problems = table.numbering_problems(expected);
    let passed = problems.is_empty();
    let details = if passed {
        vec![format!("footnotes 1..={}", problems.expected_max)]
    } else {
        vec![problems.describe()]
    };

    IntegrityCheck::new("V-003", "Footnote numbers are contiguous", details, passed)
}

fn round_trip_check(document: &Document) -> IntegrityCheck {
    let mut details = Vec::new();

    for question in &document.questions {
        let joined = question
            .clauses
            .iter()
            .map(|clause| clause.text.as_str())
            .collect::<Vec<&str>>()
            .join(" ");
        if compact(&joined) != compact(&question.answer) {
            details.push(format!(
                "question {}: clauses {:?} != answer {:?}",
                question.number,
                truncate_for_display(&joined, MISMATCH_DISPLAY_CHARS),
                truncate_for_display(&question.answer, MISMATCH_DISPLAY_CHARS)
            ));
        }
    }

    let passed = details.is_empty();
    IntegrityCheck::new("V-004", "Clause text reproduces answer", details, passed)
}

fn compact(text: &str) -> String {
    text.chars().filter(|character| !character.is_whitespace()).collect()
}

fn collect_warnings(document: &Document) -> Vec<String> {
    let mut warnings = Vec::new();

    for question in &document.questions {
        if question.clauses.is_empty() {
            warnings.push(format!("question {} has no clauses", question.number));
        }

        let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
        for number in question
            .clauses
            .iter()
            .flat_map(|clause| clause.footnote_numbers())
        {
            *counts.entry(number).or_insert(0) += 1;
        }
        let repeated = counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(number, _)| number)
            .collect::<Vec<u32>>();
        if !repeated.is_empty() {
            warnings.push(format!(
                "question {} repeats footnote markers {repeated:?}",
                question.number
            ));
        }
    }

    warnings
}
