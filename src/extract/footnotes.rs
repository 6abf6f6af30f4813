use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

use super::classify::{LabeledToken, TokenLabel};
use crate::model::{FootnoteEntry, ProofText};
use crate::util::normalize_whitespace;

#[derive(Debug, Clone, Default)]
pub struct FootnoteTable {
    entries: BTreeMap<u32, FootnoteEntry>,
    duplicates: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumberingProblems {
    pub expected_max: u32,
    pub missing: Vec<u32>,
    pub duplicates: Vec<u32>,
    pub out_of_range: Vec<u32>,
}

impl NumberingProblems {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.duplicates.is_empty() && self.out_of_range.is_empty()
    }

    pub fn describe(&self) -> String {
        format!(
            "expected 1..={}; missing {:?}; duplicates {:?}; out of range {:?}",
            self.expected_max, self.missing, self.duplicates, self.out_of_range
        )
    }
}

impl FootnoteTable {
    pub fn from_entries(entries: impl IntoIterator<Item = FootnoteEntry>) -> Self {
        let mut table = Self::default();
        for entry in entries {
            table.insert(entry);
        }
        table
    }

    pub fn from_reference_map(map: BTreeMap<String, Vec<ProofText>>) -> Result<Self> {
        let mut table = Self::default();
        for (key, proof_texts) in map {
            let number = key
                .trim()
                .parse::<u32>()
                .with_context(|| format!("footnote key is not a number: {key:?}"))?;
            table.insert(FootnoteEntry {
                number,
                proof_texts,
            });
        }
        Ok(table)
    }

    pub fn insert(&mut self, entry: FootnoteEntry) {
        match self.entries.get_mut(&entry.number) {
            Some(existing) => {
                warn!(footnote = entry.number, "duplicate footnote number");
                self.duplicates.push(entry.number);
                existing.proof_texts.extend(entry.proof_texts);
            }
            None => {
                self.entries.insert(entry.number, entry);
            }
        }
    }

    pub fn get(&self, number: u32) -> Option<&FootnoteEntry> {
        self.entries.get(&number)
    }

    pub fn numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn proof_text_count(&self) -> usize {
        self.entries
            .values()
            .map(|entry| entry.proof_texts.len())
            .sum()
    }

    pub fn numbering_problems(&self, expected: Option<u32>) -> NumberingProblems {
        let expected_max = expected
            .or_else(|| self.entries.keys().next_back().copied())
            .unwrap_or(0);

        let mut duplicates = self.duplicates.clone();
        duplicates.sort_unstable();
        duplicates.dedup();

        NumberingProblems {
            expected_max,
            missing: (1..=expected_max)
                .filter(|number| !self.entries.contains_key(number))
                .collect(),
            duplicates,
            out_of_range: self
                .entries
                .keys()
                .copied()
                .filter(|number| *number == 0 || *number > expected_max)
                .collect(),
        }
    }

    pub fn validate_numbering(&self, expected: Option<u32>) -> Result<()> {
        let problems = self.numbering_problems(expected);
        if !problems.is_empty() {
            bail!("footnote numbering is not contiguous: {}", problems.describe());
        }
        Ok(())
    }

    pub fn to_entries(&self) -> Vec<FootnoteEntry> {
        self.entries.values().cloned().collect()
    }
}

#[derive(Debug)]
struct OpenEntry {
    number: u32,
    proof_texts: Vec<ProofText>,
    reference: String,
    text: String,
    last_position: Option<(u32, f32)>,
}

impl OpenEntry {
    fn new(number: u32) -> Self {
        Self {
            number,
            proof_texts: Vec::new(),
            reference: String::new(),
            text: String::new(),
            last_position: None,
        }
    }

    fn push_reference(&mut self, fragment: &str) {
        if !self.text.trim().is_empty() {
            self.close_pair();
        }
        push_reference_fragment(&mut self.reference, fragment);
    }

    fn push_text(&mut self, fragment: &str, position: (u32, f32), line_tolerance: f32) {
        let new_line = self.last_position.is_some_and(|(page, y)| {
            page != position.0 || (y - position.1).abs() > line_tolerance
        });
        self.last_position = Some(position);

        if new_line && !self.text.is_empty() {
            let ends_hyphenated = self.text.trim_end().ends_with('-');
            let continues_lowercase = fragment
                .trim_start()
                .chars()
                .next()
                .is_some_and(char::is_lowercase);
            if ends_hyphenated && continues_lowercase {
                let trimmed = self.text.trim_end().trim_end_matches('-').len();
                self.text.truncate(trimmed);
                self.text.push_str(fragment.trim_start());
                return;
            }
            self.text.push(' ');
        }
        self.text.push_str(fragment);
    }

    fn close_pair(&mut self) {
        let reference = clean_reference(&self.reference);
        let text = normalize_whitespace(&self.text);
        self.reference.clear();
        self.text.clear();
        self.last_position = None;

        if reference.is_empty() && text.is_empty() {
            return;
        }
        if reference.is_empty() {
            debug!(footnote = self.number, "scripture text without a reference");
        }
        self.proof_texts.push(ProofText { reference, text });
    }

    fn finish(mut self) -> FootnoteEntry {
        self.close_pair();
        FootnoteEntry {
            number: self.number,
            proof_texts: self.proof_texts,
        }
    }
}

pub fn push_reference_fragment(buffer: &mut String, fragment: &str) {
    let fragment = fragment.trim();
    if fragment.is_empty() {
        return;
    }
    let attaches = buffer.is_empty()
        || buffer.ends_with(':')
        || buffer.ends_with('-')
        || fragment.starts_with([':', ',', '-', '.', ';']);
    if !attaches {
        buffer.push(' ');
    }
    buffer.push_str(fragment);
}

pub fn clean_reference(raw: &str) -> String {
    normalize_whitespace(raw)
        .trim_end_matches('.')
        .trim_end()
        .to_string()
}

pub fn build_footnote_table(tokens: &[LabeledToken], line_tolerance: f32) -> FootnoteTable {
    let mut table = FootnoteTable::default();
    let mut open: Option<OpenEntry> = None;
    let mut skipped = 0usize;

    for labeled in tokens {
        let token = &labeled.token;
        match labeled.label {
            TokenLabel::FootnoteMarker(number) => {
                if let Some(entry) = open.take() {
                    table.insert(entry.finish());
                }
                open = Some(OpenEntry::new(number));
            }
            TokenLabel::Reference => match open.as_mut() {
                Some(entry) => entry.push_reference(&token.text),
                None => skipped += 1,
            },
            TokenLabel::Body => match open.as_mut() {
                Some(entry) => entry.push_text(&token.text, (token.page, token.y), line_tolerance),
                None => skipped += 1,
            },
            TokenLabel::PageNumber => {}
        }
    }

    if let Some(entry) = open.take() {
        table.insert(entry.finish());
    }

    if skipped > 0 {
        debug!(skipped, "ignored apparatus tokens before the first marker");
    }
    debug!(
        footnotes = table.len(),
        proof_texts = table.proof_text_count(),
        "built footnote table"
    );
    table
}
