use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::cli::ConvertArgs;
use crate::commands::{enforce_integrity, log_integrity, write_document};
use crate::extract::{
    Expectations, FootnoteTable, StreamItem, TrailingText, bind_proof_texts, parse_item_number,
    segment_clauses, verify_document,
};
use crate::model::{Document, DocumentKind, FootnoteEntry, ProofText, Question};
use crate::profile::SourceProfile;
use crate::scripture::ReferenceParser;
use crate::util::{normalize_whitespace, read_json};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreedsFile {
    #[serde(default)]
    metadata: CreedsMetadata,
    #[serde(default)]
    data: Vec<CreedsItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreedsMetadata {
    title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreedsItem {
    number: Option<Value>,
    question: Option<String>,
    answer: Option<String>,
    answer_with_proofs: Option<String>,
    #[serde(default)]
    proofs: Vec<CreedsProof>,
    chapter: Option<Value>,
    title: Option<String>,
    #[serde(default)]
    sections: Vec<CreedsSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreedsSection {
    section: Option<Value>,
    content: Option<String>,
    content_with_proofs: Option<String>,
    #[serde(default)]
    proofs: Vec<CreedsProof>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreedsProof {
    id: Value,
    #[serde(default)]
    references: Vec<String>,
}

pub fn run(args: ConvertArgs) -> Result<()> {
    let profile = SourceProfile::resolve(&args.profile)?;
    let creeds: CreedsFile = read_json(&args.input)?;
    info!(
        path = %args.input.display(),
        rows = creeds.data.len(),
        kind = profile.kind.as_str(),
        "converting Creeds.json dump"
    );

    let (document, table) = convert_creeds(creeds, &profile)?;

    let expectations = Expectations {
        footnotes: None,
        ..Expectations::for_profile(&profile, None)
    };
    let integrity = verify_document(&document, &table, &expectations);
    log_integrity(&integrity);
    enforce_integrity(&integrity)?;

    write_document(&args.output, &document, args.without_proof_texts)?;
    info!(
        output = %args.output.display(),
        questions = document.questions.len(),
        footnotes = table.len(),
        "conversion completed"
    );
    Ok(())
}

struct Converter {
    marker: Regex,
    references: ReferenceParser,
    table: FootnoteTable,
    next_footnote: u32,
}

fn convert_creeds(creeds: CreedsFile, profile: &SourceProfile) -> Result<(Document, FootnoteTable)> {
    let mut converter = Converter {
        marker: Regex::new(r"\[(\d+)\]").context("failed to compile proof marker regex")?,
        references: ReferenceParser::new()?,
        table: FootnoteTable::default(),
        next_footnote: 1,
    };

    let mut questions = Vec::new();
    match profile.kind {
        DocumentKind::Confession => {
            for item in creeds.data {
                let chapter = required_number(item.chapter.as_ref(), "Chapter")?;
                let title = item.title.unwrap_or_default();
                for section in item.sections {
                    let number = required_number(section.section.as_ref(), "Section")?;
                    let marked = section
                        .content_with_proofs
                        .or(section.content)
                        .unwrap_or_default();
                    let (answer, stream) = converter.stream(&marked, &section.proofs)?;
                    questions.push(Question {
                        number: (questions.len() + 1) as u32,
                        question: title.clone(),
                        answer,
                        clauses: segment_clauses(&stream, TrailingText::Merge),
                        chapter: Some(chapter),
                        section: Some(number),
                    });
                }
            }
        }
        DocumentKind::ShorterCatechism | DocumentKind::LargerCatechism => {
            for item in creeds.data {
                let number = required_number(item.number.as_ref(), "Number")?;
                let marked = item.answer_with_proofs.or(item.answer).unwrap_or_default();
                let (answer, stream) = converter.stream(&marked, &item.proofs)?;
                questions.push(Question {
                    number,
                    question: normalize_whitespace(&item.question.unwrap_or_default()),
                    answer,
                    clauses: segment_clauses(&stream, TrailingText::Merge),
                    chapter: None,
                    section: None,
                });
            }
        }
    }

    let report = bind_proof_texts(&mut questions, &converter.table);
    debug!(
        bound = report.bound_clauses,
        unresolved = report.unresolved.len(),
        "bound converted proofs"
    );

    let document = Document {
        title: creeds.metadata.title.unwrap_or_else(|| profile.title.clone()),
        kind: profile.kind,
        questions,
        footnotes: converter.table.to_entries(),
    };
    Ok((document, converter.table))
}

impl Converter {
    fn stream(&mut self, marked: &str, proofs: &[CreedsProof]) -> Result<(String, Vec<StreamItem>)> {
        let mut local_to_global = HashMap::new();
        for proof in proofs {
            let local = required_number(Some(&proof.id), "Proofs[].Id")?;
            let proof_texts = proof
                .references
                .iter()
                .map(|reference| ProofText {
                    reference: self.canonical_reference(reference),
                    text: String::new(),
                })
                .collect();
            let global = allocate(&mut self.next_footnote);
            local_to_global.insert(local, global);
            self.table.insert(FootnoteEntry {
                number: global,
                proof_texts,
            });
        }

        let mut stream = Vec::new();
        let mut plain = String::new();
        let mut cursor = 0;
        for capture in self.marker.captures_iter(marked) {
            let (Some(whole), Some(digits)) = (capture.get(0), capture.get(1)) else {
                continue;
            };
            let text = &marked[cursor..whole.start()];
            plain.push_str(text);
            stream.push(StreamItem::Text(text.to_string()));
            cursor = whole.end();

            let local = digits
                .as_str()
                .parse::<u32>()
                .with_context(|| format!("proof marker out of range: {}", whole.as_str()))?;
            let global = match local_to_global.get(&local) {
                Some(global) => *global,
                None => {
                    let global = allocate(&mut self.next_footnote);
                    local_to_global.insert(local, global);
                    global
                }
            };
            stream.push(StreamItem::Marker(global));
        }
        let tail = &marked[cursor..];
        plain.push_str(tail);
        stream.push(StreamItem::Text(tail.to_string()));

        Ok((normalize_whitespace(&plain), stream))
    }

    fn canonical_reference(&self, raw: &str) -> String {
        match self.references.parse(raw) {
            Ok(passage) => passage.canonical(),
            Err(_) => raw.trim().to_string(),
        }
    }
}

fn allocate(next: &mut u32) -> u32 {
    let number = *next;
    *next += 1;
    number
}

fn required_number(value: Option<&Value>, field: &str) -> Result<u32> {
    let parsed = match value {
        Some(Value::Number(number)) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(text)) => parse_item_number(text),
        _ => None,
    };
    match parsed {
        Some(number) => Ok(number),
        None => bail!("Creeds.json field {field} is missing or not a number: {value:?}"),
    }
}
