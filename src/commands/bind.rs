use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::BindArgs;
use crate::commands::{enforce_integrity, log_integrity};
use crate::extract::{Expectations, FootnoteTable, bind_proof_texts, verify_document};
use crate::model::{Document, ProofText};
use crate::profile::SourceProfile;
use crate::util::{read_json, write_json_pretty};

pub fn run(args: BindArgs) -> Result<()> {
    let profile = SourceProfile::resolve(&args.profile)?;
    let mut document: Document = read_json(&args.document)?;
    let references: BTreeMap<String, Vec<ProofText>> = read_json(&args.references)?;
    let table = FootnoteTable::from_reference_map(references)
        .with_context(|| format!("invalid reference dictionary {}", args.references.display()))?;
    table
        .validate_numbering(None)
        .with_context(|| format!("invalid reference dictionary {}", args.references.display()))?;

    let report = bind_proof_texts(&mut document.questions, &table);
    document.footnotes = table.to_entries();

    let integrity = verify_document(
        &document,
        &table,
        &Expectations::for_profile(&profile, args.expected_footnotes),
    );
    log_integrity(&integrity);
    enforce_integrity(&integrity)?;

    write_json_pretty(&args.output, &document)?;
    info!(
        output = %args.output.display(),
        bound = report.bound_clauses,
        unmarked = report.unmarked_clauses,
        proof_texts = report.attached_proof_texts,
        "binding completed"
    );
    Ok(())
}
