use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::{ScriptureArgs, VerseSourceMode};
use crate::commands::{enforce_integrity, log_integrity};
use crate::extract::{Expectations, FootnoteTable, verify_document};
use crate::model::Document;
use crate::profile::SourceProfile;
use crate::scripture::{
    BibleApi, KjvDataset, RequestWindow, VerseSource, VerseStore, fill_proof_texts,
};
use crate::util::{read_json, write_json_pretty};

pub fn run(args: ScriptureArgs) -> Result<()> {
    let profile = SourceProfile::resolve(&args.profile)?;
    let mut document: Document = read_json(&args.document)?;
    let source = build_source(&args)?;
    let mut store = VerseStore::new(source)?;

    info!(
        document = %args.document.display(),
        source = args.source.as_str(),
        overwrite = args.overwrite,
        "filling proof texts"
    );
    let report = fill_proof_texts(&mut document, &mut store, args.overwrite);

    let stats = store.stats();
    if stats.not_found + stats.failed + stats.unrecognized > 0 {
        warn!(
            not_found = stats.not_found,
            failed = stats.failed,
            unrecognized = stats.unrecognized,
            "some references were left as placeholders; re-run to retry them"
        );
    }

    let table = FootnoteTable::from_entries(document.footnotes.iter().cloned());
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
        filled = report.filled,
        kept = report.kept,
        skipped_unresolved = report.skipped_unresolved,
        citations = stats.citations,
        cache_hits = stats.cache_hits,
        "scripture lookup completed"
    );
    Ok(())
}

fn build_source(args: &ScriptureArgs) -> Result<Box<dyn VerseSource>> {
    let timeout = Duration::from_secs(args.timeout_secs);
    match args.source {
        VerseSourceMode::Dataset => {
            let dataset =
                KjvDataset::load_or_download(&args.kjv_path, args.kjv_url.as_deref(), timeout)?;
            Ok(Box::new(dataset))
        }
        VerseSourceMode::Api => {
            let window = RequestWindow::new(args.max_requests, Duration::from_secs(args.window_secs));
            let api = BibleApi::new(&args.api_base_url, &args.translation, timeout, window)?;
            Ok(Box::new(api))
        }
    }
}
