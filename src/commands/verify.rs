use anyhow::Result;
use tracing::info;

use crate::cli::VerifyArgs;
use crate::commands::{enforce_integrity, log_integrity};
use crate::extract::{Expectations, FootnoteTable, verify_document};
use crate::model::Document;
use crate::profile::SourceProfile;
use crate::util::{read_json, write_json_pretty};

pub fn run(args: VerifyArgs) -> Result<()> {
    let profile = SourceProfile::resolve(&args.profile)?;
    let document: Document = read_json(&args.document)?;
    let table = FootnoteTable::from_entries(document.footnotes.iter().cloned());

    let report = verify_document(
        &document,
        &table,
        &Expectations::for_profile(&profile, args.expected_footnotes),
    );
    log_integrity(&report);

    if let Some(path) = &args.report_path {
        write_json_pretty(path, &report)?;
        info!(path = %path.display(), "wrote integrity report");
    }

    enforce_integrity(&report)?;
    info!(
        document = %args.document.display(),
        checks = report.summary.total_checks,
        "integrity verification passed"
    );
    Ok(())
}
