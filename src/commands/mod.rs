pub mod bind;
pub mod calibrate;
pub mod convert;
pub mod extract;
pub mod scripture;
pub mod verify;

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tracing::{error, info, warn};

use crate::cli::SourceArgs;
use crate::extract::{IntegrityReport, PageLimits, Token, load_pdf_tokens, load_span_dump};
use crate::model::Document;
use crate::util::write_json_pretty;

pub fn load_tokens(source: &SourceArgs, bold_hints: &[String]) -> Result<(Vec<Token>, PathBuf)> {
    let limits = PageLimits {
        first: source.first_page,
        last: source.last_page,
    };

    match (&source.pdf, &source.spans) {
        (Some(pdf), _) => Ok((load_pdf_tokens(pdf, limits, bold_hints)?, pdf.clone())),
        (None, Some(spans)) => Ok((load_span_dump(spans, limits)?, spans.clone())),
        (None, None) => bail!("either --pdf or --spans is required"),
    }
}

pub fn log_integrity(report: &IntegrityReport) {
    for check in &report.checks {
        if check.result == "pass" {
            info!(
                check_id = %check.check_id,
                name = %check.name,
                details = %check.details.join("; "),
                "integrity check passed"
            );
        } else {
            error!(
                check_id = %check.check_id,
                name = %check.name,
                details = %check.details.join("; "),
                "integrity check failed"
            );
        }
    }
    for warning in &report.warnings {
        warn!(warning = %warning, "integrity warning");
    }
}

pub fn write_document(path: &Path, document: &Document, without_proof_texts: bool) -> Result<()> {
    if without_proof_texts {
        write_json_pretty(path, &document.outline())
    } else {
        write_json_pretty(path, document)
    }
}

pub fn enforce_integrity(report: &IntegrityReport) -> Result<()> {
    if report.is_clean() {
        return Ok(());
    }
    let failed = report
        .failed()
        .iter()
        .map(|check| check.check_id.clone())
        .collect::<Vec<String>>();
    bail!("integrity verification failed ({})", failed.join(", "))
}
