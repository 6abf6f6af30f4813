use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::{ExtractArgs, TrailingTextMode};
use crate::commands::{enforce_integrity, load_tokens, log_integrity, write_document};
use crate::extract::{
    Calibration, ExtractOptions, Extraction, FontThresholdClassifier, Token, TrailingText, calibrate,
    extract_document,
};
use crate::model::{RunCounts, RunManifest};
use crate::profile::SourceProfile;
use crate::util::{now_utc_string, read_json, sha256_file, utc_compact_string, write_json_pretty};

const MANIFEST_VERSION: u32 = 1;

pub fn run(args: ExtractArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("extract-{}", utc_compact_string(started_ts));

    let profile = SourceProfile::resolve(&args.profile)?;
    let explicit_calibration = match &args.calibration {
        Some(path) => Some(
            read_json::<Calibration>(path)
                .with_context(|| format!("failed to load calibration {}", path.display()))?,
        ),
        None => profile.calibration.clone(),
    };

    let bold_hints = explicit_calibration
        .as_ref()
        .map(|calibration| calibration.bold_font_hints.clone())
        .unwrap_or_else(|| vec!["Bold".to_string()]);
    let (tokens, source_path) = load_tokens(&args.source, &bold_hints)?;

    let body_calibration = resolve_body_calibration(explicit_calibration, &tokens, &bold_hints)?;
    let footnote_calibration = match &args.footnote_calibration {
        Some(path) => read_json::<Calibration>(path)
            .with_context(|| format!("failed to load footnote calibration {}", path.display()))?,
        None => profile
            .footnote_calibration
            .clone()
            .unwrap_or_else(|| body_calibration.clone()),
    };
    footnote_calibration.validate()?;

    let options = ExtractOptions {
        trailing_text: match args.trailing_text {
            TrailingTextMode::Merge => TrailingText::Merge,
            TrailingTextMode::OwnClause => TrailingText::OwnClause,
        },
        expected_footnotes: args.expected_footnotes,
    };

    let body_classifier = FontThresholdClassifier::new(body_calibration.clone());
    let footnote_classifier = FontThresholdClassifier::new(footnote_calibration.clone());
    let extraction = extract_document(
        &tokens,
        &profile,
        &body_classifier,
        &footnote_classifier,
        &options,
    )?;
    log_integrity(&extraction.integrity);

    let manifest_path = args
        .manifest_path
        .clone()
        .unwrap_or_else(|| default_manifest_path(&args.output));
    let mut manifest = RunManifest {
        manifest_version: MANIFEST_VERSION,
        run_id,
        command: "extract".to_string(),
        status: "running".to_string(),
        started_at,
        updated_at: now_utc_string(),
        profile: profile.name.clone(),
        source_path: source_path.display().to_string(),
        source_sha256: sha256_file(&source_path)?,
        output_path: args.output.display().to_string(),
        counts: run_counts(&tokens, &extraction),
        calibration: Some(body_calibration),
        footnote_calibration: Some(footnote_calibration),
        checks: extraction.integrity.checks.clone(),
        warnings: extraction.integrity.warnings.clone(),
    };

    if let Err(error) = enforce_integrity(&extraction.integrity) {
        manifest.status = "failed".to_string();
        manifest.updated_at = now_utc_string();
        write_json_pretty(&manifest_path, &manifest)?;
        warn!(path = %manifest_path.display(), "wrote failed run manifest");
        return Err(error);
    }

    write_document(&args.output, &extraction.document, args.without_proof_texts)?;
    manifest.status = "completed".to_string();
    manifest.updated_at = now_utc_string();
    write_json_pretty(&manifest_path, &manifest)?;

    info!(
        output = %args.output.display(),
        manifest = %manifest_path.display(),
        questions = manifest.counts.question_count,
        clauses = manifest.counts.clause_count,
        footnotes = manifest.counts.footnote_count,
        "extraction completed"
    );

    Ok(())
}

fn resolve_body_calibration(
    explicit: Option<Calibration>,
    tokens: &[Token],
    bold_hints: &[String],
) -> Result<Calibration> {
    let calibration = match explicit {
        Some(calibration) => calibration,
        None => {
            info!("no calibration supplied; sampling source");
            calibrate(tokens, bold_hints)?
        }
    };
    calibration.validate()?;
    Ok(calibration)
}

fn default_manifest_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    output.with_file_name(format!("{stem}.manifest.json"))
}

fn run_counts(tokens: &[Token], extraction: &Extraction) -> RunCounts {
    let questions = &extraction.document.questions;
    let body = &extraction.body_labels;
    let footnotes = &extraction.footnote_labels;

    RunCounts {
        token_count: tokens.len(),
        body_token_count: body.body + footnotes.body,
        marker_token_count: body.markers + footnotes.markers,
        reference_token_count: body.references + footnotes.references,
        page_number_token_count: body.page_numbers + footnotes.page_numbers,
        question_count: questions.len(),
        clause_count: questions.iter().map(|question| question.clauses.len()).sum(),
        footnote_count: extraction.table.len(),
        proof_text_count: extraction.table.proof_text_count(),
        unresolved_footnote_count: extraction.bind_report.unresolved.len(),
    }
}
