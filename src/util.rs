use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn utc_compact_string(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%dT%H%M%SZ").to_string()
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .with_context(|| format!("failed to read file for hashing: {}", path.display()))?;
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse {}", path.display()))
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }

    let staging = staging_path(path);
    let file = File::create(&staging)
        .with_context(|| format!("failed to create json file: {}", staging.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;
    writeln!(writer).with_context(|| format!("failed to finalize json file: {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to write json file: {}", path.display()))?;
    drop(writer);

    fs::rename(&staging, path).with_context(|| {
        format!("failed to move {} into place at {}", staging.display(), path.display())
    })
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

pub fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

pub fn truncate_for_display(input: &str, max_chars: usize) -> String {
    let mut chars = input.chars();
    let prefix = chars.by_ref().take(max_chars).collect::<String>();
    if chars.next().is_some() {
        format!("{prefix}...")
    } else {
        prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_whitespace_collapses_runs_and_newlines() {
        assert_eq!(
            normalize_whitespace("  Man's chief\nend   is\t to "),
            "Man's chief end is to"
        );
    }

    #[test]
    fn truncate_for_display_marks_cut_strings_only() {
        assert_eq!(truncate_for_display("abcdef", 3), "abc...");
        assert_eq!(truncate_for_display("abc", 3), "abc");
    }

    #[test]
    fn write_json_pretty_appends_trailing_newline() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("value.json");
        write_json_pretty(&path, &serde_json::json!({"number": 1})).expect("write json");

        let raw = fs::read_to_string(&path).expect("read back");
        assert!(raw.ends_with("}\n"));
        let value: serde_json::Value = read_json(&path).expect("parse back");
        assert_eq!(value["number"], 1);
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn write_json_pretty_replaces_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("document.json");
        fs::write(&path, "stale").expect("seed file");

        write_json_pretty(&path, &vec![1, 2]).expect("write json");
        let value: Vec<u32> = read_json(&path).expect("parse back");
        assert_eq!(value, vec![1, 2]);
        assert_eq!(
            staging_path(&path).file_name().and_then(|name| name.to_str()),
            Some("document.json.partial")
        );
    }

    #[test]
    fn sha256_file_hashes_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("input.txt");
        fs::write(&path, "abc").expect("seed file");

        assert_eq!(
            sha256_file(&path).expect("hash"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
