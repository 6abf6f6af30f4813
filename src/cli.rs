use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "westminster",
    version,
    about = "Westminster Standards clause and proof-text extraction tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Calibrate(CalibrateArgs),
    Extract(ExtractArgs),
    Convert(ConvertArgs),
    Bind(BindArgs),
    Scripture(ScriptureArgs),
    Verify(VerifyArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum BuiltinProfile {
    Confession,
    Shorter,
    Larger,
}

impl BuiltinProfile {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confession => "confession",
            Self::Shorter => "shorter",
            Self::Larger => "larger",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    #[arg(long, value_enum, required_unless_present = "profile_path")]
    pub profile: Option<BuiltinProfile>,

    #[arg(long, conflicts_with = "profile")]
    pub profile_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    #[arg(long, required_unless_present = "spans")]
    pub pdf: Option<PathBuf>,

    #[arg(long, conflicts_with = "pdf")]
    pub spans: Option<PathBuf>,

    #[arg(long)]
    pub first_page: Option<u32>,

    #[arg(long)]
    pub last_page: Option<u32>,
}

#[derive(Args, Debug, Clone)]
pub struct CalibrateArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long, default_value = "Bold")]
    pub bold_hint: Vec<String>,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum TrailingTextMode {
    Merge,
    OwnClause,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long)]
    pub calibration: Option<PathBuf>,

    #[arg(long)]
    pub footnote_calibration: Option<PathBuf>,

    #[arg(long)]
    pub expected_footnotes: Option<u32>,

    #[arg(long, value_enum, default_value_t = TrailingTextMode::Merge)]
    pub trailing_text: TrailingTextMode,

    #[arg(long, default_value_t = false)]
    pub without_proof_texts: bool,

    #[arg(long)]
    pub output: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub output: PathBuf,

    #[arg(long, default_value_t = false)]
    pub without_proof_texts: bool,
}

#[derive(Args, Debug, Clone)]
pub struct BindArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    #[arg(long)]
    pub document: PathBuf,

    #[arg(long)]
    pub references: PathBuf,

    #[arg(long)]
    pub expected_footnotes: Option<u32>,

    #[arg(long)]
    pub output: PathBuf,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum VerseSourceMode {
    Dataset,
    Api,
}

impl VerseSourceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dataset => "dataset",
            Self::Api => "api",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ScriptureArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    #[arg(long)]
    pub document: PathBuf,

    #[arg(long)]
    pub expected_footnotes: Option<u32>,

    #[arg(long)]
    pub output: PathBuf,

    #[arg(long, value_enum, default_value_t = VerseSourceMode::Dataset)]
    pub source: VerseSourceMode,

    #[arg(long, default_value = "kjv.json")]
    pub kjv_path: PathBuf,

    #[arg(long)]
    pub kjv_url: Option<String>,

    #[arg(long, default_value = "https://bible-api.com")]
    pub api_base_url: String,

    #[arg(long, default_value = "kjv")]
    pub translation: String,

    #[arg(long, default_value_t = 14)]
    pub max_requests: u32,

    #[arg(long, default_value_t = 30)]
    pub window_secs: u64,

    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}

#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    #[arg(long)]
    pub document: PathBuf,

    #[arg(long)]
    pub expected_footnotes: Option<u32>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}
