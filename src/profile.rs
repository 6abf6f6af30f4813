use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cli::{BuiltinProfile, ProfileArgs};
use crate::extract::Calibration;
use crate::model::DocumentKind;
use crate::util::read_json;

pub const CATECHISM_QUESTION_PATTERN: &str = r"(?m)^[ \t]*Q\.\s*(?P<number>\d+)\.?[ \t]*";
pub const CATECHISM_ANSWER_PATTERN: &str = r"(?m)(?:^|\s)A\.[ \t]*";
pub const CONFESSION_CHAPTER_PATTERN: &str =
    r"(?m)^[ \t]*CHAPTER\s+(?P<number>[IVXLC]+|\d+)\.?[ \t]*(?P<title>[^\n]*)";
pub const CONFESSION_SECTION_PATTERN: &str = r"(?m)^[ \t]*(?P<number>[IVXLC]+|\d+)\.[ \t]+";

pub const SHORTER_FOOTNOTES: u32 = 227;
pub const LARGER_FOOTNOTES: u32 = 1303;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceProfile {
    pub name: String,
    pub title: String,
    pub kind: DocumentKind,
    #[serde(default)]
    pub expected_items: Option<usize>,
    #[serde(default)]
    pub expected_chapters: Option<usize>,
    #[serde(default)]
    pub expected_footnotes: Option<u32>,
    #[serde(default)]
    pub body_pages: PageWindow,
    #[serde(default)]
    pub footnote_region: FootnoteRegion,
    pub item_pattern: String,
    #[serde(default)]
    pub answer_pattern: Option<String>,
    #[serde(default)]
    pub chapter_pattern: Option<String>,
    #[serde(default = "default_line_tolerance")]
    pub line_tolerance: f32,
    #[serde(default)]
    pub calibration: Option<Calibration>,
    #[serde(default)]
    pub footnote_calibration: Option<Calibration>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageWindow {
    #[serde(default)]
    pub first: Option<u32>,
    #[serde(default)]
    pub last: Option<u32>,
}

impl PageWindow {
    pub fn contains(&self, page: u32) -> bool {
        self.first.is_none_or(|first| page >= first) && self.last.is_none_or(|last| page <= last)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FootnoteRegion {
    #[serde(default)]
    pub start_page: Option<u32>,
    #[serde(default)]
    pub start_heading: Option<String>,
}

fn default_line_tolerance() -> f32 {
    2.0
}

impl SourceProfile {
    pub fn builtin(profile: BuiltinProfile) -> Self {
        match profile {
            BuiltinProfile::Confession => Self {
                name: profile.as_str().to_string(),
                title: "The Westminster Confession of Faith".to_string(),
                kind: DocumentKind::Confession,
                expected_items: None,
                expected_chapters: Some(33),
                expected_footnotes: None,
                body_pages: PageWindow::default(),
                footnote_region: FootnoteRegion {
                    start_page: None,
                    start_heading: Some(r"(?i)^\s*(scripture\s+proofs|footnotes)\s*$".to_string()),
                },
                item_pattern: CONFESSION_SECTION_PATTERN.to_string(),
                answer_pattern: None,
                chapter_pattern: Some(CONFESSION_CHAPTER_PATTERN.to_string()),
                line_tolerance: default_line_tolerance(),
                calibration: None,
                footnote_calibration: None,
            },
            BuiltinProfile::Shorter => Self {
                name: profile.as_str().to_string(),
                title: "The Westminster Shorter Catechism".to_string(),
                kind: DocumentKind::ShorterCatechism,
                expected_items: Some(107),
                expected_chapters: None,
                expected_footnotes: Some(SHORTER_FOOTNOTES),
                body_pages: PageWindow::default(),
                footnote_region: FootnoteRegion {
                    start_page: None,
                    start_heading: Some(r"^\(\s*15\s*\)$".to_string()),
                },
                item_pattern: CATECHISM_QUESTION_PATTERN.to_string(),
                answer_pattern: Some(CATECHISM_ANSWER_PATTERN.to_string()),
                chapter_pattern: None,
                line_tolerance: default_line_tolerance(),
                calibration: None,
                footnote_calibration: None,
            },
            BuiltinProfile::Larger => Self {
                name: profile.as_str().to_string(),
                title: "The Westminster Larger Catechism".to_string(),
                kind: DocumentKind::LargerCatechism,
                expected_items: Some(196),
                expected_chapters: None,
                expected_footnotes: Some(LARGER_FOOTNOTES),
                body_pages: PageWindow {
                    first: Some(3),
                    last: None,
                },
                footnote_region: FootnoteRegion {
                    start_page: Some(42),
                    start_heading: None,
                },
                item_pattern: CATECHISM_QUESTION_PATTERN.to_string(),
                answer_pattern: Some(CATECHISM_ANSWER_PATTERN.to_string()),
                chapter_pattern: None,
                line_tolerance: default_line_tolerance(),
                calibration: Some(Calibration {
                    body_font_size: 10.0,
                    page_number_min_size: 9.5,
                    marker_max_size: 9.0,
                    bold_font_hints: vec!["Bold".to_string()],
                }),
                footnote_calibration: None,
            },
        }
    }

    pub fn resolve(args: &ProfileArgs) -> Result<Self> {
        let profile = match (&args.profile_path, args.profile) {
            (Some(path), _) => read_json::<SourceProfile>(path)
                .with_context(|| format!("failed to load source profile {}", path.display()))?,
            (None, Some(builtin)) => Self::builtin(builtin),
            (None, None) => bail!("either --profile or --profile-path is required"),
        };

        profile.validate()?;
        info!(profile = %profile.name, kind = profile.kind.as_str(), "resolved source profile");
        Ok(profile)
    }

    pub fn validate(&self) -> Result<()> {
        regex::Regex::new(&self.item_pattern)
            .with_context(|| format!("invalid item_pattern in profile {}", self.name))?;
        if let Some(pattern) = &self.answer_pattern {
            regex::Regex::new(pattern)
                .with_context(|| format!("invalid answer_pattern in profile {}", self.name))?;
        }
        if let Some(pattern) = &self.chapter_pattern {
            regex::Regex::new(pattern)
                .with_context(|| format!("invalid chapter_pattern in profile {}", self.name))?;
        }
        if let Some(pattern) = &self.footnote_region.start_heading {
            regex::Regex::new(pattern).with_context(|| {
                format!("invalid footnote_region.start_heading in profile {}", self.name)
            })?;
        }
        if matches!(self.kind, DocumentKind::Confession) && self.chapter_pattern.is_none() {
            bail!("confession profile {} needs a chapter_pattern", self.name);
        }
        if self.line_tolerance < 0.0 {
            bail!("line_tolerance must not be negative in profile {}", self.name);
        }
        Ok(())
    }
}
