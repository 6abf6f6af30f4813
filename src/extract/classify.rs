use std::collections::BTreeMap;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::spans::{Token, font_is_bold};

const PAGE_NUMBER_TOLERANCE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenLabel {
    Body,
    FootnoteMarker(u32),
    Reference,
    PageNumber,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledToken {
    pub token: Token,
    pub label: TokenLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub body_font_size: f32,
    pub page_number_min_size: f32,
    pub marker_max_size: f32,
    #[serde(default = "default_bold_hints")]
    pub bold_font_hints: Vec<String>,
}

fn default_bold_hints() -> Vec<String> {
    vec!["Bold".to_string()]
}

impl Calibration {
    pub fn validate(&self) -> Result<()> {
        if self.marker_max_size <= 0.0 || self.page_number_min_size <= 0.0 {
            bail!("calibration thresholds must be positive");
        }
        if self.marker_max_size > self.page_number_min_size {
            bail!(
                "marker_max_size {} exceeds page_number_min_size {}",
                self.marker_max_size,
                self.page_number_min_size
            );
        }
        Ok(())
    }
}

pub trait TokenClassifier {
    fn classify(&self, token: &Token) -> TokenLabel;

    fn label_all(&self, tokens: &[Token]) -> Vec<LabeledToken> {
        tokens
            .iter()
            .map(|token| LabeledToken {
                label: self.classify(token),
                token: token.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct FontThresholdClassifier {
    calibration: Calibration,
}

impl FontThresholdClassifier {
    pub fn new(calibration: Calibration) -> Self {
        Self { calibration }
    }
}

impl TokenClassifier for FontThresholdClassifier {
    fn classify(&self, token: &Token) -> TokenLabel {
        let text = token.text.trim();

        if is_all_digits(text) && token.font_size >= self.calibration.page_number_min_size {
            return TokenLabel::PageNumber;
        }

        if token.font_size < self.calibration.marker_max_size {
            if let Some(value) = marker_value(text) {
                return TokenLabel::FootnoteMarker(value);
            }
        }

        if token.is_bold || font_is_bold(&token.font_name, &self.calibration.bold_font_hints) {
            return TokenLabel::Reference;
        }

        TokenLabel::Body
    }
}

fn is_all_digits(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|character| character.is_ascii_digit())
}

fn marker_value(text: &str) -> Option<u32> {
    let digits = text.strip_suffix('.').unwrap_or(text);
    if !is_all_digits(digits) {
        return None;
    }
    digits.parse::<u32>().ok().filter(|value| *value > 0)
}

#[derive(Debug, Clone, Default)]
pub struct FontHistogram {
    pub chars_by_size: BTreeMap<String, usize>,
    pub numeric_tokens_by_size: BTreeMap<String, usize>,
}

fn size_key(size: f32) -> String {
    format!("{size:.1}")
}

pub fn font_histogram(tokens: &[Token]) -> FontHistogram {
    let mut histogram = FontHistogram::default();
    for token in tokens {
        let text = token.text.trim();
        if text.is_empty() {
            continue;
        }
        let key = size_key(token.font_size);
        *histogram.chars_by_size.entry(key.clone()).or_insert(0) += text.chars().count();
        if marker_value(text).is_some() {
            *histogram.numeric_tokens_by_size.entry(key).or_insert(0) += 1;
        }
    }
    histogram
}

pub fn calibrate(tokens: &[Token], bold_font_hints: &[String]) -> Result<Calibration> {
    let histogram = font_histogram(tokens);

    let Some(body_font_size) = most_frequent_size(&histogram.chars_by_size, |_| true) else {
        bail!("cannot calibrate: sample contains no text");
    };

    let marker_size = most_frequent_size(&histogram.numeric_tokens_by_size, |size| {
        size < body_font_size - PAGE_NUMBER_TOLERANCE / 2.0
    });

    let page_number_min_size = body_font_size - PAGE_NUMBER_TOLERANCE;
    let marker_max_size = match marker_size {
        Some(marker_size) => (marker_size + body_font_size) / 2.0,
        None => page_number_min_size,
    };

    let calibration = Calibration {
        body_font_size,
        page_number_min_size,
        marker_max_size: marker_max_size.min(page_number_min_size),
        bold_font_hints: bold_font_hints.to_vec(),
    };

    info!(
        body_font_size = calibration.body_font_size,
        marker_font_size = marker_size.unwrap_or_default(),
        marker_max_size = calibration.marker_max_size,
        page_number_min_size = calibration.page_number_min_size,
        "calibrated font thresholds"
    );

    Ok(calibration)
}

fn most_frequent_size(counts: &BTreeMap<String, usize>, accept: impl Fn(f32) -> bool) -> Option<f32> {
    counts
        .iter()
        .filter_map(|(key, count)| key.parse::<f32>().ok().map(|size| (size, *count)))
        .filter(|(size, _)| accept(*size))
        .max_by(|left, right| {
            left.1
                .cmp(&right.1)
                .then_with(|| right.0.total_cmp(&left.0))
        })
        .map(|(size, _)| size)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LabelCounts {
    pub body: usize,
    pub markers: usize,
    pub references: usize,
    pub page_numbers: usize,
}

pub fn count_labels(tokens: &[LabeledToken]) -> LabelCounts {
    let mut counts = LabelCounts::default();
    for token in tokens {
        match token.label {
            TokenLabel::Body => counts.body += 1,
            TokenLabel::FootnoteMarker(_) => counts.markers += 1,
            TokenLabel::Reference => counts.references += 1,
            TokenLabel::PageNumber => counts.page_numbers += 1,
        }
    }
    counts
}
