use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, warn};

use super::classify::{LabeledToken, TokenLabel};
use super::spans::Token;
use crate::profile::SourceProfile;

#[derive(Debug, Clone)]
pub struct TextAssembler {
    text: String,
    last_position: Option<(u32, f32)>,
    line_tolerance: f32,
}

impl TextAssembler {
    pub fn new(line_tolerance: f32) -> Self {
        Self {
            text: String::new(),
            last_position: None,
            line_tolerance,
        }
    }

    pub fn push(&mut self, token: &Token) {
        if let Some((page, y)) = self.last_position {
            let new_line = page != token.page || (y - token.y).abs() > self.line_tolerance;
            if new_line {
                self.break_line(&token.text);
            }
        }
        self.text.push_str(&token.text);
        self.last_position = Some((token.page, token.y));
    }

    fn break_line(&mut self, next: &str) {
        if should_merge_hyphenated_pair(&self.text, next) {
            let trimmed_len = self.text.trim_end().trim_end_matches('-').len();
            self.text.truncate(trimmed_len);
            return;
        }
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn take(&mut self) -> String {
        self.last_position = None;
        std::mem::take(&mut self.text)
    }
}

fn should_merge_hyphenated_pair(current: &str, next: &str) -> bool {
    let left = current.trim_end();
    if !left.ends_with('-') {
        return false;
    }

    let starts_with_lowercase = next
        .trim_start()
        .chars()
        .next()
        .map(|character| character.is_lowercase())
        .unwrap_or(false);
    if !starts_with_lowercase {
        return false;
    }

    left.trim_end_matches('-')
        .chars()
        .last()
        .map(|character| character.is_alphabetic())
        .unwrap_or(false)
}

#[derive(Debug, Clone)]
pub struct Line {
    pub page: u32,
    pub text: String,
    pub first_token: usize,
}

pub fn group_lines(tokens: &[LabeledToken], line_tolerance: f32) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();
    let mut last_y = f32::NAN;

    for (index, labeled) in tokens.iter().enumerate() {
        let token = &labeled.token;
        let same_line = lines
            .last()
            .map(|line| line.page == token.page && (last_y - token.y).abs() <= line_tolerance)
            .unwrap_or(false);

        if same_line {
            if let Some(line) = lines.last_mut() {
                line.text.push_str(&token.text);
            }
        } else {
            lines.push(Line {
                page: token.page,
                text: token.text.clone(),
                first_token: index,
            });
        }
        last_y = token.y;
    }

    lines
}

#[derive(Debug, Clone, Copy)]
pub struct Regions {
    pub body_end: usize,
    pub footnote_start: Option<usize>,
}

pub fn split_regions(tokens: &[LabeledToken], profile: &SourceProfile) -> Result<Regions> {
    let region = &profile.footnote_region;
    let heading = region
        .start_heading
        .as_deref()
        .map(Regex::new)
        .transpose()
        .context("failed to compile footnote heading pattern")?;

    if region.start_page.is_none() && heading.is_none() {
        warn!(profile = %profile.name, "profile defines no footnote region");
        return Ok(Regions {
            body_end: tokens.len(),
            footnote_start: None,
        });
    }

    let min_page = region.start_page.unwrap_or(0);
    let lines = group_lines(tokens, profile.line_tolerance);
    let start_line = lines.iter().find(|line| {
        line.page >= min_page
            && heading
                .as_ref()
                .is_none_or(|pattern| pattern.is_match(line.text.trim()))
    });

    match start_line {
        Some(line) => {
            // The heading line itself belongs to neither region.
            let footnote_start = if heading.is_some() {
                lines
                    .iter()
                    .find(|candidate| candidate.first_token > line.first_token)
                    .map(|candidate| candidate.first_token)
                    .unwrap_or(tokens.len())
            } else {
                line.first_token
            };
            debug!(
                page = line.page,
                heading = %line.text.trim(),
                "footnote apparatus starts"
            );
            Ok(Regions {
                body_end: line.first_token,
                footnote_start: Some(footnote_start),
            })
        }
        None => {
            warn!(profile = %profile.name, "footnote apparatus start not found");
            Ok(Regions {
                body_end: tokens.len(),
                footnote_start: None,
            })
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BodyStream {
    pub text: String,
    pub anchors: Vec<(usize, u32)>,
}

pub fn assemble_body_stream(
    tokens: &[LabeledToken],
    profile: &SourceProfile,
) -> BodyStream {
    let mut assembler = TextAssembler::new(profile.line_tolerance);
    let mut anchors = Vec::new();

    for labeled in tokens {
        if !profile.body_pages.contains(labeled.token.page) {
            continue;
        }
        match labeled.label {
            TokenLabel::Body | TokenLabel::Reference => assembler.push(&labeled.token),
            TokenLabel::FootnoteMarker(number) => anchors.push((assembler.len(), number)),
            TokenLabel::PageNumber => {}
        }
    }

    BodyStream {
        text: assembler.take(),
        anchors,
    }
}
