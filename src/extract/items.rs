use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, warn};

use super::layout::BodyStream;
use super::segment::StreamItem;
use crate::model::DocumentKind;
use crate::profile::SourceProfile;
use crate::util::normalize_whitespace;

#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub printed_number: u32,
    pub chapter: Option<u32>,
    pub prompt: String,
    pub answer: String,
    pub stream: Vec<StreamItem>,
}

#[derive(Debug, Clone)]
struct Header {
    start: usize,
    end: usize,
    number: u32,
    chapter: Option<(u32, String)>,
}

pub fn split_items(body: &BodyStream, profile: &SourceProfile) -> Result<Vec<ItemDraft>> {
    let item_pattern =
        Regex::new(&profile.item_pattern).context("failed to compile item pattern")?;
    let answer_pattern = profile
        .answer_pattern
        .as_deref()
        .map(Regex::new)
        .transpose()
        .context("failed to compile answer pattern")?;
    let chapter_pattern = profile
        .chapter_pattern
        .as_deref()
        .map(Regex::new)
        .transpose()
        .context("failed to compile chapter pattern")?;

    let text = body.text.as_str();
    let chapters = match &chapter_pattern {
        Some(pattern) => find_chapters(text, pattern),
        None => Vec::new(),
    };
    let headers = find_headers(text, &item_pattern, &chapters);

    let mut drafts = Vec::with_capacity(headers.len());
    for (index, header) in headers.iter().enumerate() {
        let span_end = headers
            .get(index + 1)
            .map(|next| next.start)
            .unwrap_or(text.len());
        let span_end = chapters
            .iter()
            .map(|chapter| chapter.start)
            .filter(|start| *start > header.end && *start < span_end)
            .min()
            .unwrap_or(span_end);

        let (prompt, answer_start) = match (&answer_pattern, &header.chapter) {
            (Some(pattern), _) => match pattern.find(&text[header.end..span_end]) {
                Some(found) => (
                    normalize_whitespace(&text[header.end..header.end + found.start()]),
                    header.end + found.end(),
                ),
                None => {
                    warn!(number = header.number, "answer marker not found; using whole span");
                    (String::new(), header.end)
                }
            },
            (None, Some((_, title))) => (title.clone(), header.end),
            (None, None) => (String::new(), header.end),
        };

        let stream = answer_stream(body, answer_start, span_end);
        drafts.push(ItemDraft {
            printed_number: header.number,
            chapter: header.chapter.as_ref().map(|(number, _)| *number),
            prompt,
            answer: normalize_whitespace(&text[answer_start..span_end]),
            stream,
        });
    }

    debug!(items = drafts.len(), chapters = chapters.len(), "split body stream");
    Ok(drafts)
}

#[derive(Debug, Clone)]
struct ChapterHeader {
    start: usize,
    end: usize,
    number: u32,
    title: String,
}

fn find_chapters(text: &str, pattern: &Regex) -> Vec<ChapterHeader> {
    pattern
        .captures_iter(text)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            let number = parse_item_number(captures.name("number")?.as_str())?;
            let title = captures
                .name("title")
                .map(|title| normalize_whitespace(title.as_str()))
                .unwrap_or_default();
            Some(ChapterHeader {
                start: whole.start(),
                end: whole.end(),
                number,
                title,
            })
        })
        .collect()
}

fn find_headers(text: &str, pattern: &Regex, chapters: &[ChapterHeader]) -> Vec<Header> {
    pattern
        .captures_iter(text)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            if chapters
                .iter()
                .any(|chapter| whole.start() >= chapter.start && whole.start() < chapter.end)
            {
                return None;
            }
            let number = parse_item_number(captures.name("number")?.as_str())?;
            let chapter = chapters
                .iter()
                .rev()
                .find(|chapter| chapter.end <= whole.start())
                .map(|chapter| (chapter.number, chapter.title.clone()));
            Some(Header {
                start: whole.start(),
                end: whole.end(),
                number,
                chapter,
            })
        })
        .collect()
}

fn answer_stream(body: &BodyStream, start: usize, end: usize) -> Vec<StreamItem> {
    let text = body.text.as_str();
    let mut stream = Vec::new();
    let mut cursor = start;

    for &(offset, number) in &body.anchors {
        if offset < start || offset > end {
            continue;
        }
        let offset = floor_char_boundary(text, offset.min(text.len()));
        if offset > cursor {
            stream.push(StreamItem::Text(text[cursor..offset].to_string()));
            cursor = offset;
        }
        stream.push(StreamItem::Marker(number));
    }

    if end > cursor {
        stream.push(StreamItem::Text(text[cursor..end].to_string()));
    }

    stream
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

pub fn parse_item_number(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<u32>() {
        return Some(value);
    }
    parse_roman(raw)
}

pub fn parse_roman(raw: &str) -> Option<u32> {
    if raw.is_empty() {
        return None;
    }

    let mut total = 0u32;
    let mut previous = 0u32;
    for character in raw.chars().rev() {
        let value = match character.to_ascii_uppercase() {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            'C' => 100,
            'D' => 500,
            'M' => 1000,
            _ => return None,
        };
        if value < previous {
            total = total.checked_sub(value)?;
        } else {
            total += value;
            previous = value;
        }
    }

    (total > 0).then_some(total)
}

pub fn item_numbering(kind: DocumentKind, drafts: &[ItemDraft]) -> Vec<(u32, Option<u32>)> {
    drafts
        .iter()
        .enumerate()
        .map(|(index, draft)| match kind {
            DocumentKind::Confession => ((index + 1) as u32, Some(draft.printed_number)),
            DocumentKind::ShorterCatechism | DocumentKind::LargerCatechism => {
                (draft.printed_number, None)
            }
        })
        .collect()
}
