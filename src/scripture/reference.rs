use std::fmt;

use anyhow::{Context, Result, bail};
use regex::Regex;

use super::books::{Book, lookup_book};

const DOT_VERSE_PATTERN: &str = r"([1-3]?[A-Za-z]+)\.(\d+)\.(\d+)";
const DOT_CHAPTER_PATTERN: &str = r"([A-Za-z])\.\s*(\d)";
const BOOK_PREFIX_PATTERN: &str =
    r"^(?P<book>(?:[1-3]|I{1,3}\s)?\s*[A-Za-z][A-Za-z\s]*?)\s*(?P<rest>\d[\d:\s\-A-Za-z]*)$";
const LOCATOR_PATTERN: &str = r"^(?P<chapter>\d+)(?::(?P<verse>\d+))?$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    Verse { chapter: u32, verse: u32 },
    VerseRange { chapter: u32, start: u32, end: u32 },
    CrossChapter { start_chapter: u32, start_verse: u32, end_chapter: u32, end_verse: u32 },
    Chapter { chapter: u32 },
    ChapterRange { start: u32, end: u32 },
}

impl Span {
    pub fn bounds(&self) -> ((u32, u32), (u32, Option<u32>)) {
        match *self {
            Self::Verse { chapter, verse } => ((chapter, verse), (chapter, Some(verse))),
            Self::VerseRange { chapter, start, end } => ((chapter, start), (chapter, Some(end))),
            Self::CrossChapter {
                start_chapter,
                start_verse,
                end_chapter,
                end_verse,
            } => ((start_chapter, start_verse), (end_chapter, Some(end_verse))),
            Self::Chapter { chapter } => ((chapter, 1), (chapter, None)),
            Self::ChapterRange { start, end } => ((start, 1), (end, None)),
        }
    }

    pub fn is_single_verse(&self) -> bool {
        matches!(self, Self::Verse { .. })
    }

    pub fn spans_chapters(&self) -> bool {
        matches!(self, Self::CrossChapter { .. } | Self::ChapterRange { .. })
    }

    fn is_chapter_level(&self) -> bool {
        matches!(self, Self::Chapter { .. } | Self::ChapterRange { .. })
    }

    fn last_chapter(&self) -> u32 {
        self.bounds().1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Citation {
    pub book: &'static Book,
    pub span: Span,
}

impl Citation {
    pub fn api_path(&self) -> String {
        format!("{}+{}", self.book.api_name(), self.locator())
    }

    fn locator(&self) -> String {
        match self.span {
            Span::Verse { chapter, verse } => format!("{chapter}:{verse}"),
            Span::VerseRange { chapter, start, end } => format!("{chapter}:{start}-{end}"),
            Span::CrossChapter {
                start_chapter,
                start_verse,
                end_chapter,
                end_verse,
            } => format!("{start_chapter}:{start_verse}-{end_chapter}:{end_verse}"),
            Span::Chapter { chapter } => chapter.to_string(),
            Span::ChapterRange { start, end } => format!("{start}-{end}"),
        }
    }
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.book.name, self.locator())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    pub citations: Vec<Citation>,
}

impl Passage {
    pub fn canonical(&self) -> String {
        self.citations
            .iter()
            .map(Citation::to_string)
            .collect::<Vec<String>>()
            .join("; ")
    }
}

#[derive(Debug, Clone)]
pub struct ReferenceParser {
    dot_verse: Regex,
    dot_chapter: Regex,
    book_prefix: Regex,
    locator: Regex,
}

#[derive(Debug, Clone, Copy)]
struct Locator {
    chapter: u32,
    verse: Option<u32>,
}

impl ReferenceParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dot_verse: Regex::new(DOT_VERSE_PATTERN).context("failed to compile dot verse regex")?,
            dot_chapter: Regex::new(DOT_CHAPTER_PATTERN)
                .context("failed to compile dot chapter regex")?,
            book_prefix: Regex::new(BOOK_PREFIX_PATTERN)
                .context("failed to compile book prefix regex")?,
            locator: Regex::new(LOCATOR_PATTERN).context("failed to compile locator regex")?,
        })
    }

    pub fn parse(&self, raw: &str) -> Result<Passage> {
        let normalized = self.normalize_notation(raw);
        if normalized.is_empty() {
            bail!("empty reference");
        }

        let mut citations: Vec<Citation> = Vec::new();
        for part in normalized.split([';', ',']) {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let citation = self
                .parse_part(part, citations.last())
                .with_context(|| format!("unrecognized reference part {part:?} in {raw:?}"))?;
            citations.push(citation);
        }

        if citations.is_empty() {
            bail!("no citations in reference {raw:?}");
        }
        Ok(Passage { citations })
    }

    fn normalize_notation(&self, raw: &str) -> String {
        let text = self.dot_verse.replace_all(raw.trim(), "$1 $2:$3");
        let text = self.dot_chapter.replace_all(&text, "$1 $2");
        let text = text.replace(['\u{2013}', '\u{2014}'], "-");
        text.trim().trim_end_matches('.').trim().to_string()
    }

    fn parse_part(&self, part: &str, previous: Option<&Citation>) -> Result<Citation> {
        if let Some(captures) = self.book_prefix.captures(part) {
            let name = captures.name("book").map(|m| m.as_str()).unwrap_or_default();
            let rest = captures.name("rest").map(|m| m.as_str()).unwrap_or_default();
            let book = lookup_book(name).with_context(|| format!("unknown book {name:?}"))?;
            let span = self.parse_span(book, rest, None)?;
            return Ok(Citation { book, span });
        }

        let Some(previous) = previous else {
            bail!("reference has no book name");
        };
        let context = (!previous.span.is_chapter_level()).then(|| previous.span.last_chapter());
        let span = self.parse_span(previous.book, part, context)?;
        Ok(Citation {
            book: previous.book,
            span,
        })
    }

    fn parse_locator(&self, raw: &str) -> Result<Locator> {
        let compact = raw.split_whitespace().collect::<String>();
        let captures = self
            .locator
            .captures(&compact)
            .with_context(|| format!("malformed chapter/verse {raw:?}"))?;
        let chapter = captures
            .name("chapter")
            .map(|m| m.as_str())
            .unwrap_or_default()
            .parse::<u32>()
            .context("chapter out of range")?;
        let verse = captures
            .name("verse")
            .map(|m| m.as_str().parse::<u32>())
            .transpose()
            .context("verse out of range")?;
        Ok(Locator { chapter, verse })
    }

    fn parse_span(&self, book: &'static Book, raw: &str, context: Option<u32>) -> Result<Span> {
        let (start_raw, end_raw) = match raw.split_once('-') {
            Some((start, end)) => (start.trim(), Some(self.strip_repeated_book(book, end.trim())?)),
            None => (raw.trim(), None),
        };

        let mut start = self.parse_locator(start_raw)?;
        if start.verse.is_none() {
            if let Some(chapter) = context {
                start = Locator {
                    chapter,
                    verse: Some(start.chapter),
                };
            } else if book.single_chapter {
                start = Locator {
                    chapter: 1,
                    verse: Some(start.chapter),
                };
            }
        }

        let Some(end_raw) = end_raw else {
            return Ok(match start.verse {
                Some(verse) => Span::Verse {
                    chapter: start.chapter,
                    verse,
                },
                None => Span::Chapter {
                    chapter: start.chapter,
                },
            });
        };

        let end = self.parse_locator(&end_raw)?;
        let span = match (start.verse, end.verse) {
            (Some(start_verse), None) => Span::VerseRange {
                chapter: start.chapter,
                start: start_verse,
                end: end.chapter,
            },
            (Some(start_verse), Some(end_verse)) if end.chapter == start.chapter => {
                Span::VerseRange {
                    chapter: start.chapter,
                    start: start_verse,
                    end: end_verse,
                }
            }
            (Some(start_verse), Some(end_verse)) => Span::CrossChapter {
                start_chapter: start.chapter,
                start_verse,
                end_chapter: end.chapter,
                end_verse,
            },
            (None, None) => Span::ChapterRange {
                start: start.chapter,
                end: end.chapter,
            },
            (None, Some(end_verse)) => Span::CrossChapter {
                start_chapter: start.chapter,
                start_verse: 1,
                end_chapter: end.chapter,
                end_verse,
            },
        };

        let ((first_chapter, first_verse), (last_chapter, last_verse)) = span.bounds();
        if (last_chapter, last_verse.unwrap_or(u32::MAX)) < (first_chapter, first_verse) {
            bail!("range end precedes its start in {raw:?}");
        }
        Ok(span)
    }

    fn strip_repeated_book(&self, book: &'static Book, end: &str) -> Result<String> {
        let Some(captures) = self.book_prefix.captures(end) else {
            return Ok(end.to_string());
        };
        let name = captures.name("book").map(|m| m.as_str()).unwrap_or_default();
        match lookup_book(name) {
            Some(found) if found == book => Ok(captures
                .name("rest")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()),
            _ => bail!("range crosses into another book: {end:?}"),
        }
    }
}
