use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::books::book_by_number;
use super::rate_limit::RequestWindow;
use super::reference::{Citation, ReferenceParser};
use crate::util::ensure_directory;

pub const NOT_FOUND_PREFIX: &str = "[Reference not found]";
pub const LOOKUP_ERROR_PREFIX: &str = "[Lookup error]";
pub const UNRECOGNIZED_PREFIX: &str = "[Unrecognized reference]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verse {
    pub chapter: u32,
    pub verse: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(Vec<Verse>),
    NotFound,
    Failed(String),
}

pub trait VerseSource {
    fn name(&self) -> &'static str;

    fn fetch(&mut self, citation: &Citation) -> Lookup;
}

#[derive(Debug, Deserialize)]
struct KjvDump {
    resultset: KjvResultSet,
}

#[derive(Debug, Deserialize)]
struct KjvResultSet {
    #[serde(default)]
    row: Vec<KjvRow>,
}

#[derive(Debug, Deserialize)]
struct KjvRow {
    #[serde(default)]
    field: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default)]
pub struct KjvDataset {
    verses: BTreeMap<(u8, u32, u32), String>,
}

impl KjvDataset {
    pub fn from_json_bytes(raw: &[u8]) -> Result<Self> {
        let dump: KjvDump = serde_json::from_slice(raw).context("failed to parse KJV dataset")?;

        let mut verses = BTreeMap::new();
        let mut skipped = 0usize;
        for row in dump.resultset.row {
            match parse_row(&row.field) {
                Some((key, text)) => {
                    verses.insert(key, text);
                }
                None => skipped += 1,
            }
        }

        if verses.is_empty() {
            bail!("KJV dataset contains no verses");
        }
        if skipped > 0 {
            warn!(skipped, "skipped malformed KJV rows");
        }
        Ok(Self { verses })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let dataset = Self::from_json_bytes(&raw)
            .with_context(|| format!("failed to load KJV dataset {}", path.display()))?;
        info!(path = %path.display(), verses = dataset.len(), "loaded KJV dataset");
        Ok(dataset)
    }

    pub fn load_or_download(path: &Path, url: Option<&str>, timeout: Duration) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }
        let Some(url) = url else {
            bail!(
                "KJV dataset not found at {}; pass --kjv-url to download it",
                path.display()
            );
        };

        info!(url, path = %path.display(), "downloading KJV dataset");
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        let bytes = client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.bytes())
            .with_context(|| format!("failed to download KJV dataset from {url}"))?;

        let dataset = Self::from_json_bytes(&bytes)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_directory(parent)?;
            }
        }
        fs::write(path, &bytes).with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), verses = dataset.len(), "cached KJV dataset");
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.verses.len()
    }
}

fn parse_row(field: &[serde_json::Value]) -> Option<((u8, u32, u32), String)> {
    let [_, book, chapter, verse, text, ..] = field else {
        return None;
    };
    let book = book_by_number(u8::try_from(book.as_u64()?).ok()?)?.number;
    let chapter = u32::try_from(chapter.as_u64()?).ok()?;
    let verse = u32::try_from(verse.as_u64()?).ok()?;
    Some(((book, chapter, verse), text.as_str()?.trim().to_string()))
}

impl VerseSource for KjvDataset {
    fn name(&self) -> &'static str {
        "dataset"
    }

    fn fetch(&mut self, citation: &Citation) -> Lookup {
        let book = citation.book.number;
        let ((first_chapter, first_verse), (last_chapter, last_verse)) = citation.span.bounds();
        let verses = self
            .verses
            .range((book, first_chapter, first_verse)..=(book, last_chapter, last_verse.unwrap_or(u32::MAX)))
            .map(|(&(_, chapter, verse), text)| Verse {
                chapter,
                verse,
                text: text.clone(),
            })
            .collect::<Vec<Verse>>();

        if verses.is_empty() {
            Lookup::NotFound
        } else {
            Lookup::Found(verses)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    verses: Vec<ApiVerse>,
}

#[derive(Debug, Deserialize)]
struct ApiVerse {
    #[serde(default)]
    chapter: Option<u32>,
    verse: u32,
    text: String,
}

#[derive(Debug)]
pub struct BibleApi {
    client: Client,
    base_url: String,
    translation: String,
    window: RequestWindow,
}

impl BibleApi {
    pub fn new(base_url: &str, translation: &str, timeout: Duration, window: RequestWindow) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            translation: translation.to_string(),
            window,
        })
    }

    pub fn url_for(&self, citation: &Citation) -> String {
        format!(
            "{}/{}?translation={}",
            self.base_url,
            citation.api_path(),
            self.translation
        )
    }
}

impl VerseSource for BibleApi {
    fn name(&self) -> &'static str {
        "api"
    }

    fn fetch(&mut self, citation: &Citation) -> Lookup {
        self.window.acquire();
        let url = self.url_for(citation);
        debug!(url = %url, "requesting passage");

        let response = match self.client.get(&url).send() {
            Ok(response) => response,
            Err(error) => return Lookup::Failed(error.to_string()),
        };
        if response.status() == StatusCode::NOT_FOUND {
            return Lookup::NotFound;
        }
        if !response.status().is_success() {
            return Lookup::Failed(format!("HTTP {}", response.status()));
        }

        match response.json::<ApiResponse>() {
            Ok(body) => api_verses(citation, body),
            Err(error) => Lookup::Failed(error.to_string()),
        }
    }
}

fn api_verses(citation: &Citation, body: ApiResponse) -> Lookup {
    let ((first_chapter, first_verse), _) = citation.span.bounds();
    let verses = if body.verses.is_empty() {
        body.text
            .map(|text| Verse {
                chapter: first_chapter,
                verse: first_verse,
                text: text.trim().to_string(),
            })
            .into_iter()
            .collect::<Vec<Verse>>()
    } else {
        body.verses
            .into_iter()
            .map(|verse| Verse {
                chapter: verse.chapter.unwrap_or(first_chapter),
                verse: verse.verse,
                text: verse.text.trim().to_string(),
            })
            .collect()
    };

    if verses.iter().all(|verse| verse.text.is_empty()) {
        Lookup::NotFound
    } else {
        Lookup::Found(verses)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LookupStats {
    pub citations: usize,
    pub cache_hits: usize,
    pub found: usize,
    pub not_found: usize,
    pub failed: usize,
    pub unrecognized: usize,
}

pub struct VerseStore {
    source: Box<dyn VerseSource>,
    parser: ReferenceParser,
    cache: HashMap<String, Lookup>,
    stats: LookupStats,
}

impl VerseStore {
    pub fn new(source: Box<dyn VerseSource>) -> Result<Self> {
        Ok(Self {
            source,
            parser: ReferenceParser::new()?,
            cache: HashMap::new(),
            stats: LookupStats::default(),
        })
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    pub fn stats(&self) -> &LookupStats {
        &self.stats
    }

    pub fn passage_text(&mut self, reference: &str) -> String {
        let passage = match self.parser.parse(reference) {
            Ok(passage) => passage,
            Err(error) => {
                warn!(reference, error = %error, "unrecognized scripture reference");
                self.stats.unrecognized += 1;
                return format!("{UNRECOGNIZED_PREFIX} {reference}");
            }
        };

        passage
            .citations
            .iter()
            .map(|citation| self.citation_text(citation))
            .collect::<Vec<String>>()
            .join(" | ")
    }

    fn citation_text(&mut self, citation: &Citation) -> String {
        let key = citation.to_string();
        self.stats.citations += 1;

        let lookup = match self.cache.get(&key) {
            Some(cached) => {
                self.stats.cache_hits += 1;
                cached.clone()
            }
            None => {
                let fetched = self.source.fetch(citation);
                match &fetched {
                    Lookup::Found(_) => self.stats.found += 1,
                    Lookup::NotFound => self.stats.not_found += 1,
                    Lookup::Failed(reason) => {
                        self.stats.failed += 1;
                        warn!(citation = %key, reason = %reason, "verse lookup failed");
                    }
                }
                self.cache.insert(key.clone(), fetched.clone());
                fetched
            }
        };

        match lookup {
            Lookup::Found(verses) => format_verses(citation, &verses),
            Lookup::NotFound => format!("{NOT_FOUND_PREFIX} {key}"),
            Lookup::Failed(_) => format!("{LOOKUP_ERROR_PREFIX} {key}"),
        }
    }
}

fn format_verses(citation: &Citation, verses: &[Verse]) -> String {
    if citation.span.is_single_verse() && verses.len() == 1 {
        return verses[0].text.clone();
    }

    let spans_chapters = citation.span.spans_chapters();
    verses
        .iter()
        .map(|verse| {
            if spans_chapters {
                format!("[{}:{}] {}", verse.chapter, verse.verse, verse.text)
            } else {
                format!("[{}] {}", verse.verse, verse.text)
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn is_placeholder(text: &str) -> bool {
    [NOT_FOUND_PREFIX, LOOKUP_ERROR_PREFIX, UNRECOGNIZED_PREFIX]
        .iter()
        .any(|prefix| text.starts_with(prefix))
}
