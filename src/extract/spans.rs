use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const TJ_SPACE_THRESHOLD: f32 = -200.0;

const SPAN_FLAG_BOLD: u32 = 1 << 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    #[serde(default, alias = "font")]
    pub font_name: String,
    #[serde(alias = "size")]
    pub font_size: f32,
    #[serde(default)]
    pub is_bold: bool,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

fn default_page() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct SpanDumpEntry {
    #[serde(flatten)]
    token: Token,
    #[serde(default)]
    flags: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PageLimits {
    pub first: Option<u32>,
    pub last: Option<u32>,
}

impl PageLimits {
    fn contains(&self, page: u32) -> bool {
        self.first.is_none_or(|first| page >= first) && self.last.is_none_or(|last| page <= last)
    }
}

pub fn load_span_dump(path: &Path, limits: PageLimits) -> Result<Vec<Token>> {
    let raw = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let entries: Vec<SpanDumpEntry> = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse span dump {}", path.display()))?;

    let tokens = entries
        .into_iter()
        .map(|entry| {
            let mut token = entry.token;
            if entry.flags.is_some_and(|flags| flags & SPAN_FLAG_BOLD != 0) {
                token.is_bold = true;
            }
            token
        })
        .filter(|token| limits.contains(token.page))
        .collect::<Vec<Token>>();

    info!(path = %path.display(), tokens = tokens.len(), "loaded span dump");
    Ok(tokens)
}

pub fn load_pdf_tokens(path: &Path, limits: PageLimits, bold_hints: &[String]) -> Result<Vec<Token>> {
    let document =
        Document::load(path).with_context(|| format!("failed to load PDF {}", path.display()))?;
    if document.is_encrypted() {
        bail!("PDF is encrypted and cannot be read: {}", path.display());
    }

    let mut tokens = Vec::new();
    for (page_number, page_id) in document.get_pages() {
        if !limits.contains(page_number) {
            continue;
        }

        match read_page_tokens(&document, page_number, page_id, bold_hints) {
            Ok(page_tokens) => {
                debug!(page = page_number, tokens = page_tokens.len(), "read page");
                tokens.extend(page_tokens);
            }
            Err(error) => {
                warn!(page = page_number, error = %error, "skipping unreadable page");
            }
        }
    }

    if tokens.is_empty() {
        bail!("no text runs found in {}", path.display());
    }

    info!(path = %path.display(), tokens = tokens.len(), "read PDF text runs");
    Ok(tokens)
}

#[derive(Debug, Clone, Copy)]
struct TextState {
    matrix: [f32; 6],
    line_matrix: [f32; 6],
    font_size: f32,
    leading: f32,
}

impl TextState {
    const IDENTITY: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

    fn new() -> Self {
        Self {
            matrix: Self::IDENTITY,
            line_matrix: Self::IDENTITY,
            font_size: 0.0,
            leading: 0.0,
        }
    }

    fn begin_text(&mut self) {
        self.matrix = Self::IDENTITY;
        self.line_matrix = Self::IDENTITY;
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        let [a, b, c, d, e, f] = self.line_matrix;
        self.line_matrix = [a, b, c, d, tx * a + ty * c + e, tx * b + ty * d + f];
        self.matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn effective_size(&self) -> f32 {
        let [_, b, _, d, _, _] = self.matrix;
        let scale = (b * b + d * d).sqrt();
        let scale = if scale > 0.0 { scale } else { 1.0 };
        (self.font_size * scale * 100.0).round() / 100.0
    }
}

fn read_page_tokens(
    document: &Document,
    page_number: u32,
    page_id: ObjectId,
    bold_hints: &[String],
) -> Result<Vec<Token>> {
    let fonts = page_font_names(document, page_id);
    let content_bytes = document
        .get_page_content(page_id)
        .with_context(|| format!("failed to read content of page {page_number}"))?;
    let content = Content::decode(&content_bytes)
        .with_context(|| format!("failed to decode content of page {page_number}"))?;

    let mut state = TextState::new();
    let mut font_name = String::new();
    let mut tokens = Vec::new();

    for operation in &content.operations {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            "BT" => state.begin_text(),
            "Tf" => {
                if let Some(Object::Name(resource)) = operands.first() {
                    font_name = fonts
                        .get(resource.as_slice())
                        .cloned()
                        .unwrap_or_else(|| String::from_utf8_lossy(resource).into_owned());
                }
                if let Some(size) = operands.get(1).and_then(number_operand) {
                    state.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number_operand) {
                    state.leading = leading;
                }
            }
            "Tm" => {
                let values = operands.iter().filter_map(number_operand).collect::<Vec<f32>>();
                if let [a, b, c, d, e, f] = values[..] {
                    state.line_matrix = [a, b, c, d, e, f];
                    state.matrix = state.line_matrix;
                }
            }
            "Td" | "TD" => {
                let values = operands.iter().filter_map(number_operand).collect::<Vec<f32>>();
                if let [tx, ty] = values[..] {
                    if operation.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.move_line(tx, ty);
                }
            }
            "T*" => state.next_line(),
            "Tj" | "TJ" | "'" | "\"" => {
                if matches!(operation.operator.as_str(), "'" | "\"") {
                    state.next_line();
                }
                let Some(text) = operands.last().and_then(decode_text_operand) else {
                    continue;
                };
                if text.is_empty() {
                    continue;
                }
                tokens.push(Token {
                    is_bold: font_is_bold(&font_name, bold_hints),
                    font_name: font_name.clone(),
                    font_size: state.effective_size(),
                    page: page_number,
                    x: state.matrix[4],
                    y: state.matrix[5],
                    text,
                });
            }
            _ => {}
        }
    }

    Ok(tokens)
}

fn page_font_names(document: &Document, page_id: ObjectId) -> BTreeMap<Vec<u8>, String> {
    let mut names = BTreeMap::new();
    let mut node = document.get_dictionary(page_id).ok();
    let mut depth = 0;

    while let Some(dictionary) = node {
        if let Some(fonts) = dictionary
            .get(b"Resources")
            .ok()
            .and_then(|resources| resolve_dictionary(document, resources))
            .and_then(|resources| resources.get(b"Font").ok())
            .and_then(|fonts| resolve_dictionary(document, fonts))
        {
            for (resource, font) in fonts.iter() {
                if names.contains_key(resource) {
                    continue;
                }
                let base_font = resolve_dictionary(document, font)
                    .and_then(|font| font.get(b"BaseFont").ok())
                    .and_then(|name| match name {
                        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
                        _ => None,
                    });
                if let Some(base_font) = base_font {
                    names.insert(resource.clone(), base_font);
                }
            }
        }

        depth += 1;
        if depth > 32 {
            break;
        }
        node = dictionary
            .get(b"Parent")
            .ok()
            .and_then(|parent| resolve_dictionary(document, parent));
    }

    names
}

fn resolve_dictionary<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    let object = match object {
        Object::Reference(id) => document.get_object(*id).ok()?,
        other => other,
    };
    match object {
        Object::Dictionary(dictionary) => Some(dictionary),
        _ => None,
    }
}

pub fn font_is_bold(font_name: &str, bold_hints: &[String]) -> bool {
    bold_hints
        .iter()
        .any(|hint| !hint.is_empty() && font_name.contains(hint.as_str()))
}

fn number_operand(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

fn decode_text_operand(object: &Object) -> Option<String> {
    match object {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        Object::Array(items) => {
            let mut text = String::new();
            for item in items {
                match item {
                    Object::String(bytes, _) => text.push_str(&decode_pdf_string(bytes)),
                    other => {
                        let gap = number_operand(other).unwrap_or_default();
                        if gap < TJ_SPACE_THRESHOLD && !text.ends_with(' ') {
                            text.push(' ');
                        }
                    }
                }
            }
            Some(text)
        }
        _ => None,
    }
}

pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect::<Vec<u16>>();
        return String::from_utf16_lossy(&units);
    }

    bytes.iter().map(|&byte| byte as char).collect()
}
