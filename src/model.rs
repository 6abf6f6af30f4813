use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Confession,
    ShorterCatechism,
    LargerCatechism,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confession => "confession",
            Self::ShorterCatechism => "shorter_catechism",
            Self::LargerCatechism => "larger_catechism",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub kind: DocumentKind,
    pub questions: Vec<Question>,
    #[serde(default)]
    pub footnotes: Vec<FootnoteEntry>,
}

impl Document {
    pub fn outline(&self) -> Vec<OutlineQuestion> {
        self.questions
            .iter()
            .map(|question| OutlineQuestion {
                number: question.number,
                question: question.question.clone(),
                answer: question.answer.clone(),
                clauses: question
                    .clauses
                    .iter()
                    .map(|clause| OutlineClause {
                        text: clause.text.clone(),
                        footnote_number: clause.footnote_number,
                        additional_footnotes: clause.additional_footnotes.clone(),
                    })
                    .collect(),
                chapter: question.chapter,
                section: question.section,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub number: u32,
    pub question: String,
    pub answer: String,
    pub clauses: Vec<Clause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub text: String,
    pub footnote_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_footnotes: Vec<u32>,
    #[serde(default)]
    pub proof_texts: Vec<ProofText>,
}

impl Clause {
    pub fn new(text: String, footnote_number: Option<u32>) -> Self {
        Self {
            text,
            footnote_number,
            additional_footnotes: Vec::new(),
            proof_texts: Vec::new(),
        }
    }

    pub fn footnote_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.footnote_number
            .into_iter()
            .chain(self.additional_footnotes.iter().copied())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlineQuestion {
    pub number: u32,
    pub question: String,
    pub answer: String,
    pub clauses: Vec<OutlineClause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlineClause {
    pub text: String,
    pub footnote_number: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional_footnotes: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootnoteEntry {
    pub number: u32,
    pub proof_texts: Vec<ProofText>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofText {
    pub reference: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub command: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub profile: String,
    pub source_path: String,
    pub source_sha256: String,
    pub output_path: String,
    pub counts: RunCounts,
    pub calibration: Option<crate::extract::Calibration>,
    pub footnote_calibration: Option<crate::extract::Calibration>,
    pub checks: Vec<crate::extract::IntegrityCheck>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunCounts {
    pub token_count: usize,
    pub body_token_count: usize,
    pub marker_token_count: usize,
    pub reference_token_count: usize,
    pub page_number_token_count: usize,
    pub question_count: usize,
    pub clause_count: usize,
    pub footnote_count: usize,
    pub proof_text_count: usize,
    pub unresolved_footnote_count: usize,
}
