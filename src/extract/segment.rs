use crate::model::Clause;
use crate::util::normalize_whitespace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamItem {
    Text(String),
    Marker(u32),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrailingText {
    #[default]
    Merge,
    OwnClause,
}

pub fn segment_clauses(stream: &[StreamItem], trailing: TrailingText) -> Vec<Clause> {
    let mut clauses: Vec<Clause> = Vec::new();
    let mut buffer = String::new();
    let mut leading_markers: Vec<u32> = Vec::new();

    for item in stream {
        match item {
            StreamItem::Text(text) => buffer.push_str(text),
            StreamItem::Marker(number) => {
                let text = normalize_whitespace(&buffer);
                buffer.clear();

                if !text.is_empty() {
                    let mut clause = Clause::new(text, None);
                    let mut numbers = leading_markers.drain(..).chain(std::iter::once(*number));
                    clause.footnote_number = numbers.next();
                    clause.additional_footnotes = numbers.collect();
                    clauses.push(clause);
                } else if let Some(previous) = clauses.last_mut() {
                    previous.additional_footnotes.push(*number);
                } else {
                    leading_markers.push(*number);
                }
            }
        }
    }

    let tail = normalize_whitespace(&buffer);
    if tail.is_empty() {
        return clauses;
    }

    match clauses.last_mut() {
        Some(last) if trailing == TrailingText::Merge => {
            last.text = join_clause_text(&last.text, &tail);
        }
        _ => {
            let mut clause = Clause::new(tail, None);
            let mut numbers = leading_markers.into_iter();
            clause.footnote_number = numbers.next();
            clause.additional_footnotes = numbers.collect();
            clauses.push(clause);
        }
    }

    clauses
}

fn join_clause_text(head: &str, tail: &str) -> String {
    let attaches = tail
        .chars()
        .next()
        .is_some_and(|character| matches!(character, '.' | ',' | ';' | ':' | '?' | '!' | ')'));
    if attaches {
        format!("{head}{tail}")
    } else {
        format!("{head} {tail}")
    }
}
