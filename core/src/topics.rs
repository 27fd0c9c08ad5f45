//! Reader for TREC topic files (`<top>` records).

use crate::eval::Query;
use anyhow::{Context, Result};
use std::path::Path;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    Description,
    Narrative,
}

/// Parse topic records. A record without a usable `<num>` is skipped.
pub fn parse_topics(contents: &str) -> Vec<Query> {
    let mut queries = Vec::new();
    let mut current = Query::default();
    let mut number: Option<u32> = None;
    let mut malformed = false;
    let mut field = Field::None;

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("<top>") {
            current = Query::default();
            number = None;
            malformed = false;
            field = Field::None;
        } else if line.starts_with("<num>") {
            field = Field::None;
            number = parse_number(line);
            if number.is_none() {
                tracing::warn!(line, "malformed topic number");
                malformed = true;
            }
        } else if line.starts_with("<title>") {
            field = Field::None;
            current.title = strip_tags(line, &["<title>", "</title>"]);
        } else if line.starts_with("<desc>") {
            field = Field::Description;
            append(&mut current.description, &strip_label(line, "<desc>", "Description:"));
        } else if line.starts_with("<narr>") {
            field = Field::Narrative;
            append(&mut current.narrative, &strip_label(line, "<narr>", "Narrative:"));
        } else if line.starts_with("</top>") {
            match number {
                Some(topic) if !malformed => {
                    current.topic = topic;
                    queries.push(std::mem::take(&mut current));
                }
                _ => tracing::warn!(title = %current.title, "skipping topic without a valid number"),
            }
            current = Query::default();
            number = None;
            malformed = false;
            field = Field::None;
        } else {
            match field {
                Field::Description => append(&mut current.description, line),
                Field::Narrative => append(&mut current.narrative, line),
                Field::None => {}
            }
        }
    }
    queries
}

pub fn load_topics(path: &Path) -> Result<Vec<Query>> {
    let contents = std::fs::read_to_string(path).with_context(|| format!("reading topics {}", path.display()))?;
    let queries = parse_topics(&contents);
    tracing::info!(topics = queries.len(), path = %path.display(), "loaded topics");
    Ok(queries)
}

/// `<num> Number: 301` -> 301
fn parse_number(line: &str) -> Option<u32> {
    let inner = strip_tags(line, &["<num>", "</num>"]);
    let (_, value) = inner.split_once(':')?;
    value.trim().parse().ok()
}

fn strip_tags(line: &str, tags: &[&str]) -> String {
    let mut s = line.to_string();
    for tag in tags {
        s = s.replace(tag, "");
    }
    s.trim().to_string()
}

fn strip_label(line: &str, tag: &str, label: &str) -> String {
    let rest = line.trim_start_matches(tag).trim();
    rest.strip_prefix(label).unwrap_or(rest).trim().to_string()
}

fn append(buf: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    if !buf.is_empty() {
        buf.push(' ');
    }
    buf.push_str(text);
}
