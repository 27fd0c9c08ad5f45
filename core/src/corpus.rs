//! Reader for TREC-style `<DOC>` collections.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrecDocument {
    pub docno: String,
    pub text: String,
}

/// Parse every document in one file's contents.
///
/// The DOCNO is the trimmed content of the `<DOCNO>` line. Text is collected
/// between `<TEXT>` and `</TEXT>`, including anything on the tag lines; several
/// TEXT blocks are joined with a space and end of input closes an open block.
pub fn parse_documents(contents: &str) -> Vec<TrecDocument> {
    let mut docs = Vec::new();
    let mut docno: Option<String> = None;
    let mut text = String::new();
    let mut in_text = false;
    let mut in_doc = false;

    let mut finish = |docno: &mut Option<String>, text: &mut String| {
        match docno.take() {
            Some(no) if !no.is_empty() => docs.push(TrecDocument { docno: no, text: text.trim().to_string() }),
            _ => tracing::warn!("skipping document without DOCNO"),
        }
        text.clear();
    };

    for line in contents.lines() {
        if in_text {
            match line.find("</TEXT>") {
                Some(end) => {
                    push_text(&mut text, &line[..end]);
                    in_text = false;
                }
                None => push_text(&mut text, line),
            }
            continue;
        }
        if line.contains("<DOC>") {
            if in_doc {
                finish(&mut docno, &mut text);
            }
            in_doc = true;
        } else if line.contains("</DOC>") {
            finish(&mut docno, &mut text);
            in_doc = false;
        } else if line.contains("<DOCNO>") {
            docno = Some(line.replace("<DOCNO>", "").replace("</DOCNO>", "").trim().to_string());
            in_doc = true;
        } else if let Some(start) = line.find("<TEXT>") {
            let rest = &line[start + "<TEXT>".len()..];
            match rest.find("</TEXT>") {
                Some(end) => push_text(&mut text, &rest[..end]),
                None => {
                    push_text(&mut text, rest);
                    in_text = true;
                }
            }
            in_doc = true;
        }
    }
    if in_doc {
        finish(&mut docno, &mut text);
    }
    docs
}

fn push_text(buf: &mut String, fragment: &str) {
    let fragment = fragment.trim();
    if fragment.is_empty() {
        return;
    }
    if !buf.is_empty() {
        buf.push(' ');
    }
    buf.push_str(fragment);
}

/// All `*.txt` files under `dir`, in file-name order.
pub fn corpus_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("corpus directory {} does not exist", dir.display());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::error!(error = %err, "cannot read corpus entry");
                continue;
            }
        };
        let p = entry.path();
        if p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("txt") {
            files.push(p.to_path_buf());
        }
    }
    Ok(files)
}

pub fn read_file(path: &Path) -> Result<Vec<TrecDocument>> {
    let bytes = fs::read(path).with_context(|| format!("reading corpus file {}", path.display()))?;
    Ok(parse_documents(&String::from_utf8_lossy(&bytes)))
}

/// Read every corpus file. Unreadable files are reported and skipped.
pub fn load_corpus(dir: &Path) -> Result<Vec<TrecDocument>> {
    let files = corpus_files(dir)?;
    tracing::info!(files = files.len(), corpus = %dir.display(), "reading corpus");
    let mut docs = Vec::new();
    for file in &files {
        match read_file(file) {
            Ok(mut parsed) => {
                tracing::debug!(file = %file.display(), docs = parsed.len(), "parsed corpus file");
                docs.append(&mut parsed);
            }
            Err(err) => tracing::error!(error = format!("{err:#}"), "skipping corpus file"),
        }
    }
    Ok(docs)
}
