//! Reader for relevance judgments: `topic iteration docno grade` per line.

use crate::eval::Judgments;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse judgments, skipping lines with too few fields or unparsable values.
pub fn parse_qrels(contents: &str) -> Judgments {
    let mut judgments = Judgments::new();
    let mut skipped = 0usize;
    for (lineno, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            tracing::warn!(line = lineno + 1, "qrels record has fewer than four fields");
            skipped += 1;
            continue;
        }
        let topic = match parts[0].parse::<u32>() {
            Ok(t) => t,
            Err(_) => {
                tracing::warn!(line = lineno + 1, topic = parts[0], "qrels topic is not a number");
                skipped += 1;
                continue;
            }
        };
        let grade = match parts[3] {
            "0" => 0,
            "1" => 1,
            other => {
                tracing::warn!(line = lineno + 1, grade = other, "qrels grade is not 0 or 1");
                skipped += 1;
                continue;
            }
        };
        judgments.insert(topic, parts[2], grade);
    }
    if skipped > 0 {
        tracing::warn!(skipped, "skipped malformed qrels records");
    }
    judgments
}

pub fn load_qrels(path: &Path) -> Result<Judgments> {
    let contents = std::fs::read_to_string(path).with_context(|| format!("reading qrels {}", path.display()))?;
    let judgments = parse_qrels(&contents);
    tracing::info!(judgments = judgments.len(), path = %path.display(), "loaded relevance judgments");
    Ok(judgments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_lines_and_skips_the_rest() {
        let j = parse_qrels("351 0 FT911-1 1\n351 0 FT911-2 0\nbad line\nx 0 FT911-3 1\n352 0 FT911-4 2\n\n352 0 FT911-5 1\n");
        assert_eq!(j.len(), 3);
        assert_eq!(j.grade(351, "FT911-1"), 1);
        assert_eq!(j.grade(351, "FT911-2"), 0);
        assert_eq!(j.grade(352, "FT911-4"), 0);
        assert_eq!(j.total_relevant(351), 1);
        assert_eq!(j.total_relevant(352), 1);
        assert_eq!(j.topics().collect::<Vec<_>>(), vec![351, 352]);
    }
}
