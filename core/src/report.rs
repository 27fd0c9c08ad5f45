//! Plain-text renderings of ranked runs and evaluation reports.

use crate::eval::{QueryVariant, RankedResult, Report};
use std::io::{self, Write};

/// Fixed-width `topic docno rank score` line.
pub fn format_result_line(r: &RankedResult) -> String {
    format!("{:<8}{:<20}{:<8}{:<10.6}", r.topic, r.doc_name, r.rank, r.score)
}

/// One line per result, grouped by topic ascending then rank ascending.
pub fn write_results<'a, W, I>(w: &mut W, results: I) -> io::Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a RankedResult>,
{
    let mut sorted: Vec<&RankedResult> = results.into_iter().collect();
    sorted.sort_by_key(|r| (r.topic, r.rank));
    for r in &sorted {
        writeln!(w, "{}", format_result_line(r))?;
    }
    Ok(sorted.len())
}

pub fn write_performance_report<W: Write>(w: &mut W, report: &Report) -> io::Result<()> {
    writeln!(w, "Query Performance Comparison Report")?;
    writeln!(w, "==================================")?;
    writeln!(w)?;
    for (topic, variants) in &report.topics {
        writeln!(w, "Topic {topic}:")?;
        for variant in QueryVariant::ALL {
            writeln!(w, "  {}:", variant.label())?;
            match variants.get(&variant) {
                Some(m) if m.retrieved > 0 => {
                    writeln!(w, "    Precision: {:.4}", m.precision)?;
                    writeln!(w, "    Recall:    {:.4}", m.recall)?;
                    writeln!(w, "    Relevant Retrieved: {}/{}", m.relevant_retrieved, m.total_relevant)?;
                    writeln!(w)?;
                }
                _ => {
                    writeln!(w, "    No results found")?;
                    writeln!(w)?;
                }
            }
        }
        writeln!(w)?;
    }
    Ok(())
}
