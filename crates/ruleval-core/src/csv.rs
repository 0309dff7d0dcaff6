//! Semicolon-delimited mismatch tables.
//!
//! Two tables per rule (overmatches, undermatches) with a header row and an
//! explicit leading index column. Escaping follows RFC 4180 with `;` as the
//! delimiter.

use ruleval_types::{MismatchRecord, RuleReport};

/// Header row shared by both tables.
const MISMATCH_HEADER: &str = "index;id;text;excerpt;actual_label";

/// Renders the false-positive table for one rule.
///
/// Columns: index, document id, full text, context excerpt, actual label.
pub fn render_overmatch_table(report: &RuleReport) -> String {
    render_table(&report.overmatches)
}

/// Renders the false-negative table for one rule.
///
/// Undermatches have no matched span, so the excerpt column is empty.
pub fn render_undermatch_table(report: &RuleReport) -> String {
    render_table(&report.undermatches)
}

fn render_table(records: &[MismatchRecord]) -> String {
    let mut out = String::new();

    out.push_str(MISMATCH_HEADER);
    out.push('\n');

    for (index, record) in records.iter().enumerate() {
        out.push_str(&render_row(index, record));
    }

    out
}

fn render_row(index: usize, record: &MismatchRecord) -> String {
    format!(
        "{};{};{};{};{}\n",
        index,
        escape_field(&record.id.to_string()),
        escape_field(&record.text),
        escape_field(record.excerpt.as_deref().unwrap_or("")),
        escape_field(&record.actual_label)
    )
}

/// Fields containing the delimiter, double quotes, or newlines are quoted.
/// Double quotes within the field are escaped by doubling them.
fn escape_field(s: &str) -> String {
    let needs_quoting = s.contains(';') || s.contains('"') || s.contains('\n') || s.contains('\r');

    if needs_quoting {
        let escaped = s.replace('"', "\"\"");
        format!("\"{}\"", escaped)
    } else {
        s.to_string()
    }
}
