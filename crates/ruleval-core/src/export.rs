use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use ruleval_types::EvalReceipt;

use crate::csv::{render_overmatch_table, render_undermatch_table};

/// Writes `overmatch_<rule>.csv` and `undermatch_<rule>.csv` for every rule
/// in the receipt, creating `dir` if absent. Returns the written paths.
///
/// Tables are written even when empty (header only): a reviewer can tell
/// "no mismatches" apart from "not exported".
pub fn export_mismatch_tables(receipt: &EvalReceipt, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create export directory '{}'", dir.display()))?;

    let mut written = Vec::with_capacity(receipt.rules.len() * 2);

    for report in &receipt.rules {
        let stem = sanitize_rule_name(&report.rule);

        let over = dir.join(format!("overmatch_{stem}.csv"));
        std::fs::write(&over, render_overmatch_table(report))
            .with_context(|| format!("write '{}'", over.display()))?;
        written.push(over);

        let under = dir.join(format!("undermatch_{stem}.csv"));
        std::fs::write(&under, render_undermatch_table(report))
            .with_context(|| format!("write '{}'", under.display()))?;
        written.push(under);
    }

    Ok(written)
}

/// Rule names are user input; keep file names to a portable subset.
fn sanitize_rule_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ruleval_types::{
        CorpusMeta, DocId, MismatchRecord, RuleReport, RuleTally, RunMeta, ToolMeta,
        EVAL_SCHEMA_V1,
    };

    fn receipt() -> EvalReceipt {
        EvalReceipt {
            schema: EVAL_SCHEMA_V1.to_string(),
            tool: ToolMeta {
                name: "ruleval".to_string(),
                version: "0.2.0".to_string(),
            },
            run: RunMeta {
                started_at: "2026-01-01T00:00:00Z".to_string(),
                ended_at: "2026-01-01T00:00:01Z".to_string(),
                duration_ms: 5,
            },
            corpus: CorpusMeta {
                documents_evaluated: 1,
                rules_evaluated: 1,
            },
            rules: vec![RuleReport {
                rule: "cat/meow".to_string(),
                pattern: "c.t".to_string(),
                counts: RuleTally::default(),
                rates: None,
                overmatches: vec![MismatchRecord {
                    id: DocId::Int(1),
                    text: "a cat".to_string(),
                    excerpt: Some("a cat".to_string()),
                    actual_label: "dog".to_string(),
                }],
                undermatches: vec![],
            }],
        }
    }

    #[test]
    fn writes_both_tables_per_rule_with_sanitized_names() {
        let td = tempfile::TempDir::new().expect("temp dir");
        let dir = td.path().join("nested/export");

        let written = export_mismatch_tables(&receipt(), &dir).expect("export should succeed");

        assert_eq!(written.len(), 2);
        assert!(dir.join("overmatch_cat_meow.csv").is_file());
        assert!(dir.join("undermatch_cat_meow.csv").is_file());

        let over = std::fs::read_to_string(dir.join("overmatch_cat_meow.csv")).unwrap();
        assert!(over.starts_with("index;id;text;excerpt;actual_label\n"));
        assert!(over.contains("0;1;a cat;a cat;dog"));

        // Empty table still carries the header row.
        let under = std::fs::read_to_string(dir.join("undermatch_cat_meow.csv")).unwrap();
        assert_eq!(under, "index;id;text;excerpt;actual_label\n");
    }

    #[test]
    fn sanitize_keeps_portable_chars() {
        assert_eq!(sanitize_rule_name("rule.name_1-x"), "rule.name_1-x");
        assert_eq!(sanitize_rule_name("a b/c:d"), "a_b_c_d");
    }
}
