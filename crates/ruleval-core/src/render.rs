use ruleval_types::{EvalReceipt, RuleReport, RuleTally};

/// Markdown summary of a run: corpus line, per-rule tally table, and the
/// mismatch totals that warrant a look at the exported tables.
pub fn render_markdown_for_receipt(receipt: &EvalReceipt) -> String {
    let mut out = String::new();
    out.push_str("## ruleval\n\n");

    out.push_str(&format!(
        "Evaluated **{}** document(s) against **{}** rule(s) in {} ms\n\n",
        receipt.corpus.documents_evaluated, receipt.corpus.rules_evaluated, receipt.run.duration_ms
    ));

    if receipt.rules.is_empty() {
        out.push_str("No rules evaluated.\n");
        return out;
    }

    out.push_str("| Rule | Matched | Overmatched | Undermatched | Nomatched | TP % | FN % |\n");
    out.push_str("|---|---|---|---|---|---|---|\n");

    for r in &receipt.rules {
        out.push_str(&render_rule_row(r));
    }
    out.push('\n');

    let mismatches: usize = receipt
        .rules
        .iter()
        .map(|r| r.overmatches.len() + r.undermatches.len())
        .sum();
    if mismatches > 0 {
        out.push_str(&format!(
            "**{mismatches}** mismatch sample(s) retained for review.\n"
        ));
    } else {
        out.push_str("No mismatches.\n");
    }

    out
}

fn render_rule_row(r: &RuleReport) -> String {
    let (tp, fnr) = match &r.rates {
        Some(rates) => (
            format!("{:.1}", rates.true_positive_pct),
            format!("{:.1}", rates.false_negative_pct),
        ),
        // No labeled documents: rates are undefined, not zero.
        None => ("n/a".to_string(), "n/a".to_string()),
    };

    format!(
        "| `{rule}` | {m} | {o} | {u} | {n} | {tp} | {fnr} |\n",
        rule = escape_md(&r.rule),
        m = r.counts.matched,
        o = r.counts.overmatched,
        u = r.counts.undermatched,
        n = r.counts.nomatched,
    )
}

/// Text rendering of the 2x2 matrix
/// `[[matched, undermatched], [overmatched, nomatched]]`:
/// rows are ground truth, columns are the pattern's decision.
pub fn render_confusion(rule: &str, counts: &RuleTally) -> String {
    let [[tp, fn_], [fp, tn]] = counts.confusion_matrix();

    let mut out = String::new();
    out.push_str(&format!("confusion for rule '{rule}'\n"));
    out.push_str(&format!("{:<16}{:>12}{:>12}\n", "", "matched", "unmatched"));
    out.push_str(&format!("{:<16}{:>12}{:>12}\n", "labeled", tp, fn_));
    out.push_str(&format!("{:<16}{:>12}{:>12}\n", "unlabeled", fp, tn));
    out
}

fn escape_md(s: &str) -> String {
    s.replace('|', "\\|").replace('`', "\\`")
}
