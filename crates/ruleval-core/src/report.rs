use ruleval_domain::{detection_rates, Evaluator};
use ruleval_types::{CorpusMeta, EvalReceipt, RuleReport, RunMeta, ToolMeta, EVAL_SCHEMA_V1};

/// Run-level metadata the engine itself does not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptContext {
    pub tool: ToolMeta,
    pub run: RunMeta,
    pub documents_evaluated: u32,
}

/// Snapshots the evaluator into a `ruleval.eval.v1` receipt, rules in name
/// order. Rates are omitted (not errored) for rules without labeled
/// documents; the raw counts still tell the whole story.
pub fn build_receipt(evaluator: &Evaluator, ctx: ReceiptContext) -> EvalReceipt {
    let rules: Vec<RuleReport> = evaluator
        .iter()
        .map(|(rule, acc)| RuleReport {
            rule: rule.name.clone(),
            pattern: rule.pattern.clone(),
            counts: acc.counts,
            rates: detection_rates(&rule.name, &acc.counts).ok(),
            overmatches: acc.overmatches.clone(),
            undermatches: acc.undermatches.clone(),
        })
        .collect();

    EvalReceipt {
        schema: EVAL_SCHEMA_V1.to_string(),
        tool: ctx.tool,
        run: ctx.run,
        corpus: CorpusMeta {
            documents_evaluated: ctx.documents_evaluated,
            rules_evaluated: rules.len().min(u32::MAX as usize) as u32,
        },
        rules,
    }
}
