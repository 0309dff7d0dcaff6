//! Derived sensitivity metrics over accumulator state.
//!
//! Rates are undefined until at least one document carrying the rule's own
//! label has been evaluated; that case is a typed, recoverable error rather
//! than a NaN or a division panic.

use ruleval_types::{RuleRates, RuleTally};

use crate::evaluate::Evaluator;

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("unknown rule '{name}': not in the registered rule set")]
    UnknownRule { name: String },

    #[error("rule '{name}' has no labeled documents yet: detection rates are undefined")]
    NoLabeledDocuments { name: String },
}

/// What `Evaluator::metrics` hands back, depending on `as_percentage`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricsReport {
    /// TP/FN detection rates among documents truly labeled with the rule.
    Rates(RuleRates),
    /// The raw four-way counts.
    Counts(RuleTally),
}

/// Detection rates for one rule: share of its labeled documents that were
/// caught (TP) and missed (FN).
pub fn detection_rates(rule_name: &str, counts: &RuleTally) -> Result<RuleRates, MetricsError> {
    let total = counts.labeled_total();
    if total == 0 {
        return Err(MetricsError::NoLabeledDocuments {
            name: rule_name.to_string(),
        });
    }

    let total_f = f64::from(total);
    Ok(RuleRates {
        labeled_total: total,
        true_positive_pct: f64::from(counts.matched) / total_f * 100.0,
        false_negative_pct: f64::from(counts.undermatched) / total_f * 100.0,
    })
}

impl Evaluator {
    /// Pure read of accumulator state; repeated calls without intervening
    /// evaluations return identical results.
    pub fn metrics(
        &self,
        rule_name: &str,
        as_percentage: bool,
    ) -> Result<MetricsReport, MetricsError> {
        let acc = self
            .accumulator(rule_name)
            .ok_or_else(|| MetricsError::UnknownRule {
                name: rule_name.to_string(),
            })?;

        if as_percentage {
            Ok(MetricsReport::Rates(detection_rates(
                rule_name,
                &acc.counts,
            )?))
        } else {
            Ok(MetricsReport::Counts(acc.counts))
        }
    }
}
