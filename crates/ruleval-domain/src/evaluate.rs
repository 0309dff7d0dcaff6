use std::borrow::Cow;
use std::collections::BTreeMap;

use ruleval_types::{
    DocId, Document, MismatchRecord, Outcome, RuleTally, DEFAULT_CONTEXT_WINDOW,
};

use crate::rules::{CompiledRule, RuleSet};

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("unknown rule '{name}': not in the registered rule set")]
    UnknownRule { name: String },

    #[error("cannot merge evaluators over different rule sets")]
    RuleSetMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalOptions {
    /// Lowercase document text before matching. Labels and rule names are
    /// compared as-is either way.
    pub case_insensitive: bool,
    /// Bytes of context kept on each side of a matched span.
    pub window: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            case_insensitive: true,
            window: DEFAULT_CONTEXT_WINDOW,
        }
    }
}

/// Decides what a single evaluation was, given whether the rule under test
/// owns the document's label and whether its pattern matched.
pub fn classify(rule_name: &str, label: &str, pattern_matched: bool) -> Outcome {
    match (rule_name == label, pattern_matched) {
        (true, true) => Outcome::Match,
        (false, true) => Outcome::Overmatch,
        (true, false) => Outcome::Undermatch,
        (false, false) => Outcome::NoMatch,
    }
}

/// The matched span widened by `window` bytes per side, clamped to the text
/// bounds and to char boundaries. Clamping is silent: a window larger than
/// the text yields the whole text.
pub fn context_excerpt(text: &str, start: usize, end: usize, window: usize) -> String {
    let lo = floor_char_boundary(text, start.saturating_sub(window));
    let hi = ceil_char_boundary(text, end.saturating_add(window));
    text.get(lo..hi).unwrap_or("").to_string()
}

fn floor_char_boundary(s: &str, idx: usize) -> usize {
    let mut idx = idx.min(s.len());
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(s: &str, idx: usize) -> usize {
    let mut idx = idx.min(s.len());
    while !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

/// Counters plus retained mismatch samples for one rule.
///
/// Matches and no-matches are counted but not retained in detail: they need
/// no manual review. Accumulation is monotonic; callers that re-submit the
/// same (document, rule) pair double-count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleAccumulator {
    pub counts: RuleTally,
    pub overmatches: Vec<MismatchRecord>,
    pub undermatches: Vec<MismatchRecord>,
}

impl RuleAccumulator {
    /// Combines a partition produced by a parallel run: counts sum, sample
    /// lists concatenate in order.
    pub fn merge(&mut self, other: RuleAccumulator) {
        self.counts.matched = self.counts.matched.saturating_add(other.counts.matched);
        self.counts.overmatched = self
            .counts
            .overmatched
            .saturating_add(other.counts.overmatched);
        self.counts.undermatched = self
            .counts
            .undermatched
            .saturating_add(other.counts.undermatched);
        self.counts.nomatched = self.counts.nomatched.saturating_add(other.counts.nomatched);
        self.overmatches.extend(other.overmatches);
        self.undermatches.extend(other.undermatches);
    }
}

/// The rule evaluator: owns the registered rule set and one accumulator per
/// rule, built up across an evaluation run and read out at the end.
#[derive(Debug, Clone)]
pub struct Evaluator {
    rules: RuleSet,
    options: EvalOptions,
    accumulators: BTreeMap<String, RuleAccumulator>,
}

impl Evaluator {
    pub fn new(rules: RuleSet, options: EvalOptions) -> Self {
        let accumulators = rules
            .names()
            .map(|name| (name.to_string(), RuleAccumulator::default()))
            .collect();
        Self {
            rules,
            options,
            accumulators,
        }
    }

    pub fn options(&self) -> EvalOptions {
        self.options
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn accumulator(&self, rule_name: &str) -> Option<&RuleAccumulator> {
        self.accumulators.get(rule_name)
    }

    /// Per-rule state in rule-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&CompiledRule, &RuleAccumulator)> {
        // Both maps are keyed by the same names, so zipping is sound.
        self.rules
            .iter()
            .zip(self.accumulators.values())
    }

    /// Evaluates one document against one rule and updates that rule's
    /// accumulator. Returns the classified outcome.
    pub fn evaluate(
        &mut self,
        id: &DocId,
        text: &str,
        label: &str,
        rule_name: &str,
    ) -> Result<Outcome, EvalError> {
        let rule = self
            .rules
            .get(rule_name)
            .ok_or_else(|| EvalError::UnknownRule {
                name: rule_name.to_string(),
            })?;

        // Patterns are searched within the lowered text, so case-insensitive
        // runs expect lowercase literals in the patterns themselves.
        let haystack: Cow<'_, str> = if self.options.case_insensitive {
            Cow::Owned(text.to_lowercase())
        } else {
            Cow::Borrowed(text)
        };

        let span = rule.regex.find(&haystack).map(|m| (m.start(), m.end()));
        let outcome = classify(rule_name, label, span.is_some());

        let acc = self
            .accumulators
            .get_mut(rule_name)
            .ok_or_else(|| EvalError::UnknownRule {
                name: rule_name.to_string(),
            })?;
        acc.counts.bump(outcome);

        match outcome {
            Outcome::Overmatch => {
                // Span indices refer to the haystack, so the excerpt must be
                // cut from the same (possibly lowered) text.
                let (start, end) = span.unwrap_or((0, 0));
                let excerpt = context_excerpt(&haystack, start, end, self.options.window);
                acc.overmatches.push(MismatchRecord {
                    id: id.clone(),
                    text: haystack.into_owned(),
                    excerpt: Some(excerpt),
                    actual_label: label.to_string(),
                });
            }
            Outcome::Undermatch => {
                // No match object exists on this path; the excerpt is a typed
                // absence rather than a best-effort extraction.
                acc.undermatches.push(MismatchRecord {
                    id: id.clone(),
                    text: haystack.into_owned(),
                    excerpt: None,
                    actual_label: label.to_string(),
                });
            }
            Outcome::Match | Outcome::NoMatch => {}
        }

        Ok(outcome)
    }

    /// Evaluates one document against every registered rule.
    pub fn evaluate_document(&mut self, doc: &Document) -> Result<(), EvalError> {
        let names: Vec<String> = self.rules.names().map(str::to_string).collect();
        for name in names {
            self.evaluate(&doc.id, &doc.text, &doc.label, &name)?;
        }
        Ok(())
    }

    /// Folds a partitioned evaluator (same rule set, disjoint documents)
    /// into this one.
    pub fn merge(&mut self, other: Evaluator) -> Result<(), EvalError> {
        let same_rules = self.rules.len() == other.rules.len()
            && self.rules.names().zip(other.rules.names()).all(|(a, b)| a == b);
        if !same_rules {
            return Err(EvalError::RuleSetMismatch);
        }

        for (name, acc) in other.accumulators {
            if let Some(mine) = self.accumulators.get_mut(&name) {
                mine.merge(acc);
            }
        }
        Ok(())
    }
}
