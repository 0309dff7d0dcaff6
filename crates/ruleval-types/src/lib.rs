//! Data types (config + receipts) for ruleval.
//!
//! This crate is intentionally "dumb": pure DTOs with serde + schemars.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ── Schema Identifiers ─────────────────────────────────────────
pub const EVAL_SCHEMA_V1: &str = "ruleval.eval.v1";

/// Number of bytes of context kept on each side of a matched span.
pub const DEFAULT_CONTEXT_WINDOW: usize = 40;

/// How a single (document, rule) evaluation turned out.
///
/// `Match`/`NoMatch` correspond to true positive/true negative;
/// `Overmatch`/`Undermatch` to false positive/false negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Match,
    Overmatch,
    Undermatch,
    NoMatch,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Match => "match",
            Outcome::Overmatch => "overmatch",
            Outcome::Undermatch => "undermatch",
            Outcome::NoMatch => "no_match",
        }
    }

    /// True for the two outcomes that warrant manual review.
    pub fn is_mismatch(self) -> bool {
        matches!(self, Outcome::Overmatch | Outcome::Undermatch)
    }
}

/// Document identifier: corpora use either numeric or string ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum DocId {
    Int(i64),
    Text(String),
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocId::Int(n) => write!(f, "{n}"),
            DocId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for DocId {
    fn from(n: i64) -> Self {
        DocId::Int(n)
    }
}

impl From<&str> for DocId {
    fn from(s: &str) -> Self {
        DocId::Text(s.to_string())
    }
}

impl From<String> for DocId {
    fn from(s: String) -> Self {
        DocId::Text(s)
    }
}

/// One labeled document from the corpus under evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Document {
    pub id: DocId,
    pub text: String,
    /// Ground-truth label. Compared as-is against rule names; an
    /// unrecognized label simply never yields a true positive.
    pub label: String,
}

/// Per-rule outcome counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct RuleTally {
    pub matched: u32,
    pub overmatched: u32,
    pub undermatched: u32,
    pub nomatched: u32,
}

impl RuleTally {
    /// Total evaluations recorded against this rule.
    pub fn total(&self) -> u32 {
        self.matched
            .saturating_add(self.overmatched)
            .saturating_add(self.undermatched)
            .saturating_add(self.nomatched)
    }

    /// Documents whose ground truth equals this rule's name.
    pub fn labeled_total(&self) -> u32 {
        self.matched.saturating_add(self.undermatched)
    }

    /// 2x2 confusion shape: `[[matched, undermatched], [overmatched, nomatched]]`.
    ///
    /// Row 0 is "actually labeled with this rule", row 1 is everything else.
    pub fn confusion_matrix(&self) -> [[u32; 2]; 2] {
        [
            [self.matched, self.undermatched],
            [self.overmatched, self.nomatched],
        ]
    }

    pub fn bump(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Match => self.matched = self.matched.saturating_add(1),
            Outcome::Overmatch => self.overmatched = self.overmatched.saturating_add(1),
            Outcome::Undermatch => self.undermatched = self.undermatched.saturating_add(1),
            Outcome::NoMatch => self.nomatched = self.nomatched.saturating_add(1),
        }
    }
}

/// A retained overmatch or undermatch sample, kept for manual review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MismatchRecord {
    pub id: DocId,
    /// The text the rule actually ran against (lowercased when the run was
    /// case-insensitive), so stored spans and excerpts stay consistent.
    pub text: String,
    /// Context around the matched span. Absent on undermatches: no match
    /// object exists to take a span from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub actual_label: String,
}

/// Detection rates among documents that truly carry the rule's label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RuleRates {
    pub labeled_total: u32,
    pub true_positive_pct: f64,
    pub false_negative_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

/// Run timing for the receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RunMeta {
    /// ISO 8601 timestamp when the run started.
    pub started_at: String,
    /// ISO 8601 timestamp when the run ended.
    pub ended_at: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CorpusMeta {
    pub documents_evaluated: u32,
    pub rules_evaluated: u32,
}

/// Everything the run learned about one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RuleReport {
    pub rule: String,
    pub pattern: String,
    pub counts: RuleTally,
    /// Absent when the corpus contained no document labeled with this rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rates: Option<RuleRates>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overmatches: Vec<MismatchRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub undermatches: Vec<MismatchRecord>,
}

/// The `ruleval.eval.v1` receipt for one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EvalReceipt {
    pub schema: String,
    pub tool: ToolMeta,
    pub run: RunMeta,
    pub corpus: CorpusMeta,
    pub rules: Vec<RuleReport>,
}

/// The on-disk configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct ConfigFile {
    /// Include other config files. Paths are relative to this config file's
    /// directory. Rules are merged: later definitions override earlier ones
    /// by rule name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<String>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub rule: Vec<RuleConfig>,
}

impl ConfigFile {
    /// Starter config written by `ruleval init`.
    pub fn example() -> Self {
        Self {
            includes: vec![],
            defaults: Defaults::default(),
            rule: vec![
                RuleConfig {
                    name: "invoice".to_string(),
                    pattern: r"\binvoice\b|\binv\.? ?n(o|r)\b".to_string(),
                },
                RuleConfig {
                    name: "receipt".to_string(),
                    pattern: r"\breceipt\b|\bpaid in full\b".to_string(),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Defaults {
    /// Lowercase document text before matching. Labels and rule names are
    /// never normalized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_insensitive: Option<bool>,

    /// Context window (bytes per side) around a matched span.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<usize>,

    /// Where mismatch tables are written when export is requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<String>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            case_insensitive: Some(true),
            window: Some(DEFAULT_CONTEXT_WINDOW),
            export_dir: Some("artifacts/ruleval/export".to_string()),
        }
    }
}

/// A named regular-expression rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RuleConfig {
    /// Unique name; a document whose label equals this name is expected to
    /// match the pattern.
    pub name: String,
    /// Regex searched anywhere within the (possibly lowercased) text.
    pub pattern: String,
}
