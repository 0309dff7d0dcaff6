//! Domain logic: rule compilation + confusion-tally evaluation.
//!
//! This crate is designed to be I/O-free and highly testable.

pub mod evaluate;
pub mod metrics;
pub mod normalize;
pub mod rules;

pub use evaluate::{
    classify, context_excerpt, EvalError, EvalOptions, Evaluator, RuleAccumulator,
};
pub use metrics::{detection_rates, MetricsError, MetricsReport};
pub use normalize::TextCleaner;
pub use rules::{compile_rules, CompiledRule, RuleCompileError, RuleSet};
