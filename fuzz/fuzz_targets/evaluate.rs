//! Focused fuzz target for the evaluator.
//!
//! This target exercises evaluation with arbitrary rule/document inputs and
//! validates core invariants (count sums, mismatch sample bookkeeping).

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use ruleval_domain::{compile_rules, EvalOptions, Evaluator};
use ruleval_types::{DocId, RuleConfig};

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    docs: Vec<FuzzDoc>,
    rules: Vec<FuzzRule>,
    case_insensitive: bool,
    window: u8,
}

#[derive(Arbitrary, Debug)]
struct FuzzDoc {
    id: i64,
    text: String,
    label: String,
}

#[derive(Arbitrary, Debug)]
struct FuzzRule {
    name: String,
    pattern: String,
}

impl FuzzRule {
    fn to_rule_config(&self) -> Option<RuleConfig> {
        if self.name.is_empty() || self.pattern.len() > 200 {
            return None;
        }
        Some(RuleConfig {
            name: self.name.clone(),
            pattern: self.pattern.clone(),
        })
    }
}

fuzz_target!(|input: FuzzInput| {
    let configs: Vec<RuleConfig> = input
        .rules
        .iter()
        .filter_map(FuzzRule::to_rule_config)
        .collect();

    let Ok(rules) = compile_rules(&configs) else {
        return;
    };

    let mut evaluator = Evaluator::new(
        rules,
        EvalOptions {
            case_insensitive: input.case_insensitive,
            window: input.window as usize,
        },
    );

    let names: Vec<String> = evaluator.rules().names().map(str::to_string).collect();

    for doc in input.docs.iter().take(64) {
        for name in &names {
            evaluator
                .evaluate(&DocId::Int(doc.id), &doc.text, &doc.label, name)
                .expect("registered rule should evaluate");
        }
    }

    let evaluated = input.docs.len().min(64) as u32;
    for name in &names {
        let acc = evaluator.accumulator(name).expect("accumulator exists");
        assert_eq!(acc.counts.total(), evaluated);
        assert_eq!(acc.counts.overmatched as usize, acc.overmatches.len());
        assert_eq!(acc.counts.undermatched as usize, acc.undermatches.len());
        assert!(acc.overmatches.iter().all(|r| r.excerpt.is_some()));
        assert!(acc.undermatches.iter().all(|r| r.excerpt.is_none()));
    }
});
