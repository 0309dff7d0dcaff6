//! Fuzz target for context-window extraction.
//!
//! The excerpt must be total: any span and window over any text yields a
//! valid substring that still contains the span.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use ruleval_domain::context_excerpt;

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    text: String,
    start: usize,
    end: usize,
    window: u16,
}

fuzz_target!(|input: FuzzInput| {
    let excerpt = context_excerpt(&input.text, input.start, input.end, input.window as usize);

    // Always a substring of the input.
    assert!(input.text.contains(&excerpt));

    // A span on char boundaries survives inside the excerpt.
    if input.start <= input.end
        && input.end <= input.text.len()
        && input.text.is_char_boundary(input.start)
        && input.text.is_char_boundary(input.end)
    {
        assert!(excerpt.contains(&input.text[input.start..input.end]));
    }
});
