//! Receipt assembly plus the export/render collaborators.
//!
//! Everything here is pure serialization of evaluator state; the engine's
//! accumulators are read, never mutated. File writing is confined to
//! `export`.

pub mod csv;
pub mod export;
pub mod render;
pub mod report;

pub use csv::{render_overmatch_table, render_undermatch_table};
pub use export::export_mismatch_tables;
pub use render::{render_confusion, render_markdown_for_receipt};
pub use report::{build_receipt, ReceiptContext};
