//! Reconstruction of kit picking tables from the flat word stream of a picking document.
//!
//! The flow is `sections` (split on the kit heading) -> `records` (per-section field scan)
//! -> `location` (emplacement normalization and sort keys) -> `merge` (union, dedupe, sort),
//! driven by `pipeline`. `pdf_text` and `render` sit at the I/O edges.

pub mod colors;
pub mod location;
pub mod merge;
pub mod pdf_text;
pub mod pipeline;
pub mod records;
pub mod render;
pub mod sections;
#[cfg(test)]
mod tests;

pub use pipeline::build_merged_table;
