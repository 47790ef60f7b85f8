use anyhow::Result;
use tracing::{info, warn};

use super::location::{LocationKeyer, normalize_location};
use super::merge::merge_tables;
use super::records::extract_records;
use super::sections::split_sections;
use crate::model::{ExtractionStats, Record};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineOutput {
    pub rows: Vec<Record>,
    pub stats: ExtractionStats,
}

/// Runs section split, record extraction, emplacement normalization and the merge over
/// the full document text. Empty text is a valid document with no rows.
pub fn build_merged_table(text: &str) -> Result<PipelineOutput> {
    let keyer = LocationKeyer::new()?;
    let mut stats = ExtractionStats::default();

    if text.trim().is_empty() {
        warn!("document text is empty; report will contain no rows");
    }

    let split = split_sections(text);
    stats.sections_found = split.sections.len() + split.skipped;
    stats.sections_skipped = split.skipped;

    let mut tables = Vec::<Vec<Record>>::with_capacity(split.sections.len());
    for section in &split.sections {
        let mut extracted = extract_records(section);
        stats.kit_occurrences += extracted.kit_occurrences;
        stats.records_extracted += extracted.records.len();
        stats.records_discarded += extracted.discarded;

        for record in &mut extracted.records {
            record.emplacement = normalize_location(&record.emplacement);
        }

        info!(
            section = section.index,
            kit = section.kit(),
            tokens = section.tokens.len(),
            records = extracted.records.len(),
            discarded = extracted.discarded,
            "extracted section"
        );
        tables.push(extracted.records);
    }

    let merged = merge_tables(tables, &keyer);
    stats.duplicates_removed = merged.duplicates_removed;
    stats.merged_rows = merged.rows.len();

    info!(
        sections = stats.sections_found,
        skipped = stats.sections_skipped,
        records = stats.records_extracted,
        duplicates = stats.duplicates_removed,
        rows = stats.merged_rows,
        "merged picking table"
    );

    Ok(PipelineOutput {
        rows: merged.rows,
        stats,
    })
}
