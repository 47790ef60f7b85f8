use std::collections::HashSet;

use super::location::LocationKeyer;
use crate::model::Record;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergedTable {
    pub rows: Vec<Record>,
    pub duplicates_removed: usize,
}

/// Unions the per-section tables in order, drops rows repeated across all five fields
/// (first occurrence wins) and sorts by emplacement key. The sort is stable, so equal keys
/// keep their discovery order.
pub fn merge_tables<I>(tables: I, keyer: &LocationKeyer) -> MergedTable
where
    I: IntoIterator<Item = Vec<Record>>,
{
    let mut seen = HashSet::<Record>::new();
    let mut rows = Vec::<Record>::new();
    let mut duplicates_removed = 0usize;

    for record in tables.into_iter().flatten() {
        if seen.contains(&record) {
            duplicates_removed += 1;
            continue;
        }
        seen.insert(record.clone());
        rows.push(record);
    }

    rows.sort_by_cached_key(|record| keyer.key(&record.emplacement));

    MergedTable {
        rows,
        duplicates_removed,
    }
}
