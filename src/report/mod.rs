use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::model::{NaturalKey, WorkingCollection};

/// Post-run verification figures. Read-only over the collection; these are
/// observability aids, not pipeline stages.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub records: usize,
    /// Natural-key groups with more than one member. Zero after a clean run.
    pub duplicate_groups: usize,
    pub distinct_industries: usize,
    /// Companies that still have at least one record with an absent
    /// industry. Ideally empty after backfill; a company lands here only
    /// when no record of it carries an industry at all.
    pub companies_missing_industry: Vec<String>,
}

pub fn summarize(col: &WorkingCollection) -> Summary {
    Summary {
        records: col.len(),
        duplicate_groups: duplicate_groups(col),
        distinct_industries: distinct_industries(col).len(),
        companies_missing_industry: companies_missing_industry(col).into_iter().collect(),
    }
}

pub fn duplicate_groups(col: &WorkingCollection) -> usize {
    let mut counts: HashMap<NaturalKey, usize> = HashMap::new();
    for rec in col.records() {
        *counts.entry(rec.natural_key()).or_insert(0) += 1;
    }
    counts.values().filter(|&&n| n > 1).count()
}

pub fn distinct_industries(col: &WorkingCollection) -> BTreeSet<String> {
    col.records()
        .iter()
        .filter_map(|r| r.industry.clone())
        .collect()
}

pub fn companies_missing_industry(col: &WorkingCollection) -> BTreeSet<String> {
    col.records()
        .iter()
        .filter(|r| r.industry.is_none())
        .filter_map(|r| r.company.clone())
        .collect()
}
