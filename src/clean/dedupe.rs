use std::collections::{HashMap, HashSet};

use crate::model::{NaturalKey, RowHandle, WorkingCollection};

/// Partition the collection into natural-key groups, rank each group's
/// members by load order, and drop everything past rank one. Ranks and
/// discards come from a single pass over one snapshot of the collection, so
/// nothing appended afterwards could ever be considered discardable.
pub fn deduplicate(col: &mut WorkingCollection) -> usize {
    let mut ranks: HashMap<NaturalKey, u64> = HashMap::new();
    let mut doomed: HashSet<RowHandle> = HashSet::new();

    for rec in col.records() {
        let rank = ranks
            .entry(rec.natural_key())
            .and_modify(|r| *r += 1)
            .or_insert(1);
        if *rank > 1 {
            doomed.insert(rec.handle());
        }
    }

    col.remove_handles(&doomed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::test_support::raw_row;

    #[test]
    fn keeps_the_earliest_member_of_each_group() {
        let rows = vec![raw_row("Acme"), raw_row("Acme"), raw_row("Beta")];
        let mut col = WorkingCollection::load(&rows);
        let first_handle = col.records()[0].handle();

        assert_eq!(deduplicate(&mut col), 1);
        assert_eq!(col.len(), 2);
        assert_eq!(col.records()[0].handle(), first_handle);
    }

    #[test]
    fn any_differing_attribute_defeats_grouping() {
        let mut variant = raw_row("Acme");
        variant.location = "Boston".to_string();
        let rows = vec![raw_row("Acme"), variant];
        let mut col = WorkingCollection::load(&rows);

        assert_eq!(deduplicate(&mut col), 0);
        assert_eq!(col.len(), 2);
    }

    #[test]
    fn sentinel_and_absent_industries_group_separately() {
        let mut a = raw_row("Acme");
        a.industry = String::new();
        let b = a.clone();
        let mut col = WorkingCollection::load(&[a, b]);
        // make the second record's industry truly absent before deduping
        col.records_mut()[1].industry = None;

        assert_eq!(deduplicate(&mut col), 0);
        assert_eq!(col.len(), 2);
    }

    #[test]
    fn rerun_is_a_no_op() {
        let rows = vec![raw_row("Acme"), raw_row("Acme")];
        let mut col = WorkingCollection::load(&rows);
        assert_eq!(deduplicate(&mut col), 1);
        assert_eq!(deduplicate(&mut col), 0);
    }
}
