use std::collections::HashSet;

use crate::model::{RowHandle, WorkingCollection};

/// Remove every record with both layoff-magnitude measures absent. Such
/// rows carry no analyzable signal. Unconditional and final; expects null
/// canonicalization to have run already. Returns the number removed.
pub fn prune(col: &mut WorkingCollection) -> usize {
    let doomed: HashSet<RowHandle> = col
        .records()
        .iter()
        .filter(|r| r.total_laid_off.is_none() && r.percentage_laid_off.is_none())
        .map(|r| r.handle())
        .collect();

    col.remove_handles(&doomed)
}
