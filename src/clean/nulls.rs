use crate::clean::CleanOptions;
use crate::model::{DateField, WorkingCollection};

/// Rewrite sentinel strings to the absent marker across every nullable
/// field, including a still-textual event date. Must run before any stage
/// that reasons about absence rather than sentinel strings (backfill and
/// pruning); idempotent on its own output. Returns the number of fields
/// rewritten.
pub fn canonicalize(col: &mut WorkingCollection, opts: &CleanOptions) -> usize {
    let mut rewrites = 0;

    for rec in col.records_mut() {
        for field in [
            &mut rec.company,
            &mut rec.location,
            &mut rec.industry,
            &mut rec.total_laid_off,
            &mut rec.percentage_laid_off,
            &mut rec.stage,
            &mut rec.country,
            &mut rec.funds_raised_millions,
        ] {
            if field
                .as_deref()
                .is_some_and(|v| is_sentinel(v, &opts.null_sentinels))
            {
                *field = None;
                rewrites += 1;
            }
        }

        if let DateField::Text(s) = &rec.event_date {
            if is_sentinel(s, &opts.null_sentinels) {
                rec.event_date = DateField::Absent;
                rewrites += 1;
            }
        }
    }

    rewrites
}

fn is_sentinel(value: &str, sentinels: &[String]) -> bool {
    sentinels.iter().any(|s| value.eq_ignore_ascii_case(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::test_support::raw_row;

    #[test]
    fn empty_and_null_variants_become_absent() {
        let mut row = raw_row("Acme");
        row.industry = String::new();
        row.total_laid_off = "NULL".to_string();
        row.percentage_laid_off = "null".to_string();
        row.funds_raised_millions = "Null".to_string();
        row.date = "NULL".to_string();
        let mut col = WorkingCollection::load(&[row]);

        assert_eq!(canonicalize(&mut col, &CleanOptions::default()), 5);
        let rec = &col.records()[0];
        assert_eq!(rec.industry, None);
        assert_eq!(rec.total_laid_off, None);
        assert_eq!(rec.percentage_laid_off, None);
        assert_eq!(rec.funds_raised_millions, None);
        assert!(rec.event_date.is_absent());
        // untouched fields keep their values
        assert_eq!(rec.company.as_deref(), Some("Acme"));
        assert_eq!(rec.country.as_deref(), Some("United States"));
    }

    #[test]
    fn non_sentinel_values_survive() {
        let mut row = raw_row("Acme");
        row.industry = "nullify inc".to_string();
        let mut col = WorkingCollection::load(&[row]);
        assert_eq!(canonicalize(&mut col, &CleanOptions::default()), 0);
        assert_eq!(col.records()[0].industry.as_deref(), Some("nullify inc"));
    }

    #[test]
    fn rerun_is_a_no_op() {
        let mut row = raw_row("Acme");
        row.industry = String::new();
        row.total_laid_off = "NULL".to_string();
        let mut col = WorkingCollection::load(&[row]);
        assert_eq!(canonicalize(&mut col, &CleanOptions::default()), 2);
        assert_eq!(canonicalize(&mut col, &CleanOptions::default()), 0);
    }
}
