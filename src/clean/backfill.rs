use std::collections::HashMap;
use tracing::warn;

use crate::model::WorkingCollection;

/// Fill absent industries from same-company records that carry one. A
/// representative industry is elected per company in a single pass (first
/// non-absent value in load order wins), then applied to every
/// absent-industry record in a second pass. The model assumes one industry
/// per company; when the data disagrees, the choice is deterministic but
/// arbitrary, and the conflict is logged. An absent company never matches
/// anything. Returns the number of records filled.
pub fn backfill_industry(col: &mut WorkingCollection) -> usize {
    let mut representatives: HashMap<String, String> = HashMap::new();

    for rec in col.records() {
        let (Some(company), Some(industry)) = (&rec.company, &rec.industry) else {
            continue;
        };
        match representatives.get(company) {
            None => {
                representatives.insert(company.clone(), industry.clone());
            }
            Some(elected) if elected != industry => {
                warn!(
                    company = %company,
                    elected = %elected,
                    conflicting = %industry,
                    "company carries conflicting industries"
                );
            }
            Some(_) => {}
        }
    }

    let mut filled = 0;
    for rec in col.records_mut() {
        if rec.industry.is_some() {
            continue;
        }
        let Some(company) = &rec.company else {
            continue;
        };
        if let Some(industry) = representatives.get(company) {
            rec.industry = Some(industry.clone());
            filled += 1;
        }
    }

    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::test_support::raw_row;
    use crate::model::RawLayoffRow;

    fn with_industry(company: &str, industry: Option<&str>) -> RawLayoffRow {
        let mut row = raw_row(company);
        row.industry = industry.unwrap_or_default().to_string();
        row
    }

    fn load_absent(rows: &[RawLayoffRow]) -> WorkingCollection {
        // emulate post-canonicalization state: empty industry cells are absent
        let mut col = WorkingCollection::load(rows);
        for rec in col.records_mut() {
            if rec.industry.as_deref() == Some("") {
                rec.industry = None;
            }
        }
        col
    }

    #[test]
    fn fills_from_a_same_company_record() {
        let rows = vec![
            with_industry("Acme", Some("Retail")),
            with_industry("Acme", None),
            with_industry("Zeta", None),
        ];
        let mut col = load_absent(&rows);

        assert_eq!(backfill_industry(&mut col), 1);
        assert_eq!(col.records()[1].industry.as_deref(), Some("Retail"));
        // no donor anywhere for Zeta
        assert_eq!(col.records()[2].industry, None);
    }

    #[test]
    fn conflicting_industries_resolve_deterministically() {
        // divergent data: the model picks one industry, it does not error.
        // load order elects the first donor; we assert determinism, not a
        // particular "correct" industry.
        let rows = vec![
            with_industry("Acme", Some("Retail")),
            with_industry("Acme", Some("Finance")),
            with_industry("Acme", None),
        ];
        let mut first = load_absent(&rows);
        backfill_industry(&mut first);
        let mut second = load_absent(&rows);
        backfill_industry(&mut second);

        assert_eq!(
            first.records()[2].industry,
            second.records()[2].industry
        );
        assert_eq!(first.records()[2].industry.as_deref(), Some("Retail"));
    }

    #[test]
    fn absent_company_never_matches() {
        let rows = vec![
            with_industry("Acme", Some("Retail")),
            with_industry("Acme", None),
        ];
        let mut col = load_absent(&rows);
        col.records_mut()[1].company = None;

        assert_eq!(backfill_industry(&mut col), 0);
        assert_eq!(col.records()[1].industry, None);
    }

    #[test]
    fn donors_never_change_and_rerun_is_a_no_op() {
        let rows = vec![
            with_industry("Acme", Some("Retail")),
            with_industry("Acme", None),
        ];
        let mut col = load_absent(&rows);
        assert_eq!(backfill_industry(&mut col), 1);
        assert_eq!(col.records()[0].industry.as_deref(), Some("Retail"));
        assert_eq!(backfill_industry(&mut col), 0);
    }
}
