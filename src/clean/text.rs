use crate::model::WorkingCollection;

/// Normalize the three free-text fields. The rules touch disjoint fields,
/// so they carry no ordering dependency between each other; only the
/// country rule is internally ordered (trim, strip one trailing dot, trim
/// again, so "Germany. " ends up as "Germany"). Returns the number of
/// rewritten fields.
pub fn normalize(col: &mut WorkingCollection) -> usize {
    let mut rewrites = 0;

    for rec in col.records_mut() {
        if let Some(company) = rec.company.as_deref() {
            let trimmed = company.trim();
            if trimmed != company {
                rec.company = Some(trimmed.to_string());
                rewrites += 1;
            }
        }

        if let Some(industry) = rec.industry.as_deref() {
            if is_crypto_variant(industry) && industry != "Crypto" {
                rec.industry = Some("Crypto".to_string());
                rewrites += 1;
            }
        }

        if let Some(country) = rec.country.as_deref() {
            let normalized = normalize_country(country);
            if normalized != country {
                rec.country = Some(normalized);
                rewrites += 1;
            }
        }
    }

    rewrites
}

/// Anything starting with "crypto" in any case collapses to the literal
/// "Crypto". Lossy on purpose: variants like "Crypto / Web3" describe the
/// same industry.
fn is_crypto_variant(industry: &str) -> bool {
    industry
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("crypto"))
}

fn normalize_country(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
    trimmed.trim().to_string()
}
