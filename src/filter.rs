use crate::types::NormalizedRow;

/// Rows whose platform equals `platform` exactly.
pub fn by_platform(rows: &[NormalizedRow], platform: &str) -> Vec<NormalizedRow> {
    rows.iter()
        .filter(|r| r.platform == platform)
        .cloned()
        .collect()
}

/// Rows whose campaign name contains `keyword`, ignoring case.
///
/// The keyword has to be specific to one campaign family (e.g. `mens_18+`
/// rather than `mens`); no disambiguation happens here. Rows without a
/// campaign name never match.
pub fn by_campaign_keyword(rows: &[NormalizedRow], keyword: &str) -> Vec<NormalizedRow> {
    let needle = keyword.to_lowercase();
    rows.iter()
        .filter(|r| {
            r.campaign_name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}
