//! d-portal query rendering

use crate::iati::types::TableKind;
use anyhow::Result;
use reqwest::Url;

/// d-portal day number; activities ending on or after it count as current
pub const DAY_END_THRESHOLD: u32 = 17500;

const SQL_ACTIVITIES: &str = "SELECT * FROM act \
    LEFT JOIN sector ON act.aid = sector.aid \
    JOIN country ON act.aid = country.aid \
    WHERE country.country_code = '{iso2}' \
    AND day_end >= {threshold}";

const SQL_LOCATIONS: &str = "SELECT * FROM act \
    JOIN country ON act.aid = country.aid \
    JOIN location ON act.aid = location.aid \
    WHERE country.country_code = '{iso2}' \
    AND day_end >= {threshold}";

/// Render the SQL for one table kind and country. `iso2` is not validated.
pub fn build_query(kind: TableKind, iso2: &str) -> String {
    let template = match kind {
        TableKind::Activities => SQL_ACTIVITIES,
        TableKind::Locations => SQL_LOCATIONS,
    };
    template
        .replace("{iso2}", iso2)
        .replace("{threshold}", &DAY_END_THRESHOLD.to_string())
}

/// Full request URL: `base_url?form=csv&human=1&sql=...`
pub fn build_url(base_url: &str, kind: TableKind, iso2: &str) -> Result<Url> {
    let sql = build_query(kind, iso2);
    let url = Url::parse_with_params(
        base_url,
        &[("form", "csv"), ("human", "1"), ("sql", sql.as_str())],
    )?;
    Ok(url)
}

/// Cache key used by the retriever's save/replay directories
pub fn cache_filename(kind: TableKind, iso2: &str) -> String {
    format!("{}-{}.csv", kind.prefix(), iso2.to_lowercase())
}
