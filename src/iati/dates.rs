//! Date range derivation over the `day_start` column

use crate::iati::types::{DateRange, Table};
use chrono::NaiveDate;

pub const START_DATE_COLUMN: &str = "day_start";

/// Parse `YYYY-MM-DD`, ignoring any trailing time part
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let date_part = value.get(..10)?;
    let rest = &value[10..];
    if !(rest.is_empty() || rest.starts_with('T') || rest.starts_with(' ')) {
        return None;
    }
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Min and max parseable start date of one table
fn table_bounds(table: &Table) -> Option<(NaiveDate, NaiveDate)> {
    table
        .column(START_DATE_COLUMN)?
        .filter_map(parse_date)
        .fold(None, |acc, date| match acc {
            None => Some((date, date)),
            Some((min, max)) => Some((min.min(date), max.max(date))),
        })
}

/// Overall start-date range across tables; absent if no table has a usable date
pub fn derive(tables: &[&Table]) -> DateRange {
    let bounds = tables.iter().filter_map(|t| table_bounds(t));

    let mut range = DateRange::default();
    for (min, max) in bounds {
        range.min_date = Some(range.min_date.map_or(min, |d| d.min(min)));
        range.max_date = Some(range.max_date.map_or(max, |d| d.max(max)));
    }
    range
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn table_with_starts(values: &[&str]) -> Table {
        Table::new(
            vec!["aid".to_string(), START_DATE_COLUMN.to_string()],
            values
                .iter()
                .enumerate()
                .map(|(i, v)| vec![format!("XM-{i}"), v.to_string()])
                .collect(),
        )
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2019-03-01"), Some(date(2019, 3, 1)));
        assert_eq!(parse_date(" 2019-03-01 "), Some(date(2019, 3, 1)));
        assert_eq!(parse_date("2019-03-01T10:00:00"), Some(date(2019, 3, 1)));
        assert_eq!(parse_date("2019-03-01 10:00:00"), Some(date(2019, 3, 1)));
        assert_eq!(parse_date("2019-03-011"), None);
        assert_eq!(parse_date("2019-02-30"), None);
        assert_eq!(parse_date("not-a-date"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_invalid_cells_ignored() {
        let table = table_with_starts(&["2019-03-01", "not-a-date", ""]);
        let range = derive(&[&table]);
        assert_eq!(range.min_date, Some(date(2019, 3, 1)));
        assert_eq!(range.max_date, Some(date(2019, 3, 1)));
        assert_eq!(
            range.formatted(),
            Some(("2019-03-01".to_string(), "2019-03-01".to_string()))
        );
    }

    #[test]
    fn test_aggregates_across_tables() {
        let a = table_with_starts(&["2015-06-01", "2018-01-01"]);
        let b = table_with_starts(&["2010-02-03", "2016-07-08"]);
        let range = derive(&[&a, &b]);
        assert_eq!(range.min_date, Some(date(2010, 2, 3)));
        assert_eq!(range.max_date, Some(date(2018, 1, 1)));
    }

    #[test]
    fn test_commutative() {
        let a = table_with_starts(&["2015-06-01", "garbage", "2021-12-31"]);
        let b = table_with_starts(&["2010-02-03"]);
        assert_eq!(derive(&[&a, &b]), derive(&[&b, &a]));
    }

    #[test]
    fn test_table_without_start_column_contributes_nothing() {
        let no_column = Table::new(
            vec!["aid".to_string()],
            vec![vec!["XM-1".to_string()]],
        );
        let unparseable = table_with_starts(&["n/a", ""]);
        let good = table_with_starts(&["2020-05-05"]);

        assert!(derive(&[&no_column]).is_absent());
        assert!(derive(&[&unparseable]).is_absent());
        assert_eq!(
            derive(&[&no_column, &unparseable, &good]),
            derive(&[&good])
        );
    }

    #[test]
    fn test_no_tables() {
        assert!(derive(&[]).is_absent());
    }
}
