//! Date parameter handler for Elasticsearch.

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime};
use serde_json::{Value, json};
use tracing::warn;

use crate::query::Query;
use crate::registry::CompiledSearchParam;
use crate::types::SearchPrefix;

/// Builds an ES query clause for a date search parameter.
///
/// Format: `[prefix]date`. The value's precision defines an implicit range:
/// `2024` covers the whole year, `2024-01-15` the whole day.
pub fn build_query(compiled: &CompiledSearchParam, value: &str) -> Query {
    let field = compiled.path.as_str();
    let (prefix, date) = SearchPrefix::extract(value.trim());

    let Some((lower, upper)) = date_precision_range(date) else {
        warn!(path = %field, value, "Ignoring unparseable date search value");
        return Query::match_none();
    };

    let condition: Value = match prefix {
        SearchPrefix::Eq | SearchPrefix::Ap => json!({
            "range": { field: { "gte": lower, "lt": upper } }
        }),
        SearchPrefix::Ne => json!({
            "bool": {
                "should": [
                    { "range": { field: { "lt": lower } } },
                    { "range": { field: { "gte": upper } } }
                ]
            }
        }),
        SearchPrefix::Gt | SearchPrefix::Sa => json!({ "range": { field: { "gte": upper } } }),
        SearchPrefix::Lt | SearchPrefix::Eb => json!({ "range": { field: { "lt": lower } } }),
        SearchPrefix::Ge => json!({ "range": { field: { "gte": lower } } }),
        SearchPrefix::Le => json!({ "range": { field: { "lt": upper } } }),
    };

    Query::leaf(condition)
}

/// Computes the precision-based range for a date value.
///
/// Returns (lower_bound_inclusive, upper_bound_exclusive), or `None` if the
/// value is not a FHIR date or dateTime.
fn date_precision_range(value: &str) -> Option<(String, String)> {
    const DAY: &str = "%Y-%m-%d";

    match value.len() {
        4 if value.bytes().all(|b| b.is_ascii_digit()) => {
            // Year precision: "2024" -> ["2024-01-01", "2025-01-01")
            let year: i32 = value.parse().ok()?;
            let lower = NaiveDate::from_ymd_opt(year, 1, 1)?;
            let upper = NaiveDate::from_ymd_opt(year + 1, 1, 1)?;
            Some((lower.format(DAY).to_string(), upper.format(DAY).to_string()))
        }
        7 => {
            // Month precision: "2024-01" -> ["2024-01-01", "2024-02-01")
            let lower = NaiveDate::parse_from_str(&format!("{}-01", value), DAY).ok()?;
            let upper = lower.checked_add_months(Months::new(1))?;
            Some((lower.format(DAY).to_string(), upper.format(DAY).to_string()))
        }
        10 => {
            // Day precision: "2024-01-15" -> ["2024-01-15", "2024-01-16")
            let lower = NaiveDate::parse_from_str(value, DAY).ok()?;
            let upper = lower.succ_opt()?;
            Some((lower.format(DAY).to_string(), upper.format(DAY).to_string()))
        }
        _ => {
            // Date-time precision is one second
            if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
                let upper = instant.checked_add_signed(Duration::seconds(1))?;
                return Some((instant.to_rfc3339(), upper.to_rfc3339()));
            }
            let local = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").ok()?;
            let upper = local.checked_add_signed(Duration::seconds(1))?;
            let fmt = "%Y-%m-%dT%H:%M:%S";
            Some((local.format(fmt).to_string(), upper.format(fmt).to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled() -> CompiledSearchParam {
        CompiledSearchParam::new("Patient", "birthDate")
    }

    #[test]
    fn test_year_precision() {
        let (lower, upper) = date_precision_range("2024").unwrap();
        assert_eq!(lower, "2024-01-01");
        assert_eq!(upper, "2025-01-01");
    }

    #[test]
    fn test_month_precision() {
        let (lower, upper) = date_precision_range("2024-12").unwrap();
        assert_eq!(lower, "2024-12-01");
        assert_eq!(upper, "2025-01-01");
    }

    #[test]
    fn test_day_precision() {
        let (lower, upper) = date_precision_range("2024-02-29").unwrap();
        assert_eq!(lower, "2024-02-29");
        assert_eq!(upper, "2024-03-01");
    }

    #[test]
    fn test_datetime_precision() {
        let (lower, upper) = date_precision_range("2024-01-15T10:00:00Z").unwrap();
        assert_eq!(lower, "2024-01-15T10:00:00+00:00");
        assert_eq!(upper, "2024-01-15T10:00:01+00:00");

        let (lower, _) = date_precision_range("2024-01-15T10:00:00").unwrap();
        assert_eq!(lower, "2024-01-15T10:00:00");
    }

    #[test]
    fn test_invalid_dates() {
        assert!(date_precision_range("2024-13").is_none());
        assert!(date_precision_range("yesterday").is_none());
        assert!(date_precision_range("20x4").is_none());
    }

    #[test]
    fn test_eq_range() {
        let clause = build_query(&compiled(), "2024-01-15").to_json();
        assert_eq!(
            clause,
            json!({ "range": { "birthDate": { "gte": "2024-01-15", "lt": "2024-01-16" } } })
        );
    }

    #[test]
    fn test_gt_starts_after_precision_range() {
        let clause = build_query(&compiled(), "gt2024-01-15").to_json();
        assert_eq!(clause["range"]["birthDate"]["gte"], "2024-01-16");
    }

    #[test]
    fn test_le_and_lt() {
        let clause = build_query(&compiled(), "le2024").to_json();
        assert_eq!(clause["range"]["birthDate"]["lt"], "2025-01-01");
        let clause = build_query(&compiled(), "lt2024").to_json();
        assert_eq!(clause["range"]["birthDate"]["lt"], "2024-01-01");
    }

    #[test]
    fn test_ne_excludes_range() {
        let clause = build_query(&compiled(), "ne2024").to_json();
        let should = clause["bool"]["should"].as_array().unwrap();
        assert_eq!(should.len(), 2);
    }

    #[test]
    fn test_unparseable_matches_nothing() {
        assert_eq!(build_query(&compiled(), "someday"), Query::match_none());
    }
}
