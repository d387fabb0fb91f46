use chrono::{DateTime, NaiveDateTime, Utc};

use crate::config::DateRange;
use crate::discourse::TopicSummary;
use crate::error::ScrapeError;

/// Accepted `created_at` layouts, with and without fractional seconds.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%dT%H:%M:%SZ"];

/// Parse a Discourse UTC timestamp.
///
/// # Errors
///
/// Returns [`ScrapeError::MalformedTimestamp`] if no accepted format matches.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ScrapeError> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.and_utc())
        .ok_or_else(|| ScrapeError::MalformedTimestamp {
            value: value.to_string(),
        })
}

/// Whether the topic was created within `range` (inclusive).
///
/// # Errors
///
/// Returns [`ScrapeError::MalformedTimestamp`] if the topic's timestamp cannot be parsed.
pub fn in_range(topic: &TopicSummary, range: &DateRange) -> Result<bool, ScrapeError> {
    Ok(range.contains(parse_timestamp(&topic.created_at)?))
}

/// Keep only topics created within `range`, preserving listing order.
///
/// # Errors
///
/// Fails on the first malformed timestamp; the listing is assumed corrupt.
pub fn select_in_range(
    topics: Vec<TopicSummary>,
    range: &DateRange,
) -> Result<Vec<TopicSummary>, ScrapeError> {
    let mut selected = Vec::with_capacity(topics.len());
    for topic in topics {
        if in_range(&topic, range)? {
            selected.push(topic);
        }
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn topic(id: u64, created_at: &str) -> TopicSummary {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "slug": format!("topic-{id}"),
            "created_at": created_at,
        }))
        .unwrap()
    }

    fn range() -> DateRange {
        DateRange::new(
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 4, 14, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_parse_with_fraction() {
        let ts = parse_timestamp("2025-02-03T04:05:06.789Z").unwrap();
        assert_eq!(ts.second(), 6);
        assert_eq!(ts.nanosecond(), 789_000_000);
    }

    #[test]
    fn test_parse_without_fraction() {
        assert_eq!(
            parse_timestamp("2025-02-03T04:05:06Z").unwrap(),
            Utc.with_ymd_and_hms(2025, 2, 3, 4, 5, 6).unwrap()
        );
    }

    #[test]
    fn test_parse_malformed() {
        for bad in ["2025-02-03", "2025-02-03 04:05:06", "yesterday", ""] {
            assert!(matches!(
                parse_timestamp(bad),
                Err(ScrapeError::MalformedTimestamp { .. })
            ));
        }
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let r = range();
        assert!(in_range(&topic(1, "2025-01-01T00:00:00Z"), &r).unwrap());
        assert!(in_range(&topic(2, "2025-04-14T00:00:00.000Z"), &r).unwrap());
        assert!(!in_range(&topic(3, "2024-12-31T23:59:59.999Z"), &r).unwrap());
        assert!(!in_range(&topic(4, "2025-04-14T00:00:00.001Z"), &r).unwrap());
    }

    #[test]
    fn test_select_in_range_keeps_order() {
        let topics = vec![
            topic(1, "2025-03-01T10:00:00.000Z"),
            topic(2, "2024-06-01T10:00:00.000Z"),
            topic(3, "2025-01-15T10:00:00Z"),
        ];
        let ids: Vec<u64> = select_in_range(topics, &range())
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_select_in_range_propagates_malformed() {
        let topics = vec![topic(1, "2025-03-01T10:00:00Z"), topic(2, "not a date")];
        assert!(select_in_range(topics, &range()).is_err());
    }
}
