// 📅 Schedule Row Parser - raw feed rows → validated rows
//
// The feed is hand-maintained: dates are "2023/10/2"-style strings, pools
// are free-text lists with stray blanks, ids are sometimes missing. A row
// whose source dates do not parse is rejected (no banners, no error).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Field separator of schedule feed dates (`2023/10/2`)
pub const FEED_DATE_SEPARATOR: char = '/';

/// Years shorter than this are rejected (`23/10/2` is not a date)
const MIN_YEAR_DIGITS: usize = 4;

/// Days up to this value exist in every month; later ones are clamped
const ALWAYS_VALID_DAY: u32 = 28;

// ============================================================================
// RAW ROW
// ============================================================================

/// One row of `timetable.json`, exactly as the feed ships it
///
/// Every field is optional in the feed and defaults to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawScheduleRow {
    pub id: String,

    #[serde(rename = "jpStartDate")]
    pub source_start_date: String,

    #[serde(rename = "jpEndDate")]
    pub source_end_date: String,

    #[serde(rename = "twStartDate")]
    pub local_start_date: String,

    #[serde(rename = "twEndDate")]
    pub local_end_date: String,

    #[serde(rename = "charaPool")]
    pub entity_pool: Vec<String>,

    #[serde(rename = "cardPool")]
    pub item_pool: Vec<String>,
}

impl RawScheduleRow {
    /// Row with the required fields; pools and local dates empty
    pub fn new(id: &str, source_start_date: &str, source_end_date: &str) -> Self {
        RawScheduleRow {
            id: id.to_string(),
            source_start_date: source_start_date.to_string(),
            source_end_date: source_end_date.to_string(),
            ..Default::default()
        }
    }

    /// Builder pattern: set the character pool
    pub fn with_entity_pool(mut self, names: &[&str]) -> Self {
        self.entity_pool = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Builder pattern: set the item pool
    pub fn with_item_pool(mut self, names: &[&str]) -> Self {
        self.item_pool = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Builder pattern: set the announced local window
    pub fn with_local_dates(mut self, start: &str, end: &str) -> Self {
        self.local_start_date = start.to_string();
        self.local_end_date = end.to_string();
        self
    }
}

// ============================================================================
// PARSED ROW
// ============================================================================

/// A row that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    /// Trimmed feed id, or `row-<n>` when the feed left it blank
    pub base_id: String,
    pub source_start_date: NaiveDate,
    pub source_end_date: NaiveDate,

    /// Announced local window, when the feed carries a parseable one
    pub local_start_date: Option<NaiveDate>,
    pub local_end_date: Option<NaiveDate>,

    /// Trimmed, non-blank names in feed order
    pub entity_pool: Vec<String>,
    pub item_pool: Vec<String>,
}

/// Validate one row; `index` is its 0-based position in the feed
///
/// Returns `None` when either source date fails to parse.
pub fn parse_row(row: &RawScheduleRow, index: usize) -> Option<ParsedRow> {
    let source_start_date = parse_feed_date(&row.source_start_date)?;
    let source_end_date = parse_feed_date(&row.source_end_date)?;

    let trimmed_id = row.id.trim();
    let base_id = if trimmed_id.is_empty() {
        format!("row-{}", index + 1)
    } else {
        trimmed_id.to_string()
    };

    Some(ParsedRow {
        base_id,
        source_start_date,
        source_end_date,
        local_start_date: parse_feed_date(&row.local_start_date),
        local_end_date: parse_feed_date(&row.local_end_date),
        entity_pool: normalize_pool(&row.entity_pool),
        item_pool: normalize_pool(&row.item_pool),
    })
}

/// Parse a `year/month/day` feed date; blank or malformed gives `None`
///
/// Year needs 4+ digits, month and day 1 or 2. A day past the end of the
/// month (29-31) is clamped to the month's last day: `2023/2/30` is
/// 2023-02-28.
pub fn parse_feed_date(value: &str) -> Option<NaiveDate> {
    let mut fields = value.trim().split(FEED_DATE_SEPARATOR);
    let year = date_field(fields.next()?, MIN_YEAR_DIGITS, usize::MAX)?;
    let month = date_field(fields.next()?, 1, 2)?;
    let day = date_field(fields.next()?, 1, 2)?;
    if fields.next().is_some() {
        return None;
    }

    let year = i32::try_from(year).ok()?;
    let month = u32::try_from(month).ok().filter(|m| (1..=12).contains(m))?;
    let day = u32::try_from(day).ok().filter(|d| (1..=31).contains(d))?;

    if day <= ALWAYS_VALID_DAY {
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    (ALWAYS_VALID_DAY..=day)
        .rev()
        .find_map(|d| NaiveDate::from_ymd_opt(year, month, d))
}

/// Unsigned decimal field with a digit count in `min..=max`
fn date_field(field: &str, min_digits: usize, max_digits: usize) -> Option<u64> {
    let digits = field.len();
    if digits < min_digits || digits > max_digits || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// Trim each pooled name and drop blanks, keeping order
pub fn normalize_pool(pool: &[String]) -> Vec<String> {
    pool.iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_feed_date_accepts_short_fields() {
        assert_eq!(parse_feed_date("2023/10/2"), Some(date(2023, 10, 2)));
        assert_eq!(parse_feed_date("2023/1/02"), Some(date(2023, 1, 2)));
        assert_eq!(parse_feed_date(" 2023/10/19 "), Some(date(2023, 10, 19)));
    }

    #[test]
    fn test_parse_feed_date_rejects_other_shapes() {
        assert_eq!(parse_feed_date(""), None);
        assert_eq!(parse_feed_date("bad-date"), None);
        assert_eq!(parse_feed_date("2023-10-19"), None);
        assert_eq!(parse_feed_date("2023/13/01"), None);
        assert_eq!(parse_feed_date("2023/0/1"), None);
        assert_eq!(parse_feed_date("2023/1/0"), None);
        assert_eq!(parse_feed_date("2023/1/32"), None);
        assert_eq!(parse_feed_date("2023/10/19 10:00"), None);
        assert_eq!(parse_feed_date("2023/10/19/1"), None);
        assert_eq!(parse_feed_date("2023/10"), None);
    }

    #[test]
    fn test_parse_feed_date_requires_four_digit_year() {
        assert_eq!(parse_feed_date("23/10/2"), None);
        assert_eq!(parse_feed_date("+2023/10/2"), None);
        assert_eq!(parse_feed_date("-2023/10/2"), None);
        assert_eq!(parse_feed_date("2023/+1/2"), None);
        assert_eq!(parse_feed_date("12023/1/2"), Some(date(12023, 1, 2)));
    }

    #[test]
    fn test_parse_feed_date_clamps_day_to_month_end() {
        assert_eq!(parse_feed_date("2023/02/30"), Some(date(2023, 2, 28)));
        assert_eq!(parse_feed_date("2024/2/31"), Some(date(2024, 2, 29)));
        assert_eq!(parse_feed_date("2023/4/31"), Some(date(2023, 4, 30)));
        assert_eq!(parse_feed_date("2023/1/31"), Some(date(2023, 1, 31)));
    }

    #[test]
    fn test_parse_row_keeps_row_with_clamped_day() {
        let row = RawScheduleRow::new("8", "2023/2/30", "2023/3/9");
        let parsed = parse_row(&row, 0).unwrap();
        assert_eq!(parsed.source_start_date, date(2023, 2, 28));
    }

    #[test]
    fn test_parse_row_valid() {
        let row = RawScheduleRow::new(" 12 ", "2023/10/2", "2023/10/11")
            .with_entity_pool(&["Alpha", "  ", " Beta "])
            .with_item_pool(&["", "SSR-Card"])
            .with_local_dates("2025/2/3", "not yet");

        let parsed = parse_row(&row, 0).unwrap();

        assert_eq!(parsed.base_id, "12");
        assert_eq!(parsed.source_start_date, date(2023, 10, 2));
        assert_eq!(parsed.source_end_date, date(2023, 10, 11));
        assert_eq!(parsed.local_start_date, Some(date(2025, 2, 3)));
        assert_eq!(parsed.local_end_date, None);
        assert_eq!(parsed.entity_pool, vec!["Alpha", "Beta"]);
        assert_eq!(parsed.item_pool, vec!["SSR-Card"]);
    }

    #[test]
    fn test_parse_row_blank_id_uses_position() {
        let row = RawScheduleRow::new("   ", "2023/10/2", "2023/10/11");
        assert_eq!(parse_row(&row, 6).unwrap().base_id, "row-7");
    }

    #[test]
    fn test_parse_row_rejects_bad_dates() {
        let bad_start = RawScheduleRow::new("1", "bad-date", "2023/10/11")
            .with_entity_pool(&["Alpha"]);
        let bad_end = RawScheduleRow::new("1", "2023/10/2", "")
            .with_entity_pool(&["Alpha"]);

        assert!(parse_row(&bad_start, 0).is_none());
        assert!(parse_row(&bad_end, 0).is_none());
    }

    #[test]
    fn test_end_before_start_is_not_rejected() {
        let row = RawScheduleRow::new("1", "2023/10/11", "2023/10/2");
        assert!(parse_row(&row, 0).is_some());
    }

    #[test]
    fn test_raw_row_deserializes_with_defaults() {
        let row: RawScheduleRow =
            serde_json::from_str(r#"{"jpStartDate": "2023/10/19", "charaPool": ["Alpha"]}"#).unwrap();

        assert_eq!(row.id, "");
        assert_eq!(row.source_start_date, "2023/10/19");
        assert_eq!(row.source_end_date, "");
        assert_eq!(row.entity_pool, vec!["Alpha"]);
        assert!(row.item_pool.is_empty());
    }
}
