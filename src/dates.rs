//! Normalization of loosely formatted archive dates.
//!
//! Archive exports print publication dates as `November 19, 2024`, usually
//! followed by a weekday or a time zone. The segmenter keeps the first three
//! tokens of such a line (see [`date_candidate`]) and hands them to
//! [`normalize`], which accepts exactly `"<Month name> <day>[,] <year>"`.

use crate::errors::DateParseError;
use chrono::NaiveDate;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Parse `"<Month name> <day>[,] <year>"` into a calendar date.
///
/// The month must be a full English month name (any casing), the day one or
/// two digits with an optional trailing comma, and the year four digits.
/// Impossible dates such as `February 30, 2023` are rejected.
///
/// # Examples
///
/// ```
/// use awful_news_archive::dates::normalize;
///
/// let date = normalize("November 19, 2024").unwrap();
/// assert_eq!(date.to_string(), "2024-11-19");
/// assert!(normalize("Someday 99, abcd").is_err());
/// ```
pub fn normalize(raw: &str) -> Result<NaiveDate, DateParseError> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let [month, day, year] = tokens.as_slice() else {
        return Err(DateParseError::new(
            raw,
            format!("expected 3 tokens, found {}", tokens.len()),
        ));
    };

    let month = month_number(month)
        .ok_or_else(|| DateParseError::new(raw, format!("unknown month {month:?}")))?;

    let day_digits = day.strip_suffix(',').unwrap_or(*day);
    if day_digits.is_empty()
        || day_digits.len() > 2
        || !day_digits.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(DateParseError::new(raw, format!("invalid day {day:?}")));
    }
    let day: u32 = day_digits
        .parse()
        .map_err(|_| DateParseError::new(raw, format!("invalid day {day:?}")))?;
    if !(1..=31).contains(&day) {
        return Err(DateParseError::new(raw, format!("day {day} out of range")));
    }

    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DateParseError::new(raw, format!("invalid year {year:?}")));
    }
    let year: i32 = year
        .parse()
        .map_err(|_| DateParseError::new(raw, format!("invalid year {year:?}")))?;

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| DateParseError::new(raw, "no such calendar date"))
}

/// [`normalize`], rendered as `YYYY-MM-DD`.
pub fn normalize_iso(raw: &str) -> Result<String, DateParseError> {
    normalize(raw).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Reduce a header or marker line to the text [`normalize`] expects.
///
/// Keeps the first three whitespace-separated tokens and strips commas from
/// both ends of the result, so `"November 19, 2024, Tuesday"` becomes
/// `"November 19, 2024"`.
pub fn date_candidate(text: &str) -> String {
    let joined = text.split_whitespace().take(3).collect::<Vec<_>>().join(" ");
    joined.trim_matches(',').to_string()
}

/// Map a full month name (case-insensitive) to `1..=12`.
pub(crate) fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == lower)
        .map(|i| i as u32 + 1)
}

/// Lower-case English month names, January first.
pub(crate) fn month_names() -> &'static [&'static str; 12] {
    &MONTHS
}
