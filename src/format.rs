use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use std::fmt;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const NOT_AVAILABLE: &str = "N/A";
pub const UNKNOWN_DATE: &str = "Unknown date";
pub const MAX_CAST_TAGS: usize = 5;

const ADDED_AT_FORMAT: &str = "%B %-d, %Y at %I:%M %p";
const NAIVE_DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub fn year_label(year: Option<i32>) -> String {
    match year {
        Some(year) => year.to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Rating fraction as a percentage with one decimal, e.g. `0.873` -> `87.3%`.
pub fn rating_label(rating: Option<f64>) -> String {
    match rating {
        Some(rating) if rating.is_finite() => format!("{:.1}%", rating * 100.0),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Long local date-time for an `added_at` value, or [`UNKNOWN_DATE`].
pub fn added_at_label(value: &str) -> String {
    format_added_at_in(value, &Local)
}

pub fn format_added_at_in<Tz>(value: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match parse_added_at(value, tz) {
        Some(at) => at.format(ADDED_AT_FORMAT).to_string(),
        None => UNKNOWN_DATE.to_string(),
    }
}

/// Accepts RFC 3339, Unix seconds, and the common naive date/time layouts.
/// Naive values are read as wall-clock time in `tz`.
pub fn parse_added_at<Tz: TimeZone>(value: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(at.with_timezone(tz));
    }

    if let Ok(secs) = value.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0).map(|at| at.with_timezone(tz));
    }

    for pattern in NAIVE_DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, pattern) {
            return tz.from_local_datetime(&naive).earliest();
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|naive| tz.from_local_datetime(&naive).earliest())
}

/// The leading cast members shown as tags.
pub fn cast_tags(cast: &[String]) -> &[String] {
    &cast[..cast.len().min(MAX_CAST_TAGS)]
}

/// Word-wrap `text` into at most `max_lines` lines of `width` display columns.
/// The last line ends with `…` when text was dropped.
pub fn clamp_lines(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    if width == 0 || max_lines == 0 {
        return Vec::new();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    let mut truncated = false;

    'words: for word in text.split_whitespace() {
        let word_width = word.width();
        let separator = usize::from(!current.is_empty());
        if current_width + separator + word_width <= width {
            if separator == 1 {
                current.push(' ');
            }
            current.push_str(word);
            current_width += separator + word_width;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
            if lines.len() == max_lines {
                truncated = true;
                break;
            }
        }

        for ch in word.chars() {
            let ch_width = ch.width().unwrap_or(0);
            // Never fits on any line.
            if ch_width > width {
                continue;
            }
            if current_width + ch_width > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_width = 0;
                if lines.len() == max_lines {
                    truncated = true;
                    break 'words;
                }
            }
            current.push(ch);
            current_width += ch_width;
        }
    }

    if !truncated && !current.is_empty() {
        lines.push(current);
    }

    if truncated {
        if let Some(last) = lines.last_mut() {
            while !last.is_empty() && last.width() + 1 > width {
                last.pop();
            }
            last.push('…');
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    #[test]
    fn test_rating_label() {
        assert_eq!(rating_label(Some(0.873)), "87.3%");
        assert_eq!(rating_label(Some(1.0)), "100.0%");
        assert_eq!(rating_label(Some(0.0)), "0.0%");
        assert_eq!(rating_label(None), "N/A");
        assert_eq!(rating_label(Some(f64::NAN)), "N/A");
    }

    #[test]
    fn test_year_label() {
        assert_eq!(year_label(Some(1999)), "1999");
        assert_eq!(year_label(None), "N/A");
    }

    #[test]
    fn test_added_at_formats() {
        assert_eq!(
            format_added_at_in("2024-01-05T15:04:05Z", &Utc),
            "January 5, 2024 at 03:04 PM"
        );
        assert_eq!(
            format_added_at_in("2024-01-05T15:04:05.123456789+02:00", &Utc),
            "January 5, 2024 at 01:04 PM"
        );
        assert_eq!(
            format_added_at_in("1704467045", &Utc),
            "January 5, 2024 at 03:04 PM"
        );
        assert_eq!(
            format_added_at_in("2023-12-31 09:30:00", &Utc),
            "December 31, 2023 at 09:30 AM"
        );
        assert_eq!(
            format_added_at_in("2023-07-04", &Utc),
            "July 4, 2023 at 12:00 AM"
        );
    }

    #[test]
    fn test_unparsable_added_at_falls_back() {
        assert_eq!(format_added_at_in("not a date", &Utc), "Unknown date");
        assert_eq!(format_added_at_in("", &Utc), "Unknown date");
        assert_eq!(format_added_at_in("2024-13-45", &Utc), "Unknown date");
        assert_eq!(added_at_label("yesterday-ish"), "Unknown date");
    }

    #[test]
    fn test_cast_tags_truncates_to_five() {
        let cast: Vec<String> = (1..=8).map(|i| format!("Actor {i}")).collect();
        let tags = cast_tags(&cast);
        assert_eq!(tags.len(), 5);
        assert_eq!(tags[4], "Actor 5");
        assert!(cast_tags(&[]).is_empty());
    }

    #[test]
    fn test_clamp_lines_truncates_with_ellipsis() {
        let lines = clamp_lines("The Lord of the Rings: The Fellowship of the Ring", 12, 2);
        assert_eq!(lines, ["The Lord of", "the Rings:…"]);
    }

    #[test]
    fn test_clamp_lines_short_title_untouched() {
        assert_eq!(clamp_lines("Heat", 12, 2), ["Heat"]);
        assert_eq!(clamp_lines("No Country", 12, 2), ["No Country"]);
    }

    #[test]
    fn test_clamp_lines_splits_long_words() {
        let lines = clamp_lines("Supercalifragilistic", 8, 2);
        assert_eq!(lines, ["Supercal", "ifragil…"]);
    }

    #[test]
    fn test_clamp_lines_wide_characters() {
        assert_eq!(clamp_lines("日本語", 3, 2), ["日", "本…"]);
        assert!(clamp_lines("日本", 1, 2).is_empty());
        assert_eq!(clamp_lines("日a本", 1, 2), ["a"]);
    }

    proptest! {
        #[test]
        fn cast_tags_are_a_bounded_prefix(cast in proptest::collection::vec("[a-zA-Z ]{1,12}", 0..20)) {
            let tags = cast_tags(&cast);
            prop_assert!(tags.len() <= MAX_CAST_TAGS);
            prop_assert_eq!(tags, &cast[..tags.len()]);
        }

        #[test]
        fn clamped_lines_fit_width(title in "[a-zA-Z0-9 :'日本語映画]{0,80}", width in 1usize..30) {
            let lines = clamp_lines(&title, width, 2);
            prop_assert!(lines.len() <= 2);
            for line in &lines {
                prop_assert!(line.width() <= width);
            }
        }

        #[test]
        fn rating_label_has_one_decimal(rating in 0.0f64..=1.0) {
            let label = rating_label(Some(rating));
            prop_assert!(label.ends_with('%'));
            let digits = label.trim_end_matches('%');
            prop_assert_eq!(digits.split('.').nth(1).map(str::len), Some(1));
        }
    }
}
