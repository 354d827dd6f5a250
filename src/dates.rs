//! Lenient parsing of the date and time-of-day spellings found in platform exports.
use time::format_description::FormatItem;
use time::macros::format_description;

static DATE_FORMATS: &[&[FormatItem<'static>]] = &[
    format_description!("[month padding:none]/[day padding:none]/[year]"),
    format_description!("[year]-[month padding:none]-[day padding:none]"),
    format_description!("[year]/[month padding:none]/[day padding:none]"),
    format_description!("[month padding:none]-[day padding:none]-[year]"),
    format_description!("[month repr:short] [day padding:none], [year]"),
    format_description!("[month repr:long] [day padding:none], [year]"),
];

static TIME_FORMATS: &[&[FormatItem<'static>]] = &[
    format_description!("[hour padding:none]:[minute]:[second]"),
    format_description!("[hour padding:none]:[minute]"),
    format_description!("[hour repr:12 padding:none]:[minute]:[second] [period case_sensitive:false]"),
    format_description!("[hour repr:12 padding:none]:[minute] [period case_sensitive:false]"),
];

/// The format in which users type dates, and in which we print them.
pub static US_DATE: &[FormatItem<'static>] = format_description!("[month]/[day]/[year]");

/// Parse a date typed by a user, which must be `MM/DD/YYYY` (leading zeros optional).
pub fn parse_us_date(input: &str) -> Option<time::Date> {
    time::Date::parse(input.trim(), DATE_FORMATS[0]).ok()
}

/// Parse a date out of an export cell, ignoring any time that follows it.
///
/// Tries the common spellings first, then everything `gix-date` understands.
pub fn parse_date(input: &str) -> Option<time::Date> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    let date_part = date_part(input);
    DATE_FORMATS
        .iter()
        .find_map(|format| time::Date::parse(date_part, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| time::Date::parse(input, format).ok())
        })
        .or_else(|| parse_with_gix(input))
}

/// Parse the time of day from a cell holding either a bare time or a date followed by a time.
pub fn parse_time(input: &str) -> Option<time::Time> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    let time_part = match input.find(|c: char| c == ' ' || c == 'T') {
        Some(pos) if parse_date(&input[..pos]).is_some() => input[pos + 1..].trim(),
        _ => input,
    };
    let time_part = time_part
        .trim_end_matches('Z')
        .split(|c| c == '+' || c == '.')
        .next()
        .unwrap_or_default()
        .trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| time::Time::parse(time_part, format).ok())
}

fn date_part(input: &str) -> &str {
    if let Some(comma) = input.rfind(", ") {
        // `Nov 5, 2024 10:00` keeps the spaces inside its date
        let year_start = comma + 2;
        return match input[year_start..].find(' ') {
            Some(space) => &input[..year_start + space],
            None => input,
        };
    }
    input
        .split(|c| c == ' ' || c == 'T')
        .next()
        .unwrap_or(input)
}

fn parse_with_gix(input: &str) -> Option<time::Date> {
    let parsed = gix_date::parse(input, None).ok()?;
    let offset = time::UtcOffset::from_whole_seconds(parsed.offset).ok()?;
    let date_time = time::OffsetDateTime::from_unix_timestamp(parsed.seconds)
        .ok()?
        .to_offset(offset);
    Some(date_time.date())
}

/// Shift `date` back by one calendar year, mapping February 29th to February 28th.
pub fn one_year_earlier(date: time::Date) -> time::Date {
    let year = date.year() - 1;
    time::Date::from_calendar_date(year, date.month(), date.day())
        .or_else(|_| time::Date::from_calendar_date(year, date.month(), date.day() - 1))
        .unwrap_or(date)
}

/// Format `date` as `MM/DD/YYYY`.
pub fn format_us_date(date: time::Date) -> String {
    date.format(US_DATE)
        .unwrap_or_else(|_| format!("{}-{}-{}", date.year(), date.month() as u8, date.day()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, time};

    #[test]
    fn dates_in_various_spellings() {
        for input in [
            "11/05/2024",
            "11/5/2024",
            "2024-11-05",
            "2024/11/05",
            "2024-11-05 13:45:00",
            "2024-11-05T13:45:00Z",
            "11/05/2024 1:45 PM",
            "Nov 5, 2024",
            "November 5, 2024",
            " 11-05-2024 ",
        ] {
            assert_eq!(parse_date(input), Some(date!(2024 - 11 - 05)), "{input}");
        }
    }

    #[test]
    fn garbage_is_not_a_date() {
        for input in ["", "n/a", "13/45/2024", "yesterday-ish"] {
            assert_eq!(parse_date(input), None, "{input}");
        }
    }

    #[test]
    fn times_in_various_spellings() {
        for (input, expected) in [
            ("13:45:00", time!(13:45)),
            ("9:05", time!(9:05)),
            ("1:45 PM", time!(13:45)),
            ("12:10 am", time!(0:10)),
            ("2024-11-05 13:45:00", time!(13:45)),
            ("2024-11-05T13:45:10.250Z", time!(13:45:10)),
        ] {
            assert_eq!(parse_time(input), Some(expected), "{input}");
        }
        assert_eq!(parse_time("later"), None);
    }

    #[test]
    fn user_dates_must_be_us_style() {
        assert_eq!(parse_us_date("1/2/2025"), Some(date!(2025 - 01 - 02)));
        assert_eq!(parse_us_date("2025-01-02"), None);
    }

    #[test]
    fn leap_days_shift_to_the_end_of_february() {
        assert_eq!(one_year_earlier(date!(2024 - 02 - 29)), date!(2023 - 02 - 28));
        assert_eq!(one_year_earlier(date!(2025 - 12 - 31)), date!(2024 - 12 - 31));
    }

    #[test]
    fn us_formatting() {
        assert_eq!(format_us_date(date!(2024 - 01 - 05)), "01/05/2024");
    }
}
