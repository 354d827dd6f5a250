use crate::dates;
use std::collections::BTreeSet;
use time::Date;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Date range '{input}' is not of the form MM/DD/YYYY-MM/DD/YYYY")]
    Malformed { input: String },
    #[error("'{input}' is not a valid MM/DD/YYYY date")]
    InvalidDate { input: String },
    #[error("Date range '{input}' starts after it ends")]
    StartAfterEnd { input: String },
}

/// Anything that happened on a particular day.
pub trait Dated {
    fn date(&self) -> Date;
}

/// An inclusive range of days.
///
/// Windows obtained through [`DateWindow::parse()`] never start after they end. Ranges constructed directly
/// with `start > end` are valid values and simply contain no day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateWindow {
    pub start: Date,
    pub end: Date,
}

impl DateWindow {
    /// Parse a range as typed by a user, like `11/01/2024-11/30/2024`.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let (start, end) = input
            .split_once('-')
            .filter(|(start, end)| !start.trim().is_empty() && !end.trim().is_empty())
            .ok_or_else(|| Error::Malformed {
                input: input.into(),
            })?;
        let parse = |date: &str| {
            dates::parse_us_date(date).ok_or_else(|| Error::InvalidDate {
                input: date.trim().into(),
            })
        };
        let window = DateWindow {
            start: parse(start)?,
            end: parse(end)?,
        };
        if window.is_empty() {
            return Err(Error::StartAfterEnd {
                input: input.into(),
            });
        }
        Ok(window)
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// The same calendar window, one year earlier.
    pub fn last_year(&self) -> Self {
        DateWindow {
            start: dates::one_year_earlier(self.start),
            end: dates::one_year_earlier(self.end),
        }
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}",
            dates::format_us_date(self.start),
            dates::format_us_date(self.end)
        )
    }
}

/// Days to leave out of every window, like holidays or outages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludedDates(pub BTreeSet<Date>);

impl ExcludedDates {
    /// Parse `MM/DD/YYYY` dates as typed by a user.
    pub fn parse<'a>(dates: impl IntoIterator<Item = &'a str>) -> Result<Self, Error> {
        dates
            .into_iter()
            .filter(|date| !date.trim().is_empty())
            .map(|date| {
                dates::parse_us_date(date).ok_or_else(|| Error::InvalidDate {
                    input: date.trim().into(),
                })
            })
            .collect::<Result<BTreeSet<_>, _>>()
            .map(ExcludedDates)
    }

    pub fn contains(&self, date: Date) -> bool {
        self.0.contains(&date)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Date> for ExcludedDates {
    fn from_iter<T: IntoIterator<Item = Date>>(iter: T) -> Self {
        ExcludedDates(iter.into_iter().collect())
    }
}

/// Return copies of all `records` within `window` that don't fall on an `excluded` day.
pub fn filter<T: Dated + Clone>(records: &[T], window: &DateWindow, excluded: &ExcludedDates) -> Vec<T> {
    records
        .iter()
        .filter(|record| {
            let date = record.date();
            window.contains(date) && !excluded.contains(date)
        })
        .cloned()
        .collect()
}

/// One of the four windows each analysis compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Period {
    PreLastYear,
    PostLastYear,
    Pre,
    Post,
}

impl Period {
    pub const ALL: [Period; 4] = [
        Period::PreLastYear,
        Period::PostLastYear,
        Period::Pre,
        Period::Post,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Period::PreLastYear => "pre (last year)",
            Period::PostLastYear => "post (last year)",
            Period::Pre => "pre",
            Period::Post => "post",
        }
    }
}

/// The windows of one analysis run along with the days excluded from all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Periods {
    pub pre: DateWindow,
    pub post: DateWindow,
    pub pre_last_year: DateWindow,
    pub post_last_year: DateWindow,
    pub excluded: ExcludedDates,
}

impl Periods {
    /// Derive the last-year windows from `pre` and `post`.
    pub fn new(pre: DateWindow, post: DateWindow, excluded: ExcludedDates) -> Self {
        Periods {
            pre_last_year: pre.last_year(),
            post_last_year: post.last_year(),
            pre,
            post,
            excluded,
        }
    }

    pub fn window(&self, period: Period) -> &DateWindow {
        match period {
            Period::PreLastYear => &self.pre_last_year,
            Period::PostLastYear => &self.post_last_year,
            Period::Pre => &self.pre,
            Period::Post => &self.post,
        }
    }

    /// Return the records that fall into `period`.
    pub fn select<T: Dated + Clone>(&self, records: &[T], period: Period) -> Vec<T> {
        filter(records, self.window(period), &self.excluded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[derive(Debug, Clone, PartialEq)]
    struct Day(Date);

    impl Dated for Day {
        fn date(&self) -> Date {
            self.0
        }
    }

    fn days() -> Vec<Day> {
        (0..40)
            .map(|offset| Day(date!(2024 - 10 - 25) + time::Duration::days(offset)))
            .collect()
    }

    fn november() -> DateWindow {
        DateWindow {
            start: date!(2024 - 11 - 01),
            end: date!(2024 - 11 - 30),
        }
    }

    #[test]
    fn filter_keeps_exactly_the_days_within_the_window() {
        let records = days();
        let window = november();
        let kept = filter(&records, &window, &ExcludedDates::default());
        let expected: Vec<_> = records
            .iter()
            .filter(|d| d.0 >= window.start && d.0 <= window.end)
            .cloned()
            .collect();
        assert_eq!(kept, expected);
        assert_eq!(kept.len(), 30);
        assert_eq!(records.len(), 40, "input is left alone");
    }

    #[test]
    fn filter_removes_exactly_the_excluded_days() {
        let records = days();
        let excluded: ExcludedDates = [date!(2024 - 11 - 28), date!(2024 - 12 - 25), date!(2024 - 11 - 01)]
            .into_iter()
            .collect();
        let kept = filter(&records, &november(), &excluded);
        assert_eq!(kept.len(), 28, "only the two excluded days within the window are removed");
        assert!(kept.iter().all(|d| !excluded.contains(d.0)));
    }

    #[test]
    fn windows_that_start_after_they_end_match_nothing() {
        let window = DateWindow {
            start: date!(2024 - 12 - 01),
            end: date!(2024 - 11 - 01),
        };
        assert!(window.is_empty());
        assert!(filter(&days(), &window, &ExcludedDates::default()).is_empty());
    }

    #[test]
    fn parse_ranges() {
        assert_eq!(DateWindow::parse("11/01/2024-11/30/2024").unwrap(), november());
        assert_eq!(DateWindow::parse(" 11/1/2024 - 11/30/2024 ").unwrap(), november());
        assert_eq!(november().to_string(), "11/01/2024-11/30/2024");
    }

    #[test]
    fn parse_rejects_bad_ranges() {
        assert!(matches!(
            DateWindow::parse("11/01/2024"),
            Err(Error::Malformed { .. })
        ));
        assert!(matches!(
            DateWindow::parse("11/01/2024-"),
            Err(Error::Malformed { .. })
        ));
        assert!(matches!(
            DateWindow::parse("11/01/2024-2024-11-30"),
            Err(Error::InvalidDate { .. })
        ));
        assert!(matches!(
            DateWindow::parse("12/01/2024-11/01/2024"),
            Err(Error::StartAfterEnd { .. })
        ));
    }

    #[test]
    fn excluded_dates_parse() {
        let excluded = ExcludedDates::parse(["11/28/2024", "", "12/25/2024"]).unwrap();
        assert_eq!(excluded.0.len(), 2);
        assert!(excluded.contains(date!(2024 - 11 - 28)));
        assert!(matches!(
            ExcludedDates::parse(["tomorrow"]),
            Err(Error::InvalidDate { .. })
        ));
    }

    #[test]
    fn periods_shift_by_a_year() {
        let post = DateWindow::parse("12/01/2024-12/31/2024").unwrap();
        let periods = Periods::new(november(), post, ExcludedDates::default());
        assert_eq!(periods.pre_last_year.to_string(), "11/01/2023-11/30/2023");
        assert_eq!(periods.post_last_year.to_string(), "12/01/2023-12/31/2023");
        assert_eq!(periods.window(Period::Post), &post);
    }
}
