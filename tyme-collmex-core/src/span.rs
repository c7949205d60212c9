//! Splits a tracked time span into one span per calendar day.
//!
//! Collmex activities cannot cross midnight. A span crossing one or more
//! midnights becomes a first day ending at 23:59, full `00:00` to `23:59` days in
//! between, and a last day starting at 00:00. A span ending exactly at
//! midnight keeps a zero-length last day unless [`MidnightEnd::Drop`] is asked for.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpanError {
    #[error("span ends ({end}) before it starts ({start})")]
    EndBeforeStart {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    #[error("span runs past the supported calendar range")]
    OutOfRange,
}

/// The part of a span that falls on a single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySpan {
    pub date: NaiveDate,
    pub from: NaiveTime,
    pub to: NaiveTime,
}

/// What to do with the day a multi-day span ends on when it ends exactly at
/// midnight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MidnightEnd {
    /// Emit a zero-length `00:00`-`00:00` span for that day.
    #[default]
    Keep,
    /// Leave that day out.
    Drop,
}

/// Last minute Collmex accepts for a day.
pub fn end_of_day() -> NaiveTime {
    NaiveTime::MIN + Duration::minutes(23 * 60 + 59)
}

pub fn split_into_days(
    start: NaiveDateTime,
    end: NaiveDateTime,
    midnight: MidnightEnd,
) -> Result<Vec<DaySpan>, SpanError> {
    if end < start {
        return Err(SpanError::EndBeforeStart { start, end });
    }

    let mut spans = Vec::new();
    let mut day = start.date();
    let mut from = start.time();
    let last_day = end.date();

    while day < last_day {
        spans.push(DaySpan {
            date: day,
            from,
            to: end_of_day(),
        });
        day = day.succ_opt().ok_or(SpanError::OutOfRange)?;
        from = NaiveTime::MIN;
    }

    let empty_last_day = !spans.is_empty() && end.time() == NaiveTime::MIN;
    if !empty_last_day || midnight == MidnightEnd::Keep {
        spans.push(DaySpan {
            date: last_day,
            from,
            to: end.time(),
        });
    }

    if spans.len() > 1 {
        tracing::debug!(%start, %end, days = spans.len(), "Split span across days");
    }
    Ok(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, min: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, min, 0).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        date(y, m, d).and_time(time(h, min))
    }

    fn split(start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<DaySpan>, SpanError> {
        split_into_days(start, end, MidnightEnd::default())
    }

    #[test]
    fn same_day_span_is_untouched() {
        let spans = split(at(2016, 10, 11, 9, 8), at(2016, 10, 11, 17, 30)).unwrap();
        assert_eq!(
            spans,
            vec![DaySpan {
                date: date(2016, 10, 11),
                from: time(9, 8),
                to: time(17, 30),
            }]
        );
    }

    #[test]
    fn span_over_one_midnight_becomes_two_days() {
        let spans = split(at(2016, 10, 11, 22, 0), at(2016, 10, 12, 1, 15)).unwrap();
        assert_eq!(
            spans,
            vec![
                DaySpan {
                    date: date(2016, 10, 11),
                    from: time(22, 0),
                    to: time(23, 59),
                },
                DaySpan {
                    date: date(2016, 10, 12),
                    from: time(0, 0),
                    to: time(1, 15),
                },
            ]
        );
    }

    #[test]
    fn intermediate_days_are_clamped_to_the_full_day() {
        let spans = split(at(2016, 10, 11, 20, 0), at(2016, 10, 14, 2, 0)).unwrap();
        assert_eq!(spans.len(), 4);
        assert_eq!(spans[1].date, date(2016, 10, 12));
        assert_eq!((spans[1].from, spans[1].to), (time(0, 0), time(23, 59)));
        assert_eq!(spans[2].date, date(2016, 10, 13));
        assert_eq!((spans[2].from, spans[2].to), (time(0, 0), time(23, 59)));
        assert_eq!(spans[3].date, date(2016, 10, 14));
        assert_eq!((spans[3].from, spans[3].to), (time(0, 0), time(2, 0)));
    }

    #[test]
    fn crossing_a_month_boundary_with_the_same_day_number() {
        // 31 Jan 23:00 to 31 Mar 01:00 would compare equal on day-of-month alone.
        let spans = split(at(2017, 1, 31, 23, 0), at(2017, 3, 31, 1, 0)).unwrap();
        assert_eq!(spans.first().unwrap().date, date(2017, 1, 31));
        assert_eq!(spans.last().unwrap().date, date(2017, 3, 31));
        assert_eq!(spans.len(), 60);
    }

    #[test]
    fn ending_at_midnight_keeps_an_empty_last_day_by_default() {
        let spans = split(at(2016, 10, 11, 22, 0), at(2016, 10, 12, 0, 0)).unwrap();
        assert_eq!(
            spans,
            vec![
                DaySpan {
                    date: date(2016, 10, 11),
                    from: time(22, 0),
                    to: time(23, 59),
                },
                DaySpan {
                    date: date(2016, 10, 12),
                    from: time(0, 0),
                    to: time(0, 0),
                },
            ]
        );
    }

    #[test]
    fn ending_at_midnight_can_drop_the_empty_last_day() {
        let spans = split_into_days(
            at(2016, 10, 11, 22, 0),
            at(2016, 10, 12, 0, 0),
            MidnightEnd::Drop,
        )
        .unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].to, time(23, 59));
    }

    #[test]
    fn dropping_the_midnight_day_keeps_full_days_before_it() {
        let spans = split_into_days(
            at(2016, 10, 11, 22, 0),
            at(2016, 10, 13, 0, 0),
            MidnightEnd::Drop,
        )
        .unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].date, date(2016, 10, 12));
        assert_eq!((spans[1].from, spans[1].to), (time(0, 0), time(23, 59)));
    }

    #[test]
    fn zero_length_span_is_kept() {
        for midnight in [MidnightEnd::Keep, MidnightEnd::Drop] {
            let spans =
                split_into_days(at(2016, 10, 11, 0, 0), at(2016, 10, 11, 0, 0), midnight).unwrap();
            assert_eq!(spans.len(), 1);
        }
    }

    #[test]
    fn inverted_span_is_rejected() {
        let err = split(at(2016, 10, 12, 9, 0), at(2016, 10, 11, 9, 0)).unwrap_err();
        assert!(matches!(err, SpanError::EndBeforeStart { .. }));
    }
}
