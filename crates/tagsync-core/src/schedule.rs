use chrono::{Datelike, NaiveDate, Weekday};
use tagsync_models::ActivationInterval;

/// Whether a rule with `intervals` may run on `today`.
///
/// No intervals means always active; otherwise any matching interval wins.
pub fn is_active(today: NaiveDate, intervals: &[ActivationInterval]) -> bool {
    intervals.is_empty() || intervals.iter().any(|interval| matches(today, interval))
}

fn matches(today: NaiveDate, interval: &ActivationInterval) -> bool {
    match interval {
        ActivationInterval::SpecificDate { start, end } => {
            start.map_or(true, |s| today >= s) && end.map_or(true, |e| today <= e)
        }
        ActivationInterval::Annual {
            start_month,
            start_day,
            end_month,
            end_day,
        } => annual_matches(today, *start_month, *start_day, *end_month, *end_day),
        ActivationInterval::Weekly { days } => {
            let name = weekday_name(today.weekday());
            days.iter().any(|day| day.trim().eq_ignore_ascii_case(name))
        }
    }
}

fn annual_matches(today: NaiveDate, start_month: u32, start_day: u32, end_month: u32, end_day: u32) -> bool {
    let year = today.year();
    let (Some(start), Some(end)) = (
        NaiveDate::from_ymd_opt(year, start_month, start_day),
        NaiveDate::from_ymd_opt(year, end_month, end_day),
    ) else {
        // Feb 29 outside a leap year, or a malformed month/day
        return false;
    };

    if end >= start {
        return today >= start && today <= end;
    }

    // Range wraps the new year: Dec 20 .. Jan 5 is active on both sides of it.
    today >= start || today <= end
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
