//! Date and time computations.

use chrono::{
    DateTime, Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike,
};

use crate::value::{Value, ValueError, ValueResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

const DATETIME_INPUT_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
];

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .ok()
        .or_else(|| NaiveDate::parse_from_str(text, "%Y/%m/%d").ok())
        .or_else(|| parse_datetime(text).map(|dt| dt.date()))
}

pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .ok()
        .or_else(|| NaiveTime::parse_from_str(text, "%H:%M").ok())
}

pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATETIME_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Drop sub-second precision.
pub fn to_seconds(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_nanosecond(0).unwrap_or(dt)
}

/// Keep millisecond precision only.
pub fn to_millis(dt: NaiveDateTime) -> NaiveDateTime {
    let millis = dt.nanosecond() / 1_000_000 * 1_000_000;
    dt.with_nanosecond(millis).unwrap_or(dt)
}

/// Shift a temporal value: DATE by days, TIME and TIMESTAMP by seconds,
/// DATETIME by milliseconds. TIME wraps around midnight.
pub fn shift(value: &Value, amount: i64) -> ValueResult<Value> {
    match value {
        Value::Date(d) => {
            let delta = TimeDelta::try_days(amount).ok_or(ValueError::Overflow)?;
            d.checked_add_signed(delta)
                .map(Value::Date)
                .ok_or(ValueError::Overflow)
        }
        Value::Time(t) => {
            let delta = TimeDelta::try_seconds(amount.rem_euclid(86_400))
                .ok_or(ValueError::Overflow)?;
            Ok(Value::Time(t.overflowing_add_signed(delta).0))
        }
        Value::Timestamp(ts) => {
            let delta = TimeDelta::try_seconds(amount).ok_or(ValueError::Overflow)?;
            ts.checked_add_signed(delta)
                .map(Value::Timestamp)
                .ok_or(ValueError::Overflow)
        }
        Value::DateTime(dt) => {
            let delta = TimeDelta::try_milliseconds(amount).ok_or(ValueError::Overflow)?;
            dt.checked_add_signed(delta)
                .map(Value::DateTime)
                .ok_or(ValueError::Overflow)
        }
        other => Err(ValueError::incompatible(other, "a temporal type")),
    }
}

/// Difference of two values of the same temporal type, in the unit `shift`
/// uses for that type.
pub fn difference(left: &Value, right: &Value) -> ValueResult<i64> {
    match (left, right) {
        (Value::Date(a), Value::Date(b)) => Ok(a.signed_duration_since(*b).num_days()),
        (Value::Time(a), Value::Time(b)) => Ok(a.signed_duration_since(*b).num_seconds()),
        (Value::Timestamp(a), Value::Timestamp(b)) => {
            Ok(a.signed_duration_since(*b).num_seconds())
        }
        (Value::DateTime(a), Value::DateTime(b)) => {
            Ok(a.signed_duration_since(*b).num_milliseconds())
        }
        (a, _) => Err(ValueError::incompatible(a, "a matching temporal type")),
    }
}

/// Calendar date part of a date-bearing value.
pub fn date_part(value: &Value) -> ValueResult<NaiveDate> {
    match value {
        Value::Date(d) => Ok(*d),
        Value::Timestamp(ts) | Value::DateTime(ts) => Ok(ts.date()),
        Value::String(s) => parse_date(s).ok_or_else(|| ValueError::incompatible(value, "DATE")),
        other => Err(ValueError::incompatible(other, "DATE")),
    }
}

/// Time-of-day part of a temporal value; a DATE is at midnight.
pub fn time_part(value: &Value) -> ValueResult<NaiveTime> {
    match value {
        Value::Time(t) => Ok(*t),
        Value::Date(_) => Ok(NaiveTime::MIN),
        Value::Timestamp(ts) | Value::DateTime(ts) => Ok(ts.time()),
        Value::String(s) => parse_time(s).ok_or_else(|| ValueError::incompatible(value, "TIME")),
        other => Err(ValueError::incompatible(other, "TIME")),
    }
}

/// Date and time of a date-bearing value.
pub fn datetime_part(value: &Value) -> ValueResult<NaiveDateTime> {
    match value {
        Value::Date(d) => Ok(d.and_time(NaiveTime::MIN)),
        Value::Timestamp(ts) | Value::DateTime(ts) => Ok(*ts),
        Value::String(s) => {
            parse_datetime(s).ok_or_else(|| ValueError::incompatible(value, "DATETIME"))
        }
        other => Err(ValueError::incompatible(other, "DATETIME")),
    }
}

pub fn last_day(date: NaiveDate) -> NaiveDate {
    let first_of_next = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    first_of_next
        .and_then(|d| d.pred_opt())
        .unwrap_or(date)
}

/// Add months; the last day of a month maps to the last day of the result
/// month.
pub fn add_months(date: NaiveDate, months: i64) -> ValueResult<NaiveDate> {
    let magnitude = u32::try_from(months.unsigned_abs()).map_err(|_| ValueError::Overflow)?;
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(magnitude))
    } else {
        date.checked_sub_months(Months::new(magnitude))
    }
    .ok_or(ValueError::Overflow)?;

    if date == last_day(date) {
        Ok(last_day(shifted))
    } else {
        Ok(shifted)
    }
}

/// Months from `later` back to `earlier`, with a fraction over 31-day months.
pub fn months_between(later: NaiveDate, earlier: NaiveDate) -> f64 {
    let months = (later.year() - earlier.year()) * 12 + later.month() as i32 - earlier.month() as i32;
    let both_last = later == last_day(later) && earlier == last_day(earlier);
    if later.day() == earlier.day() || both_last {
        return f64::from(months);
    }
    f64::from(months) + (f64::from(later.day()) - f64::from(earlier.day())) / 31.0
}

/// DATE(year, day_of_year); a non-positive day yields `None`.
pub fn make_date(year: i64, day_of_year: i64) -> ValueResult<Option<NaiveDate>> {
    if day_of_year <= 0 {
        return Ok(None);
    }
    let year = i32::try_from(year).map_err(|_| ValueError::Overflow)?;
    let start = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| ValueError::invalid(format!("year {year}")))?;
    let delta = TimeDelta::try_days(day_of_year - 1).ok_or(ValueError::Overflow)?;
    start
        .checked_add_signed(delta)
        .map(Some)
        .ok_or(ValueError::Overflow)
}

pub fn make_time(hour: i64, minute: i64, second: i64) -> ValueResult<NaiveTime> {
    let part = |v: i64| u32::try_from(v).ok();
    match (part(hour), part(minute), part(second)) {
        (Some(h), Some(m), Some(s)) => NaiveTime::from_hms_opt(h, m, s),
        _ => None,
    }
    .ok_or_else(|| ValueError::invalid(format!("time {hour}:{minute}:{second}")))
}

pub fn from_unix_time(seconds: i64) -> ValueResult<NaiveDateTime> {
    DateTime::from_timestamp(seconds, 0)
        .map(|dt| dt.naive_utc())
        .ok_or(ValueError::Overflow)
}

pub fn unix_timestamp(dt: NaiveDateTime) -> i64 {
    dt.and_utc().timestamp()
}

/// 1 = Sunday.
pub fn day_of_week(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday() + 1
}

pub fn quarter(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

/// Truncate a date to the unit named by an Oracle-style format element.
pub fn truncate_date(date: NaiveDate, unit: &str) -> ValueResult<NaiveDate> {
    let unit = unit.trim().to_ascii_uppercase();
    let truncated = match unit.as_str() {
        "YYYY" | "YEAR" | "YY" => NaiveDate::from_ymd_opt(date.year(), 1, 1),
        "Q" => NaiveDate::from_ymd_opt(date.year(), (quarter(date) - 1) * 3 + 1, 1),
        "MM" | "MONTH" | "MON" => NaiveDate::from_ymd_opt(date.year(), date.month(), 1),
        "DD" | "DAY" | "" => Some(date),
        _ => return Err(ValueError::invalid(format!("date unit '{unit}'"))),
    };
    truncated.ok_or(ValueError::Overflow)
}

/// Round a date to the nearest unit named by an Oracle-style format element.
pub fn round_date(date: NaiveDate, unit: &str) -> ValueResult<NaiveDate> {
    let upper = unit.trim().to_ascii_uppercase();
    let round_up = match upper.as_str() {
        "YYYY" | "YEAR" | "YY" => date.month() >= 7,
        "MM" | "MONTH" | "MON" => date.day() >= 16,
        _ => false,
    };
    let truncated = truncate_date(date, unit)?;
    if !round_up {
        return Ok(truncated);
    }
    let months = if upper.starts_with('Y') { 12 } else { 1 };
    truncated
        .checked_add_months(Months::new(months))
        .ok_or(ValueError::Overflow)
}

/// Translate a MySQL-style format string (`%Y-%m-%d`) to chrono's.
pub fn mysql_format(format: &str) -> String {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            push_literal(&mut out, c);
            continue;
        }
        let Some(spec) = chars.next() else {
            out.push_str("%%");
            break;
        };
        let translated = match spec {
            'Y' => "%Y",
            'y' => "%y",
            'm' => "%m",
            'c' => "%-m",
            'd' => "%d",
            'e' => "%-d",
            'H' => "%H",
            'k' => "%-H",
            'h' | 'I' => "%I",
            'l' => "%-I",
            'i' => "%M",
            's' | 'S' => "%S",
            'f' => "%6f",
            'p' => "%p",
            'M' => "%B",
            'b' => "%b",
            'W' => "%A",
            'a' => "%a",
            'j' => "%j",
            'T' => "%H:%M:%S",
            'r' => "%I:%M:%S %p",
            'w' => "%w",
            '%' => "%%",
            other => {
                push_literal(&mut out, other);
                continue;
            }
        };
        out.push_str(translated);
    }
    out
}

/// Translate an Oracle-style format model (`YYYY-MM-DD HH24:MI:SS`) to
/// chrono's.
pub fn oracle_format(format: &str) -> String {
    const ELEMENTS: [(&str, &str); 17] = [
        ("YYYY", "%Y"),
        ("HH24", "%H"),
        ("HH12", "%I"),
        ("MONTH", "%B"),
        ("FF3", "%3f"),
        ("FF", "%3f"),
        ("DAY", "%A"),
        ("MON", "%b"),
        ("YY", "%y"),
        ("MM", "%m"),
        ("DD", "%d"),
        ("DY", "%a"),
        ("HH", "%I"),
        ("MI", "%M"),
        ("SS", "%S"),
        ("AM", "%p"),
        ("PM", "%p"),
    ];

    let mut out = String::with_capacity(format.len());
    let mut rest = format;
    'outer: while !rest.is_empty() {
        let upper = rest.to_ascii_uppercase();
        for (element, translated) in ELEMENTS {
            if upper.starts_with(element) {
                out.push_str(translated);
                rest = &rest[element.len()..];
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            if c == '"' {
                // Quoted literal text.
                let literal: String = chars.by_ref().take_while(|c| *c != '"').collect();
                literal.chars().for_each(|c| push_literal(&mut out, c));
            } else {
                push_literal(&mut out, c);
            }
        }
        rest = chars.as_str();
    }
    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

/// Render a chrono format over a date-time, rejecting invalid formats
/// instead of panicking.
pub fn render(dt: &NaiveDateTime, chrono_format: &str) -> ValueResult<String> {
    use chrono::format::{Item, StrftimeItems};
    use std::fmt::Write;

    let items: Vec<Item<'_>> = StrftimeItems::new(chrono_format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(ValueError::invalid(format!("format '{chrono_format}'")));
    }
    let mut out = String::new();
    write!(out, "{}", dt.format_with_items(items.into_iter()))
        .map_err(|_| ValueError::invalid(format!("format '{chrono_format}'")))?;
    Ok(out)
}
