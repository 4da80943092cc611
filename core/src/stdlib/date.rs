//! Date Package
//!
//! Dates are UTC instants with millisecond precision. There is no local
//! time zone: `getHours` and `getUTCHours` agree and `getTimezoneOffset` is
//! always 0.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};

use crate::{
    evaluator::{Interpreter, RuntimeError},
    stdlib::arg,
    values::{Function, Value, iso_string},
};

const MS_PER_DAY: f64 = 86_400_000.0;

fn invalid_time() -> RuntimeError {
    RuntimeError::range_error("Invalid time value")
}

fn from_millis(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(ms.trunc() as i64)
}

/// Parse RFC 3339 date-times, and ISO dates or date-times without an offset
/// (taken as UTC).
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date.with_timezone(&Utc));
    }
    const FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    for format in FORMATS {
        if let Ok(date) = NaiveDateTime::parse_from_str(s, format) {
            return Some(date.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
}

/// Milliseconds since the epoch for `(year, month0, day, h, mi, s, ms)`,
/// letting out-of-range fields carry over like JavaScript does.
fn utc_millis(args: &[Value]) -> Option<f64> {
    let field = |i: usize, default: f64| match args.get(i) {
        None | Some(Value::Undefined) => default,
        Some(value) => value.to_number().trunc(),
    };
    let mut year = field(0, f64::NAN);
    let month = field(1, 0.0);
    let fields = [field(2, 1.0), field(3, 0.0), field(4, 0.0), field(5, 0.0), field(6, 0.0)];
    if !year.is_finite() || !month.is_finite() || fields.iter().any(|f| !f.is_finite()) {
        return None;
    }
    if (0.0..=99.0).contains(&year) {
        year += 1900.0;
    }
    let total_months = year * 12.0 + month;
    let year = (total_months / 12.0).floor();
    let month0 = total_months - year * 12.0;
    if year.abs() > 275_000.0 {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(year as i32, month0 as u32 + 1, 1)?
        .and_hms_opt(0, 0, 0)?
        .and_utc()
        .timestamp_millis() as f64;
    let [day, hours, minutes, seconds, millis] = fields;
    Some(
        base + (day - 1.0) * MS_PER_DAY
            + hours * 3_600_000.0
            + minutes * 60_000.0
            + seconds * 1000.0
            + millis,
    )
}

/// `Date()` / `new Date(...)`.
pub fn date_constructor(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let date = match args {
        [] => Some(Utc::now()),
        [Value::Date(date)] => Some(*date),
        [Value::Str(s)] => parse_date(s),
        [single] => from_millis(single.to_number()),
        _ => utc_millis(args).and_then(from_millis),
    };
    date.map(Value::Date).ok_or_else(invalid_time)
}

fn date_now(_: &mut Interpreter, _args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Number(Utc::now().timestamp_millis() as f64))
}

fn date_parse(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let text = arg(args, 0).to_string();
    Ok(Value::Number(
        parse_date(&text).map_or(f64::NAN, |date| date.timestamp_millis() as f64),
    ))
}

fn date_utc(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Number(utc_millis(args).unwrap_or(f64::NAN)))
}

pub fn static_member(name: &str) -> Option<Value> {
    match name {
        "now" => Some(Function::native("now", date_now)),
        "parse" => Some(Function::native("parse", date_parse)),
        "UTC" => Some(Function::native("UTC", date_utc)),
        _ => None,
    }
}

/// Dispatch a date method. Returns `None` if `name` is not one.
pub fn call_method(date: &DateTime<Utc>, name: &str) -> Option<Result<Value, RuntimeError>> {
    let number = |n: u32| Value::Number(n as f64);
    Some(Ok(match name {
        "getTime" | "valueOf" => Value::Number(date.timestamp_millis() as f64),
        "getFullYear" | "getUTCFullYear" => Value::Number(date.year() as f64),
        "getMonth" | "getUTCMonth" => number(date.month0()),
        "getDate" | "getUTCDate" => number(date.day()),
        "getDay" | "getUTCDay" => number(date.weekday().num_days_from_sunday()),
        "getHours" | "getUTCHours" => number(date.hour()),
        "getMinutes" | "getUTCMinutes" => number(date.minute()),
        "getSeconds" | "getUTCSeconds" => number(date.second()),
        "getMilliseconds" | "getUTCMilliseconds" => number(date.timestamp_subsec_millis()),
        "getTimezoneOffset" => Value::Number(0.0),
        "toISOString" | "toJSON" | "toString" => Value::from(iso_string(date)),
        _ => return None,
    }))
}
