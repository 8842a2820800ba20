//! CF time decoding and the timestamp repairs applied to CTSM history files.

use anyhow::{anyhow, Result};
use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use clap::ValueEnum;

const SECONDS_PER_DAY: i64 = 86_400;
const NOLEAP_MONTH_DAYS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Calendar {
    Standard,
    NoLeap,
}

impl Calendar {
    pub fn from_attribute(calendar: Option<&str>) -> Result<Self> {
        match calendar.map(|c| c.trim().to_lowercase()).as_deref() {
            None | Some("standard") | Some("gregorian") | Some("proleptic_gregorian") => {
                Ok(Calendar::Standard)
            }
            Some("noleap") | Some("365_day") => Ok(Calendar::NoLeap),
            Some(other) => Err(anyhow!("Unsupported calendar '{}'", other)),
        }
    }
}

/// A CF `units` attribute such as `days since 2018-01-01 00:00:00`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeUnits {
    pub seconds_per_unit: f64,
    pub reference: NaiveDateTime,
    pub calendar: Calendar,
}

impl TimeUnits {
    pub fn parse(units: &str, calendar: Option<&str>) -> Result<Self> {
        let (unit, reference) = units
            .split_once(" since ")
            .ok_or_else(|| anyhow!("Time units '{}' are not of the form '<unit> since <date>'", units))?;

        let seconds_per_unit = match unit.trim().to_lowercase().as_str() {
            "days" | "day" | "d" => 86_400.0,
            "hours" | "hour" | "h" => 3_600.0,
            "minutes" | "minute" | "min" => 60.0,
            "seconds" | "second" | "s" => 1.0,
            other => return Err(anyhow!("Unsupported time unit '{}'", other)),
        };

        Ok(TimeUnits {
            seconds_per_unit,
            reference: parse_reference(reference.trim())?,
            calendar: Calendar::from_attribute(calendar)?,
        })
    }

    pub fn decode(&self, value: f64) -> Result<NaiveDateTime> {
        if !value.is_finite() {
            return Err(anyhow!("Non-finite time value {}", value));
        }
        let seconds = (value * self.seconds_per_unit).round();
        if !seconds.is_finite() || seconds.abs() >= i64::MAX as f64 {
            return Err(anyhow!("Time value {} is out of range", value));
        }
        let offset = seconds as i64;

        match self.calendar {
            Calendar::Standard => Duration::try_seconds(offset)
                .and_then(|delta| self.reference.checked_add_signed(delta))
                .ok_or_else(|| anyhow!("Time value {} is out of range", value)),
            Calendar::NoLeap => to_noleap_seconds(&self.reference)
                .checked_add(offset)
                .ok_or_else(|| anyhow!("Time value {} is out of range", value))
                .and_then(from_noleap_seconds),
        }
    }

    pub fn decode_all(&self, values: &[f64]) -> Result<Vec<NaiveDateTime>> {
        values.iter().map(|&v| self.decode(v)).collect()
    }
}

fn parse_reference(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim_end_matches('Z').replace('T', " ");
    let s = s.split_whitespace().take(2).collect::<Vec<_>>().join(" ");

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(&s, format) {
            return Ok(datetime);
        }
    }
    NaiveDate::parse_from_str(&s, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| anyhow!("Unrecognised reference date '{}'", s))
}

fn to_noleap_seconds(datetime: &NaiveDateTime) -> i64 {
    let month_index = datetime.month0() as usize;
    let day_of_year: u32 = NOLEAP_MONTH_DAYS[..month_index].iter().sum::<u32>()
        + datetime.day().min(NOLEAP_MONTH_DAYS[month_index])
        - 1;
    let days = datetime.year() as i64 * 365 + day_of_year as i64;

    days * SECONDS_PER_DAY + datetime.num_seconds_from_midnight() as i64
}

fn from_noleap_seconds(seconds: i64) -> Result<NaiveDateTime> {
    let days = seconds.div_euclid(SECONDS_PER_DAY);
    let second_of_day = seconds.rem_euclid(SECONDS_PER_DAY) as u32;
    let year = i32::try_from(days.div_euclid(365))
        .map_err(|_| anyhow!("No-leap day {} is out of range", days))?;
    let mut day_of_year = days.rem_euclid(365) as u32;

    let mut month = 1;
    for month_days in NOLEAP_MONTH_DAYS {
        if day_of_year < month_days {
            break;
        }
        day_of_year -= month_days;
        month += 1;
    }

    let date = NaiveDate::from_ymd_opt(year, month, day_of_year + 1)
        .ok_or_else(|| anyhow!("Invalid no-leap date in year {}", year))?;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(second_of_day, 0)
        .ok_or_else(|| anyhow!("Invalid second of day {}", second_of_day))?;

    Ok(date.and_time(time))
}

/// Timestamp repair applied to each history file before merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TimeFix {
    /// Keep the decoded timestamps
    #[default]
    None,
    /// Monthly h0 files: month starts beginning one month before the first record
    Monthly,
    /// Half-hourly h1 files: 30 minute steps from midnight of the first record
    HalfHourly,
}

impl TimeFix {
    pub fn apply(&self, times: &[NaiveDateTime]) -> Result<Vec<NaiveDateTime>> {
        match self {
            TimeFix::None => Ok(times.to_vec()),
            TimeFix::Monthly => fix_monthly(times),
            TimeFix::HalfHourly => Ok(fix_half_hourly(times)),
        }
    }
}

/// CTSM stamps monthly averages at the end of the month they cover.
pub fn fix_monthly(times: &[NaiveDateTime]) -> Result<Vec<NaiveDateTime>> {
    let Some(first) = times.first() else {
        return Ok(Vec::new());
    };
    let start = NaiveDate::from_ymd_opt(first.year(), first.month(), 1)
        .and_then(|d| d.checked_sub_months(Months::new(1)))
        .ok_or_else(|| anyhow!("Cannot step back one month from {}", first))?;

    (0..times.len() as u32)
        .map(|k| {
            start
                .checked_add_months(Months::new(k))
                .map(|d| d.and_time(NaiveTime::MIN))
                .ok_or_else(|| anyhow!("Month {} after {} is out of range", k, start))
        })
        .collect()
}

pub fn fix_half_hourly(times: &[NaiveDateTime]) -> Vec<NaiveDateTime> {
    let Some(first) = times.first() else {
        return Vec::new();
    };
    let start = first.date().and_time(NaiveTime::MIN);

    (0..times.len() as i64)
        .map(|k| start + Duration::minutes(30 * k))
        .collect()
}

// -- Tests -------------------------------------------------------------------
