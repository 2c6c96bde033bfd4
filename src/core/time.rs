use crate::utils::error::{ConvertError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use ndarray::Array1;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static STEP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)([a-z]+)$").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Days,
    Months,
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Days => f.write_str("days"),
            Self::Months => f.write_str("months"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeStep {
    pub magnitude: u32,
    pub unit: TimeUnit,
}

/// Linear time axis from a `tdef` record.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAxis {
    pub count: usize,
    pub start: NaiveDateTime,
    pub step: TimeStep,
}

impl TimeAxis {
    /// CF units string, e.g. `days since 2000-01-01 00:00:00`.
    pub fn units(&self) -> String {
        format!(
            "{} since {}",
            self.step.unit,
            self.start.format("%Y-%m-%d %H:%M:%S")
        )
    }

    /// Time coordinate values: the plain step index `0..count`.
    pub fn values(&self) -> Array1<f64> {
        (0..self.count).map(|i| i as f64).collect()
    }
}

/// Parse a start timestamp of the form `HHZddMmmYYYY` (e.g. `00Z01Jan1990`).
/// `HH:MMZ` is accepted as well.
pub fn parse_start(token: &str, line: usize) -> Result<NaiveDateTime> {
    let (clock, date) = token
        .split_once(['Z', 'z'])
        .ok_or_else(|| ConvertError::parse(line, format!("bad tdef start '{}'", token)))?;

    let (hour, minute) = match clock.split_once(':') {
        Some((h, m)) => (h, m),
        None => (clock, "0"),
    };
    let bad_clock = || ConvertError::parse(line, format!("bad tdef start time '{}'", clock));
    let hour: u32 = hour.parse().map_err(|_| bad_clock())?;
    let minute: u32 = minute.parse().map_err(|_| bad_clock())?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(bad_clock)?;

    let date = NaiveDate::parse_from_str(date, "%d%b%Y")
        .map_err(|e| ConvertError::parse(line, format!("bad tdef start date '{}': {}", date, e)))?;

    Ok(NaiveDateTime::new(date, time))
}

/// Parse a step such as `1dy` or `3mo`.
pub fn parse_step(token: &str, line: usize) -> Result<TimeStep> {
    let lowered = token.to_lowercase();
    let caps = STEP_RE
        .captures(&lowered)
        .ok_or_else(|| ConvertError::parse(line, format!("bad tdef step '{}'", token)))?;

    let magnitude: u32 = caps[1]
        .parse()
        .map_err(|_| ConvertError::parse(line, format!("bad tdef step '{}'", token)))?;
    let unit = match &caps[2] {
        "dy" => TimeUnit::Days,
        "mo" => TimeUnit::Months,
        other => return Err(ConvertError::unsupported(format!("time step unit '{}'", other))),
    };

    Ok(TimeStep { magnitude, unit })
}
