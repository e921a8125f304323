//! Synthetic event logs: a fixed contribution at a fixed frequency, with a
//! rate compounding at a constant APY.

use super::error::InvestatsError;
use super::event::{Event, InvestAmounts};
use super::stats::DAYS_PER_YEAR;
use chrono::{DateTime, Days, FixedOffset, Months, NaiveDate, TimeZone};
use std::fmt;
use std::str::FromStr;

/// How often an investment is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freq {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Freq {
    /// Date of the next investment. Month steps clamp to the last day of the
    /// target month.
    pub fn next(&self, d: NaiveDate) -> Option<NaiveDate> {
        match self {
            Freq::Daily => d.checked_add_days(Days::new(1)),
            Freq::Weekly => d.checked_add_days(Days::new(7)),
            Freq::Monthly => d.checked_add_months(Months::new(1)),
            Freq::Yearly => d.checked_add_months(Months::new(12)),
        }
    }
}

impl FromStr for Freq {
    type Err = InvestatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Freq::Daily),
            "weekly" => Ok(Freq::Weekly),
            "monthly" => Ok(Freq::Monthly),
            "yearly" => Ok(Freq::Yearly),
            _ => Err(InvestatsError::InvalidFrequency {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Freq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Freq::Daily => "daily",
            Freq::Weekly => "weekly",
            Freq::Monthly => "monthly",
            Freq::Yearly => "yearly",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorParams {
    pub start: NaiveDate,
    /// Source amount invested at every step.
    pub contribution: f64,
    pub init_rate: f64,
    pub apy: f64,
    pub freq: Freq,
    pub count: usize,
    /// Set on the first checkpoint only.
    pub cgt: Option<f64>,
}

fn midnight_utc(d: NaiveDate) -> Result<DateTime<FixedOffset>, InvestatsError> {
    let invalid = || InvestatsError::InvalidTimestamp {
        value: d.to_string(),
    };
    let naive = d.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
    FixedOffset::east_opt(0)
        .ok_or_else(invalid)?
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(invalid)
}

/// Generates `count` investment/checkpoint pairs starting at `start`.
pub fn generate_events(params: &GeneratorParams) -> Result<Vec<Event>, InvestatsError> {
    if params.count < 2 {
        return Err(InvestatsError::InvalidGeneratorCount {
            count: params.count,
        });
    }

    let mut events = Vec::with_capacity(params.count * 2);
    let mut date = params.start;

    for i in 0..params.count {
        if i > 0 {
            date = params
                .freq
                .next(date)
                .ok_or_else(|| InvestatsError::InvalidTimestamp {
                    value: date.to_string(),
                })?;
        }
        let days = (date - params.start).num_days() as f64;
        let rate = params.init_rate * (1.0 + params.apy).powf(days / DAYS_PER_YEAR);
        let timestamp = midnight_utc(date)?;

        events.push(Event::investment(
            timestamp,
            InvestAmounts::SrcRate {
                src: params.contribution,
                rate,
            },
        ));
        events.push(Event::checkpoint(
            timestamp,
            if i == 0 { params.cgt } else { None },
        ));
    }

    Ok(events)
}
