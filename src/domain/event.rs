//! Investment and checkpoint events consumed by the statistics engine.

use super::error::InvestatsError;
use chrono::{DateTime, FixedOffset};
use std::fmt;
use std::str::FromStr;

/// Tag carried by every entry of an event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Invest,
    Chkpt,
}

impl FromStr for EventKind {
    type Err = InvestatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "invest" | "investment" => Ok(EventKind::Invest),
            "chkpt" | "checkpoint" => Ok(EventKind::Chkpt),
            other => Err(InvestatsError::InvalidEventKind {
                kind: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Invest => write!(f, "invest"),
            EventKind::Chkpt => write!(f, "chkpt"),
        }
    }
}

/// Two of the three investment quantities. The missing one is derived by
/// [`InvestAmounts::complete`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvestAmounts {
    SrcRate { src: f64, rate: f64 },
    DstRate { dst: f64, rate: f64 },
    SrcDst { src: f64, dst: f64 },
}

/// Fully derived investment quantities, `src == dst * rate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contribution {
    pub src: f64,
    pub dst: f64,
    pub rate: f64,
}

impl InvestAmounts {
    /// Builds the amounts from optional fields. Returns `None` unless exactly
    /// two of them are present.
    pub fn from_parts(src: Option<f64>, dst: Option<f64>, rate: Option<f64>) -> Option<Self> {
        match (src, dst, rate) {
            (Some(src), None, Some(rate)) => Some(InvestAmounts::SrcRate { src, rate }),
            (None, Some(dst), Some(rate)) => Some(InvestAmounts::DstRate { dst, rate }),
            (Some(src), Some(dst), None) => Some(InvestAmounts::SrcDst { src, dst }),
            _ => None,
        }
    }

    pub fn complete(&self) -> Contribution {
        match *self {
            InvestAmounts::SrcRate { src, rate } => Contribution {
                src,
                dst: src / rate,
                rate,
            },
            InvestAmounts::DstRate { dst, rate } => Contribution {
                src: dst * rate,
                dst,
                rate,
            },
            InvestAmounts::SrcDst { src, dst } => Contribution {
                src,
                dst,
                rate: src / dst,
            },
        }
    }

    pub fn src(&self) -> Option<f64> {
        match *self {
            InvestAmounts::SrcRate { src, .. } | InvestAmounts::SrcDst { src, .. } => Some(src),
            InvestAmounts::DstRate { .. } => None,
        }
    }

    pub fn dst(&self) -> Option<f64> {
        match *self {
            InvestAmounts::DstRate { dst, .. } | InvestAmounts::SrcDst { dst, .. } => Some(dst),
            InvestAmounts::SrcRate { .. } => None,
        }
    }

    pub fn rate(&self) -> Option<f64> {
        match *self {
            InvestAmounts::SrcRate { rate, .. } | InvestAmounts::DstRate { rate, .. } => Some(rate),
            InvestAmounts::SrcDst { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Investment {
    pub timestamp: DateTime<FixedOffset>,
    pub amounts: InvestAmounts,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    pub timestamp: DateTime<FixedOffset>,
    /// Replaces the active capital-gains-tax rate from this checkpoint on.
    pub cgt: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Investment(Investment),
    Checkpoint(Checkpoint),
}

impl Event {
    pub fn investment(timestamp: DateTime<FixedOffset>, amounts: InvestAmounts) -> Self {
        Event::Investment(Investment { timestamp, amounts })
    }

    pub fn checkpoint(timestamp: DateTime<FixedOffset>, cgt: Option<f64>) -> Self {
        Event::Checkpoint(Checkpoint { timestamp, cgt })
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        match self {
            Event::Investment(inv) => inv.timestamp,
            Event::Checkpoint(chkpt) => chkpt.timestamp,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Event::Investment(_) => EventKind::Invest,
            Event::Checkpoint(_) => EventKind::Chkpt,
        }
    }
}
