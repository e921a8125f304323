//! YAML event log adapter.
//!
//! An event log is a YAML sequence of mappings, one per event:
//!
//! ```yaml
//! ---
//! - { datetime: 2020-01-12, type: invest, inv_src: &inv 500, rate: 100.0 }
//! - { datetime: 2020-01-12, type: chkpt, cgt: 0.15 }
//! - { datetime: 2020-02-12, type: invest, inv_src: *inv, rate: 100.6558 }
//! - { datetime: 2020-02-12, type: chkpt }
//! ```

use crate::adapters::timestamp::{format_timestamp, parse_timestamp};
use crate::domain::error::InvestatsError;
use crate::domain::event::{Event, EventKind, InvestAmounts};
use crate::ports::event_port::EventLogPort;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RawEntry {
    datetime: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inv_src: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inv_dst: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cgt: Option<f64>,
}

#[derive(Debug)]
pub struct YamlEventAdapter;

impl YamlEventAdapter {
    pub fn new() -> Self {
        Self
    }

    fn invalid(index: usize, reason: &str) -> InvestatsError {
        InvestatsError::InvalidInvestment {
            index,
            reason: reason.to_string(),
        }
    }

    fn to_event(index: usize, entry: RawEntry) -> Result<Event, InvestatsError> {
        let timestamp = parse_timestamp(&entry.datetime)?;

        match entry.kind.parse::<EventKind>()? {
            EventKind::Invest => {
                let amounts = InvestAmounts::from_parts(entry.inv_src, entry.inv_dst, entry.rate)
                    .ok_or_else(|| {
                        Self::invalid(
                            index,
                            "exactly two of inv_src, inv_dst and rate are required",
                        )
                    })?;

                if let Some(rate) = amounts.rate() {
                    if !(rate.is_finite() && rate > 0.0) {
                        return Err(Self::invalid(index, "rate must be positive"));
                    }
                }
                // Negative amounts are withdrawals.
                if amounts.src().is_some_and(|v| !v.is_finite())
                    || amounts.dst().is_some_and(|v| !v.is_finite())
                {
                    return Err(Self::invalid(index, "amounts must be finite"));
                }
                if let InvestAmounts::SrcDst { src, dst } = amounts {
                    if dst == 0.0 || src / dst <= 0.0 {
                        return Err(Self::invalid(
                            index,
                            "inv_src and inv_dst must share a sign to derive a positive rate",
                        ));
                    }
                }
                if entry.cgt.is_some() {
                    tracing::warn!(index, "cgt on an investment entry is ignored");
                }

                Ok(Event::investment(timestamp, amounts))
            }
            EventKind::Chkpt => {
                if let Some(cgt) = entry.cgt {
                    if !(0.0..=1.0).contains(&cgt) {
                        return Err(InvestatsError::EventLog {
                            reason: format!(
                                "entry {index}: cgt must be between 0 and 1, got {cgt}"
                            ),
                        });
                    }
                }
                Ok(Event::checkpoint(timestamp, entry.cgt))
            }
        }
    }

    fn to_entry(event: &Event) -> RawEntry {
        match event {
            Event::Investment(inv) => RawEntry {
                datetime: format_timestamp(&inv.timestamp),
                kind: EventKind::Invest.to_string(),
                inv_src: inv.amounts.src(),
                inv_dst: inv.amounts.dst(),
                rate: inv.amounts.rate(),
                cgt: None,
            },
            Event::Checkpoint(chkpt) => RawEntry {
                datetime: format_timestamp(&chkpt.timestamp),
                kind: EventKind::Chkpt.to_string(),
                inv_src: None,
                inv_dst: None,
                rate: None,
                cgt: chkpt.cgt,
            },
        }
    }
}

impl Default for YamlEventAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLogPort for YamlEventAdapter {
    fn load_events(&self, reader: &mut dyn Read) -> Result<Vec<Event>, InvestatsError> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        let body = content.trim();
        if body.is_empty() || body == "---" {
            return Ok(Vec::new());
        }

        let entries: Option<Vec<RawEntry>> =
            serde_yaml::from_str(&content).map_err(|e| InvestatsError::EventLog {
                reason: e.to_string(),
            })?;
        let entries = entries.unwrap_or_default();

        let mut events: Vec<Event> = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let event = Self::to_event(index, entry)?;
            if let Some(prev) = events.last() {
                if event.timestamp() < prev.timestamp() {
                    return Err(InvestatsError::EventOrder {
                        index,
                        previous: prev.timestamp(),
                        current: event.timestamp(),
                    });
                }
            }
            events.push(event);
        }

        tracing::debug!(events = events.len(), "event log loaded");
        Ok(events)
    }

    fn save_events(&self, events: &[Event], writer: &mut dyn Write) -> Result<(), InvestatsError> {
        let entries: Vec<RawEntry> = events.iter().map(Self::to_entry).collect();
        let yaml = serde_yaml::to_string(&entries).map_err(|e| InvestatsError::EventLog {
            reason: e.to_string(),
        })?;
        writer.write_all(b"---\n")?;
        writer.write_all(yaml.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}
