//! Conversion of scraped transactions into an event log for one asset.

use super::error::InvestatsError;
use super::event::{Event, InvestAmounts};
use chrono::{DateTime, Days, FixedOffset, TimeZone};

/// A transaction scraped from raw text. `amounts` holds the rate and one of
/// the two amounts.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub timestamp: DateTime<FixedOffset>,
    pub asset: String,
    pub amounts: InvestAmounts,
}

/// Midnight of the day after `ts`, in the same offset.
fn next_midnight(ts: DateTime<FixedOffset>) -> Result<DateTime<FixedOffset>, InvestatsError> {
    let invalid = || InvestatsError::InvalidTimestamp {
        value: ts.to_rfc3339(),
    };
    let naive = ts
        .date_naive()
        .checked_add_days(Days::new(1))
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(invalid)?;
    ts.offset()
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(invalid)
}

/// Keeps the transactions of `asset` and turns them into investment events.
///
/// A checkpoint is inserted at the midnight following the last transaction of
/// every day, including the final one. The first checkpoint carries `cgt`
/// when it is non-zero.
pub fn txns_to_events(
    txns: &[Transaction],
    asset: &str,
    cgt: f64,
) -> Result<Vec<Event>, InvestatsError> {
    let mut events = Vec::new();
    let mut first_chkpt = true;
    let mut prev: Option<&Transaction> = None;

    let mut push_chkpt = |events: &mut Vec<Event>, after: &Transaction| {
        let timestamp = next_midnight(after.timestamp)?;
        let chkpt_cgt = if first_chkpt && cgt != 0.0 { Some(cgt) } else { None };
        first_chkpt = false;
        events.push(Event::checkpoint(timestamp, chkpt_cgt));
        Ok::<(), InvestatsError>(())
    };

    for txn in txns.iter().filter(|t| t.asset == asset) {
        if let Some(p) = prev {
            if txn.timestamp.date_naive() != p.timestamp.date_naive() {
                push_chkpt(&mut events, p)?;
            }
        }
        events.push(Event::investment(txn.timestamp, txn.amounts));
        prev = Some(txn);
    }

    if let Some(p) = prev {
        push_chkpt(&mut events, p)?;
    }

    Ok(events)
}
