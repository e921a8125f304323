//! Statistics engine: folds an ordered event log for one asset into a series
//! of checkpoint records.
//!
//! The engine is a lazy iterator adapter. Investments feed an accumulator;
//! every checkpoint turns the accumulator into a [`CheckpointRecord`] computed
//! against the previously emitted record.

use super::event::{Checkpoint, Event, Investment};
use chrono::{DateTime, FixedOffset};
use std::borrow::Borrow;

pub const DAYS_PER_YEAR: f64 = 365.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Field names of a [`CheckpointRecord`], in output order.
pub const RECORD_FIELDS: [&str; 18] = [
    "diff_days",
    "tot_days",
    "diff_src",
    "diff_dst",
    "latest_rate",
    "tot_src",
    "tot_dst",
    "avg_rate",
    "tot_dst_as_src",
    "chkpt_yield",
    "chkpt_apy",
    "global_yield",
    "global_apy",
    "latest_cgt",
    "chkpt_gain_src",
    "chkpt_gain_net_src",
    "tot_gain_src",
    "tot_gain_net_src",
];

/// Derived metrics at one checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointRecord {
    pub timestamp: DateTime<FixedOffset>,
    pub diff_days: f64,
    pub tot_days: f64,
    pub diff_src: f64,
    pub diff_dst: f64,
    pub latest_rate: f64,
    pub tot_src: f64,
    pub tot_dst: f64,
    pub avg_rate: f64,
    pub tot_dst_as_src: f64,
    pub chkpt_yield: f64,
    pub chkpt_apy: f64,
    pub global_yield: f64,
    pub global_apy: f64,
    pub latest_cgt: f64,
    pub chkpt_gain_src: f64,
    pub chkpt_gain_net_src: f64,
    pub tot_gain_src: f64,
    pub tot_gain_net_src: f64,
}

impl CheckpointRecord {
    /// Field values in [`RECORD_FIELDS`] order.
    pub fn values(&self) -> [f64; 18] {
        [
            self.diff_days,
            self.tot_days,
            self.diff_src,
            self.diff_dst,
            self.latest_rate,
            self.tot_src,
            self.tot_dst,
            self.avg_rate,
            self.tot_dst_as_src,
            self.chkpt_yield,
            self.chkpt_apy,
            self.global_yield,
            self.global_apy,
            self.latest_cgt,
            self.chkpt_gain_src,
            self.chkpt_gain_net_src,
            self.tot_gain_src,
            self.tot_gain_net_src,
        ]
    }

    /// Inverse of [`CheckpointRecord::values`].
    pub fn from_values(timestamp: DateTime<FixedOffset>, v: [f64; 18]) -> Self {
        CheckpointRecord {
            timestamp,
            diff_days: v[0],
            tot_days: v[1],
            diff_src: v[2],
            diff_dst: v[3],
            latest_rate: v[4],
            tot_src: v[5],
            tot_dst: v[6],
            avg_rate: v[7],
            tot_dst_as_src: v[8],
            chkpt_yield: v[9],
            chkpt_apy: v[10],
            global_yield: v[11],
            global_apy: v[12],
            latest_cgt: v[13],
            chkpt_gain_src: v[14],
            chkpt_gain_net_src: v[15],
            tot_gain_src: v[16],
            tot_gain_net_src: v[17],
        }
    }
}

/// Elapsed time between two instants in fractional days.
pub fn days_between(from: DateTime<FixedOffset>, to: DateTime<FixedOffset>) -> f64 {
    (to - from).num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// Compounds a period yield to a 365-day basis. Zero-length periods yield 0.
pub fn annualize(period_yield: f64, days: f64) -> f64 {
    if days == 0.0 {
        0.0
    } else {
        (1.0 + period_yield).powf(DAYS_PER_YEAR / days) - 1.0
    }
}

#[derive(Debug, Clone, Default)]
struct Accumulator {
    diff_src: f64,
    diff_dst: f64,
    latest_rate: f64,
    latest_cgt: f64,
    prev: Option<CheckpointRecord>,
}

impl Accumulator {
    fn invest(&mut self, inv: &Investment) {
        let c = inv.amounts.complete();
        self.diff_src += c.src;
        self.diff_dst += c.dst;
        self.latest_rate = c.rate;
    }

    fn checkpoint(&mut self, chkpt: &Checkpoint) -> CheckpointRecord {
        if let Some(cgt) = chkpt.cgt {
            self.latest_cgt = cgt;
        }

        let prev = self.prev.as_ref();
        let latest_rate = self.latest_rate;
        let latest_cgt = self.latest_cgt;
        let diff_src = self.diff_src;
        let diff_dst = self.diff_dst;

        let diff_days = prev.map_or(0.0, |p| days_between(p.timestamp, chkpt.timestamp));
        let tot_days = prev.map_or(0.0, |p| p.tot_days + diff_days);

        let tot_src = prev.map_or(0.0, |p| p.tot_src) + diff_src;
        let tot_dst = prev.map_or(0.0, |p| p.tot_dst) + diff_dst;
        let avg_rate = if tot_dst != 0.0 { tot_src / tot_dst } else { 0.0 };
        let tot_dst_as_src = tot_dst * latest_rate;

        let chkpt_yield = match prev {
            Some(p) if p.latest_rate != 0.0 => latest_rate / p.latest_rate - 1.0,
            _ => 0.0,
        };
        let chkpt_apy = annualize(chkpt_yield, diff_days);

        let global_yield = if avg_rate != 0.0 {
            latest_rate / avg_rate - 1.0
        } else {
            0.0
        };
        let global_apy = annualize(global_yield, tot_days);

        let chkpt_gain_src =
            prev.map_or(0.0, |p| (tot_dst_as_src - p.tot_dst_as_src) - diff_src);
        let tot_gain_src = tot_dst_as_src - tot_src;

        let record = CheckpointRecord {
            timestamp: chkpt.timestamp,
            diff_days,
            tot_days,
            diff_src,
            diff_dst,
            latest_rate,
            tot_src,
            tot_dst,
            avg_rate,
            tot_dst_as_src,
            chkpt_yield,
            chkpt_apy,
            global_yield,
            global_apy,
            latest_cgt,
            chkpt_gain_src,
            chkpt_gain_net_src: chkpt_gain_src * (1.0 - latest_cgt),
            tot_gain_src,
            tot_gain_net_src: tot_gain_src * (1.0 - latest_cgt),
        };

        self.diff_src = 0.0;
        self.diff_dst = 0.0;
        self.prev = Some(record.clone());
        record
    }
}

/// Lazy iterator of checkpoint records. Created by [`compute_stats`].
#[derive(Debug, Clone)]
pub struct Stats<I> {
    events: I,
    acc: Accumulator,
}

impl<I> Iterator for Stats<I>
where
    I: Iterator,
    I::Item: Borrow<Event>,
{
    type Item = CheckpointRecord;

    fn next(&mut self) -> Option<CheckpointRecord> {
        for event in self.events.by_ref() {
            match event.borrow() {
                Event::Investment(inv) => self.acc.invest(inv),
                Event::Checkpoint(chkpt) => return Some(self.acc.checkpoint(chkpt)),
            }
        }
        None
    }
}

/// Computes one [`CheckpointRecord`] per checkpoint event.
///
/// Events must be sorted by timestamp. Investments after the last checkpoint
/// contribute to no record.
pub fn compute_stats<I>(events: I) -> Stats<I::IntoIter>
where
    I: IntoIterator,
    I::Item: Borrow<Event>,
{
    Stats {
        events: events.into_iter(),
        acc: Accumulator::default(),
    }
}
