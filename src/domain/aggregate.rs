//! Aggregation engine: merges aligned per-asset checkpoint series into one
//! consolidated portfolio series.

use super::error::InvestatsError;
use super::stats::{annualize, CheckpointRecord, RECORD_FIELDS};
use chrono::{DateTime, FixedOffset};

/// Consolidated field names, in output order.
pub const TOTALS_FIELDS: [&str; 13] = [
    "diff_days",
    "tot_days",
    "diff_src",
    "tot_src",
    "tot_dst_as_src",
    "chkpt_yield",
    "chkpt_apy",
    "global_yield",
    "global_apy",
    "chkpt_gain_src",
    "chkpt_gain_net_src",
    "tot_gain_src",
    "tot_gain_net_src",
];

/// Portfolio-level metrics. Only fields expressed in source units (or
/// derived from them) can be consolidated across assets.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioTotals {
    pub diff_days: f64,
    pub tot_days: f64,
    pub diff_src: f64,
    pub tot_src: f64,
    pub tot_dst_as_src: f64,
    pub chkpt_yield: f64,
    pub chkpt_apy: f64,
    pub global_yield: f64,
    pub global_apy: f64,
    pub chkpt_gain_src: f64,
    pub chkpt_gain_net_src: f64,
    pub tot_gain_src: f64,
    pub tot_gain_net_src: f64,
}

impl PortfolioTotals {
    /// Field values in [`TOTALS_FIELDS`] order.
    pub fn values(&self) -> [f64; 13] {
        [
            self.diff_days,
            self.tot_days,
            self.diff_src,
            self.tot_src,
            self.tot_dst_as_src,
            self.chkpt_yield,
            self.chkpt_apy,
            self.global_yield,
            self.global_apy,
            self.chkpt_gain_src,
            self.chkpt_gain_net_src,
            self.tot_gain_src,
            self.tot_gain_net_src,
        ]
    }
}

/// One aligned checkpoint across all assets.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRecord {
    pub timestamp: DateTime<FixedOffset>,
    pub totals: PortfolioTotals,
    /// Per-asset records, in the order the series were given.
    pub assets: Vec<(String, CheckpointRecord)>,
}

impl AggregatedRecord {
    /// Output column names: consolidated fields, then `<asset>:<field>`.
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = TOTALS_FIELDS.iter().map(|f| f.to_string()).collect();
        for (asset, _) in &self.assets {
            names.extend(RECORD_FIELDS.iter().map(|f| format!("{asset}:{f}")));
        }
        names
    }

    /// Values matching [`AggregatedRecord::field_names`].
    pub fn field_values(&self) -> Vec<f64> {
        let mut values = self.totals.values().to_vec();
        for (_, record) in &self.assets {
            values.extend(record.values());
        }
        values
    }
}

/// Checks that the series can be merged position by position. Returns the
/// common series length.
pub fn validate_alignment(
    series: &[(String, Vec<CheckpointRecord>)],
) -> Result<usize, InvestatsError> {
    if series.len() < 2 {
        return Err(InvestatsError::InsufficientSeriesCount {
            count: series.len(),
        });
    }

    let expected = series[0].1.len();
    if let Some((name, records)) = series.iter().find(|(_, r)| r.len() != expected) {
        return Err(InvestatsError::SeriesLengthMismatch {
            name: name.clone(),
            expected,
            actual: records.len(),
        });
    }

    let reference = &series[0].1;
    for (index, first) in reference.iter().enumerate() {
        for (name, records) in &series[1..] {
            let actual = records[index].timestamp;
            if actual != first.timestamp {
                return Err(InvestatsError::CheckpointAlignmentMismatch {
                    name: name.clone(),
                    index,
                    expected: first.timestamp,
                    actual,
                });
            }
        }
    }

    Ok(expected)
}

/// Merges named per-asset series into one consolidated series.
///
/// All series must have the same length and the same checkpoint timestamps.
/// Inputs are only read.
pub fn aggregate_series(
    series: &[(String, Vec<CheckpointRecord>)],
) -> Result<Vec<AggregatedRecord>, InvestatsError> {
    let len = validate_alignment(series)?;

    let mut out: Vec<AggregatedRecord> = Vec::with_capacity(len);
    let mut base_src = 0.0;

    for i in 0..len {
        let rows: Vec<&CheckpointRecord> = series.iter().map(|(_, r)| &r[i]).collect();
        let first = rows[0];
        let sum = |f: fn(&CheckpointRecord) -> f64| rows.iter().map(|r| f(r)).sum::<f64>();

        let diff_src = sum(|r| r.diff_src);
        let tot_dst_as_src = sum(|r| r.tot_dst_as_src);
        let tot_gain_src = sum(|r| r.tot_gain_src);

        let chkpt_yield = match out.last() {
            Some(prev) if prev.totals.tot_dst_as_src != 0.0 => {
                (tot_dst_as_src - diff_src) / prev.totals.tot_dst_as_src - 1.0
            }
            _ => 0.0,
        };

        if i == 0 {
            base_src = diff_src;
        }
        let global_yield = if i == 0 || base_src == 0.0 {
            0.0
        } else {
            tot_gain_src / base_src
        };

        let totals = PortfolioTotals {
            diff_days: first.diff_days,
            tot_days: first.tot_days,
            diff_src,
            tot_src: sum(|r| r.tot_src),
            tot_dst_as_src,
            chkpt_yield,
            chkpt_apy: annualize(chkpt_yield, first.diff_days),
            global_yield,
            global_apy: annualize(global_yield, first.tot_days),
            chkpt_gain_src: sum(|r| r.chkpt_gain_src),
            chkpt_gain_net_src: sum(|r| r.chkpt_gain_net_src),
            tot_gain_src,
            tot_gain_net_src: sum(|r| r.tot_gain_net_src),
        };

        out.push(AggregatedRecord {
            timestamp: first.timestamp,
            totals,
            assets: series
                .iter()
                .map(|(name, records)| (name.clone(), records[i].clone()))
                .collect(),
        });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::{Event, InvestAmounts};
    use crate::domain::stats::compute_stats;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn day(n: i64) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2020, 1, 1, 0, 0, 0)
            .unwrap()
            + Duration::days(n)
    }

    fn series(rates: &[f64], src: f64) -> Vec<CheckpointRecord> {
        let mut events = Vec::new();
        for (i, rate) in rates.iter().enumerate() {
            let d = day(31 * i as i64);
            events.push(Event::investment(d, InvestAmounts::SrcRate { src, rate: *rate }));
            events.push(Event::checkpoint(d, if i == 0 { Some(0.15) } else { None }));
        }
        compute_stats(events).collect()
    }

    fn two_assets() -> Vec<(String, Vec<CheckpointRecord>)> {
        vec![
            ("AAA".to_string(), series(&[100.0, 110.0, 90.0], 500.0)),
            ("BBB".to_string(), series(&[20.0, 25.0, 30.0], 500.0)),
        ]
    }

    #[test]
    fn totals_are_elementwise_sums() {
        let input = two_assets();
        let merged = aggregate_series(&input).unwrap();
        assert_eq!(merged.len(), 3);

        assert_relative_eq!(merged[0].totals.tot_src, 1000.0);
        for (i, rec) in merged.iter().enumerate() {
            let a = &input[0].1[i];
            let b = &input[1].1[i];
            assert_eq!(rec.timestamp, a.timestamp);
            assert_relative_eq!(rec.totals.diff_src, a.diff_src + b.diff_src);
            assert_relative_eq!(rec.totals.tot_src, a.tot_src + b.tot_src);
            assert_relative_eq!(rec.totals.tot_dst_as_src, a.tot_dst_as_src + b.tot_dst_as_src);
            assert_relative_eq!(rec.totals.chkpt_gain_src, a.chkpt_gain_src + b.chkpt_gain_src);
            assert_relative_eq!(
                rec.totals.chkpt_gain_net_src,
                a.chkpt_gain_net_src + b.chkpt_gain_net_src
            );
            assert_relative_eq!(rec.totals.tot_gain_src, a.tot_gain_src + b.tot_gain_src);
            assert_relative_eq!(
                rec.totals.tot_gain_net_src,
                a.tot_gain_net_src + b.tot_gain_net_src
            );
            assert_relative_eq!(rec.totals.diff_days, a.diff_days);
            assert_relative_eq!(rec.totals.tot_days, a.tot_days);
        }
    }

    #[test]
    fn consolidated_yields() {
        let merged = aggregate_series(&two_assets()).unwrap();
        let r0 = &merged[0].totals;
        assert_eq!(r0.chkpt_yield, 0.0);
        assert_eq!(r0.global_yield, 0.0);
        assert_eq!(r0.global_apy, 0.0);

        // AAA: 5 + 500/110 dst at 110; BBB: 25 + 20 dst at 25
        let value_1 = (5.0 + 500.0 / 110.0) * 110.0 + 45.0 * 25.0;
        let r1 = &merged[1].totals;
        assert_relative_eq!(r1.tot_dst_as_src, value_1, epsilon = 1e-9);
        assert_relative_eq!(r1.chkpt_yield, (value_1 - 1000.0) / 1000.0 - 1.0, epsilon = 1e-12);
        assert_relative_eq!(r1.global_yield, (value_1 - 2000.0) / 1000.0, epsilon = 1e-12);
        assert_relative_eq!(r1.chkpt_apy, annualize(r1.chkpt_yield, 31.0), epsilon = 1e-12);
        assert_relative_eq!(r1.global_apy, annualize(r1.global_yield, 31.0), epsilon = 1e-12);

        let r2 = &merged[2].totals;
        assert_relative_eq!(
            r2.chkpt_yield,
            (r2.tot_dst_as_src - 1000.0) / r1.tot_dst_as_src - 1.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(r2.global_yield, r2.tot_gain_src / 1000.0, epsilon = 1e-12);
    }

    #[test]
    fn per_asset_fields_are_namespaced() {
        let input = two_assets();
        let merged = aggregate_series(&input).unwrap();
        let rec = &merged[1];

        assert_eq!(rec.assets[0], ("AAA".to_string(), input[0].1[1].clone()));
        assert_eq!(rec.assets[1].0, "BBB");
        assert_eq!(rec.assets[1].1.latest_rate, 25.0);
        assert_eq!(rec.assets[0].1.latest_cgt, 0.15);

        let names = rec.field_names();
        assert_eq!(names.len(), TOTALS_FIELDS.len() + 2 * RECORD_FIELDS.len());
        assert_eq!(names[TOTALS_FIELDS.len()], "AAA:diff_days");
        assert_eq!(names.last().unwrap(), "BBB:tot_gain_net_src");
        assert_eq!(rec.field_values().len(), names.len());
    }

    #[test]
    fn rejects_fewer_than_two_series() {
        let err = aggregate_series(&[]).unwrap_err();
        assert!(matches!(err, InvestatsError::InsufficientSeriesCount { count: 0 }));

        let one = vec![("AAA".to_string(), series(&[1.0, 2.0], 1.0))];
        let err = aggregate_series(&one).unwrap_err();
        assert!(matches!(err, InvestatsError::InsufficientSeriesCount { count: 1 }));
    }

    #[test]
    fn rejects_truncated_series() {
        let mut input = two_assets();
        input[1].1.pop();
        let err = aggregate_series(&input).unwrap_err();
        assert!(matches!(
            err,
            InvestatsError::SeriesLengthMismatch {
                ref name,
                expected: 3,
                actual: 2,
            } if name == "BBB"
        ));
        assert_eq!(input[1].1.len(), 2);
    }

    #[test]
    fn rejects_misaligned_checkpoint() {
        let mut input = two_assets();
        let original = input[1].1[2].timestamp;
        input[1].1[2].timestamp = original + Duration::days(1);
        let err = aggregate_series(&input).unwrap_err();
        match err {
            InvestatsError::CheckpointAlignmentMismatch {
                name,
                index,
                expected,
                actual,
            } => {
                assert_eq!(name, "BBB");
                assert_eq!(index, 2);
                assert_eq!(expected, original);
                assert_eq!(actual, original + Duration::days(1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_principal_gives_zero_global_yield() {
        let input = vec![
            ("AAA".to_string(), series(&[1.0, 2.0], 0.0)),
            ("BBB".to_string(), series(&[1.0, 2.0], 0.0)),
        ];
        let merged = aggregate_series(&input).unwrap();
        assert_eq!(merged[1].totals.global_yield, 0.0);
        assert_eq!(merged[1].totals.chkpt_yield, 0.0);
    }

    #[test]
    fn empty_series_merge_to_nothing() {
        let input = vec![("AAA".to_string(), vec![]), ("BBB".to_string(), vec![])];
        assert!(aggregate_series(&input).unwrap().is_empty());
    }
}
