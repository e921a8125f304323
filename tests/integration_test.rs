//! End-to-end tests over the engines and adapters, without the CLI layer.

mod common;

use approx::assert_relative_eq;
use common::*;
use investats::adapters::csv_adapter::CsvAdapter;
use investats::adapters::text_scrape_adapter::{ScrapePrefixes, TextScrapeAdapter};
use investats::adapters::yaml_event_adapter::YamlEventAdapter;
use investats::domain::aggregate::{aggregate_series, AggregatedRecord};
use investats::domain::error::InvestatsError;
use investats::domain::event::Event;
use investats::domain::scrape::txns_to_events;
use investats::domain::stats::{compute_stats, CheckpointRecord};
use investats::ports::event_port::EventLogPort;
use investats::ports::series_port::SeriesPort;
use investats::ports::transaction_port::TransactionPort;

fn load_log(yaml: &str) -> Vec<Event> {
    YamlEventAdapter::new()
        .load_events(&mut yaml.as_bytes())
        .unwrap()
}

fn stats_of(yaml: &str) -> Vec<CheckpointRecord> {
    compute_stats(load_log(yaml)).collect()
}

fn two_assets() -> Vec<(String, Vec<CheckpointRecord>)> {
    vec![
        ("AAA".to_string(), stats_of(SAMPLE_LOG)),
        ("BBB".to_string(), stats_of(SAMPLE_LOG_B)),
    ]
}

mod statistics {
    use super::*;

    #[test]
    fn sample_log_produces_one_record_per_checkpoint() {
        let records = stats_of(SAMPLE_LOG);
        assert_eq!(records.len(), 3);

        assert_relative_eq!(records[0].tot_dst, 5.0);
        assert_relative_eq!(records[0].latest_cgt, 0.15);
        assert_eq!(records[0].global_yield, 0.0);

        let r = &records[1];
        assert_relative_eq!(r.diff_days, 31.0);
        assert_relative_eq!(r.tot_src, 1000.0);
        assert_relative_eq!(r.tot_dst, 5.0 + 500.0 / 100.6558, epsilon = 1e-12);
        assert_relative_eq!(r.chkpt_yield, 0.006558, epsilon = 1e-9);
        assert_relative_eq!(r.latest_cgt, 0.15);
        assert!(r.chkpt_apy > r.chkpt_yield);

        let r = &records[2];
        assert_relative_eq!(r.tot_days, 60.0);
        assert_relative_eq!(r.tot_src, 1500.0);
        assert!(r.tot_gain_src > 0.0);
        assert_relative_eq!(r.tot_gain_net_src, r.tot_gain_src * 0.85, epsilon = 1e-9);
    }

    #[test]
    fn two_checkpoint_scenario_matches_hand_computed_values() {
        let records: Vec<CheckpointRecord> = compute_stats(vec![
            invest(0, 500.0, 100.0),
            chkpt(0, Some(0.15)),
            invest(31, 700.0, 70.0),
            chkpt(31, None),
        ])
        .collect();

        let r = &records[1];
        assert_relative_eq!(r.avg_rate, 80.0);
        assert_relative_eq!(r.tot_dst_as_src, 1050.0);
        assert_relative_eq!(r.chkpt_yield, -0.3, epsilon = 1e-12);
        assert_relative_eq!(r.global_yield, -0.125, epsilon = 1e-12);
        assert_relative_eq!(r.chkpt_gain_net_src, -127.5, epsilon = 1e-9);
    }

    #[test]
    fn csv_output_reads_back_identically() {
        let records = stats_of(SAMPLE_LOG);
        let adapter = CsvAdapter::new(None);

        let mut buf = Vec::new();
        adapter.write_records(&records, &mut buf).unwrap();
        let loaded = adapter.read_records(&mut buf.as_slice()).unwrap();

        assert_eq!(loaded, records);
    }
}

mod aggregation {
    use super::*;

    fn merged() -> Vec<AggregatedRecord> {
        aggregate_series(&two_assets()).unwrap()
    }

    #[test]
    fn totals_are_sums_of_assets() {
        let series = two_assets();
        let merged = merged();
        assert_eq!(merged.len(), 3);

        for (i, row) in merged.iter().enumerate() {
            let a = &series[0].1[i];
            let b = &series[1].1[i];
            assert_eq!(row.timestamp, a.timestamp);
            assert_relative_eq!(row.totals.tot_src, a.tot_src + b.tot_src, epsilon = 1e-9);
            assert_relative_eq!(
                row.totals.tot_dst_as_src,
                a.tot_dst_as_src + b.tot_dst_as_src,
                epsilon = 1e-9
            );
            assert_relative_eq!(
                row.totals.tot_gain_net_src,
                a.tot_gain_net_src + b.tot_gain_net_src,
                epsilon = 1e-9
            );
            assert_eq!(row.totals.tot_days, a.tot_days);
        }
    }

    #[test]
    fn per_asset_records_are_carried_in_full() {
        let series = two_assets();
        let merged = merged();
        let second: Vec<(String, CheckpointRecord)> = series
            .iter()
            .map(|(name, records)| (name.clone(), records[1].clone()))
            .collect();
        assert_eq!(merged[1].assets, second);
        assert_eq!(merged[2].assets[0].1.tot_src, 1500.0);
        assert_eq!(merged[2].assets[1].1.latest_cgt, 0.2);
    }

    #[test]
    fn first_row_global_yield_is_zero() {
        let merged = merged();
        assert_eq!(merged[0].totals.global_yield, 0.0);
        assert_eq!(merged[0].totals.chkpt_yield, 0.0);
        assert_relative_eq!(merged[0].totals.diff_src, 700.0);
    }

    #[test]
    fn inputs_are_left_untouched() {
        let series = two_assets();
        let before = series.clone();
        let _ = aggregate_series(&series).unwrap();
        assert_eq!(series, before);
    }

    #[test]
    fn truncated_series_is_rejected() {
        let mut series = two_assets();
        series[1].1.pop();
        let err = aggregate_series(&series).unwrap_err();
        assert!(matches!(
            err,
            InvestatsError::SeriesLengthMismatch { name, expected: 3, actual: 2 } if name == "BBB"
        ));
    }

    #[test]
    fn shifted_checkpoint_is_rejected() {
        let mut series = two_assets();
        series[1].1[2].timestamp = day(80);
        let err = aggregate_series(&series).unwrap_err();
        assert!(matches!(
            err,
            InvestatsError::CheckpointAlignmentMismatch { index: 2, .. }
        ));
    }

    #[test]
    fn single_series_is_rejected() {
        let series = vec![("AAA".to_string(), stats_of(SAMPLE_LOG))];
        let err = aggregate_series(&series).unwrap_err();
        assert!(matches!(err, InvestatsError::InsufficientSeriesCount { count: 1 }));
    }

    #[test]
    fn aggregated_csv_has_namespaced_columns() {
        let mut buf = Vec::new();
        CsvAdapter::new(Some(4))
            .write_aggregated(&merged(), &mut buf)
            .unwrap();
        let csv = String::from_utf8(buf).unwrap();
        let header = csv.lines().next().unwrap();
        assert_eq!(header.split(',').count(), 1 + 13 + 2 * 18);
        assert!(header.contains("AAA:avg_rate"));
        assert!(header.contains("BBB:avg_rate"));
        assert_eq!(csv.lines().count(), 4);
    }
}

mod scraping {
    use super::*;

    #[test]
    fn scraped_log_feeds_statistics_engine() {
        let txns = TextScrapeAdapter::new(ScrapePrefixes::default())
            .load_transactions(&mut SAMPLE_TXNS.as_bytes())
            .unwrap();
        assert_eq!(txns.len(), 3);

        let events = txns_to_events(&txns, "BBB", 0.15).unwrap();
        let adapter = YamlEventAdapter::new();
        let mut buf = Vec::new();
        adapter.save_events(&events, &mut buf).unwrap();
        let reloaded = adapter.load_events(&mut buf.as_slice()).unwrap();
        assert_eq!(reloaded, events);

        let records: Vec<CheckpointRecord> = compute_stats(&reloaded).collect();
        assert_eq!(records.len(), 2);
        assert_relative_eq!(records[0].tot_dst, 25.0);
        assert_relative_eq!(records[0].latest_cgt, 0.15);
        assert_relative_eq!(records[1].tot_dst, 45.0);
        assert_relative_eq!(records[1].tot_src, 1025.0);
    }
}
