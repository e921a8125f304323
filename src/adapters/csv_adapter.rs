//! CSV series adapter.
//!
//! Each row is one checkpoint: a `datetime` column followed by one column per
//! record field.

use crate::adapters::timestamp::{format_timestamp, parse_timestamp};
use crate::domain::aggregate::{AggregatedRecord, TOTALS_FIELDS};
use crate::domain::error::InvestatsError;
use crate::domain::stats::{CheckpointRecord, RECORD_FIELDS};
use crate::ports::series_port::SeriesPort;
use std::io::{Read, Write};

const DATETIME_COLUMN: &str = "datetime";

#[derive(Debug)]
pub struct CsvAdapter {
    precision: Option<usize>,
}

impl CsvAdapter {
    pub fn new(precision: Option<usize>) -> Self {
        Self { precision }
    }

    fn format_value(&self, v: f64) -> String {
        match self.precision {
            Some(p) => format!("{v:.p$}"),
            None => v.to_string(),
        }
    }

    fn write_rows(
        &self,
        header: Vec<String>,
        rows: impl Iterator<Item = (String, Vec<f64>)>,
        writer: &mut dyn Write,
    ) -> Result<(), InvestatsError> {
        let series_err = |e: csv::Error| InvestatsError::Series {
            reason: e.to_string(),
        };

        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&header).map_err(series_err)?;
        for (datetime, values) in rows {
            let mut row = Vec::with_capacity(values.len() + 1);
            row.push(datetime);
            row.extend(values.into_iter().map(|v| self.format_value(v)));
            wtr.write_record(&row).map_err(series_err)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl SeriesPort for CsvAdapter {
    fn write_records(
        &self,
        records: &[CheckpointRecord],
        writer: &mut dyn Write,
    ) -> Result<(), InvestatsError> {
        let mut header = vec![DATETIME_COLUMN.to_string()];
        header.extend(RECORD_FIELDS.iter().map(|f| f.to_string()));

        let rows = records
            .iter()
            .map(|r| (format_timestamp(&r.timestamp), r.values().to_vec()));
        self.write_rows(header, rows, writer)
    }

    fn write_aggregated(
        &self,
        records: &[AggregatedRecord],
        writer: &mut dyn Write,
    ) -> Result<(), InvestatsError> {
        let mut header = vec![DATETIME_COLUMN.to_string()];
        match records.first() {
            Some(first) => header.extend(first.field_names()),
            None => header.extend(TOTALS_FIELDS.iter().map(|f| f.to_string())),
        }

        let rows = records
            .iter()
            .map(|r| (format_timestamp(&r.timestamp), r.field_values()));
        self.write_rows(header, rows, writer)
    }

    fn read_records(&self, reader: &mut dyn Read) -> Result<Vec<CheckpointRecord>, InvestatsError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr
            .headers()
            .map_err(|e| InvestatsError::Series {
                reason: format!("CSV header error: {e}"),
            })?
            .clone();

        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| InvestatsError::MissingColumn {
                    column: name.to_string(),
                })
        };

        let datetime_idx = column(DATETIME_COLUMN)?;
        let mut field_idx = [0usize; 18];
        for (slot, name) in field_idx.iter_mut().zip(RECORD_FIELDS) {
            *slot = column(name)?;
        }

        let mut records = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let row = result.map_err(|e| InvestatsError::Series {
                reason: format!("CSV parse error: {e}"),
            })?;

            let timestamp = parse_timestamp(row.get(datetime_idx).unwrap_or_default())?;

            let mut values = [0.0f64; 18];
            let columns = field_idx.iter().zip(RECORD_FIELDS);
            for (value, (&idx, name)) in values.iter_mut().zip(columns) {
                let raw = row.get(idx).unwrap_or_default().trim();
                *value = raw.parse().map_err(|_| InvestatsError::Series {
                    reason: format!("row {}: invalid {name} value {raw:?}", line + 1),
                })?;
            }

            records.push(CheckpointRecord::from_values(timestamp, values));
        }

        Ok(records)
    }
}
