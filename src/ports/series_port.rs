//! Checkpoint series port trait.

use crate::domain::aggregate::AggregatedRecord;
use crate::domain::error::InvestatsError;
use crate::domain::stats::CheckpointRecord;
use std::io::{Read, Write};

/// Renders and loads derived-metric series.
pub trait SeriesPort {
    fn write_records(
        &self,
        records: &[CheckpointRecord],
        writer: &mut dyn Write,
    ) -> Result<(), InvestatsError>;

    fn write_aggregated(
        &self,
        records: &[AggregatedRecord],
        writer: &mut dyn Write,
    ) -> Result<(), InvestatsError>;

    fn read_records(&self, reader: &mut dyn Read) -> Result<Vec<CheckpointRecord>, InvestatsError>;
}
