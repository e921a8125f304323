#![allow(dead_code)]

use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use investats::domain::event::{Event, InvestAmounts};
use std::io::Write;
use tempfile::NamedTempFile;

/// Event log with three monthly investments and a checkpoint after each.
pub const SAMPLE_LOG: &str = "---
- { datetime: 2020-01-12, type: invest, inv_src: &inv 500, rate: 100.0000 }
- { datetime: 2020-01-12, type: chkpt, cgt: 0.15 }
- { datetime: 2020-02-12, type: invest, inv_src: *inv, rate: 100.6558 }
- { datetime: 2020-02-12, type: chkpt }
- { datetime: 2020-03-12, type: invest, inv_src: *inv, rate: 101.3159 }
- { datetime: 2020-03-12, type: chkpt }
";

/// Same checkpoint dates as [`SAMPLE_LOG`], different asset.
pub const SAMPLE_LOG_B: &str = "---
- { datetime: 2020-01-12, type: invest, inv_dst: 10, rate: 20.0 }
- { datetime: 2020-01-12, type: chkpt, cgt: 0.2 }
- { datetime: 2020-02-12, type: invest, inv_src: 200, rate: 25.0 }
- { datetime: 2020-02-12, type: chkpt }
- { datetime: 2020-03-12, type: chkpt }
";

pub const SAMPLE_TXNS: &str = "Exported transactions

########## TRANSACTION ##########
Datetime:  2020-09-12T11:30:00Z
Asset:     BBB
Price:     25.0000
Shares:    25

########## TRANSACTION ##########
Datetime:  2020-10-12T12:00:00Z
Asset:     AAA
Price:     125.0000
Shares:    22

########## TRANSACTION ##########
Datetime:  2020-10-12T12:30:00Z
Asset:     BBB
Price:     20.0000
Amount:    400.00
";

pub fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

/// Midnight UTC, `n` days after 2020-01-01.
pub fn day(n: i64) -> DateTime<FixedOffset> {
    utc().with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
}

pub fn invest(n: i64, src: f64, rate: f64) -> Event {
    Event::investment(day(n), InvestAmounts::SrcRate { src, rate })
}

pub fn chkpt(n: i64, cgt: Option<f64>) -> Event {
    Event::checkpoint(day(n), cgt)
}

pub fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub fn path_str(file: &NamedTempFile) -> String {
    file.path().to_string_lossy().into_owned()
}
