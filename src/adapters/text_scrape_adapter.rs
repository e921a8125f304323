//! Raw transaction text adapter.
//!
//! Transactions are blocks of lines separated by a reset line. Within a block
//! every field is introduced by a line prefix, e.g.
//!
//! ```text
//! ########## TRANSACTION ##########
//! Datetime:  2020-10-12T12:30:00Z
//! Asset:     BBB
//! Price:     20.0000
//! Amount:    400.00
//! ```

use crate::adapters::timestamp::parse_timestamp;
use crate::domain::error::InvestatsError;
use crate::domain::event::InvestAmounts;
use crate::domain::scrape::Transaction;
use crate::ports::transaction_port::TransactionPort;
use std::io::Read;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapePrefixes {
    pub reset: String,
    pub datetime: String,
    pub asset: String,
    pub amount_src: String,
    pub amount_dst: String,
    pub rate: String,
}

impl Default for ScrapePrefixes {
    fn default() -> Self {
        Self {
            reset: "###".into(),
            datetime: "Datetime:".into(),
            asset: "Asset:".into(),
            amount_src: "Amount:".into(),
            amount_dst: "Shares:".into(),
            rate: "Price:".into(),
        }
    }
}

/// Fields collected for one block, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
struct RawTxn {
    datetime: Option<String>,
    asset: Option<String>,
    inv_src: Option<String>,
    inv_dst: Option<String>,
    rate: Option<String>,
}

impl RawTxn {
    fn is_empty(&self) -> bool {
        *self == RawTxn::default()
    }

    fn is_valid(&self) -> bool {
        self.datetime.is_some()
            && self.asset.is_some()
            && self.rate.is_some()
            && (self.inv_src.is_some() != self.inv_dst.is_some())
    }

    fn describe(&self) -> String {
        let fields = [
            ("datetime", &self.datetime),
            ("asset", &self.asset),
            ("inv_src", &self.inv_src),
            ("inv_dst", &self.inv_dst),
            ("rate", &self.rate),
        ];
        let parts: Vec<String> = fields
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| format!("{k}: {v}")))
            .collect();
        format!("{{{}}}", parts.join(", "))
    }

    fn parse_number(&self, value: &str) -> Result<f64, InvestatsError> {
        value
            .trim()
            .replace(',', "")
            .parse()
            .map_err(|_| InvestatsError::InvalidTransaction {
                block: self.describe(),
            })
    }

    fn into_transaction(self) -> Result<Transaction, InvestatsError> {
        let invalid = || InvestatsError::InvalidTransaction {
            block: self.describe(),
        };
        if !self.is_valid() {
            return Err(invalid());
        }

        let datetime = self.datetime.as_deref().ok_or_else(invalid)?;
        let asset = self.asset.clone().ok_or_else(invalid)?;
        let rate = self.parse_number(self.rate.as_deref().ok_or_else(invalid)?)?;

        let amounts = match (&self.inv_src, &self.inv_dst) {
            (Some(src), None) => InvestAmounts::SrcRate {
                src: self.parse_number(src)?,
                rate,
            },
            (None, Some(dst)) => InvestAmounts::DstRate {
                dst: self.parse_number(dst)?,
                rate,
            },
            _ => return Err(invalid()),
        };

        Ok(Transaction {
            timestamp: parse_timestamp(datetime)?,
            asset,
            amounts,
        })
    }
}

#[derive(Debug)]
pub struct TextScrapeAdapter {
    prefixes: ScrapePrefixes,
}

impl TextScrapeAdapter {
    pub fn new(prefixes: ScrapePrefixes) -> Self {
        Self { prefixes }
    }
}

impl TransactionPort for TextScrapeAdapter {
    fn load_transactions(&self, reader: &mut dyn Read) -> Result<Vec<Transaction>, InvestatsError> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;

        let p = &self.prefixes;
        let mut txns = Vec::new();
        let mut raw = RawTxn::default();

        for line in content.lines().map(str::trim) {
            if line.starts_with(p.reset.as_str()) {
                if !raw.is_empty() {
                    txns.push(std::mem::take(&mut raw).into_transaction()?);
                }
            } else if let Some(v) = line.strip_prefix(p.datetime.as_str()) {
                raw.datetime = Some(v.trim().to_string());
            } else if let Some(v) = line.strip_prefix(p.asset.as_str()) {
                raw.asset = Some(v.trim().to_string());
            } else if let Some(v) = line.strip_prefix(p.amount_src.as_str()) {
                raw.inv_src = Some(v.trim().to_string());
            } else if let Some(v) = line.strip_prefix(p.amount_dst.as_str()) {
                raw.inv_dst = Some(v.trim().to_string());
            } else if let Some(v) = line.strip_prefix(p.rate.as_str()) {
                raw.rate = Some(v.trim().to_string());
            }
        }

        if !raw.is_empty() {
            txns.push(raw.into_transaction()?);
        }

        tracing::debug!(transactions = txns.len(), "transactions scraped");
        Ok(txns)
    }
}
