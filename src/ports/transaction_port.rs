//! Raw transaction source port trait.

use crate::domain::error::InvestatsError;
use crate::domain::scrape::Transaction;
use std::io::Read;

pub trait TransactionPort {
    fn load_transactions(&self, reader: &mut dyn Read) -> Result<Vec<Transaction>, InvestatsError>;
}
