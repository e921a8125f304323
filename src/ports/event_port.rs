//! Event log port trait.

use crate::domain::error::InvestatsError;
use crate::domain::event::Event;
use std::io::{Read, Write};

/// Reads and writes event logs. Implementations validate and normalize
/// entries so that the statistics engine only ever sees typed, ordered events.
pub trait EventLogPort {
    fn load_events(&self, reader: &mut dyn Read) -> Result<Vec<Event>, InvestatsError>;

    fn save_events(&self, events: &[Event], writer: &mut dyn Write) -> Result<(), InvestatsError>;
}
