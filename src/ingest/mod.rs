//! Raw table loading and row validation.

mod observation;
mod source;

pub use observation::{
    parse_count, parse_week, Observation, RawRecord, DEFAULT_COUNT_COLUMN, MAX_YEAR, MIN_YEAR,
    TAG_COLUMN, WEEK_COLUMN,
};
pub use source::{CsvSource, MemorySource, ObservationSource};
