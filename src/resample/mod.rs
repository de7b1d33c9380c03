//! Calendar alignment and zero-filling of weekly counts.

mod calendar;
mod resampler;

pub use calendar::{Calendar, WeekAnchor};
pub use resampler::{ResampledRow, ResampledTable, TagSeries, WeeklyResampler, MAX_CALENDAR_WEEKS};
