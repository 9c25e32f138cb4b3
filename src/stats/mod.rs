//! Statistics module - summaries over a dataset

mod describe;
mod summarizer;

pub use describe::{describe, describe_groups, GroupSummary};
pub use summarizer::{
    AggregateEntry, AggregateTable, CrossSeries, CrossTable, FrequencyEntry, FrequencyOrder,
    FrequencyTable, GroupValues, GroupedValues, NonNumericPolicy, Summarizer,
};
