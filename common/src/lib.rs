pub mod aggregate;
pub mod catalogue;
pub mod config;
pub mod data;
pub mod derived;
pub mod metric;
pub mod report;
pub mod style;

/// `time_scaling` value converting model times recorded in milliseconds
/// to seconds before derived factors are computed.
pub const MS_TO_S: f64 = 1000.0;
