use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use crate::metric::Metric;

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("trial table not found at {path:?}")]
    DataNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("required column {0:?} is missing from the trial table")]
    MissingColumn(&'static str),
    #[error("required metric column {0} is missing from the trial table")]
    MissingMetric(Metric),
    #[error("row {row}: cannot parse {value:?} in column {column:?}")]
    BadValue {
        row: usize,
        column: String,
        value: String,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Columns forming the configuration key of a trial.
pub const KEY_COLUMNS: &[&str] = &[
    "num_nodes",
    "threads_per_task",
    "tasks_per_node",
    "model_time_sim",
];

const SEED_COLUMN: &str = "rng_seed";

/// One measured benchmark run. Trials sharing a [`ConfigKey`] differ
/// only in their random seed.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRow {
    pub key: ConfigKey,
    pub rng_seed: Option<i64>,
    pub values: BTreeMap<Metric, f64>,
}

/// The tuple of scaling parameters identifying one benchmark scenario.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigKey {
    pub num_nodes: u32,
    pub threads_per_task: u32,
    pub tasks_per_node: u32,
    pub model_time_sim: f64,
}

impl ConfigKey {
    /// Virtual processes per node.
    pub fn num_nvp(&self) -> u32 {
        self.threads_per_task * self.tasks_per_node
    }
}

impl Eq for ConfigKey {}

impl Ord for ConfigKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.num_nodes, self.threads_per_task, self.tasks_per_node)
            .cmp(&(other.num_nodes, other.threads_per_task, other.tasks_per_node))
            .then(self.model_time_sim.total_cmp(&other.model_time_sim))
    }
}

impl PartialOrd for ConfigKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// The raw trial table, read once from a delimited text file and
/// discarded after aggregation.
#[derive(Debug, Clone, Default)]
pub struct TrialTable {
    pub rows: Vec<TrialRow>,
    /// Metrics that have a column in the source file. Optional metrics
    /// without a column are simply not in this set.
    pub available: BTreeSet<Metric>,
}

impl TrialTable {
    pub fn from_path(path: &Path) -> Result<Self, DataError> {
        let text = std::fs::read_to_string(path).map_err(|source| DataError::DataNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse a comma or semicolon separated table with a header row.
    pub fn parse(text: &str) -> Result<Self, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(sniff_delimiter(text))
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let position = |name: &str| headers.iter().position(|h| h == name);

        let mut key_columns = [0usize; 4];
        for (slot, name) in key_columns.iter_mut().zip(KEY_COLUMNS) {
            *slot = position(name).ok_or(DataError::MissingColumn(name))?;
        }

        let mut available = BTreeSet::new();
        let mut metric_columns = Vec::new();
        for metric in Metric::ALL {
            match position(metric.column()) {
                Some(index) => {
                    available.insert(*metric);
                    metric_columns.push((*metric, index));
                }
                None if metric.is_required() => return Err(DataError::MissingMetric(*metric)),
                None => {}
            }
        }
        let seed_column = position(SEED_COLUMN);

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let row = index + 1;
            let field = |column: usize| record.get(column).unwrap_or("");

            let key = ConfigKey {
                num_nodes: parse_count(row, KEY_COLUMNS[0], field(key_columns[0]))?,
                threads_per_task: parse_count(row, KEY_COLUMNS[1], field(key_columns[1]))?,
                tasks_per_node: parse_count(row, KEY_COLUMNS[2], field(key_columns[2]))?,
                model_time_sim: parse_value(row, KEY_COLUMNS[3], field(key_columns[3]))?,
            };

            let rng_seed = match seed_column.map(field) {
                Some(raw) if !raw.is_empty() => {
                    Some(raw.parse().map_err(|_| DataError::BadValue {
                        row,
                        column: SEED_COLUMN.to_owned(),
                        value: raw.to_owned(),
                    })?)
                }
                _ => None,
            };

            let mut values = BTreeMap::new();
            for (metric, column) in &metric_columns {
                let raw = field(*column);
                // Empty cells mark measurements a run did not record.
                if !raw.is_empty() {
                    values.insert(*metric, parse_value(row, metric.column(), raw)?);
                }
            }

            rows.push(TrialRow {
                key,
                rng_seed,
                values,
            });
        }

        Ok(TrialTable { rows, available })
    }
}

/// Prefer the semicolon only when the header actually uses it; some
/// exporters write semicolon separated tables with comma decimals.
fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or("");
    let semicolons = header.matches(';').count();
    let commas = header.matches(',').count();
    if semicolons > commas { b';' } else { b',' }
}

fn parse_value(row: usize, column: &str, raw: &str) -> Result<f64, DataError> {
    raw.parse().map_err(|_| DataError::BadValue {
        row,
        column: column.to_owned(),
        value: raw.to_owned(),
    })
}

/// Key counts are integers, but tables written by dataframe tooling
/// often render them as "4.0".
fn parse_count(row: usize, column: &str, raw: &str) -> Result<u32, DataError> {
    let value = parse_value(row, column, raw)?;
    if value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(DataError::BadValue {
            row,
            column: column.to_owned(),
            value: raw.to_owned(),
        });
    }
    Ok(value as u32)
}
