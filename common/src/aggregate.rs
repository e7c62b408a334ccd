use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;

use crate::{
    data::{ConfigKey, TrialTable},
    metric::{Metric, Quantity},
};

/// Mean and sample standard deviation of one metric over the trials of
/// one configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub mean: f64,
    pub std: f64,
}

impl Sample {
    /// Sample (n-1) standard deviation; a single value yields a std of
    /// zero so downstream ratios stay finite.
    pub fn of(values: &[f64]) -> Sample {
        let n = values.len();
        let mean = values.iter().sum::<f64>() / n as f64;
        let std = if n < 2 {
            0.0
        } else {
            let squares = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
            (squares / (n - 1) as f64).sqrt()
        };
        Sample { mean, std }
    }

    /// Sum of independent terms: means add, stds add in quadrature.
    /// The independence of the terms is assumed, not verified.
    pub fn sum_independent(parts: &[Sample]) -> Sample {
        Sample {
            mean: parts.iter().map(|p| p.mean).sum(),
            std: parts.iter().map(|p| p.std.powi(2)).sum::<f64>().sqrt(),
        }
    }

    /// Ratio against a deterministic (non-random) scalar. A zero
    /// scalar yields NaN so the renderer can skip the point.
    pub fn per(&self, scalar: f64) -> Sample {
        if scalar == 0.0 {
            return Sample::NOT_A_NUMBER;
        }
        Sample {
            mean: self.mean / scalar,
            std: self.std / scalar,
        }
    }

    /// Percentage of a total. The std is approximated from the
    /// numerator alone, ignoring covariance and denominator variance.
    pub fn percent_of(&self, total_mean: f64) -> Sample {
        if total_mean == 0.0 {
            return Sample::NOT_A_NUMBER;
        }
        Sample {
            mean: 100.0 * self.mean / total_mean,
            std: 100.0 * self.std / total_mean,
        }
    }

    const NOT_A_NUMBER: Sample = Sample {
        mean: f64::NAN,
        std: f64::NAN,
    };
}

/// One row of the aggregated table: every surviving configuration key
/// with mean/std per metric plus the derived columns.
#[derive(Debug, Clone)]
pub struct AggregateRow {
    pub key: ConfigKey,
    values: BTreeMap<Quantity, Sample>,
}

impl AggregateRow {
    pub fn new(key: ConfigKey) -> Self {
        AggregateRow {
            key,
            values: BTreeMap::new(),
        }
    }

    /// `None` is the not-available marker for optional metrics the
    /// trial table did not carry.
    pub fn get(&self, quantity: impl Into<Quantity>) -> Option<Sample> {
        self.values.get(&quantity.into()).copied()
    }

    pub fn insert(&mut self, quantity: impl Into<Quantity>, sample: Sample) {
        self.values.insert(quantity.into(), sample);
    }

    pub fn quantities(&self) -> impl Iterator<Item = Quantity> + '_ {
        self.values.keys().copied()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AggregateTable {
    /// Sorted by configuration key for reproducible plots.
    pub rows: Vec<AggregateRow>,
    pub available: BTreeSet<Metric>,
}

impl AggregateTable {
    pub fn has(&self, metric: Metric) -> bool {
        self.available.contains(&metric)
    }

    /// Union of columns over all rows, in deterministic order.
    pub fn columns(&self) -> Vec<Quantity> {
        self.rows
            .iter()
            .flat_map(AggregateRow::quantities)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Group trials by configuration key and reduce every metric to
/// mean/std. Seeds are dropped here; the raw table is not needed
/// afterwards.
pub fn aggregate(trials: &TrialTable) -> AggregateTable {
    let chunks = trials
        .rows
        .iter()
        .sorted_by(|a, b| a.key.cmp(&b.key))
        .chunk_by(|row| row.key);

    let mut rows = Vec::new();
    for (key, group) in &chunks {
        let group = group.collect::<Vec<_>>();
        let mut row = AggregateRow::new(key);
        for metric in &trials.available {
            let values = group
                .iter()
                .filter_map(|trial| trial.values.get(metric).copied())
                .collect::<Vec<_>>();
            if !values.is_empty() {
                row.insert(*metric, Sample::of(&values));
            }
        }
        rows.push(row);
    }

    AggregateTable {
        rows,
        available: trials.available.clone(),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::data::TrialTable;

    fn table(rows: &[(u32, f64)]) -> TrialTable {
        let header = "num_nodes,threads_per_task,tasks_per_node,model_time_sim,rng_seed,\
             wall_time_create,wall_time_connect,wall_time_sim,wall_time_phase_update,\
             wall_time_phase_communicate,wall_time_phase_deliver,wall_time_phase_collocate";
        let mut text = format!("{header}\n");
        for (i, (nodes, sim)) in rows.iter().enumerate() {
            text += &format!("{nodes},4,8,100.0,{i},1.0,2.0,{sim},4.0,3.0,2.0,1.0\n");
        }
        TrialTable::parse(&text).unwrap()
    }

    #[test]
    fn single_trial_keeps_value_with_zero_std() {
        let aggregated = aggregate(&table(&[(1, 10.0)]));
        let sim = aggregated.rows[0].get(Metric::WallTimeSim).unwrap();
        assert_eq!(sim.mean, 10.0);
        assert_eq!(sim.std, 0.0);
    }

    #[test]
    fn identical_trials_have_zero_std() {
        let aggregated = aggregate(&table(&[(1, 10.0), (1, 10.0), (1, 10.0)]));
        assert_eq!(aggregated.rows.len(), 1);
        let sim = aggregated.rows[0].get(Metric::WallTimeSim).unwrap();
        assert_eq!(sim.mean, 10.0);
        assert_eq!(sim.std, 0.0);
    }

    #[test]
    fn sample_std_uses_n_minus_one() {
        let aggregated = aggregate(&table(&[(2, 20.0), (2, 22.0), (2, 24.0)]));
        let sim = aggregated.rows[0].get(Metric::WallTimeSim).unwrap();
        assert_relative_eq!(sim.mean, 22.0);
        assert_relative_eq!(sim.std, 2.0);
    }

    #[test]
    fn rows_are_sorted_by_key() {
        let aggregated = aggregate(&table(&[(8, 1.0), (1, 1.0), (4, 1.0), (1, 2.0)]));
        let nodes = aggregated
            .rows
            .iter()
            .map(|row| row.key.num_nodes)
            .collect::<Vec<_>>();
        assert_eq!(nodes, vec![1, 4, 8]);
    }

    #[test]
    fn missing_optional_metric_stays_not_available() {
        let aggregated = aggregate(&table(&[(1, 10.0)]));
        assert!(!aggregated.has(Metric::TotalMemory));
        assert_eq!(aggregated.rows[0].get(Metric::TotalMemory), None);
    }

    #[test]
    fn percent_of_zero_total_is_nan() {
        let sample = Sample { mean: 1.0, std: 0.5 };
        assert!(sample.percent_of(0.0).mean.is_nan());
        assert!(sample.per(0.0).mean.is_nan());
    }

    #[test]
    fn quadrature_sum() {
        let total = Sample::sum_independent(&[
            Sample { mean: 3.0, std: 3.0 },
            Sample { mean: 1.0, std: 4.0 },
        ]);
        assert_relative_eq!(total.mean, 4.0);
        assert_relative_eq!(total.std, 5.0);
    }
}
