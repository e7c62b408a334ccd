use crate::{
    aggregate::{AggregateTable, Sample},
    metric::{Derived, Metric, Phase},
};

/// Add the derived columns to an aggregated table.
///
/// `time_scaling` rescales the model time once, globally, before any
/// derived quantity uses it (e.g. [`crate::MS_TO_S`] for tables that
/// record model time in milliseconds). Purely functional on the table
/// apart from the rescaled key; no I/O.
pub fn compute_derived(table: &mut AggregateTable, time_scaling: f64) {
    for row in &mut table.rows {
        row.key.model_time_sim /= time_scaling;
        let model_time = row.key.model_time_sim;

        if let (Some(create), Some(connect)) = (
            row.get(Metric::WallTimeCreate),
            row.get(Metric::WallTimeConnect),
        ) {
            row.insert(
                Derived::WallTimeConstruction,
                Sample::sum_independent(&[create, connect]),
            );
        }

        if let Some(sim) = row.get(Metric::WallTimeSim) {
            row.insert(Derived::SimFactor, sim.per(model_time));
        }

        let phases = Phase::ALL
            .iter()
            .map(|phase| row.get(phase.metric()))
            .collect::<Option<Vec<_>>>();
        if let Some(phases) = phases {
            let total = Sample::sum_independent(&phases);
            row.insert(Derived::WallTimePhaseTotal, total);
            row.insert(Derived::PhaseTotalFactor, total.per(model_time));
            for (phase, sample) in Phase::ALL.iter().zip(phases) {
                row.insert(phase.factor(), sample.per(model_time));
                row.insert(phase.fraction(), sample.percent_of(total.mean));
            }
        }

        if let Some(memory) = row.get(Metric::TotalMemory) {
            row.insert(
                Derived::TotalMemoryPerNode,
                memory.per(row.key.num_nodes as f64),
            );
        }
    }
}
