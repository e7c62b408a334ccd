//! Series builders shared by the report crates.

use common::{
    aggregate::AggregateTable,
    metric::Quantity,
    report::{Series, XAxis},
    style::PlotStyle,
};
use eyre::Result;

struct Points {
    x: Vec<f64>,
    y: Vec<f64>,
    yerr: Vec<f64>,
}

/// Collect the (x, mean, std) triples of one quantity. Rows where the
/// quantity is not available are skipped entirely; NaN means survive
/// so the renderer can leave a gap.
fn points(table: &AggregateTable, x_axis: XAxis, quantity: Quantity) -> Points {
    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut yerr = Vec::new();
    for row in &table.rows {
        if let Some(sample) = row.get(quantity) {
            x.push(x_axis.value(&row.key));
            y.push(sample.mean);
            yerr.push(sample.std);
        }
    }
    Points { x, y, yerr }
}

pub fn curve(
    table: &AggregateTable,
    style: &PlotStyle,
    x_axis: XAxis,
    quantity: impl Into<Quantity>,
    error_bars: bool,
) -> Result<Series> {
    let quantity = quantity.into();
    let Points { x, y, yerr } = points(table, x_axis, quantity);
    Ok(Series::Curve {
        label: style.label(quantity)?.to_owned(),
        color: style.color(quantity)?.to_owned(),
        x,
        y,
        yerr: error_bars.then_some(yerr),
    })
}

pub fn fill(
    table: &AggregateTable,
    style: &PlotStyle,
    x_axis: XAxis,
    quantity: impl Into<Quantity>,
    error_bars: bool,
) -> Result<Series> {
    let quantity = quantity.into();
    let Points { x, y, yerr } = points(table, x_axis, quantity);
    Ok(Series::Fill {
        label: style.label(quantity)?.to_owned(),
        color: style.color(quantity)?.to_owned(),
        x,
        y,
        yerr: error_bars.then_some(yerr),
    })
}

/// Fills that the renderer stacks cumulatively, in the given order.
pub fn stacked_fills(
    table: &AggregateTable,
    style: &PlotStyle,
    x_axis: XAxis,
    quantities: &[Quantity],
    error_bars: bool,
) -> Result<Vec<Series>> {
    quantities
        .iter()
        .map(|quantity| fill(table, style, x_axis, *quantity, error_bars))
        .collect()
}

#[cfg(test)]
mod tests {
    use common::{
        aggregate::aggregate,
        data::TrialTable,
        derived::compute_derived,
        metric::{Derived, Metric},
    };

    use super::*;

    fn table() -> AggregateTable {
        let header = "num_nodes,threads_per_task,tasks_per_node,model_time_sim,rng_seed,\
             wall_time_create,wall_time_connect,wall_time_sim,wall_time_phase_update,\
             wall_time_phase_communicate,wall_time_phase_deliver,wall_time_phase_collocate,\
             total_memory";
        // total_memory only measured for the first configuration
        let text = format!(
            "{header}\n1,4,8,100.0,1,1.0,2.0,10.0,4.0,3.0,2.0,1.0,64.0\n\
             2,4,8,100.0,1,1.0,2.0,20.0,4.0,3.0,2.0,1.0,\n"
        );
        let mut aggregated = aggregate(&TrialTable::parse(&text).unwrap());
        compute_derived(&mut aggregated, 1.0);
        aggregated
    }

    #[test]
    fn curve_collects_means_and_stds() {
        let style = PlotStyle::default();
        match curve(&table(), &style, XAxis::NumNodes, Metric::WallTimeSim, true).unwrap() {
            Series::Curve { x, y, yerr, label, .. } => {
                assert_eq!(x, vec![1.0, 2.0]);
                assert_eq!(y, vec![10.0, 20.0]);
                assert_eq!(yerr, Some(vec![0.0, 0.0]));
                assert_eq!(label, "state propagation");
            }
            other => panic!("expected a curve, got {other:?}"),
        }
    }

    #[test]
    fn not_available_rows_are_skipped() {
        let style = PlotStyle::default();
        match curve(
            &table(),
            &style,
            XAxis::NumNodes,
            Derived::TotalMemoryPerNode,
            false,
        )
        .unwrap()
        {
            Series::Curve { x, y, yerr, .. } => {
                assert_eq!(x, vec![1.0]);
                assert_eq!(y, vec![64.0]);
                assert_eq!(yerr, None);
            }
            other => panic!("expected a curve, got {other:?}"),
        }
    }

    #[test]
    fn stacked_fills_keep_order() {
        let style = PlotStyle::default();
        let quantities = [
            Derived::FracPhaseUpdate.into(),
            Derived::FracPhaseCommunicate.into(),
        ];
        let fills =
            stacked_fills(&table(), &style, XAxis::NumNodes, &quantities, false).unwrap();
        assert_eq!(fills.len(), 2);
        match &fills[0] {
            Series::Fill { label, .. } => assert_eq!(label, "update"),
            other => panic!("expected a fill, got {other:?}"),
        }
    }
}
