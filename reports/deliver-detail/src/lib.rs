use common::{
    aggregate::AggregateTable,
    metric::{Metric, Quantity},
    report::{FigureSpec, Panel, RenderCtx, Report, XAxis},
    style::PlotStyle,
};
use eyre::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The detailed communication timers broken out of the deliver and
/// communicate phases. All of them are optional columns: instrumented
/// builds record them, plain builds do not.
const DETAIL_TIMERS: &[Metric] = &[
    Metric::WallTimeCommunicateTargetData,
    Metric::WallTimeGatherSpikeData,
    Metric::WallTimeGatherTargetData,
    Metric::WallTimeCommunicatePrepare,
];

/// Spike-delivery deep dive: the deliver phase against whichever
/// detailed communication timers the trial table recorded. Skipped
/// when none are available.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliverDetail {
    /// Output file stem.
    pub name: String,
    pub x_axis: XAxis,
    pub log_x: bool,
    pub error_bars: bool,
    pub x_ticks: Option<Vec<f64>>,
}

impl Default for DeliverDetail {
    fn default() -> Self {
        DeliverDetail {
            name: "deliver_detail".to_owned(),
            x_axis: XAxis::NumNodes,
            log_x: false,
            error_bars: true,
            x_ticks: None,
        }
    }
}

#[async_trait::async_trait]
#[typetag::serde]
impl Report for DeliverDetail {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_metrics(&self) -> &'static [Metric] {
        &[Metric::WallTimePhaseDeliver]
    }

    fn used_quantities(&self) -> Vec<Quantity> {
        let mut used = vec![Metric::WallTimePhaseDeliver.into()];
        used.extend(DETAIL_TIMERS.iter().copied().map(Quantity::from));
        used
    }

    async fn generate(
        &self,
        table: &AggregateTable,
        style: &PlotStyle,
        ctx: &RenderCtx,
    ) -> Result<()> {
        let available = DETAIL_TIMERS
            .iter()
            .copied()
            .filter(|metric| table.has(*metric))
            .collect::<Vec<_>>();
        if available.is_empty() {
            warn!(
                "Skipping {}: the trial table has no detailed communication timers",
                self.name
            );
            return Ok(());
        }
        debug!(
            "Building {} with {} detail timers",
            self.name,
            available.len()
        );

        let mut series = vec![report_common::curve(
            table,
            style,
            self.x_axis,
            Metric::WallTimePhaseDeliver,
            self.error_bars,
        )?];
        for metric in available {
            series.push(report_common::curve(
                table,
                style,
                self.x_axis,
                metric,
                self.error_bars,
            )?);
        }

        let spec = FigureSpec {
            name: self.name.clone(),
            title: ctx.title.clone(),
            figure: style.figure.clone(),
            panels: vec![Panel {
                x_label: self.x_axis.label().to_owned(),
                y_label: "wall time [s]".to_owned(),
                log_x: self.log_x,
                log_y: false,
                x_ticks: self.x_ticks.clone(),
                series,
            }],
        };
        ctx.render(&spec).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use common::{aggregate::aggregate, data::TrialTable, derived::compute_derived};

    use super::*;

    const HEADER: &str = "num_nodes,threads_per_task,tasks_per_node,model_time_sim,rng_seed,\
         wall_time_create,wall_time_connect,wall_time_sim,wall_time_phase_update,\
         wall_time_phase_communicate,wall_time_phase_deliver,wall_time_phase_collocate";

    fn aggregated(text: &str) -> AggregateTable {
        let mut table = aggregate(&TrialTable::parse(text).unwrap());
        compute_derived(&mut table, 1.0);
        table
    }

    fn ctx(dir: &std::path::Path) -> RenderCtx {
        RenderCtx {
            plot_path: dir.to_path_buf(),
            data_path: dir.join("plot_data"),
            extension: "pdf".into(),
            renderer: "render/figure.py".into(),
            skip_render: true,
            title: "deliver".into(),
        }
    }

    #[tokio::test]
    async fn skipped_without_detail_timers() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(dir.path());
        ctx.ensure_dirs().await.unwrap();

        let table = aggregated(&format!("{HEADER}\n1,4,8,100.0,1,1.0,2.0,10.0,4.0,3.0,2.0,1.0\n"));
        DeliverDetail::default()
            .generate(&table, &PlotStyle::default(), &ctx)
            .await
            .unwrap();

        assert!(!dir.path().join("plot_data/deliver_detail.json").exists());
    }

    #[tokio::test]
    async fn plots_only_available_detail_timers() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(dir.path());
        ctx.ensure_dirs().await.unwrap();

        let header = format!("{HEADER},wall_time_gather_spike_data");
        let table = aggregated(&format!(
            "{header}\n1,4,8,100.0,1,1.0,2.0,10.0,4.0,3.0,2.0,1.0,0.5\n"
        ));
        DeliverDetail::default()
            .generate(&table, &PlotStyle::default(), &ctx)
            .await
            .unwrap();

        let json =
            std::fs::read_to_string(dir.path().join("plot_data/deliver_detail.json")).unwrap();
        let spec: FigureSpec = serde_json::from_str(&json).unwrap();
        // deliver phase plus the single recorded detail timer
        assert_eq!(spec.panels[0].series.len(), 2);
    }
}
