use common::{
    aggregate::AggregateTable,
    metric::{Derived, Metric, Quantity},
    report::{FigureSpec, Panel, RenderCtx, Report, XAxis},
    style::PlotStyle,
};
use eyre::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The standard scaling figure: stacked construction/propagation wall
/// times on the left, real-time factors with error bars on the right.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingBasic {
    /// Output file stem.
    pub name: String,
    pub x_axis: XAxis,
    pub log_x: bool,
    pub log_y: bool,
    pub error_bars: bool,
    /// Explicit tick positions; defaults to ticks at the data points.
    pub x_ticks: Option<Vec<f64>>,
}

impl Default for ScalingBasic {
    fn default() -> Self {
        ScalingBasic {
            name: "scaling_basic".to_owned(),
            x_axis: XAxis::NumNodes,
            log_x: false,
            log_y: false,
            error_bars: true,
            x_ticks: None,
        }
    }
}

#[async_trait::async_trait]
#[typetag::serde]
impl Report for ScalingBasic {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_metrics(&self) -> &'static [Metric] {
        &[
            Metric::WallTimeCreate,
            Metric::WallTimeConnect,
            Metric::WallTimeSim,
        ]
    }

    fn used_quantities(&self) -> Vec<Quantity> {
        vec![
            Derived::WallTimeConstruction.into(),
            Metric::WallTimeSim.into(),
            Derived::SimFactor.into(),
            Derived::PhaseTotalFactor.into(),
        ]
    }

    async fn generate(
        &self,
        table: &AggregateTable,
        style: &PlotStyle,
        ctx: &RenderCtx,
    ) -> Result<()> {
        debug!(
            "Building {} over {} configurations",
            self.name,
            table.rows.len()
        );

        let wall_times = Panel {
            x_label: self.x_axis.label().to_owned(),
            y_label: "wall time [s]".to_owned(),
            log_x: self.log_x,
            log_y: self.log_y,
            x_ticks: self.x_ticks.clone(),
            series: report_common::stacked_fills(
                table,
                style,
                self.x_axis,
                &[
                    Derived::WallTimeConstruction.into(),
                    Metric::WallTimeSim.into(),
                ],
                self.error_bars,
            )?,
        };

        let factors = Panel {
            x_label: self.x_axis.label().to_owned(),
            y_label: "real-time factor $T_{\\mathrm{wall}} / T_{\\mathrm{model}}$".to_owned(),
            log_x: self.log_x,
            log_y: self.log_y,
            x_ticks: self.x_ticks.clone(),
            series: vec![
                report_common::curve(table, style, self.x_axis, Derived::SimFactor, self.error_bars)?,
                report_common::curve(
                    table,
                    style,
                    self.x_axis,
                    Derived::PhaseTotalFactor,
                    self.error_bars,
                )?,
            ],
        };

        let spec = FigureSpec {
            name: self.name.clone(),
            title: ctx.title.clone(),
            figure: style.figure.clone(),
            panels: vec![wall_times, factors],
        };
        ctx.render(&spec).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use common::{aggregate::aggregate, data::TrialTable, derived::compute_derived, report::Series};

    use super::*;

    fn aggregated() -> AggregateTable {
        let header = "num_nodes,threads_per_task,tasks_per_node,model_time_sim,rng_seed,\
             wall_time_create,wall_time_connect,wall_time_sim,wall_time_phase_update,\
             wall_time_phase_communicate,wall_time_phase_deliver,wall_time_phase_collocate";
        let text = format!(
            "{header}\n1,4,8,100.0,1,1.0,2.0,10.0,4.0,3.0,2.0,1.0\n\
             2,4,8,100.0,1,1.0,2.0,20.0,4.0,3.0,2.0,1.0\n"
        );
        let mut table = aggregate(&TrialTable::parse(&text).unwrap());
        compute_derived(&mut table, 1.0);
        table
    }

    #[tokio::test]
    async fn writes_two_panel_spec() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RenderCtx {
            plot_path: dir.path().to_path_buf(),
            data_path: dir.path().join("plot_data"),
            extension: "pdf".into(),
            renderer: "render/figure.py".into(),
            skip_render: true,
            title: "strong scaling".into(),
        };
        ctx.ensure_dirs().await.unwrap();

        let report = ScalingBasic {
            log_x: true,
            ..ScalingBasic::default()
        };
        report
            .generate(&aggregated(), &PlotStyle::default(), &ctx)
            .await
            .unwrap();

        let json =
            std::fs::read_to_string(dir.path().join("plot_data/scaling_basic.json")).unwrap();
        let spec: FigureSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(spec.title, "strong scaling");
        assert_eq!(spec.panels.len(), 2);
        assert!(spec.panels[0].log_x);
        match &spec.panels[1].series[0] {
            Series::Curve { y, yerr, .. } => {
                assert_eq!(y, &vec![0.1, 0.2]);
                assert!(yerr.is_some());
            }
            other => panic!("expected a curve, got {other:?}"),
        }
    }

    #[test]
    fn deserializes_from_tagged_yaml() {
        let reports: Vec<Box<dyn Report>> = serde_yml::from_str(
            "- type: ScalingBasic\n  x_axis: num_nvp\n  error_bars: false\n",
        )
        .unwrap();
        let report = reports[0]
            .downcast_ref::<ScalingBasic>()
            .expect("a ScalingBasic report");
        assert_eq!(report.x_axis, XAxis::NumNvp);
        assert!(!report.error_bars);
    }
}
