use common::{
    aggregate::AggregateTable,
    metric::{Derived, Metric, Phase, Quantity},
    report::{FigureSpec, Panel, RenderCtx, Report, XAxis},
    style::PlotStyle,
};
use eyre::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where the simulation spends its time: per-phase real-time factors
/// stacked against the total, and the percentage breakdown of the
/// phase loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseFractions {
    /// Output file stem.
    pub name: String,
    pub x_axis: XAxis,
    pub log_x: bool,
    pub error_bars: bool,
    pub x_ticks: Option<Vec<f64>>,
}

impl Default for PhaseFractions {
    fn default() -> Self {
        PhaseFractions {
            name: "phase_fractions".to_owned(),
            x_axis: XAxis::NumNodes,
            log_x: false,
            error_bars: false,
            x_ticks: None,
        }
    }
}

#[async_trait::async_trait]
#[typetag::serde]
impl Report for PhaseFractions {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_metrics(&self) -> &'static [Metric] {
        &[
            Metric::WallTimePhaseUpdate,
            Metric::WallTimePhaseCommunicate,
            Metric::WallTimePhaseDeliver,
            Metric::WallTimePhaseCollocate,
        ]
    }

    fn used_quantities(&self) -> Vec<Quantity> {
        let mut used: Vec<Quantity> = vec![Derived::SimFactor.into()];
        for phase in Phase::ALL {
            used.push(phase.factor().into());
            used.push(phase.fraction().into());
        }
        used
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

        let factor_fills = Phase::ALL
            .iter()
            .map(|phase| phase.factor().into())
            .collect::<Vec<Quantity>>();
        let mut factor_series =
            report_common::stacked_fills(table, style, self.x_axis, &factor_fills, self.error_bars)?;
        factor_series.push(report_common::curve(
            table,
            style,
            self.x_axis,
            Derived::SimFactor,
            self.error_bars,
        )?);
        let factors = Panel {
            x_label: self.x_axis.label().to_owned(),
            y_label: "real-time factor $T_{\\mathrm{wall}} / T_{\\mathrm{model}}$".to_owned(),
            log_x: self.log_x,
            log_y: false,
            x_ticks: self.x_ticks.clone(),
            series: factor_series,
        };

        let fraction_fills = Phase::ALL
            .iter()
            .map(|phase| phase.fraction().into())
            .collect::<Vec<Quantity>>();
        let fractions = Panel {
            x_label: self.x_axis.label().to_owned(),
            y_label: "fraction of phase time [%]".to_owned(),
            log_x: self.log_x,
            log_y: false,
            x_ticks: self.x_ticks.clone(),
            series: report_common::stacked_fills(
                table,
                style,
                self.x_axis,
                &fraction_fills,
                self.error_bars,
            )?,
        };

        let spec = FigureSpec {
            name: self.name.clone(),
            title: ctx.title.clone(),
            figure: style.figure.clone(),
            panels: vec![factors, fractions],
        };
        ctx.render(&spec).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use common::{aggregate::aggregate, data::TrialTable, derived::compute_derived, report::Series};

    use super::*;

    fn aggregated() -> AggregateTable {
        let header = "num_nodes,threads_per_task,tasks_per_node,model_time_sim,rng_seed,\
             wall_time_create,wall_time_connect,wall_time_sim,wall_time_phase_update,\
             wall_time_phase_communicate,wall_time_phase_deliver,wall_time_phase_collocate";
        let text = format!(
            "{header}\n1,4,8,100.0,1,1.0,2.0,10.0,4.0,3.0,2.0,1.0\n\
             2,4,8,100.0,1,1.0,2.0,20.0,8.0,6.0,4.0,2.0\n"
        );
        let mut table = aggregate(&TrialTable::parse(&text).unwrap());
        compute_derived(&mut table, 1.0);
        table
    }

    #[tokio::test]
    async fn fraction_fills_stack_to_hundred() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RenderCtx {
            plot_path: dir.path().to_path_buf(),
            data_path: dir.path().join("plot_data"),
            extension: "png".into(),
            renderer: "render/figure.py".into(),
            skip_render: true,
            title: "phases".into(),
        };
        ctx.ensure_dirs().await.unwrap();

        PhaseFractions::default()
            .generate(&aggregated(), &PlotStyle::default(), &ctx)
            .await
            .unwrap();

        let json =
            std::fs::read_to_string(dir.path().join("plot_data/phase_fractions.json")).unwrap();
        let spec: FigureSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(spec.panels.len(), 2);

        // one fill per phase, stacking to 100% at every x
        let fills = &spec.panels[1].series;
        assert_eq!(fills.len(), Phase::ALL.len());
        for i in 0..2 {
            let stacked: f64 = fills
                .iter()
                .map(|series| match series {
                    Series::Fill { y, .. } => y[i],
                    other => panic!("expected a fill, got {other:?}"),
                })
                .sum();
            assert_relative_eq!(stacked, 100.0, epsilon = 1e-9);
        }
    }
}
