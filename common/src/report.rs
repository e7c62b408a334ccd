use core::fmt::Debug;
use std::path::PathBuf;

use downcast_rs::{Downcast, impl_downcast};
use dyn_clone::{DynClone, clone_trait_object};
use eyre::{Result, bail, eyre};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::{fs, process::Command};
use tracing::debug;

use crate::{
    aggregate::AggregateTable,
    data::ConfigKey,
    metric::{Metric, Quantity},
    style::{FigureParams, PlotStyle},
};

/// Key-derived scalar plotted on the x-axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XAxis {
    NumNodes,
    NumNvp,
    ThreadsPerTask,
    TasksPerNode,
    ModelTimeSim,
}

impl XAxis {
    pub fn value(&self, key: &ConfigKey) -> f64 {
        match self {
            XAxis::NumNodes => key.num_nodes as f64,
            XAxis::NumNvp => key.num_nvp() as f64,
            XAxis::ThreadsPerTask => key.threads_per_task as f64,
            XAxis::TasksPerNode => key.tasks_per_node as f64,
            XAxis::ModelTimeSim => key.model_time_sim,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            XAxis::NumNodes => "Number of nodes",
            XAxis::NumNvp => "Virtual processes per node",
            XAxis::ThreadsPerTask => "Threads per task",
            XAxis::TasksPerNode => "Tasks per node",
            XAxis::ModelTimeSim => "Model time [s]",
        }
    }
}

/// One drawable series of a panel. Labels and colors are resolved
/// against the [`PlotStyle`] before the spec leaves the process, so
/// the renderer never needs the metric registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Series {
    /// Line (or errorbar) plot of one quantity.
    Curve {
        label: String,
        color: String,
        x: Vec<f64>,
        y: Vec<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        yerr: Option<Vec<f64>>,
    },
    /// Area stacked on top of the fills preceding it in the panel.
    Fill {
        label: String,
        color: String,
        x: Vec<f64>,
        y: Vec<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        yerr: Option<Vec<f64>>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub x_label: String,
    pub y_label: String,
    #[serde(default)]
    pub log_x: bool,
    #[serde(default)]
    pub log_y: bool,
    /// Explicit tick positions; `None` places ticks at the data points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_ticks: Option<Vec<f64>>,
    pub series: Vec<Series>,
}

/// The complete figure handed to the external charting collaborator.
/// Non-finite values serialize as JSON null and are skipped when
/// drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureSpec {
    /// Output file stem.
    pub name: String,
    pub title: String,
    pub figure: FigureParams,
    pub panels: Vec<Panel>,
}

/// A standardized figure built from the aggregated table. Configured
/// report instances are deserialized from the `reports:` list of a
/// config file, dispatched on their `type:` tag.
#[typetag::serde(tag = "type")]
#[async_trait::async_trait]
pub trait Report: Debug + DynClone + Downcast + Send + Sync {
    /// Report name, also the output file stem.
    fn name(&self) -> &str;
    /// Metrics the trial table must provide for this report.
    fn required_metrics(&self) -> &'static [Metric];
    /// Quantities whose colors and labels the style must resolve.
    fn used_quantities(&self) -> Vec<Quantity>;
    /// Build the figure spec(s) and hand them to the renderer.
    async fn generate(
        &self,
        table: &AggregateTable,
        style: &PlotStyle,
        ctx: &RenderCtx,
    ) -> Result<()>;
}
clone_trait_object!(Report);
impl_downcast!(Report);

/// Output locations and renderer handle shared by all reports of a
/// run.
#[derive(Debug, Clone)]
pub struct RenderCtx {
    /// Directory receiving the rendered images.
    pub plot_path: PathBuf,
    /// Directory receiving the figure-spec JSON files.
    pub data_path: PathBuf,
    /// Image file extension, e.g. "pdf" or "png".
    pub extension: String,
    /// The external charting collaborator.
    pub renderer: PathBuf,
    /// Stop at the JSON handoff, do not invoke the renderer.
    pub skip_render: bool,
    /// Figure title, usually resolved through the catalogue.
    pub title: String,
}

impl RenderCtx {
    pub async fn ensure_dirs(&self) -> Result<()> {
        let jobs = [&self.plot_path, &self.data_path].map(fs::create_dir_all);
        for result in join_all(jobs).await {
            result?;
        }
        Ok(())
    }

    /// Write the spec JSON and invoke the renderer on it. Returns the
    /// path of the image the renderer was asked to produce.
    pub async fn render(&self, spec: &FigureSpec) -> Result<PathBuf> {
        let spec_path = self.data_path.join(format!("{}.json", spec.name));
        fs::write(&spec_path, serde_json::to_vec_pretty(spec)?).await?;

        let out = self
            .plot_path
            .join(format!("{}.{}", spec.name, self.extension));
        if self.skip_render {
            debug!("Skipping renderer for {}", spec.name);
            return Ok(out);
        }

        let status = Command::new("python3")
            .arg(&self.renderer)
            .arg("--spec")
            .arg(&spec_path)
            .arg("--out")
            .arg(&out)
            .status()
            .await
            .map_err(|e| eyre!("spawning renderer {:?}: {e}", self.renderer))?;
        if !status.success() {
            bail!("renderer exited with {status} for figure {}", spec.name);
        }
        debug!("Rendered {}", out.display());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn spec_json_round_trip() {
        let spec = FigureSpec {
            name: "scaling".into(),
            title: "MAM node scaling".into(),
            figure: FigureParams::default(),
            panels: vec![Panel {
                x_label: "Number of nodes".into(),
                y_label: "wall time [s]".into(),
                log_x: true,
                log_y: false,
                x_ticks: None,
                series: vec![Series::Curve {
                    label: "state propagation".into(),
                    color: "#AA3377".into(),
                    x: vec![1.0, 2.0],
                    y: vec![10.0, 22.0],
                    yerr: Some(vec![0.0, 2.0]),
                }],
            }],
        };

        let json = serde_json::to_string(&spec).unwrap();
        let back: FigureSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }

    #[tokio::test]
    async fn render_handoff_writes_spec_json() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RenderCtx {
            plot_path: dir.path().join("plots"),
            data_path: dir.path().join("plots/plot_data"),
            extension: "pdf".into(),
            renderer: "render/figure.py".into(),
            skip_render: true,
            title: "t".into(),
        };
        ctx.ensure_dirs().await.unwrap();

        let spec = FigureSpec {
            name: "fig".into(),
            title: "t".into(),
            figure: FigureParams::default(),
            panels: vec![],
        };
        let out = ctx.render(&spec).await.unwrap();

        assert_eq!(out, dir.path().join("plots/fig.pdf"));
        let written = std::fs::read_to_string(dir.path().join("plots/plot_data/fig.json")).unwrap();
        let back: FigureSpec = serde_json::from_str(&written).unwrap();
        assert_eq!(back, spec);
    }
}
