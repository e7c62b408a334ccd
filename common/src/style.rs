use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::metric::{Derived, Metric, Quantity};

#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    #[error("no color configured for quantity {0}")]
    MissingColor(Quantity),
    #[error("no label configured for quantity {0}")]
    MissingLabel(Quantity),
}

/// Figure-level parameters forwarded to the renderer. Sizes are in
/// points before `size_factor` is applied, figure sizes in inches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureParams {
    pub size_factor: f64,
    pub figsize_single: (f64, f64),
    pub figsize_double: (f64, f64),
    pub axes_label_size: f64,
    pub axes_title_size: f64,
    pub font_size: f64,
    pub legend_font_size: f64,
    pub tick_label_size: f64,
    pub line_width: f64,
}

impl Default for FigureParams {
    fn default() -> Self {
        FigureParams {
            size_factor: 1.3,
            figsize_single: (9.15, 6.1),
            figsize_double: (12.2, 6.71),
            axes_label_size: 15.0,
            axes_title_size: 19.0,
            font_size: 16.0,
            legend_font_size: 11.0,
            tick_label_size: 11.0,
            line_width: 2.0,
        }
    }
}

/// Immutable display metadata for every plottable quantity. Defaults
/// cover the whole closed quantity set; config files may override
/// single entries. Lookups for quantities a report uses are validated
/// before any figure is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotStyle {
    pub figure: FigureParams,
    pub colors: BTreeMap<Quantity, String>,
    pub labels: BTreeMap<Quantity, String>,
}

/// Partial style from a config file, merged over the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleOverrides {
    pub figure: Option<FigureParams>,
    pub colors: BTreeMap<Quantity, String>,
    pub labels: BTreeMap<Quantity, String>,
}

impl Default for PlotStyle {
    fn default() -> Self {
        // Paul Tol's bright/vibrant palettes, as in the upstream
        // benchmark figures.
        let colors = [
            (Metric::WallTimeCreate.into(), "#4477AA"),
            (Metric::WallTimeConnect.into(), "#009988"),
            (Metric::WallTimeSim.into(), "#AA3377"),
            (Metric::WallTimePhaseUpdate.into(), "#EE6677"),
            (Metric::WallTimePhaseCommunicate.into(), "#228833"),
            (Metric::WallTimePhaseDeliver.into(), "#0077BB"),
            (Metric::WallTimePhaseCollocate.into(), "#CCBB44"),
            (Metric::WallTimeCommunicateTargetData.into(), "#33BBEE"),
            (Metric::WallTimeGatherSpikeData.into(), "#EE3377"),
            (Metric::WallTimeGatherTargetData.into(), "#CC3311"),
            (Metric::WallTimeCommunicatePrepare.into(), "#EE7733"),
            (Metric::PyTimeCreate.into(), "#4477AA"),
            (Metric::PyTimeConnect.into(), "#009988"),
            (Metric::BaseMemory.into(), "#BBBBBB"),
            (Metric::NetworkMemory.into(), "#66CCEE"),
            (Metric::InitMemory.into(), "#EE7733"),
            (Metric::TotalMemory.into(), "#4477AA"),
            (Metric::NumConnections.into(), "#228833"),
            (Metric::LocalSpikeCounter.into(), "#EE6677"),
            (Derived::WallTimeConstruction.into(), "#66CCEE"),
            (Derived::SimFactor.into(), "#AA3377"),
            (Derived::WallTimePhaseTotal.into(), "#BBBBBB"),
            (Derived::PhaseTotalFactor.into(), "#EE7733"),
            (Derived::PhaseUpdateFactor.into(), "#EE6677"),
            (Derived::PhaseCommunicateFactor.into(), "#228833"),
            (Derived::PhaseDeliverFactor.into(), "#0077BB"),
            (Derived::PhaseCollocateFactor.into(), "#CCBB44"),
            (Derived::FracPhaseUpdate.into(), "#EE6677"),
            (Derived::FracPhaseCommunicate.into(), "#228833"),
            (Derived::FracPhaseDeliver.into(), "#0077BB"),
            (Derived::FracPhaseCollocate.into(), "#CCBB44"),
            (Derived::TotalMemoryPerNode.into(), "#009988"),
        ];
        let labels = [
            (Metric::WallTimeCreate.into(), "creation"),
            (Metric::WallTimeConnect.into(), "connection"),
            (Metric::WallTimeSim.into(), "state propagation"),
            (Metric::WallTimePhaseUpdate.into(), "update"),
            (Metric::WallTimePhaseCommunicate.into(), "communicate"),
            (Metric::WallTimePhaseDeliver.into(), "deliver"),
            (Metric::WallTimePhaseCollocate.into(), "collocate"),
            (
                Metric::WallTimeCommunicateTargetData.into(),
                "communicate target data",
            ),
            (Metric::WallTimeGatherSpikeData.into(), "gather spike data"),
            (Metric::WallTimeGatherTargetData.into(), "gather target data"),
            (
                Metric::WallTimeCommunicatePrepare.into(),
                "communicate prepare",
            ),
            (Metric::PyTimeCreate.into(), "creation (python)"),
            (Metric::PyTimeConnect.into(), "connection (python)"),
            (Metric::BaseMemory.into(), "base memory"),
            (Metric::NetworkMemory.into(), "network memory"),
            (Metric::InitMemory.into(), "initialization memory"),
            (Metric::TotalMemory.into(), "total memory"),
            (Metric::NumConnections.into(), "connections"),
            (Metric::LocalSpikeCounter.into(), "local spikes"),
            (Derived::WallTimeConstruction.into(), "network construction"),
            (Derived::SimFactor.into(), "state propagation"),
            (Derived::WallTimePhaseTotal.into(), "all phases"),
            (Derived::PhaseTotalFactor.into(), "all phases"),
            (Derived::PhaseUpdateFactor.into(), "update factor"),
            (Derived::PhaseCommunicateFactor.into(), "communicate factor"),
            (Derived::PhaseDeliverFactor.into(), "deliver factor"),
            (Derived::PhaseCollocateFactor.into(), "collocate factor"),
            (Derived::FracPhaseUpdate.into(), "update"),
            (Derived::FracPhaseCommunicate.into(), "communicate"),
            (Derived::FracPhaseDeliver.into(), "deliver"),
            (Derived::FracPhaseCollocate.into(), "collocate"),
            (Derived::TotalMemoryPerNode.into(), "memory per node"),
        ];

        PlotStyle {
            figure: FigureParams::default(),
            colors: colors
                .into_iter()
                .map(|(q, c): (Quantity, &str)| (q, c.to_owned()))
                .collect(),
            labels: labels
                .into_iter()
                .map(|(q, l): (Quantity, &str)| (q, l.to_owned()))
                .collect(),
        }
    }
}

impl PlotStyle {
    pub fn color(&self, quantity: impl Into<Quantity>) -> Result<&str, StyleError> {
        let quantity = quantity.into();
        self.colors
            .get(&quantity)
            .map(String::as_str)
            .ok_or(StyleError::MissingColor(quantity))
    }

    pub fn label(&self, quantity: impl Into<Quantity>) -> Result<&str, StyleError> {
        let quantity = quantity.into();
        self.labels
            .get(&quantity)
            .map(String::as_str)
            .ok_or(StyleError::MissingLabel(quantity))
    }

    pub fn merge(&mut self, overrides: StyleOverrides) {
        if let Some(figure) = overrides.figure {
            self.figure = figure;
        }
        self.colors.extend(overrides.colors);
        self.labels.extend(overrides.labels);
    }

    /// Fail fast at configuration-load time instead of at render time.
    pub fn validate(&self, used: &[Quantity]) -> Result<(), StyleError> {
        for quantity in used {
            self.color(*quantity)?;
            self.label(*quantity)?;
        }
        Ok(())
    }
}
