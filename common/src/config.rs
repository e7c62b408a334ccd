use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{report::Report, style::StyleOverrides};

/// One report-generation run: which trial table to load and which
/// figures to produce from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub name: String,
    /// The raw trial table (comma or semicolon separated).
    pub data_file: PathBuf,
    #[serde(default)]
    pub settings: Settings,
    pub reports: Vec<Box<dyn Report>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Divides the recorded model time once before derived factors are
    /// computed, e.g. 1000 for tables recording milliseconds.
    pub time_scaling: f64,
    pub plot_dir: PathBuf,
    /// Image file extension handed to the renderer.
    pub extension: String,
    /// The external charting script.
    pub renderer: PathBuf,
    /// Experiment catalogue resolving `catalogue_key` to the figure
    /// title. Without a catalogue the config `name` is used.
    pub catalogue_file: Option<PathBuf>,
    pub catalogue_key: Option<String>,
    pub style: StyleOverrides,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            time_scaling: 1.0,
            plot_dir: PathBuf::from("plots"),
            extension: "pdf".to_owned(),
            renderer: PathBuf::from("render/figure.py"),
            catalogue_file: None,
            catalogue_key: None,
            style: StyleOverrides::default(),
        }
    }
}
