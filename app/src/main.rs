use std::path::PathBuf;

use clap::{Parser, Subcommand};
use common::config::Config;
use eyre::Result;
use tokio::fs::{read_dir, read_to_string};
use tracing::error;
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

mod report;

const MODULES: &[&str] = &[
    "common",
    "report_common",
    "scaling_basic",
    "phase_fractions",
    "deliver_detail",
];

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long)]
    log: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List report configs in a folder
    Ls {
        #[arg(short, long, default_value = ".")]
        folder: String,
    },
    /// Generate the figures of a report config
    Plot {
        #[arg(short, long, default_value = "config.yaml")]
        config_file: String,
        /// Write the figure-spec JSON files but do not invoke the renderer
        #[arg(long, default_value_t = false)]
        skip_render: bool,
        /// Only generate reports whose name matches this regex
        #[arg(short, long)]
        only: Option<String>,
    },
    /// Dump the aggregated table (means, stds, derived columns) as CSV
    Aggregate {
        #[arg(short, long, default_value = "config.yaml")]
        config_file: String,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let args = Cli::parse();
    let file_appender = tracing_appender::rolling::never(".", "benchplot.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let mut env_filter = EnvFilter::new(format!("benchplot={log_level}"));

    if !args.log.is_empty() {
        for log in &args.log {
            env_filter = env_filter.add_directive(log.parse()?);
        }
    }

    for module in MODULES {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .with(layer().with_writer(non_blocking))
        .init();

    init_reports();

    match args.command {
        Commands::Ls { folder } => list_configs(&folder).await?,
        Commands::Plot {
            config_file,
            skip_render,
            only,
        } => {
            if let Err(err) = report::run_reports(&config_file, skip_render, only.as_deref()).await
            {
                error!("{err:#?}");
                return Err(err);
            }
        }
        Commands::Aggregate { config_file, out } => {
            report::dump_aggregate(&config_file, out.as_deref()).await?
        }
    };

    Ok(())
}

/// Touch every report type so its typetag registration is linked in.
fn init_reports() {
    serde_json::to_string(&scaling_basic::ScalingBasic::default()).unwrap();
    serde_json::to_string(&phase_fractions::PhaseFractions::default()).unwrap();
    serde_json::to_string(&deliver_detail::DeliverDetail::default()).unwrap();
}

async fn list_configs(folder: &str) -> Result<()> {
    let mut items = read_dir(folder).await?;
    while let Ok(Some(entry)) = items.next_entry().await {
        let path = entry.path();
        let is_yaml = path
            .extension()
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if !is_yaml {
            continue;
        }
        if let Ok(config) = serde_yml::from_str::<Config>(&read_to_string(&path).await?) {
            println!("{} -> {}", config.name, path.display());
        }
    }
    Ok(())
}
