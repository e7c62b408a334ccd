use std::path::Path;

use common::{
    aggregate::{AggregateTable, aggregate},
    catalogue,
    config::Config,
    data::TrialTable,
    derived::compute_derived,
    report::RenderCtx,
    style::PlotStyle,
};
use eyre::{Result, WrapErr, bail};
use regex::Regex;
use tokio::fs::read_to_string;
use tracing::{debug, info};

/// Run the full pipeline of a config file: load trials, aggregate,
/// derive, and generate every configured report.
pub async fn run_reports(config_file: &str, skip_render: bool, only: Option<&str>) -> Result<()> {
    let config: Config = serde_yml::from_str(&read_to_string(config_file).await?)
        .wrap_err_with(|| format!("parsing config {config_file}"))?;
    let settings = &config.settings;

    let title = resolve_title(&config)?;

    // Fail on style gaps before any data is touched.
    let mut style = PlotStyle::default();
    style.merge(settings.style.clone());
    for report in &config.reports {
        style
            .validate(&report.used_quantities())
            .wrap_err_with(|| format!("validating style for report {}", report.name()))?;
    }

    let table = load_aggregated(&config)?;
    info!(
        "Aggregated {} configurations from {}",
        table.rows.len(),
        config.data_file.display()
    );

    let ctx = RenderCtx {
        data_path: settings.plot_dir.join("plot_data"),
        plot_path: settings.plot_dir.clone(),
        extension: settings.extension.clone(),
        renderer: settings.renderer.clone(),
        skip_render,
        title,
    };
    ctx.ensure_dirs().await?;

    let filter = only.map(Regex::new).transpose()?;
    for report in &config.reports {
        if let Some(filter) = &filter
            && !filter.is_match(report.name())
        {
            debug!("Skipping report {}", report.name());
            continue;
        }
        report
            .generate(&table, &style, &ctx)
            .await
            .wrap_err_with(|| format!("generating report {}", report.name()))?;
    }
    Ok(())
}

/// Dump the aggregated table as CSV, one row per configuration with
/// mean/std column pairs. Not-available metrics stay empty.
pub async fn dump_aggregate(config_file: &str, out: Option<&Path>) -> Result<()> {
    let config: Config = serde_yml::from_str(&read_to_string(config_file).await?)
        .wrap_err_with(|| format!("parsing config {config_file}"))?;
    let table = load_aggregated(&config)?;
    let columns = table.columns();

    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header = vec![
        "num_nodes".to_owned(),
        "threads_per_task".to_owned(),
        "tasks_per_node".to_owned(),
        "model_time_sim".to_owned(),
        "num_nvp".to_owned(),
    ];
    for column in &columns {
        header.push(column.column().to_owned());
        header.push(format!("{column}_std"));
    }
    writer.write_record(&header)?;

    for row in &table.rows {
        let mut record = vec![
            row.key.num_nodes.to_string(),
            row.key.threads_per_task.to_string(),
            row.key.tasks_per_node.to_string(),
            row.key.model_time_sim.to_string(),
            row.key.num_nvp().to_string(),
        ];
        for column in &columns {
            match row.get(*column) {
                Some(sample) => {
                    record.push(sample.mean.to_string());
                    record.push(sample.std.to_string());
                }
                None => {
                    record.push(String::new());
                    record.push(String::new());
                }
            }
        }
        writer.write_record(&record)?;
    }

    let bytes = writer.into_inner()?;
    match out {
        Some(path) => tokio::fs::write(path, bytes).await?,
        None => print!("{}", String::from_utf8(bytes)?),
    }
    Ok(())
}

fn resolve_title(config: &Config) -> Result<String> {
    let settings = &config.settings;
    match (&settings.catalogue_file, &settings.catalogue_key) {
        (Some(path), Some(key)) => {
            let catalogue = catalogue::load(path)?;
            Ok(catalogue::lookup(&catalogue, key)?.plot_name.clone())
        }
        (None, None) => Ok(config.name.clone()),
        _ => bail!("catalogue_file and catalogue_key must be set together"),
    }
}

fn load_aggregated(config: &Config) -> Result<AggregateTable> {
    let trials = TrialTable::from_path(&config.data_file)?;
    for report in &config.reports {
        for metric in report.required_metrics() {
            if !trials.available.contains(metric) {
                bail!(
                    "report {} requires metric {metric}, absent from {}",
                    report.name(),
                    config.data_file.display()
                );
            }
        }
    }
    let mut table = aggregate(&trials);
    compute_derived(&mut table, config.settings.time_scaling);
    Ok(table)
}
