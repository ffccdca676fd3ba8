use anyhow::{Context, Result};
use canal_losses::aggregate::{monthly_volume, season_volume};
use canal_losses::calendar::Month;
use canal_losses::config::{EngineConfig, OutputFormat};
use canal_losses::dataset::{table16_part1, table16_part2};
use canal_losses::flows::FlowTable;
use canal_losses::io;
use canal_losses::metrics::FleetOverview;
use canal_losses::network::NetworkTopology;
use canal_losses::routing::{CalculatedTableResults, calculate_table};
use canal_losses::summary::AnalysisPayload;
use log::{info, warn};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

mod cli;

use cli::{Command, get_args};

fn main() -> Result<()> {
    let args = get_args();

    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match args.command {
        Command::Table {
            part1,
            part2,
            config,
            format,
            output,
        } => run_table(part1, part2, config, format, output),
        Command::Channels { input, output } => run_channels(&input, &output),
        Command::Overview { input } => run_overview(&input),
        Command::Summary {
            months,
            config,
            output,
        } => run_summary(&months, config, output),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config: {:?}", path)),
        None => Ok(EngineConfig::default()),
    }
}

fn load_part(path: Option<&Path>, bundled: fn() -> canal_losses::Result<FlowTable>) -> Result<FlowTable> {
    match path {
        Some(path) => io::csv::load_flow_table(path)
            .with_context(|| format!("Failed to read flow table: {:?}", path)),
        None => bundled().context("Failed to build bundled Table 16"),
    }
}

fn compute(
    part1: Option<&Path>,
    part2: Option<&Path>,
    config: &EngineConfig,
) -> Result<CalculatedTableResults> {
    let part1 = load_part(part1, table16_part1)?;
    let part2 = load_part(part2, table16_part2)?;
    let topology = NetworkTopology::rudaki()?;

    info!("Routing configuration:");
    info!("  Segments: {}", topology.routing_order.len());
    info!("  Filtration coefficient A: {}", config.filtration_coefficient);
    info!("  Days per decade: {}", config.days_per_decade);
    info!("  Worker threads: {}", config.worker_threads());

    calculate_table(&topology, &part1, &part2, config).context("Failed to compute hydrology table")
}

fn run_table(
    part1: Option<PathBuf>,
    part2: Option<PathBuf>,
    config: Option<PathBuf>,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let table = compute(part1.as_deref(), part2.as_deref(), &config)?;

    let output =
        output.unwrap_or_else(|| PathBuf::from(format!("hydrology_table.{}", format.extension())));

    match format {
        OutputFormat::Csv => {
            let file = File::create(&output).with_context(|| format!("Failed to create {:?}", output))?;
            io::csv::write_results(BufWriter::new(file), &table)?;
        }
        OutputFormat::Json => {
            let file = File::create(&output).with_context(|| format!("Failed to create {:?}", output))?;
            io::write_json(BufWriter::new(file), &table)?;
        }
        #[cfg(feature = "netcdf")]
        OutputFormat::NetCdf => {
            io::netcdf::write_netcdf_output(&output.to_string_lossy(), &table)?;
        }
        #[cfg(not(feature = "netcdf"))]
        OutputFormat::NetCdf => {
            anyhow::bail!("NetCDF output requires building with the `netcdf` feature");
        }
    }

    let computed = table.iter().filter(|(_, r)| !r.is_unset()).count();
    println!("\nComputed {} of {} decades", computed, table.len());
    for month in Month::ALL {
        if let Some(volume) = monthly_volume(&table, month) {
            println!("  {}: {:.3} million m3", month, volume);
        }
    }
    if let Some(total) = season_volume(&table) {
        println!("  season: {:.3} million m3", total);
    }
    println!("Results saved to {}", output.display());
    Ok(())
}

fn run_channels(input: &Path, output: &Path) -> Result<()> {
    let channels = io::csv::load_channels(input)
        .with_context(|| format!("Failed to read channels: {:?}", input))?;
    let file = File::create(output).with_context(|| format!("Failed to create {:?}", output))?;
    io::csv::write_channel_reports(BufWriter::new(file), &channels)?;

    println!("{} channel reports saved to {}", channels.len(), output.display());
    Ok(())
}

fn run_overview(input: &Path) -> Result<()> {
    let channels = io::csv::load_channels(input)
        .with_context(|| format!("Failed to read channels: {:?}", input))?;
    let overview = FleetOverview::from_channels(&channels);

    println!("Channels: {}", overview.total_channels);
    println!("Total length: {:.1} km", overview.total_length_km);
    println!("Critical: {}", overview.critical);
    println!("High loss: {}", overview.high_loss);
    println!("Normal: {}", overview.normal);
    match overview.mean_efficiency {
        Some(e) => println!("Mean efficiency: {:.1}%", e * 100.0),
        None => println!("Mean efficiency: n/a"),
    }
    Ok(())
}

fn run_summary(months: &[Month], config: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let table = compute(None, None, &config)?;
    let payload = AnalysisPayload::from_table(&table, months);
    if payload.is_empty() {
        warn!("No computed values for months {:?}", months);
    }

    let json = payload.to_json()?;
    match output {
        Some(path) => {
            std::fs::write(&path, json).with_context(|| format!("Failed to write {:?}", path))?;
            println!("Analysis payload saved to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
