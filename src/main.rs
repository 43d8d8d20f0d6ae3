//! hostprobe - host inventory and benchmark CLI
//!
//! Loads the settings file, initialises logging, and dispatches to the
//! snapshot, sensor, benchmark and settings commands.

mod cli;

use std::path::Path;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use hostprobe::error::{Error, Result};
use hostprobe::gpu::{GpuStressRunner, NoAccelerator, VendorPreference};
use hostprobe::report::{self, console};
use hostprobe::settings::{Settings, SettingsStore};
use hostprobe::system::{
    CpuBenchmark, MetricsCollector, SysinfoProvider, DEFAULT_SAMPLE_INTERVAL,
};
use hostprobe::{logging, version};

use crate::cli::{BenchTarget, Cli, Commands, ConfigSubcommand};

fn main() {
    // Parse CLI arguments first (before logging, so we know verbosity)
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    // Commands that don't need full logging
    match &cli.command {
        Commands::Version => {
            version::print_version();
            return Ok(());
        }
        Commands::Config { subcommand } => {
            logging::init_simple(if cli.quiet {
                tracing::Level::ERROR
            } else {
                tracing::Level::WARN
            })?;
            return handle_config_command(&cli.settings, subcommand.clone());
        }
        _ => {}
    }

    let store = SettingsStore::load(&cli.settings)?;
    let mut settings = store.settings().clone();
    settings.apply_env_overrides();
    settings.validate()?;

    // The guards must be kept alive for the lifetime of the program
    let log_file = settings.log_file();
    let _log_guards =
        logging::init_logging(&settings.logging, log_file.as_deref(), cli.verbose, cli.quiet)?;

    let build = version::build_info();
    info!(
        version = %build.full_version(),
        settings = %store.path().display(),
        "Starting hostprobe"
    );

    match cli.command {
        Commands::Specs { output, top } => run_specs(&settings, &output, top),
        Commands::Info { top } => run_info(&settings, top),
        Commands::Temps => run_temps(),
        Commands::Bench { target } => match target {
            BenchTarget::Cpu {
                iterations,
                cores,
                output,
            } => run_cpu_bench(&settings, iterations, cores, output.as_deref()),
            BenchTarget::Gpu {
                matrix_size,
                iterations,
                output,
            } => run_gpu_bench(&settings, matrix_size, iterations, output.as_deref()),
        },
        Commands::Version | Commands::Config { .. } => {
            // Already handled above
            unreachable!();
        }
    }
}

fn sample_interval(settings: &Settings) -> Duration {
    Duration::try_from_secs_f64(settings.benchmark.polling_interval_sec)
        .unwrap_or(DEFAULT_SAMPLE_INTERVAL)
}

fn collector(settings: &Settings, top: usize) -> MetricsCollector<SysinfoProvider> {
    MetricsCollector::system()
        .with_top_processes(top)
        .with_sample_interval(sample_interval(settings))
}

/// Capture a snapshot and write it as JSON
fn run_specs(settings: &Settings, output: &Path, top: usize) -> Result<()> {
    let snapshot = collector(settings, top).capture();
    report::write_json(&snapshot, output)?;
    println!("System specs saved to {}", output.display());
    Ok(())
}

/// Capture a snapshot and print it
fn run_info(settings: &Settings, top: usize) -> Result<()> {
    let capture = collector(settings, top).capture_detailed();
    print!("{}", console::render_snapshot(&capture.snapshot, &capture.skipped));
    Ok(())
}

/// Print temperature sensors
fn run_temps() -> Result<()> {
    let sensors = MetricsCollector::system().capture_sensors();
    print!("{}", console::render_temperatures(&sensors));
    Ok(())
}

/// Run the CPU benchmark and save its result
fn run_cpu_bench(
    settings: &Settings,
    iterations: Option<u64>,
    cores: Option<usize>,
    output: Option<&Path>,
) -> Result<()> {
    let iterations = iterations.unwrap_or(settings.benchmark.cpu_iterations);
    let cores = cores.unwrap_or_else(num_cpus::get);

    println!("Running CPU benchmark on {} cores ({} iterations each)...", cores, iterations);

    let mut bench = CpuBenchmark::new(iterations, cores);
    if settings.cpu.monitor_usage {
        bench = bench.with_usage_sampling(sample_interval(settings));
    }
    let result = bench.run(&mut SysinfoProvider::new())?;

    println!();
    print!("{}", console::render_benchmark(&result));

    let path = output.map(Path::to_path_buf).unwrap_or_else(|| settings.json_path());
    report::write_json(&result, &path)?;
    println!("\nResults saved to {}", path.display());

    Ok(())
}

/// Run the GPU stress loop and save its report
fn run_gpu_bench(
    settings: &Settings,
    matrix_size: usize,
    iterations: Option<u64>,
    output: Option<&Path>,
) -> Result<()> {
    let iterations = iterations.unwrap_or(settings.benchmark.gpu_iterations);
    let preference = if settings.gpu.enable {
        VendorPreference::parse(&settings.gpu.vendor)?
    } else {
        VendorPreference::Disabled
    };

    let stress = GpuStressRunner::new(NoAccelerator)
        .with_preference(preference)
        .run(matrix_size, iterations)?;

    print!("{}", console::render_gpu_stress(&stress));

    let path = output.map(Path::to_path_buf).unwrap_or_else(|| settings.json_path());
    report::write_json(&stress, &path)?;
    println!("Results saved to {}", path.display());

    Ok(())
}

/// Handle settings subcommands
fn handle_config_command(path: &Path, subcommand: ConfigSubcommand) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show => {
            let store = SettingsStore::load(path)?;
            println!("# {}", store.path().display());
            println!("{}", toml::to_string_pretty(store.settings())?);
        }
        ConfigSubcommand::Path => {
            println!("{}", path.display());
        }
        ConfigSubcommand::Get { key } => {
            let store = SettingsStore::load(path)?;
            println!("{}", store.settings().get(&key)?);
        }
        ConfigSubcommand::Set { key, value } => {
            let mut store = SettingsStore::load(path)?;
            store.settings_mut().set(&key, &value)?;
            store.settings().validate()?;
            store.save()?;
            println!("{} = {}", key, store.settings().get(&key)?);
        }
        ConfigSubcommand::Reset { force } => {
            if path.exists() && !force {
                return Err(Error::InvalidInput(format!(
                    "settings file already exists at {} (use --force to overwrite)",
                    path.display()
                )));
            }
            let store = SettingsStore::reset(path)?;
            println!("Settings reset to defaults at {}", store.path().display());
        }
        ConfigSubcommand::Validate => {
            let store = SettingsStore::load(path)?;
            store.settings().validate()?;
            println!("Settings are valid.");
        }
    }

    Ok(())
}
