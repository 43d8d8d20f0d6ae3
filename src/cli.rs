//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface for hostprobe.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use hostprobe::settings::DEFAULT_SETTINGS_PATH;

/// hostprobe - host inventory and CPU/GPU saturation benchmarks
///
/// Captures a snapshot of the host (CPU, memory, disks, network, sensors,
/// processes), runs simple CPU and GPU load tests, and writes the results
/// as JSON.
#[derive(Parser, Debug)]
#[command(name = "hostprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the settings file
    #[arg(
        long,
        global = true,
        env = "HOSTPROBE_SETTINGS",
        default_value = DEFAULT_SETTINGS_PATH
    )]
    pub settings: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Capture a system snapshot and write it as JSON
    Specs {
        /// Output file for the snapshot
        #[arg(short, long, default_value = hostprobe::report::DEFAULT_SPECS_PATH)]
        output: PathBuf,

        /// Number of processes listed by memory usage
        #[arg(long, default_value_t = hostprobe::system::DEFAULT_TOP_PROCESSES)]
        top: usize,
    },

    /// Capture a system snapshot and print it
    Info {
        /// Number of processes listed by memory usage
        #[arg(long, default_value_t = hostprobe::system::DEFAULT_TOP_PROCESSES)]
        top: usize,
    },

    /// Print temperature sensors
    Temps,

    /// Run a benchmark
    Bench {
        #[command(subcommand)]
        target: BenchTarget,
    },

    /// Settings management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Display version and build information
    Version,
}

/// Benchmark targets
#[derive(Subcommand, Debug, Clone)]
pub enum BenchTarget {
    /// Saturate every logical core with a square-root workload
    Cpu {
        /// Iterations per worker (default: benchmark.cpu_iterations)
        #[arg(short, long)]
        iterations: Option<u64>,

        /// Number of workers (default: logical core count)
        #[arg(short, long)]
        cores: Option<usize>,

        /// Output file for results (default: output.json_path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Repeated matrix multiplication on an accelerator
    Gpu {
        /// Matrix edge length
        #[arg(long, default_value_t = hostprobe::gpu::DEFAULT_MATRIX_SIZE)]
        matrix_size: usize,

        /// Number of multiplications (default: benchmark.gpu_iterations)
        #[arg(short, long)]
        iterations: Option<u64>,

        /// Output file for the report (default: output.json_path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Settings subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the current settings
    Show,

    /// Print the settings file path
    Path,

    /// Print one setting, e.g. `benchmark.cpu_iterations`
    Get {
        key: String,
    },

    /// Change one setting and save the file
    Set {
        key: String,
        value: String,
    },

    /// Restore the default settings file
    Reset {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Validate the settings file
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_specs_defaults() {
        let cli = Cli::parse_from(["hostprobe", "specs"]);
        match cli.command {
            Commands::Specs { output, top } => {
                assert_eq!(output, PathBuf::from("specs.json"));
                assert_eq!(top, 5);
            }
            _ => panic!("Expected Specs command"),
        }
    }

    #[test]
    fn test_bench_cpu_with_options() {
        let cli = Cli::parse_from([
            "hostprobe",
            "bench",
            "cpu",
            "--iterations",
            "1000",
            "--cores",
            "2",
            "--output",
            "out.json",
        ]);
        match cli.command {
            Commands::Bench {
                target: BenchTarget::Cpu { iterations, cores, output },
            } => {
                assert_eq!(iterations, Some(1000));
                assert_eq!(cores, Some(2));
                assert_eq!(output, Some(PathBuf::from("out.json")));
            }
            _ => panic!("Expected Bench Cpu command"),
        }
    }

    #[test]
    fn test_bench_gpu_defaults() {
        let cli = Cli::parse_from(["hostprobe", "bench", "gpu"]);
        match cli.command {
            Commands::Bench {
                target: BenchTarget::Gpu { matrix_size, iterations, output },
            } => {
                assert_eq!(matrix_size, 4096);
                assert!(iterations.is_none());
                assert!(output.is_none());
            }
            _ => panic!("Expected Bench Gpu command"),
        }
    }

    #[test]
    fn test_global_settings_flag() {
        let cli = Cli::parse_from(["hostprobe", "config", "show", "--settings", "/tmp/s.toml"]);
        assert_eq!(cli.settings, PathBuf::from("/tmp/s.toml"));
    }

    #[test]
    fn test_config_set() {
        let cli = Cli::parse_from(["hostprobe", "config", "set", "gpu.vendor", "amd"]);
        match cli.command {
            Commands::Config {
                subcommand: ConfigSubcommand::Set { key, value },
            } => {
                assert_eq!(key, "gpu.vendor");
                assert_eq!(value, "amd");
            }
            _ => panic!("Expected Config Set command"),
        }
    }

    #[test]
    fn test_verbose_flags() {
        let cli = Cli::parse_from(["hostprobe", "-vv", "version"]);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_quiet_flag() {
        let cli = Cli::parse_from(["hostprobe", "--quiet", "temps"]);
        assert!(cli.quiet);
    }
}
