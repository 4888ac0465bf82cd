use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use cm_app::{AppError, AppResult, RunOptions, RunReport, project_service, run_service};

#[derive(Parser)]
#[command(name = "cm-cli")]
#[command(about = "Climate manager CLI - multi-zone heating control", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate config file syntax and structure
    Validate {
        /// Path to the hub config YAML file
        config_path: PathBuf,
    },
    /// List zones and circuits in a config
    Zones {
        /// Path to the hub config YAML file
        config_path: PathBuf,
    },
    /// Run the hub against fixed entity states
    Run {
        /// Path to the hub config YAML file
        config_path: PathBuf,
        /// YAML map of entity id to state
        #[arg(long)]
        states: PathBuf,
        /// Number of ticks to run (required unless --realtime)
        #[arg(long)]
        ticks: Option<u64>,
        /// Tick on the wall clock instead of a simulated one
        #[arg(long)]
        realtime: bool,
        /// Restore snapshot file to apply before starting
        #[arg(long)]
        restore: Option<PathBuf>,
        /// Write restore snapshots here after the run
        #[arg(long)]
        save: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::Zones { config_path } => cmd_zones(&config_path),
        Commands::Run {
            config_path,
            states,
            ticks,
            realtime,
            restore,
            save,
            json,
        } => cmd_run(
            &config_path,
            &states,
            RunOptions {
                ticks,
                realtime,
                restore,
                save,
            },
            json,
        ),
    }
}

fn cmd_validate(config_path: &Path) -> AppResult<()> {
    println!("Validating config: {}", config_path.display());
    let config = project_service::load_config(config_path)?;
    project_service::validate_config(&config)?;
    println!("✓ Config is valid");
    Ok(())
}

fn cmd_zones(config_path: &Path) -> AppResult<()> {
    let config = project_service::load_config(config_path)?;

    let zones = project_service::list_zones(&config);
    if zones.is_empty() {
        println!("No zones found in config");
    } else {
        println!("Zones:");
        for zone in zones {
            println!(
                "  {} - {} ({:?}, sensor {}, {} windows, {} TRVs)",
                zone.id,
                zone.name,
                zone.regulator_type,
                zone.temperature_sensor,
                zone.window_count,
                zone.trv_count
            );
        }
    }

    let circuits = project_service::list_circuits(&config);
    if !circuits.is_empty() {
        println!("Circuits:");
        for circuit in circuits {
            println!(
                "  {} - {} (zones: {}, {} switches)",
                circuit.id,
                circuit.name,
                circuit.zones.join(", "),
                circuit.switch_count
            );
            for missing in &circuit.missing_zones {
                println!("    ! unknown zone '{}' will be skipped", missing);
            }
        }
    }
    Ok(())
}

fn cmd_run(config_path: &Path, states_path: &Path, options: RunOptions, json: bool) -> AppResult<()> {
    let config = project_service::load_config(config_path)?;
    let states = run_service::load_states(states_path)?;
    tracing::info!(config = %config_path.display(), ticks = ?options.ticks, "starting run");

    let report = run_service::simulate(&config, &states, &options)?;

    if json {
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| AppError::InvalidInput(format!("Failed to serialize report: {}", e)))?;
        println!("{}", text);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("✓ {} ran {} ticks", report.hub, report.ticks);
    if report.restored_zones > 0 {
        println!("  Restored zones: {}", report.restored_zones);
    }
    println!("  Output: {:.4}", report.output);
    println!("  Control fault: {}", report.control_fault);
    println!("  Boiler fault: {}", report.boiler_fault);
    println!("  Service calls: {}", report.service_calls);

    println!("Zones:");
    for zone in &report.zones {
        let current = zone
            .current_temperature
            .map(|t| format!("{:.1}", t))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<16} {} / {:.1} {} [{}] output {:.4}{}{}{}",
            zone.name,
            current,
            zone.target_temperature,
            zone.hvac_mode,
            zone.preset,
            zone.output,
            if zone.trv_open { " trv-open" } else { "" },
            if zone.sensor_fault { " SENSOR-FAULT" } else { "" },
            if zone.control_fault { " CONTROL-FAULT" } else { "" },
        );
    }

    if !report.circuits.is_empty() {
        println!("Circuits:");
        for circuit in &report.circuits {
            let target = circuit
                .target_temperature
                .map(|t| format!("{:.1}", t))
                .unwrap_or_else(|| "mixed".to_string());
            println!(
                "  {:<16} target {} {}",
                circuit.name,
                target,
                if circuit.active { "active" } else { "idle" }
            );
        }
    }
}
