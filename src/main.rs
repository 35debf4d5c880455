// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;

use vehicle_inventory::{
    load_lenient, BadLinePolicy, ConfigOverrides, InventoryConfig, LoadMode, Shell,
};

#[derive(Parser)]
#[command(name = "vehicle-inventory", version, about = "Console vehicle inventory manager")]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Inventory file used when a save/load path is left blank
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    /// How a loaded file is combined with the live inventory
    #[arg(long, value_enum, global = true)]
    load_mode: Option<LoadMode>,

    /// What a load does with lines that are not valid vehicles
    #[arg(long, value_enum, global = true)]
    bad_lines: Option<BadLinePolicy>,

    /// Load the data file when the shell starts
    #[arg(long, global = true)]
    autoload: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive menu (default)
    Shell,
    /// Validate an inventory file and list every bad line
    Check { file: Option<PathBuf> },
    /// Browse an inventory file in a terminal table
    Browse { file: Option<PathBuf> },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let overrides = ConfigOverrides {
        data_file: cli.data_file,
        load_mode: cli.load_mode,
        bad_lines: cli.bad_lines,
        autoload: cli.autoload,
    };
    let config = InventoryConfig::resolve(cli.config.as_deref(), overrides)?;
    log::debug!("config: {:?}", config);

    match cli.command.unwrap_or(Command::Shell) {
        Command::Shell => run_shell(config),
        Command::Check { file } => run_check(file.unwrap_or(config.data_file)),
        Command::Browse { file } => run_browse(file.unwrap_or(config.data_file)),
    }
}

fn run_shell(config: InventoryConfig) -> Result<()> {
    let stdin = io::stdin();
    let mut shell = Shell::new(config, stdin.lock(), io::stdout());
    shell.run()
}

fn run_check(path: PathBuf) -> Result<()> {
    let report = load_lenient(&path)
        .with_context(|| format!("Failed to check {}", path.display()))?;

    println!("📂 {}", path.display());
    println!("✓ {} valid vehicle(s)", report.vehicles.len());
    for skipped in &report.skipped {
        println!("❌ {}", skipped);
    }

    if !report.is_clean() {
        bail!("{} bad line(s) in {}", report.skipped.len(), path.display());
    }
    Ok(())
}

#[cfg(feature = "tui")]
fn run_browse(path: PathBuf) -> Result<()> {
    let vehicles = vehicle_inventory::load(&path)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    let mut app = ui::App::new(vehicles, path.display().to_string());
    ui::run_ui(&mut app)
}

#[cfg(not(feature = "tui"))]
fn run_browse(_path: PathBuf) -> Result<()> {
    eprintln!("❌ Browse mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    std::process::exit(1);
}
