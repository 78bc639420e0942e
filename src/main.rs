//! terralite - A deterministic 2D tile sandbox engine
//!
//! Headless runner: restores or creates a world, steps the session for a
//! number of ticks, and saves on exit.

use anyhow::Result;
use std::{env, path::PathBuf};
use terralite::config::SessionConfig;
use terralite::headless::{self, HeadlessConfig};
use tracing::info;

const DEFAULT_TICKS: u64 = 600;

#[derive(Debug, Default)]
struct CliOptions {
    config: Option<PathBuf>,
    seed: Option<u64>,
    save_dir: Option<PathBuf>,
    no_save: bool,
    ticks: Option<u64>,
    export: Option<PathBuf>,
    import: Option<PathBuf>,
    scripted_input: Option<PathBuf>,
    command_script: Option<PathBuf>,
    event_log: Option<PathBuf>,
    help: bool,
}

fn parse_u64(flag: &str, raw: Option<String>) -> Option<u64> {
    let Some(raw) = raw else {
        tracing::error!("{flag} requires an integer");
        return None;
    };
    match raw.parse::<u64>() {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::error!(%err, value = %raw, "{flag} must be an integer");
            None
        }
    }
}

fn parse_path(flag: &str, raw: Option<String>) -> Option<PathBuf> {
    if raw.is_none() {
        tracing::error!("{flag} requires a file path");
    }
    raw.map(PathBuf::from)
}

impl CliOptions {
    fn parse<I: Iterator<Item = String>>(mut args: I) -> Self {
        let mut opts = CliOptions::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => opts.config = parse_path(&arg, args.next()),
                "--seed" => opts.seed = parse_u64(&arg, args.next()),
                "--save-dir" => opts.save_dir = parse_path(&arg, args.next()),
                "--no-save" => opts.no_save = true,
                "--ticks" => opts.ticks = parse_u64(&arg, args.next()),
                "--export" => opts.export = parse_path(&arg, args.next()),
                "--import" => opts.import = parse_path(&arg, args.next()),
                "--scripted-input" => opts.scripted_input = parse_path(&arg, args.next()),
                "--command-script" => opts.command_script = parse_path(&arg, args.next()),
                "--event-log" => opts.event_log = parse_path(&arg, args.next()),
                "--help" | "-h" => opts.help = true,
                other => tracing::warn!(arg = %other, "Ignoring unknown argument"),
            }
        }
        opts
    }
}

fn print_help() {
    println!("terralite - headless session runner");
    println!();
    println!("Options:");
    println!("  --config <file>          Session config (default: config/session.toml)");
    println!("  --seed <number>          World seed for a fresh world");
    println!("  --save-dir <dir>         Save directory");
    println!("  --no-save                Keep saves in memory only");
    println!("  --ticks <number>         Ticks to simulate (default: {DEFAULT_TICKS})");
    println!("  --import <file>          Import a world bundle before running");
    println!("  --export <file>          Export a world bundle after running");
    println!("  --scripted-input <file>  JSON input steps");
    println!("  --command-script <file>  JSON tick-scheduled commands");
    println!("  --event-log <file>       Write session events as JSONL");
}

fn main() -> Result<()> {
    // Initialize tracing with WARN level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    info!("Starting terralite v{}", env!("CARGO_PKG_VERSION"));

    let cli = CliOptions::parse(env::args().skip(1));
    if cli.help {
        print_help();
        return Ok(());
    }

    let mut session = match &cli.config {
        Some(path) => SessionConfig::load_from_path(path),
        None => SessionConfig::load(),
    };
    if let Some(seed) = cli.seed {
        session.seed = seed;
    }
    if let Some(dir) = cli.save_dir {
        session.save_dir = Some(dir);
    }

    let summary = headless::run(HeadlessConfig {
        session,
        no_save: cli.no_save,
        ticks: cli.ticks.unwrap_or(DEFAULT_TICKS),
        scripted_input: cli.scripted_input,
        command_script: cli.command_script,
        import: cli.import,
        export: cli.export,
        event_log: cli.event_log,
    })?;

    let s = summary.snapshot;
    println!(
        "tick {} restored={} events={} player=({:.1}, {:.1}) on_ground={} tool={} slot={}",
        s.tick,
        summary.restored,
        summary.events,
        s.x,
        s.y,
        s.on_ground,
        s.tool.map(|t| t.name()).unwrap_or("none"),
        s.selected_slot
    );
    Ok(())
}
