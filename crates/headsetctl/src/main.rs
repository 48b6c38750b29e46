//! headsetctl: query and configure USB and wireless gaming headsets.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

mod cli;

/// Shared shutdown flag, set by the Ctrl+C handler.
pub static RUNNING: AtomicBool = AtomicBool::new(true);

#[derive(Parser)]
#[command(
    name = "headsetctl",
    version,
    about = "Control sidetone, battery, equalizer and more on USB headsets"
)]
struct Args {
    /// Output as JSON (for devices, capabilities, status, set, config, connected)
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only use the headset with this vendorid:productid (hex)
    #[arg(short, long, global = true, value_name = "VID:PID")]
    device: Option<String>,

    /// Add the virtual test headset, optionally with a profile: `--test-device=10`
    #[arg(
        long,
        global = true,
        value_name = "PROFILE",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "0"
    )]
    test_device: Option<u8>,

    /// HID read timeout in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    timeout: Option<i32>,

    /// Use this config file instead of the default one
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: cli::Command,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .init();

    ctrlc::set_handler(move || {
        RUNNING.store(false, Ordering::SeqCst);
    })
    .ok();

    let globals = cli::Globals {
        json: args.json,
        device: args.device,
        test_device: args.test_device,
        timeout_ms: args.timeout,
        config_path: args.config,
    };

    if let Err(e) = cli::run(args.command, &globals) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
