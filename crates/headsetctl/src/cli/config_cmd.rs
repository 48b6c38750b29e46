//! `config` subcommand: show the effective configuration and file path,
//! optionally saving it.

use super::{ConfigOutput, Globals, Result, display_path, kv, kv_indent, kv_width, load_config, print_json};

pub(super) fn cmd_config(globals: &Globals, save: bool) -> Result<()> {
    let config = load_config(globals)?;
    let config_path = globals.config_file();

    if save {
        match &globals.config_path {
            Some(p) => config.save_to(p)?,
            None => config.save()?,
        }
        log::info!("saved configuration to {:?}", display_path(config_path.as_deref()));
    }

    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());

    if globals.json {
        let output = ConfigOutput {
            config_file: display_path(config_path.as_deref()),
            config_file_exists: config_exists,
            settings: config,
        };
        return print_json(&output);
    }

    // Human-readable output
    let w = kv_width(
        &["Config file:"],
        &[
            "timeout_ms:",
            "follow_interval_secs:",
            "device:",
            "test_device:",
            "test_profile:",
            "disambiguation:",
        ],
    );

    match &config_path {
        Some(p) => {
            if config_exists {
                let state = if save { "saved" } else { "loaded" };
                kv("Config file:", format_args!("{} ({state})", p.display()), w);
            } else {
                kv(
                    "Config file:",
                    format_args!("{} (not found, using defaults)", p.display()),
                    w,
                );
            }
        }
        None => kv("Config file:", "(no config directory)", w),
    }
    println!();

    println!("Settings:");
    kv_indent("timeout_ms:", config.timeout_ms, w);
    kv_indent("follow_interval_secs:", config.follow_interval_secs, w);
    let device = if config.device.is_empty() {
        "(all)"
    } else {
        config.device.as_str()
    };
    kv_indent("device:", device, w);
    kv_indent("test_device:", config.test_device, w);
    kv_indent("test_profile:", config.test_profile, w);
    kv_indent("disambiguation:", config.disambiguation, w);
    Ok(())
}
