//! `devices` subcommand: list connected headsets.

use super::{
    Capability, DeviceJson, DevicesOutput, DiscoveredHeadset, Globals, Result, discover,
    load_config, open_backend, print_json, registry,
};

fn capability_names(h: &DiscoveredHeadset<'_>, test_profile: u8) -> Vec<&'static str> {
    let options = headsetctl_lib::context::DispatchOptions {
        test_profile,
        ..Default::default()
    };
    h.device
        .active_capabilities(&options)
        .iter()
        .map(Capability::cli_name)
        .collect()
}

pub(super) fn cmd_devices(globals: &Globals) -> Result<()> {
    let config = load_config(globals)?;
    let backend = open_backend(&config)?;
    let headsets = discover(backend.as_ref(), registry::initialize(), &config)?;

    if globals.json {
        let output = DevicesOutput {
            count: headsets.len(),
            devices: headsets
                .iter()
                .map(|h| DeviceJson::from_headset(h, capability_names(h, config.test_profile)))
                .collect(),
        };
        return print_json(&output);
    }

    if headsets.is_empty() {
        println!("No supported headset found.");
        return Ok(());
    }

    println!(
        "Found {} headset{}:",
        headsets.len(),
        if headsets.len() == 1 { "" } else { "s" }
    );
    println!();

    for (i, h) in headsets.iter().enumerate() {
        println!(
            "  [{}] {} ({}) [{:04x}:{:04x}]",
            i + 1,
            h.name(),
            h.vendor_name(),
            h.vendor_id,
            h.product_id
        );
        if let Some(product) = h.product_string() {
            println!("      Product: {product}");
        }
        println!("      Platforms: {}", h.device.platforms());
        println!(
            "      Capabilities: {}",
            capability_names(h, config.test_profile).join(", ")
        );
        if let Some(eq) = h.device.equalizer_info() {
            println!(
                "      Equalizer: {} bands, {} to {} dB in {} dB steps",
                eq.bands_count, eq.min, eq.max, eq.step
            );
        }
        let presets = h.device.equalizer_presets();
        if !presets.is_empty() {
            let names: Vec<&str> = presets.iter().map(|p| p.name.as_str()).collect();
            println!("      Presets: {}", names.join(", "));
        }
    }

    Ok(())
}
