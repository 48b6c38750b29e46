//! `capabilities` subcommand: the capability table.

use serde::Serialize;

use super::{Capability, CapabilityKind, Result, print_json};

#[derive(Serialize)]
struct CapabilityJson {
    name: &'static str,
    cli_name: &'static str,
    short: Option<String>,
    kind: &'static str,
    min: Option<i32>,
    max: Option<i32>,
    values: &'static str,
    description: &'static str,
}

fn kind_label(kind: CapabilityKind) -> &'static str {
    match kind {
        CapabilityKind::Action => "action",
        CapabilityKind::Info => "info",
    }
}

fn rows() -> Vec<CapabilityJson> {
    Capability::ALL
        .into_iter()
        .map(|cap| {
            let info = cap.info();
            CapabilityJson {
                name: info.name,
                cli_name: info.cli_name,
                short: info.short.map(String::from),
                kind: kind_label(info.kind),
                min: info.range.map(|r| r.min),
                max: info.range.map(|r| r.max),
                values: info.value_hint,
                description: info.description,
            }
        })
        .collect()
}

pub(super) fn cmd_capabilities(json: bool) -> Result<()> {
    let rows = rows();
    if json {
        return print_json(&rows);
    }

    let name_w = rows.iter().map(|r| r.cli_name.len()).max().unwrap_or(0) + 2;
    let values_w = rows.iter().map(|r| r.values.len()).max().unwrap_or(0) + 2;
    for r in &rows {
        let short = r.short.as_deref().map(|s| format!("-{s}")).unwrap_or_default();
        println!(
            "  {:<name_w$}{short:<4}{:<8}{:<values_w$}{}",
            r.cli_name, r.kind, r.values, r.description
        );
    }
    Ok(())
}
