//! Network (location) command handlers.

use neviweb_api::{Location, OccupancyMode};
use neviweb_core::Controller;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{GlobalOpts, NetworksArgs, NetworksCommand, OccupancyArg};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct NetworkView {
    id: u64,
    name: String,
    mode: Option<String>,
    slot: Option<&'static str>,
}

#[derive(Tabled)]
struct NetworkRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Selected")]
    slot: String,
}

impl From<&NetworkView> for NetworkRow {
    fn from(n: &NetworkView) -> Self {
        Self {
            id: n.id,
            name: n.name.clone(),
            mode: n.mode.clone().unwrap_or_else(|| "-".into()),
            slot: n.slot.unwrap_or("").into(),
        }
    }
}

fn view(location: &Location, controller: &Controller) -> NetworkView {
    let selection = controller.networks();
    let slot = [
        (&selection.primary, "primary"),
        (&selection.secondary, "secondary"),
        (&selection.tertiary, "tertiary"),
    ]
    .into_iter()
    .find(|(sel, _)| sel.as_ref().is_some_and(|l| l.id == location.id))
    .map(|(_, name)| name);

    NetworkView {
        id: location.id,
        name: location.name.clone(),
        mode: location.mode.as_ref().map(|m| m.as_str().to_owned()),
        slot,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: NetworksArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        NetworksCommand::List => {
            let locations = controller.client().list_locations().await?;
            let views: Vec<NetworkView> = locations.iter().map(|l| view(l, controller)).collect();
            let out = output::render_list(&global.output, &views, |n| NetworkRow::from(n), |n| {
                n.id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NetworksCommand::Notifications { network } => {
            let id = controller.resolve_network(&network)?;
            let notes = controller.client().get_location_notifications(id).await?;
            let out = output::render_single(
                &global.output,
                &notes,
                |n| {
                    if n.is_empty() {
                        "No notifications".into()
                    } else {
                        n.iter()
                            .map(|v| serde_json::to_string(v).unwrap_or_default())
                            .collect::<Vec<_>>()
                            .join("\n")
                    }
                },
                |n| n.len().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NetworksCommand::Occupancy { network, mode } => {
            let mode = match mode {
                OccupancyArg::Home => OccupancyMode::Home,
                OccupancyArg::Away => OccupancyMode::Away,
            };
            controller.set_occupancy_mode(&network, &mode).await?;
            if !global.quiet {
                eprintln!("✓ Network '{network}' set to {}", mode.as_str());
            }
            Ok(())
        }
    }
}
