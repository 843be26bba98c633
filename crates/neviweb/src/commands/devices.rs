//! Device command handlers.

use std::sync::Arc;

use neviweb_api::ErrorCode;
use neviweb_core::{Controller, CoreError, DeviceSnapshot, RefreshOutcome};
use tabled::Tabled;

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Network")]
    network: String,
    #[tabled(rename = "Firmware")]
    firmware: String,
}

impl From<&Arc<DeviceSnapshot>> for DeviceRow {
    fn from(d: &Arc<DeviceSnapshot>) -> Self {
        let sig = d.device.signature.as_ref();
        Self {
            id: d.device.id,
            name: d.device.name.clone(),
            kind: d.kind.to_string(),
            model: sig.map(|s| s.model.to_string()).unwrap_or_default(),
            network: d
                .device
                .location_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            firmware: sig.map(|s| s.soft_version.to_string()).unwrap_or_default(),
        }
    }
}

fn detail(d: &Arc<DeviceSnapshot>) -> String {
    let sig = d.device.signature.as_ref();
    let mut lines = vec![
        format!("ID:        {}", d.device.id),
        format!("Name:      {}", d.device.name),
        format!("Kind:      {}", d.kind),
        format!(
            "Model:     {}",
            sig.map_or_else(|| "-".into(), |s| s.model.to_string())
        ),
        format!(
            "Firmware:  {}",
            sig.map_or_else(|| "-".into(), |s| s.soft_version.to_string())
        ),
        format!(
            "Updated:   {}",
            d.updated_at
                .map_or_else(|| "-".into(), |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        ),
    ];
    if !d.attributes.is_empty() {
        lines.push(String::new());
        lines.push(output::attribute_lines(&d.attributes));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List => {
            let devices = controller.store().snapshot();
            let out = output::render_list(&global.output, &devices, |d| DeviceRow::from(d), |d| {
                d.device.id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Get { device } => {
            let id = util::resolve_device(controller, &device)?.device.id;
            match controller.refresh_device(id).await? {
                RefreshOutcome::Rejected(code) => {
                    return Err(CliError::ApiError {
                        code: code.to_string(),
                        message: code.description().into(),
                    });
                }
                RefreshOutcome::Deactivated => {
                    let code = ErrorCode::DeviceUnavailable;
                    return Err(CliError::ApiError {
                        code: code.to_string(),
                        message: code.description().into(),
                    });
                }
                _ => {}
            }
            let snap = controller
                .store()
                .device(id)
                .ok_or(CoreError::DeviceNotFound { device_id: id })?;
            let out = output::render_single(&global.output, &snap, detail, |d| {
                d.device.id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Status { device } => {
            let id = util::resolve_device(controller, &device)?.device.id;
            let reply = controller.client().get_device_status(id).await?;
            print_attributes(util::reply_to_attributes(reply)?, global)
        }

        DevicesCommand::Alert { device } => {
            let id = util::resolve_device(controller, &device)?.device.id;
            let reply = controller.client().get_device_alert(id).await?;
            print_attributes(util::reply_to_attributes(reply)?, global)
        }

        DevicesCommand::ErrorCode { device } => {
            let id = util::resolve_device(controller, &device)?.device.id;
            let reply = controller.client().get_device_error_code(id).await?;
            print_attributes(util::reply_to_attributes(reply)?, global)
        }
    }
}

pub(super) fn print_attributes(
    attributes: serde_json::Map<String, serde_json::Value>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let out = output::render_single(&global.output, &attributes, output::attribute_lines, |m| {
        m.values()
            .map(output::display_value)
            .collect::<Vec<_>>()
            .join("\n")
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
