//! Shared helpers for command handlers.

use std::sync::Arc;

use neviweb_api::AttributeReply;
use neviweb_core::{Controller, DeviceSnapshot};

use crate::error::CliError;

/// Resolve a device identifier (numeric ID or case-insensitive name).
pub fn resolve_device(
    controller: &Controller,
    identifier: &str,
) -> Result<Arc<DeviceSnapshot>, CliError> {
    controller
        .store()
        .snapshot()
        .into_iter()
        .find(|d| {
            d.device.id.to_string() == identifier || d.device.name.eq_ignore_ascii_case(identifier)
        })
        .ok_or_else(|| CliError::NotFound {
            resource_type: "device".into(),
            identifier: identifier.into(),
            list_command: "devices list".into(),
        })
}

/// Turn an in-band reply into attributes or a user-facing error.
pub fn reply_to_attributes(
    reply: AttributeReply,
) -> Result<serde_json::Map<String, serde_json::Value>, CliError> {
    match reply {
        AttributeReply::Attributes(map) => Ok(map),
        AttributeReply::ReadTimeout => Err(CliError::ApiError {
            code: "ReadTimeout".into(),
            message: "the gateway did not answer in time; try again".into(),
        }),
        AttributeReply::Error(err) => Err(CliError::ApiError {
            code: err.code.to_string(),
            message: err.code.description().into(),
        }),
    }
}
