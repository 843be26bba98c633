//! Attribute read/write handlers.

use serde_json::{Map, Value};

use neviweb_core::Controller;

use crate::cli::{AttributesArgs, AttributesCommand, GlobalOpts};
use crate::error::CliError;

use super::{devices, util};

/// Parse `name=value` pairs into a JSON object.
///
/// Values that parse as JSON (`21.5`, `true`, `"auto"`, `{..}`) keep their
/// type; anything else is sent as a string.
fn parse_assignments(assignments: &[String]) -> Result<Map<String, Value>, CliError> {
    let mut map = Map::new();
    for item in assignments {
        let (name, raw) = item.split_once('=').ok_or_else(|| CliError::Validation {
            field: "assignment".into(),
            reason: format!("expected name=value, got '{item}'"),
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(CliError::Validation {
                field: "assignment".into(),
                reason: format!("missing attribute name in '{item}'"),
            });
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()));
        map.insert(name.to_owned(), value);
    }
    Ok(map)
}

fn parse_json_object(text: &str) -> Result<Value, CliError> {
    let value: Value = serde_json::from_str(text)?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(CliError::Validation {
            field: "json".into(),
            reason: "payload must be a JSON object".into(),
        })
    }
}

pub async fn handle(
    controller: &Controller,
    args: AttributesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        AttributesCommand::Get { device, attributes } => {
            let id = util::resolve_device(controller, &device)?.device.id;
            let names: Vec<&str> = attributes.iter().map(String::as_str).collect();
            let reply = controller
                .client()
                .get_device_attributes(id, &names)
                .await?;
            devices::print_attributes(util::reply_to_attributes(reply)?, global)
        }

        AttributesCommand::Set {
            device,
            assignments,
            json,
        } => {
            let snap = util::resolve_device(controller, &device)?;
            let payload = match json {
                Some(text) => parse_json_object(&text)?,
                None => Value::Object(parse_assignments(&assignments)?),
            };
            controller
                .set_device_attributes(snap.device.id, &payload)
                .await?;
            if !global.quiet {
                eprintln!("✓ Sent {payload} to '{}'", snap.device.name);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn assignments_keep_json_types() {
        let map = parse_assignments(&[
            "roomSetpoint=21.5".into(),
            "onOff=on".into(),
            "keypad=\"locked\"".into(),
            "backlight={\"level\":50}".into(),
        ])
        .expect("parse");
        assert_eq!(map["roomSetpoint"], json!(21.5));
        assert_eq!(map["onOff"], json!("on"));
        assert_eq!(map["keypad"], json!("locked"));
        assert_eq!(map["backlight"], json!({"level": 50}));
    }

    #[test]
    fn assignment_without_equals_is_rejected() {
        let err = parse_assignments(&["roomSetpoint".into()]).expect_err("should fail");
        assert!(matches!(err, CliError::Validation { .. }));
    }

    #[test]
    fn json_payload_must_be_an_object() {
        assert!(parse_json_object("{\"onOff\":\"off\"}").is_ok());
        assert!(matches!(
            parse_json_object("[1,2]"),
            Err(CliError::Validation { .. })
        ));
        assert!(matches!(parse_json_object("{"), Err(CliError::Json(_))));
    }
}
