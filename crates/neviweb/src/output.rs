//! Rendering of command results in the `--output` format.
//!
//! Lists become a `tabled` table, single items a hand-formatted detail
//! block. The structured formats serialize the domain value itself, so
//! JSON and YAML carry every field, not just the table columns.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::{Map, Value};
use tabled::{Table, Tabled, settings::Style};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Render a collection: one table row, or one plain line, per item.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    plain_line: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let mut table = Table::new(data.iter().map(to_row));
            table.with(Style::rounded());
            Ok(table.to_string())
        }
        OutputFormat::Plain => Ok(data.iter().map(plain_line).collect::<Vec<_>>().join("\n")),
        structured => serialize(structured, data),
    }
}

/// Render one item: `detail` for tables, `plain` for scripting.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail: impl Fn(&T) -> String,
    plain: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize + ?Sized,
{
    match format {
        OutputFormat::Table => Ok(detail(data)),
        OutputFormat::Plain => Ok(plain(data)),
        structured => serialize(structured, data),
    }
}

fn serialize<T: Serialize + ?Sized>(format: &OutputFormat, data: &T) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        _ => serde_json::to_string_pretty(data)?,
    })
}

/// Device attributes as aligned `name  value` lines.
pub fn attribute_lines(map: &Map<String, Value>) -> String {
    let width = map.keys().map(String::len).max().unwrap_or(0);
    map.iter()
        .map(|(name, value)| format!("{name:<width$}  {}", display_value(value)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strings unquoted, null as `-`, anything else as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".into(),
        other => other.to_string(),
    }
}

/// Write rendered output to stdout unless `--quiet` was given.
pub fn print_output(rendered: &str, quiet: bool) {
    if quiet || rendered.is_empty() {
        return;
    }
    let _ = writeln!(io::stdout().lock(), "{rendered}");
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn attribute_lines_align_names() {
        let map = json!({"roomSetpoint": 21.5, "mode": "auto", "alarm": null});
        let Value::Object(map) = map else {
            unreachable!()
        };
        let text = attribute_lines(&map);
        assert!(text.contains("roomSetpoint  21.5"));
        assert!(text.contains("mode          auto"));
        assert!(text.contains("alarm         -"));
    }

    #[test]
    fn single_item_in_structured_formats() {
        let value = json!({"onOff": "on"});
        let compact = render_single(&OutputFormat::JsonCompact, &value, |_| String::new(), |_| {
            String::new()
        })
        .expect("json");
        assert_eq!(compact, r#"{"onOff":"on"}"#);

        let yaml = render_single(&OutputFormat::Yaml, &value, |_| String::new(), |_| String::new())
            .expect("yaml");
        assert_eq!(yaml.trim(), "onOff: on");
    }
}
