//! Get command: print parameters in human-readable or JSON form.

use anyhow::Result;
use serde_json::{Map, Value, json};

use crate::constants::EXIT_FAILURE;
use crate::events::LogSink;
use crate::parameters::ModuleConfig;

/// Fields `get` understands, in output order.
pub const FIELD_NAMES: [&str; 8] = [
    "hostname",
    "latitude",
    "longitude",
    "timezone",
    "country",
    "alpha2",
    "sunrise",
    "sunset",
];

/// Handle the get command.
///
/// `fields` may be the single value `all`.
pub fn handle_get_command(fields: &[String], json: bool) -> Result<()> {
    let unknown: Vec<&String> = fields
        .iter()
        .filter(|f| f.as_str() != "all" && !FIELD_NAMES.contains(&f.as_str()))
        .collect();
    if !unknown.is_empty() {
        report_unknown_fields(&unknown, json)?;
        std::process::exit(EXIT_FAILURE);
    }

    let service = super::open_service(Box::new(LogSink))?;
    let config = service.get_module_config();

    let wanted: Vec<&str> = if fields.iter().any(|f| f == "all") {
        FIELD_NAMES.to_vec()
    } else {
        fields.iter().map(String::as_str).collect()
    };

    if json {
        let mut object = Map::new();
        for field in &wanted {
            object.insert(field.to_string(), field_value(&config, field));
        }
        println!("{}", serde_json::to_string(&object)?);
    } else if wanted.len() == 1 && fields.len() == 1 && fields[0] != "all" {
        println!("{}", format_value(&field_value(&config, wanted[0])));
    } else {
        for field in wanted {
            println!("{}={}", field, format_value(&field_value(&config, field)));
        }
    }

    Ok(())
}

fn report_unknown_fields(unknown: &[&String], json: bool) -> Result<()> {
    let names: Vec<&str> = unknown.iter().map(|f| f.as_str()).collect();
    if json {
        let error = json!({
            "error": format!("Unknown field: {}", names.join(", ")),
            "type": "UnknownField",
            "available": FIELD_NAMES,
        });
        eprintln!("{}", serde_json::to_string(&error)?);
    } else {
        log_pipe!();
        log_error!("Unknown field: '{}'", names.join("', '"));
        log_block_start!("Available fields:");
        log_indented!("all (special: returns all fields)");
        log_indented!("{}", FIELD_NAMES.join(", "));
        log_end!();
    }
    Ok(())
}

/// Value of one field. Unset values are `null`.
pub fn field_value(config: &ModuleConfig, field: &str) -> Value {
    match field {
        "hostname" => json!(config.hostname),
        "latitude" => json!(config.position.latitude),
        "longitude" => json!(config.position.longitude),
        "timezone" => json!(config.timezone),
        "country" => json!(config.country.country),
        "alpha2" => json!(config.country.alpha2),
        "sunrise" => sun_value(config.sun.sunrise, &config.sun.sunrise_iso),
        "sunset" => sun_value(config.sun.sunset, &config.sun.sunset_iso),
        _ => Value::Null,
    }
}

fn sun_value(timestamp: i64, iso: &str) -> Value {
    if timestamp == 0 {
        Value::Null
    } else {
        json!(iso)
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn show_usage() {
    log_version!();
    log_block_start!("Usage: devparams get [OPTIONS] <field> [<field>...]");
    log_block_start!("Options:");
    log_indented!("-j, --json           Output in JSON format");
    log_block_start!("Arguments:");
    log_indented!("<field>              Field(s) to retrieve, or 'all'");
    log_block_start!("For detailed help with examples, try: devparams help get");
    log_end!();
}

pub fn display_help() {
    log_version!();
    log_block_start!("get - Read device parameters");
    log_block_start!("Usage: devparams get [OPTIONS] <field> [<field>...]");
    log_block_start!("Options:");
    log_indented!("-j, --json           Output in JSON format");
    log_block_start!("Available Fields:");
    log_indented!("hostname             Device name");
    log_indented!("latitude             Latitude (-90 to 90)");
    log_indented!("longitude            Longitude (-180 to 180)");
    log_indented!("timezone             Timezone derived from the position");
    log_indented!("country              Country derived from the position");
    log_indented!("alpha2               ISO 3166 country code");
    log_indented!("sunrise              Today's sunrise (ISO 8601)");
    log_indented!("sunset               Today's sunset (ISO 8601)");
    log_block_start!("Examples:");
    log_indented!("devparams get timezone");
    log_indented!("Europe/London");
    log_pipe!();
    log_indented!("devparams get --json latitude longitude");
    log_indented!("{{\"latitude\":52.204,\"longitude\":0.1208}}");
    log_end!();
}
