//! Command surface of the parameters service.
//!
//! Host callers send `{"command": "<name>", "params": {...}}` and get a JSON
//! response back; [`Command::from_json`] and [`dispatch`] implement that. The CLI
//! subcommands in the submodules are thin wrappers over the same operations.

pub mod call;
pub mod get;
pub mod help;
pub mod set;
pub mod sun;
pub mod sync_time;

use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;

use crate::config::FileStore;
use crate::error::ParameterError;
use crate::events::EventSink;
use crate::parameters::Parameters;
use crate::system::Console;
use crate::time_source::RealTimeSource;

/// A request to the service.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    GetModuleConfig,
    GetModuleDevices,
    SetHostname { hostname: String },
    GetHostname,
    SetPosition { latitude: f64, longitude: f64 },
    GetPosition,
    GetSun,
    SetSun,
    SetCountry,
    GetCountry,
    SetTimezone,
    GetTimezone,
    SyncTime,
}

/// Names accepted in the `command` field.
pub const COMMAND_NAMES: [&str; 13] = [
    "get_module_config",
    "get_module_devices",
    "set_hostname",
    "get_hostname",
    "set_position",
    "get_position",
    "get_sun",
    "set_sun",
    "set_country",
    "get_country",
    "set_timezone",
    "get_timezone",
    "sync_time",
];

fn required<'a>(params: &'a Map<String, Value>, name: &str) -> Result<&'a Value, ParameterError> {
    match params.get(name) {
        None | Some(Value::Null) => Err(ParameterError::missing(name)),
        Some(value) => Ok(value),
    }
}

fn required_f64(params: &Map<String, Value>, name: &str) -> Result<f64, ParameterError> {
    required(params, name)?
        .as_f64()
        .ok_or_else(|| ParameterError::invalid(format!("Parameter \"{name}\" is invalid")))
}

fn required_str(params: &Map<String, Value>, name: &str) -> Result<String, ParameterError> {
    required(params, name)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ParameterError::invalid(format!("Parameter \"{name}\" is invalid")))
}

impl Command {
    /// Parse a `{"command", "params"}` request.
    pub fn from_json(request: &Value) -> Result<Self, ParameterError> {
        let name = request
            .get("command")
            .ok_or_else(|| ParameterError::missing("command"))?
            .as_str()
            .ok_or_else(|| ParameterError::invalid("Parameter \"command\" is invalid"))?;

        let empty = Map::new();
        let params = match request.get("params") {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(map)) => map,
            Some(_) => return Err(ParameterError::invalid("Parameter \"params\" is invalid")),
        };

        let command = match name {
            "get_module_config" => Command::GetModuleConfig,
            "get_module_devices" => Command::GetModuleDevices,
            "set_hostname" => Command::SetHostname {
                hostname: required_str(params, "hostname")?,
            },
            "get_hostname" => Command::GetHostname,
            "set_position" => Command::SetPosition {
                latitude: required_f64(params, "latitude")?,
                longitude: required_f64(params, "longitude")?,
            },
            "get_position" => Command::GetPosition,
            "get_sun" => Command::GetSun,
            "set_sun" => Command::SetSun,
            "set_country" => Command::SetCountry,
            "get_country" => Command::GetCountry,
            "set_timezone" => Command::SetTimezone,
            "get_timezone" => Command::GetTimezone,
            "sync_time" => Command::SyncTime,
            other => {
                return Err(ParameterError::invalid(format!(
                    "Unknown command \"{other}\""
                )));
            }
        };
        Ok(command)
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Run `command` on the service and return its result as JSON.
pub fn dispatch(service: &mut Parameters, command: Command) -> Result<Value> {
    log_debug!("Dispatching {command:?}");
    match command {
        Command::GetModuleConfig => to_json(service.get_module_config()),
        Command::GetModuleDevices => to_json(service.get_module_devices()),
        Command::SetHostname { hostname } => to_json(service.set_hostname(&hostname)?),
        Command::GetHostname => to_json(service.get_hostname()),
        Command::SetPosition {
            latitude,
            longitude,
        } => {
            service.set_position(latitude, longitude)?;
            Ok(Value::Null)
        }
        Command::GetPosition => to_json(service.get_position()),
        Command::GetSun => to_json(service.get_sun()),
        Command::SetSun => {
            service.set_sun()?;
            Ok(Value::Null)
        }
        Command::SetCountry => {
            service.set_country()?;
            Ok(Value::Null)
        }
        Command::GetCountry => to_json(service.get_country()),
        Command::SetTimezone => to_json(service.set_timezone()?),
        Command::GetTimezone => to_json(service.get_timezone()),
        Command::SyncTime => to_json(service.sync_time()?),
    }
}

/// JSON body of a failed command: `{"error": message, "type": kind}`.
///
/// Errors that are not a [`ParameterError`] are reported as `CommandError`.
pub fn error_response(error: &anyhow::Error) -> Value {
    match error.downcast_ref::<ParameterError>() {
        Some(typed) => json!({ "error": typed.to_string(), "type": typed.kind() }),
        None => json!({ "error": format!("{error:#}"), "type": "CommandError" }),
    }
}

/// Parse and run one request, always producing a JSON response.
pub fn respond(service: &mut Parameters, request: &Value) -> Value {
    let result = Command::from_json(request)
        .map_err(anyhow::Error::from)
        .and_then(|command| dispatch(service, command));
    match result {
        Ok(data) => json!({ "data": data }),
        Err(e) => error_response(&e),
    }
}

/// Build the service on the settings file with the real clock and console.
pub(crate) fn open_service(events: Box<dyn EventSink>) -> Result<Parameters> {
    let store = FileStore::open_default()?;
    log_debug!("Using settings file {}", store.path().display());
    let mut service = Parameters::new(
        Box::new(store),
        Arc::new(RealTimeSource),
        Box::new(Console),
        events,
    )?;
    service.configure()?;
    Ok(service)
}
