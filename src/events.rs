//! Events emitted by the parameters service.
//!
//! Each event has a dotted name, optional parameters and the id of the device it
//! concerns. Sinks decide where events go: the log, a JSON lines stream, or a
//! channel for an embedding process.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Value, json};
use std::io::Write;
use std::sync::mpsc::Sender;

use crate::clock::ClockTime;
use crate::geo::Country;

/// Parameters of the `parameters.time.now` event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeNow {
    #[serde(flatten)]
    pub time: ClockTime,
    pub sunrise: i64,
    pub sunset: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParametersEvent {
    /// Sent every minute by the clock
    TimeNow(TimeNow),
    /// Sent on the minute of sunrise
    TimeSunrise,
    /// Sent on the minute of sunset
    TimeSunset,
    /// The device name changed
    HostnameUpdate { hostname: String },
    /// The country derived from the position changed
    CountryUpdate(Country),
}

impl ParametersEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ParametersEvent::TimeNow(_) => "parameters.time.now",
            ParametersEvent::TimeSunrise => "parameters.time.sunrise",
            ParametersEvent::TimeSunset => "parameters.time.sunset",
            ParametersEvent::HostnameUpdate { .. } => "parameters.hostname.update",
            ParametersEvent::CountryUpdate(_) => "parameters.country.update",
        }
    }

    pub fn params(&self) -> Value {
        match self {
            ParametersEvent::TimeNow(now) => serde_json::to_value(now).unwrap_or(Value::Null),
            ParametersEvent::TimeSunrise | ParametersEvent::TimeSunset => json!({}),
            ParametersEvent::HostnameUpdate { hostname } => json!({ "hostname": hostname }),
            ParametersEvent::CountryUpdate(country) => {
                serde_json::to_value(country).unwrap_or(Value::Null)
            }
        }
    }
}

/// An event ready to be delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub event: ParametersEvent,
    pub device_id: Option<String>,
}

impl Event {
    pub fn new(event: ParametersEvent) -> Self {
        Self {
            event,
            device_id: None,
        }
    }

    pub fn for_device(event: ParametersEvent, device_id: &str) -> Self {
        Self {
            event,
            device_id: Some(device_id.to_string()),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "event": self.event.name(),
            "params": self.event.params(),
            "device_id": self.device_id,
        })
    }
}

/// Destination of emitted events.
pub trait EventSink: Send {
    fn send(&mut self, event: Event) -> Result<()>;
}

/// Writes events to the log.
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn send(&mut self, event: Event) -> Result<()> {
        match &event.event {
            ParametersEvent::TimeNow(now) => {
                log_debug!("{} {}", event.event.name(), now.time.iso);
            }
            other => {
                log_decorated!("Event {} {}", other.name(), other.params());
            }
        }
        Ok(())
    }
}

/// Writes one JSON object per line.
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn send(&mut self, event: Event) -> Result<()> {
        let line = serde_json::to_string(&event.to_json())?;
        writeln!(self.writer, "{line}").context("Failed to write event")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Forwards events over a channel.
pub struct ChannelSink {
    sender: Sender<Event>,
}

impl ChannelSink {
    pub fn new(sender: Sender<Event>) -> Self {
        Self { sender }
    }
}

impl EventSink for ChannelSink {
    fn send(&mut self, event: Event) -> Result<()> {
        self.sender
            .send(event)
            .map_err(|_| anyhow::anyhow!("Event receiver disconnected"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_time() -> ClockTime {
        ClockTime {
            timestamp: 1_718_941_380,
            iso: "2024-06-21T04:43:00+01:00".to_string(),
            year: 2024,
            month: 6,
            day: 21,
            hour: 4,
            minute: 43,
            weekday: 4,
            weekday_literal: "friday".to_string(),
        }
    }

    #[test]
    fn test_time_now_serialization() {
        let event = Event::for_device(
            ParametersEvent::TimeNow(TimeNow {
                time: sample_time(),
                sunrise: 1_718_941_380,
                sunset: 1_719_001_500,
            }),
            "clock",
        );
        let json = event.to_json();

        assert_eq!(json["event"], "parameters.time.now");
        assert_eq!(json["device_id"], "clock");
        assert_eq!(json["params"]["hour"], 4);
        assert_eq!(json["params"]["weekday_literal"], "friday");
        assert_eq!(json["params"]["sunset"], 1_719_001_500);
    }

    #[test]
    fn test_hostname_update_params() {
        let event = ParametersEvent::HostnameUpdate {
            hostname: "kitchen".to_string(),
        };
        assert_eq!(event.name(), "parameters.hostname.update");
        assert_eq!(event.params(), json!({ "hostname": "kitchen" }));
    }

    #[test]
    fn test_country_update_params() {
        let event = ParametersEvent::CountryUpdate(Country::default());
        assert_eq!(
            event.params(),
            json!({ "country": "United Kingdom", "alpha2": "GB" })
        );
    }

    #[test]
    fn test_json_lines_sink() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.send(Event::new(ParametersEvent::TimeSunset)).unwrap();
        sink.send(Event::new(ParametersEvent::TimeSunrise)).unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "parameters.time.sunset");
        assert_eq!(first["device_id"], Value::Null);
    }

    #[test]
    fn test_channel_sink_disconnected() {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut sink = ChannelSink::new(tx);
        sink.send(Event::new(ParametersEvent::TimeSunrise)).unwrap();
        assert_eq!(rx.recv().unwrap().event, ParametersEvent::TimeSunrise);

        drop(rx);
        assert!(sink.send(Event::new(ParametersEvent::TimeSunrise)).is_err());
    }
}
