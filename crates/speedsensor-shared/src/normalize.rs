//! Projection of a measurement into the six fixed sensor channels.

use crate::error::SensorError;
use crate::measurement::{MeasurementResult, ServerInfo};

/// Bytes per second in one megabit per second.
pub const BYTES_PER_MEGABIT: f64 = 125_000.0;

/// Highest precision the tool accepts.
pub const MAX_PRECISION: u8 = 8;

/// Sensor channels, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    DownloadSpeed,
    UploadSpeed,
    Latency,
    Jitter,
    PacketLoss,
    SpeedtestServer,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::DownloadSpeed,
        Channel::UploadSpeed,
        Channel::Latency,
        Channel::Jitter,
        Channel::PacketLoss,
        Channel::SpeedtestServer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::DownloadSpeed => "Download Speed",
            Channel::UploadSpeed => "Upload Speed",
            Channel::Latency => "Latency",
            Channel::Jitter => "Jitter",
            Channel::PacketLoss => "Packet Loss",
            Channel::SpeedtestServer => "Speedtest Server",
        }
    }
}

/// One channel reading.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub channel: Channel,
    pub value: f64,
    pub unit: String,
}

impl OutputRow {
    fn new(channel: Channel, value: f64, unit: impl Into<String>) -> Self {
        Self {
            channel,
            value,
            unit: unit.into(),
        }
    }
}

/// Round half away from zero at `precision` decimal places.
pub fn round_to(value: f64, precision: u8) -> f64 {
    let factor = 10f64.powi(i32::from(precision.min(MAX_PRECISION)));
    (value * factor).round() / factor
}

/// Build the six channel rows for a `result` record.
///
/// A missing `packetLoss` reads as 0; any other missing field means the
/// tool's output format changed and is reported as an unexpected shape.
pub fn normalize(result: &MeasurementResult, precision: u8) -> Result<[OutputRow; 6], SensorError> {
    if precision > MAX_PRECISION {
        return Err(SensorError::Config(format!(
            "precision {} is outside 0..={}",
            precision, MAX_PRECISION
        )));
    }

    let mut missing = Vec::new();

    let download = bandwidth(
        result.download.as_ref().map(|d| d.bandwidth),
        "download",
        &mut missing,
    );
    let upload = bandwidth(
        result.upload.as_ref().map(|u| u.bandwidth),
        "upload",
        &mut missing,
    );

    let (latency, jitter) = match result.ping.as_ref() {
        Some(ping) => (
            require(ping.latency, "ping.latency", &mut missing),
            require(ping.jitter, "ping.jitter", &mut missing),
        ),
        None => {
            missing.push("ping".to_string());
            (0.0, 0.0)
        }
    };

    let server_label = match result.server.as_ref() {
        Some(server) => server_label(server, &mut missing),
        None => {
            missing.push("server".to_string());
            String::new()
        }
    };

    if !missing.is_empty() {
        return Err(SensorError::UnexpectedResultShape { missing });
    }

    let packet_loss = result.packet_loss.unwrap_or(0.0);

    Ok([
        OutputRow::new(
            Channel::DownloadSpeed,
            round_to(download / BYTES_PER_MEGABIT, precision),
            "Mb/s",
        ),
        OutputRow::new(
            Channel::UploadSpeed,
            round_to(upload / BYTES_PER_MEGABIT, precision),
            "Mb/s",
        ),
        OutputRow::new(Channel::Latency, round_to(latency, precision), "ms"),
        OutputRow::new(Channel::Jitter, round_to(jitter, precision), "ms"),
        OutputRow::new(Channel::PacketLoss, round_to(packet_loss, precision), "%"),
        OutputRow::new(Channel::SpeedtestServer, 0.0, server_label),
    ])
}

fn bandwidth(field: Option<Option<f64>>, record: &str, missing: &mut Vec<String>) -> f64 {
    match field {
        Some(Some(value)) => value,
        Some(None) => {
            missing.push(format!("{}.bandwidth", record));
            0.0
        }
        None => {
            missing.push(record.to_string());
            0.0
        }
    }
}

fn require(field: Option<f64>, name: &str, missing: &mut Vec<String>) -> f64 {
    field.unwrap_or_else(|| {
        missing.push(name.to_string());
        0.0
    })
}

fn server_label(server: &ServerInfo, missing: &mut Vec<String>) -> String {
    let mut part = |value: &Option<String>, name: &str| match value {
        Some(v) => v.clone(),
        None => {
            missing.push(format!("server.{}", name));
            String::new()
        }
    };
    let name = part(&server.name, "name");
    let location = part(&server.location, "location");
    let country = part(&server.country, "country");
    format!("{} ({} - {})", name, location, country)
}
