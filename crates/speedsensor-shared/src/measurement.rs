//! Wire model for the speedtest CLI's `--format=json` output.
//!
//! The tool writes one JSON object per message. A finished run is tagged
//! `"type": "result"`; everything else (`log`, `testStart`, progress
//! updates) is a failed attempt as far as the sensor is concerned.
//!
//! Sub-records are `Option` so that a result payload from an incompatible
//! tool version still deserializes; `normalize` decides what is missing.

use crate::error::AttemptFailure;
use serde::Deserialize;

/// Tag carried by a completed measurement.
pub const RESULT_KIND: &str = "result";

/// Complete measurement record as emitted by the tool.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementResult {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub ping: Option<PingStats>,
    #[serde(default)]
    pub download: Option<TransferStats>,
    #[serde(default)]
    pub upload: Option<TransferStats>,
    #[serde(default)]
    pub packet_loss: Option<f64>,
    #[serde(default)]
    pub isp: Option<String>,
    #[serde(default)]
    pub interface: Option<InterfaceInfo>,
    #[serde(default)]
    pub server: Option<ServerInfo>,
    #[serde(default)]
    pub result: Option<ResultLink>,
}

/// Latency figures in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PingStats {
    #[serde(default)]
    pub jitter: Option<f64>,
    #[serde(default)]
    pub latency: Option<f64>,
}

/// Download or upload phase. `bandwidth` is bytes per second.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TransferStats {
    #[serde(default)]
    pub bandwidth: Option<f64>,
    #[serde(default)]
    pub bytes: Option<u64>,
    #[serde(default)]
    pub elapsed: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceInfo {
    #[serde(default)]
    pub internal_ip: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mac_addr: Option<String>,
    #[serde(default)]
    pub is_vpn: Option<bool>,
    #[serde(default)]
    pub external_ip: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
}

/// Shareable result page published by the tool.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResultLink {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Minimal view used to classify any message the tool emits.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Classify the captured text of one attempt.
///
/// Returns the record only when it is tagged `result`. Merged stderr may
/// surround the JSON with plain log lines, so each line is tried on its own
/// after the whole text fails to parse.
pub fn classify_output(raw: &str) -> Result<MeasurementResult, AttemptFailure> {
    let candidates = json_candidates(raw);
    if candidates.is_empty() {
        return Err(AttemptFailure::Parse(describe_unparsable(raw)));
    }

    // A result anywhere in the output wins over earlier log/progress lines.
    let mut first_other: Option<AttemptFailure> = None;
    for value in candidates {
        let envelope: Envelope = match serde_json::from_value(value.clone()) {
            Ok(env) => env,
            Err(e) => {
                first_other.get_or_insert(AttemptFailure::Parse(e.to_string()));
                continue;
            }
        };

        match envelope.kind.as_deref() {
            Some(RESULT_KIND) => {
                return serde_json::from_value::<MeasurementResult>(value)
                    .map_err(|e| AttemptFailure::Parse(e.to_string()));
            }
            Some(kind) => {
                first_other.get_or_insert(AttemptFailure::WrongKind {
                    kind: kind.to_string(),
                    message: envelope.message,
                });
            }
            None => {
                first_other.get_or_insert(AttemptFailure::Parse(
                    "record has no \"type\" field".to_string(),
                ));
            }
        }
    }

    Err(first_other.unwrap_or_else(|| AttemptFailure::Parse(describe_unparsable(raw))))
}

/// JSON objects found in the text: the whole text if it parses, otherwise
/// every line that parses on its own.
fn json_candidates(raw: &str) -> Vec<serde_json::Value> {
    let trimmed = raw.trim();
    if let Ok(value @ serde_json::Value::Object(_)) =
        serde_json::from_str::<serde_json::Value>(trimmed)
    {
        return vec![value];
    }

    raw.lines()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .filter_map(|line| match serde_json::from_str::<serde_json::Value>(line) {
            Ok(value @ serde_json::Value::Object(_)) => Some(value),
            _ => None,
        })
        .collect()
}

fn describe_unparsable(raw: &str) -> String {
    let first = raw.lines().map(str::trim).find(|l| !l.is_empty());
    match first {
        Some(line) if line.len() > 120 => format!("{}...", truncate_at_char(line, 120)),
        Some(line) => line.to_string(),
        None => "empty output".to_string(),
    }
}

fn truncate_at_char(s: &str, max: usize) -> &str {
    let mut end = max.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{"type":"result","timestamp":"2024-03-01T10:00:00Z","ping":{"jitter":1.2,"latency":12.345},"download":{"bandwidth":125000000,"bytes":900000000,"elapsed":7000},"upload":{"bandwidth":62500000,"bytes":400000000,"elapsed":7000},"packetLoss":0.5,"isp":"ExampleNet","interface":{"internalIp":"10.0.0.2","name":"eth0","macAddr":"00:11:22:33:44:55","isVpn":false,"externalIp":"203.0.113.7"},"server":{"id":4242,"host":"speed.example.net","port":8080,"name":"ServerA","location":"CityX","country":"CountryY","ip":"198.51.100.1"},"result":{"id":"abc","url":"https://www.speedtest.net/result/c/abc"}}"#;

    #[test]
    fn test_classify_full_result() {
        let result = classify_output(SAMPLE).unwrap();
        assert_eq!(result.kind, "result");
        assert_eq!(result.download.as_ref().unwrap().bandwidth, Some(125_000_000.0));
        assert_eq!(result.packet_loss, Some(0.5));
        assert_eq!(result.interface.as_ref().unwrap().is_vpn, Some(false));
        assert_eq!(result.server.as_ref().unwrap().id, Some(4242));
    }

    #[test]
    fn test_classify_result_after_stderr_noise() {
        let raw = format!(
            "[2024-03-01 10:00:00.000] [warning] Configuration is stale\n{}\n",
            SAMPLE
        );
        assert!(classify_output(&raw).is_ok());
    }

    #[test]
    fn test_classify_log_message_is_wrong_kind() {
        let raw = r#"{"type":"log","timestamp":"2024-03-01T10:00:00Z","message":"Cannot open socket","level":"error"}"#;
        let failure = classify_output(raw).unwrap_err();
        assert_eq!(
            failure,
            AttemptFailure::WrongKind {
                kind: "log".to_string(),
                message: Some("Cannot open socket".to_string()),
            }
        );
    }

    #[test]
    fn test_classify_in_progress_is_wrong_kind() {
        let raw = r#"{"type":"inProgress"}"#;
        assert!(matches!(
            classify_output(raw),
            Err(AttemptFailure::WrongKind { ref kind, .. }) if kind == "inProgress"
        ));
    }

    #[test]
    fn test_classify_plain_text_is_parse_failure() {
        let raw = "speedtest: error while loading shared libraries";
        match classify_output(raw) {
            Err(AttemptFailure::Parse(detail)) => assert!(detail.contains("shared libraries")),
            other => panic!("expected parse failure, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_empty_output() {
        assert_eq!(
            classify_output("   \n"),
            Err(AttemptFailure::Parse("empty output".to_string()))
        );
    }

    #[test]
    fn test_classify_missing_type() {
        assert!(matches!(
            classify_output(r#"{"ping":{"latency":3.0}}"#),
            Err(AttemptFailure::Parse(_))
        ));
    }

    #[test]
    fn test_result_with_missing_subrecords_still_parses() {
        let result = classify_output(r#"{"type":"result","isp":"X"}"#).unwrap();
        assert!(result.download.is_none());
        assert!(result.server.is_none());
    }
}
