//! Data models for the analysis queue.
//!
//! This module contains the records tracked by the store, the persisted
//! aggregate, and the lenient decoding used when restoring it.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use tracing::warn;
use uuid::Uuid;

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Maximum number of analyses kept in the queue.
pub const MAX_ANALYSES: usize = 20;

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Workflow state of an analysis.
///
/// Known values map to the five dashboard states. Anything else is kept
/// verbatim in `Unrecognized` and displayed as pending.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum AnalysisStatus {
    #[default]
    Pending,
    /// Legacy label for a running analysis.
    InProgress,
    Running,
    Completed,
    Failed,
    Unrecognized(String),
}

impl AnalysisStatus {
    /// Wire string used in the persisted blob and event payloads.
    pub fn as_str(&self) -> &str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::InProgress => "in-progress",
            AnalysisStatus::Running => "running",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
            AnalysisStatus::Unrecognized(s) => s,
        }
    }

    /// Display metadata for this status.
    pub fn info(&self) -> &'static StatusInfo {
        match self {
            AnalysisStatus::Pending | AnalysisStatus::Unrecognized(_) => &PENDING_INFO,
            AnalysisStatus::InProgress => &IN_PROGRESS_INFO,
            AnalysisStatus::Running => &RUNNING_INFO,
            AnalysisStatus::Completed => &COMPLETED_INFO,
            AnalysisStatus::Failed => &FAILED_INFO,
        }
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for AnalysisStatus {
    fn from(s: &str) -> Self {
        match s {
            "pending" => AnalysisStatus::Pending,
            "in-progress" => AnalysisStatus::InProgress,
            "running" => AnalysisStatus::Running,
            "completed" => AnalysisStatus::Completed,
            "failed" => AnalysisStatus::Failed,
            other => AnalysisStatus::Unrecognized(other.to_string()),
        }
    }
}

impl Serialize for AnalysisStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AnalysisStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(AnalysisStatus::from(raw.as_str()))
    }
}

/// Presentation tokens for a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusInfo {
    pub text: &'static str,
    pub color: &'static str,
    pub bg_color: &'static str,
    pub icon: &'static str,
}

impl StatusInfo {
    /// Look up display info by raw status string. Unknown input yields the
    /// pending entry.
    pub fn for_status(status: &str) -> &'static StatusInfo {
        AnalysisStatus::from(status).info()
    }
}

pub const PENDING_INFO: StatusInfo = StatusInfo {
    text: "Pending",
    color: "text-gray-500",
    bg_color: "bg-gray-500",
    icon: "fas fa-clock",
};

pub const IN_PROGRESS_INFO: StatusInfo = StatusInfo {
    text: "In-Progress",
    color: "text-orange-500",
    bg_color: "bg-orange-500",
    icon: "fas fa-spinner fa-spin",
};

pub const RUNNING_INFO: StatusInfo = StatusInfo {
    text: "Running",
    color: "text-blue-500",
    bg_color: "bg-blue-500",
    icon: "fas fa-play",
};

pub const COMPLETED_INFO: StatusInfo = StatusInfo {
    text: "Completed",
    color: "text-green-500",
    bg_color: "bg-green-500",
    icon: "fas fa-check",
};

pub const FAILED_INFO: StatusInfo = StatusInfo {
    text: "Failed",
    color: "text-red-500",
    bg_color: "bg-red-500",
    icon: "fas fa-exclamation-triangle",
};

/// One user-initiated analytics request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    /// Unique within the store.
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_title")]
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_status")]
    pub status: AnalysisStatus,
    /// Creation time.
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub timestamp: Timestamp,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub indication: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub analysis_type: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_text"
    )]
    pub indication_display_name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_text"
    )]
    pub analysis_display_name: Option<String>,
    /// Percentage, present once the analysis has started.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_progress"
    )]
    pub progress: Option<u8>,
    /// Set on every status change.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_timestamp"
    )]
    pub last_updated: Option<Timestamp>,
}

impl Analysis {
    /// Create a pending analysis for an indication/analysis-type pair.
    pub fn new(
        indication: &str,
        indication_display_name: &str,
        analysis_type: &str,
        analysis_display_name: &str,
        now: Timestamp,
    ) -> Self {
        Self {
            id: generate_analysis_id(now),
            title: format!("{} - {}", indication_display_name, analysis_display_name),
            status: AnalysisStatus::Pending,
            timestamp: now,
            indication: Some(indication.to_string()),
            analysis_type: Some(analysis_type.to_string()),
            indication_display_name: Some(indication_display_name.to_string()),
            analysis_display_name: Some(analysis_display_name.to_string()),
            progress: Some(0),
            last_updated: None,
        }
    }

    fn demo(id: &str, title: &str, status: AnalysisStatus, timestamp: Timestamp) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            status,
            timestamp,
            indication: None,
            analysis_type: None,
            indication_display_name: None,
            analysis_display_name: None,
            progress: None,
            last_updated: None,
        }
    }
}

/// Build a fresh id: `analysis_<millis>_<9 random chars>`.
pub fn generate_analysis_id(now: Timestamp) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("analysis_{}_{}", now, &random[..9])
}

/// Clamp a progress percentage into 0..=100.
pub fn clamp_progress(progress: u8) -> u8 {
    progress.min(100)
}

// Restored records keep whatever fields they can: a null or mistyped value
// falls back to that field's default instead of rejecting the record.

/// Integer millis, or a float truncated toward zero.
fn json_timestamp(value: &Value) -> Option<Timestamp> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}

fn deserialize_progress<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(raw
        .as_f64()
        .filter(|p| !p.is_nan())
        .map(|p| p.clamp(0.0, 100.0) as u8))
}

fn deserialize_title<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(deserialize_text(deserializer)?.unwrap_or_default())
}

fn deserialize_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn deserialize_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<AnalysisStatus, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => AnalysisStatus::from(s.as_str()),
        _ => AnalysisStatus::default(),
    })
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
    Ok(deserialize_optional_timestamp(deserializer)?.unwrap_or_default())
}

fn deserialize_optional_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Timestamp>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(json_timestamp(&raw))
}

/// The complete persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    /// Most recently added first.
    pub analyses: Vec<Analysis>,
    pub current_session: Option<String>,
    pub last_updated: Timestamp,
    pub sidebar_collapsed: bool,
}

impl Aggregate {
    /// The demo aggregate used on first run.
    pub fn seed(now: Timestamp) -> Self {
        let mut enhertu = Analysis::demo(
            "demo_4",
            "What share of patients get treated on Enhertu?",
            AnalysisStatus::Completed,
            now - 12 * HOUR_MS,
        );
        enhertu.indication = Some("Breast Cancer".to_string());
        enhertu.analysis_type = Some("market-access".to_string());

        Self {
            analyses: vec![
                Analysis::demo("demo_1", "5 payers?", AnalysisStatus::Completed, now - DAY_MS),
                Analysis::demo(
                    "demo_2",
                    "What are the top reasons for denials within UHC?",
                    AnalysisStatus::InProgress,
                    now - 2 * HOUR_MS,
                ),
                Analysis::demo(
                    "demo_3",
                    "Market Structure analysis",
                    AnalysisStatus::Completed,
                    now - 6 * HOUR_MS,
                ),
                enhertu,
            ],
            current_session: None,
            last_updated: now,
            sidebar_collapsed: false,
        }
    }

    /// Best-effort restore of a persisted blob.
    ///
    /// The blob must be a JSON object; each top-level field is then decoded
    /// on its own and replaced by its default when missing or malformed.
    /// Returns `None` when the blob cannot be used at all.
    pub fn decode_lenient(blob: &str, now: Timestamp) -> Option<Self> {
        let value: Value = match serde_json::from_str(blob) {
            Ok(v) => v,
            Err(e) => {
                warn!("Failed to parse stored analytics state: {}", e);
                return None;
            }
        };

        let Value::Object(fields) = value else {
            warn!("Stored analytics state is not a JSON object, ignoring it");
            return None;
        };

        let analyses = match fields.get("analyses") {
            Some(Value::Array(items)) => decode_analyses(items),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                warn!("Stored analyses field has unexpected type: {}", other);
                Vec::new()
            }
        };

        let current_session = match fields.get("currentSession") {
            Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
            _ => None,
        };

        let last_updated = fields
            .get("lastUpdated")
            .and_then(json_timestamp)
            .filter(|ts| *ts != 0)
            .unwrap_or(now);

        let sidebar_collapsed = fields
            .get("sidebarCollapsed")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Some(Self {
            analyses,
            current_session,
            last_updated,
            sidebar_collapsed,
        })
    }
}

fn decode_analyses(items: &[Value]) -> Vec<Analysis> {
    let mut seen = HashSet::new();
    let mut analyses = Vec::with_capacity(items.len().min(MAX_ANALYSES));

    for item in items {
        match serde_json::from_value::<Analysis>(item.clone()) {
            Ok(analysis) => {
                if !seen.insert(analysis.id.clone()) {
                    warn!("Dropping duplicate stored analysis {}", analysis.id);
                    continue;
                }
                analyses.push(analysis);
            }
            Err(e) => warn!("Dropping malformed stored analysis: {}", e),
        }
    }

    analyses.truncate(MAX_ANALYSES);
    analyses
}
