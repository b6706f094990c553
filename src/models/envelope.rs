use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Protocol version reported in every payload's `map_version` field.
pub const DEFAULT_MAP_VERSION: &str = "Unity-0.9.1";

/// Collection endpoint used when the host does not configure one.
pub const DEFAULT_ENDPOINT: &str = "https://upload.mapcha.in/v1/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadAction {
    SessionStart,
    DataUpload,
    PlaneUpload,
}

/// Fields shared by every outbound message. Flattened into each payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadEnvelope {
    pub action: UploadAction,
    pub map_version: String,
    pub host: String,
    pub session: Uuid,
}

/// Stamps envelopes for one session; every payload a pipeline builds goes through
/// the same template so `session` cannot drift from the active session.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeTemplate {
    pub map_version: String,
    pub endpoint: String,
    pub session_id: Uuid,
}

impl EnvelopeTemplate {
    pub fn envelope(&self, action: UploadAction) -> UploadEnvelope {
        UploadEnvelope {
            action,
            map_version: self.map_version.clone(),
            host: self.endpoint.clone(),
            session: self.session_id,
        }
    }
}

/// Location and heading fields repeated across session-start and point-cloud payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoFields {
    pub heading_accuracy: f32,
    pub heading: f32,
    pub lat: f32,
    pub lon: f32,
    pub gps_accuracy: f32,
    pub gps_timestamp: f64,
    pub altitude: f32,
}
