use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::device::DeviceInfo;
use super::envelope::{EnvelopeTemplate, GeoFields, UploadAction, UploadEnvelope};

/// First message of every session: who the client is and where the device was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStartPayload {
    #[serde(flatten)]
    pub envelope: UploadEnvelope,
    pub client: Uuid,
    pub map_key: String,
    #[serde(flatten)]
    pub geo: GeoFields,
    pub os_version: String,
    pub device_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_identifier: Option<String>,
}

impl SessionStartPayload {
    pub fn new(
        template: &EnvelopeTemplate,
        client: Uuid,
        map_key: &str,
        geo: GeoFields,
        device: &DeviceInfo,
    ) -> Self {
        Self {
            envelope: template.envelope(UploadAction::SessionStart),
            client,
            map_key: map_key.to_string(),
            geo,
            os_version: device.os_version.clone(),
            device_type: device.model.clone(),
            device_identifier: device.identifier.clone(),
        }
    }
}
