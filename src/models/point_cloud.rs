use serde::{Deserialize, Serialize};

use super::envelope::{EnvelopeTemplate, GeoFields, UploadAction, UploadEnvelope};
use super::geometry::Vector3;

/// Points accumulated between two point-cloud flushes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloudBatch {
    #[serde(flatten)]
    pub envelope: UploadEnvelope,
    pub points: Vec<Vector3>,
    #[serde(flatten)]
    pub geo: GeoFields,
    /// Flush counter within the session, starting at zero.
    pub seq: u64,
}

impl PointCloudBatch {
    pub fn new(template: &EnvelopeTemplate, seq: u64, points: Vec<Vector3>, geo: GeoFields) -> Self {
        Self {
            envelope: template.envelope(UploadAction::DataUpload),
            points,
            geo,
            seq,
        }
    }
}
