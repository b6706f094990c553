use serde::{Deserialize, Serialize};

use super::envelope::{EnvelopeTemplate, UploadAction, UploadEnvelope};
use super::geometry::{Quaternion, Vector2, Vector3};

/// Plane orientation class, sent as its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum PlaneAlignment {
    Horizontal,
    Vertical,
}

impl From<PlaneAlignment> for i32 {
    fn from(value: PlaneAlignment) -> Self {
        match value {
            PlaneAlignment::Horizontal => 0,
            PlaneAlignment::Vertical => 1,
        }
    }
}

impl TryFrom<i32> for PlaneAlignment {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PlaneAlignment::Horizontal),
            1 => Ok(PlaneAlignment::Vertical),
            other => Err(format!("unknown plane alignment {other}")),
        }
    }
}

/// One tracked plane as it looked at flush time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaneSnapshot {
    pub plane_id: String,
    pub position: Vector3,
    pub rotation: Quaternion,
    #[serde(rename = "locPosition")]
    pub local_position: Vector3,
    #[serde(rename = "locRotation")]
    pub local_rotation: Quaternion,
    pub alignment: PlaneAlignment,
    pub boundary_vertices: Vec<Vector3>,
    #[serde(rename = "textureCoordinates")]
    pub texture_coords: Vec<Vector2>,
    pub triangle_indices: Vec<i32>,
    pub vertices: Vec<Vector3>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneGeometryBatch {
    #[serde(flatten)]
    pub envelope: UploadEnvelope,
    pub planes: Vec<PlaneSnapshot>,
}

impl PlaneGeometryBatch {
    pub fn new(template: &EnvelopeTemplate) -> Self {
        Self {
            envelope: template.envelope(UploadAction::PlaneUpload),
            planes: Vec::new(),
        }
    }
}
