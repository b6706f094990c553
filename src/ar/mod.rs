use crate::models::{PlaneAlignment, Quaternion, Vector2, Vector3};

/// Mesh of a detected plane as reported by the AR subsystem.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaneGeometry {
    pub boundary_vertices: Vec<Vector3>,
    pub texture_coordinates: Vec<Vector2>,
    pub triangle_indices: Vec<i32>,
    pub vertices: Vec<Vector3>,
}

/// A plane currently tracked by the AR session.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneAnchor {
    pub identifier: String,
    pub center: Vector3,
    pub world_rotation: Quaternion,
    pub local_position: Vector3,
    pub local_rotation: Quaternion,
    pub alignment: PlaneAlignment,
    /// `None` while the subsystem has not produced a mesh for the anchor yet.
    pub geometry: Option<PlaneGeometry>,
}

/// Source of the current plane set. Queried fresh on every plane flush.
pub trait PlaneAnchorProvider: Send + Sync {
    fn current_plane_anchors(&self) -> Vec<PlaneAnchor>;
}

/// Provider for hosts without plane detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlanes;

impl PlaneAnchorProvider for NoPlanes {
    fn current_plane_anchors(&self) -> Vec<PlaneAnchor> {
        Vec::new()
    }
}
