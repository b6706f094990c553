pub mod device;
pub mod envelope;
pub mod geometry;
pub mod plane;
pub mod point_cloud;
pub mod session_start;

pub use device::DeviceInfo;
pub use envelope::{
    EnvelopeTemplate, GeoFields, UploadAction, UploadEnvelope, DEFAULT_ENDPOINT,
    DEFAULT_MAP_VERSION,
};
pub use geometry::{Quaternion, Vector2, Vector3};
pub use plane::{PlaneAlignment, PlaneGeometryBatch, PlaneSnapshot};
pub use point_cloud::PointCloudBatch;
pub use session_start::SessionStartPayload;
