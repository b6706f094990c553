#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use mapbuffers_lib::{
    ar::{PlaneAnchor, PlaneAnchorProvider, PlaneGeometry},
    identity::MemoryStore,
    location::{FixedLocation, Heading, LocationFix},
    models::{DeviceInfo, PlaneAlignment, Quaternion, Vector2, Vector3},
    transport::Transport,
    Collaborators,
};

#[derive(Debug, Clone)]
pub struct Request {
    pub endpoint: String,
    pub field: String,
    pub body: String,
}

impl Request {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("payload is JSON")
    }

    pub fn action(&self) -> String {
        self.json()["action"].as_str().unwrap_or_default().to_string()
    }
}

/// Records every attempt; fails the first `fail_first` of them.
pub struct RecordingTransport {
    fail_first: usize,
    requests: Mutex<Vec<Request>>,
}

impl RecordingTransport {
    pub fn accepting() -> Arc<Self> {
        Self::failing_first(0)
    }

    pub fn failing_first(fail_first: usize) -> Arc<Self> {
        Arc::new(Self {
            fail_first,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn rejecting() -> Arc<Self> {
        Self::failing_first(usize::MAX)
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn with_action(&self, action: &str) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|r| r.action() == action)
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post_form(&self, endpoint: &str, field: &str, payload: &str) -> Result<()> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(Request {
            endpoint: endpoint.to_string(),
            field: field.to_string(),
            body: payload.to_string(),
        });
        if requests.len() <= self.fail_first {
            Err(anyhow!("HTTP status client error (400 Bad Request)"))
        } else {
            Ok(())
        }
    }
}

/// Plane provider whose anchor set tests can swap at will.
#[derive(Default)]
pub struct FakePlanes {
    anchors: Mutex<Vec<PlaneAnchor>>,
}

impl FakePlanes {
    pub fn set(&self, anchors: Vec<PlaneAnchor>) {
        *self.anchors.lock().unwrap() = anchors;
    }
}

impl PlaneAnchorProvider for FakePlanes {
    fn current_plane_anchors(&self) -> Vec<PlaneAnchor> {
        self.anchors.lock().unwrap().clone()
    }
}

/// Plane provider that blows up the first time it is queried.
pub struct PanickingPlanes;

impl PlaneAnchorProvider for PanickingPlanes {
    fn current_plane_anchors(&self) -> Vec<PlaneAnchor> {
        panic!("plane provider crashed");
    }
}

pub fn plane(id: &str) -> PlaneAnchor {
    PlaneAnchor {
        identifier: id.to_string(),
        center: Vector3::new(0.0, -1.0, 0.0),
        world_rotation: Quaternion::IDENTITY,
        local_position: Vector3::default(),
        local_rotation: Quaternion::IDENTITY,
        alignment: PlaneAlignment::Horizontal,
        geometry: Some(PlaneGeometry {
            boundary_vertices: vec![
                Vector3::new(-0.5, 0.0, -0.5),
                Vector3::new(0.5, 0.0, -0.5),
                Vector3::new(0.5, 0.0, 0.5),
            ],
            texture_coordinates: vec![Vector2::new(0.0, 0.0), Vector2::new(1.0, 1.0)],
            triangle_indices: vec![0, 1, 2],
            vertices: vec![Vector3::default(); 3],
        }),
    }
}

pub fn london() -> FixedLocation {
    FixedLocation::new(
        LocationFix {
            latitude: 51.5,
            longitude: -0.125,
            altitude: 11.0,
            horizontal_accuracy: 5.0,
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        },
        Heading {
            degrees: 270.0,
            accuracy: 10.0,
        },
    )
}

pub fn device() -> DeviceInfo {
    DeviceInfo {
        model: "test-rig".into(),
        os_version: "TestOS 1.0".into(),
        identifier: None,
    }
}

pub fn collaborators(
    store: Arc<MemoryStore>,
    planes: Arc<FakePlanes>,
    transport: Arc<RecordingTransport>,
) -> Collaborators {
    Collaborators {
        store,
        location: Arc::new(london()),
        planes,
        transport,
    }
}

pub fn points(range: std::ops::Range<usize>) -> Vec<Vector3> {
    range.map(|i| Vector3::new(i as f32, 0.0, 0.0)).collect()
}
