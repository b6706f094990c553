//! Device location and compass heading, as consumed by the pipeline.
//!
//! The pipeline never talks to GPS hardware itself. Hosts implement
//! [`LocationProvider`] over whatever positioning service they have, and the
//! pipeline polls it once during startup and again at every point-cloud flush.

use chrono::{DateTime, Utc};
use log::{info, warn};
use std::time::Duration;

use crate::models::GeoFields;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationStatus {
    Stopped,
    Initializing,
    Running,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub latitude: f32,
    pub longitude: f32,
    pub altitude: f32,
    pub horizontal_accuracy: f32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Heading {
    pub degrees: f32,
    pub accuracy: f32,
}

pub trait LocationProvider: Send + Sync {
    /// Whether the user allowed location access at all.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Begin acquiring fixes. Called once, before the first status poll.
    fn start(&self) {}

    fn status(&self) -> LocationStatus;

    /// Most recent fix, possibly stale. `None` before the first fix.
    fn last_fix(&self) -> Option<LocationFix>;

    fn heading(&self) -> Heading;
}

/// Location and heading read together at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LocationSnapshot {
    pub fix: Option<LocationFix>,
    pub heading: Heading,
}

impl LocationSnapshot {
    pub fn read(provider: &dyn LocationProvider) -> Self {
        Self {
            fix: provider.last_fix(),
            heading: provider.heading(),
        }
    }
}

impl From<LocationSnapshot> for GeoFields {
    fn from(snapshot: LocationSnapshot) -> Self {
        let mut geo = GeoFields {
            heading: snapshot.heading.degrees,
            heading_accuracy: snapshot.heading.accuracy,
            ..GeoFields::default()
        };
        if let Some(fix) = snapshot.fix {
            geo.lat = fix.latitude;
            geo.lon = fix.longitude;
            geo.altitude = fix.altitude;
            geo.gps_accuracy = fix.horizontal_accuracy;
            geo.gps_timestamp = fix.timestamp.timestamp_millis() as f64 / 1000.0;
        }
        geo
    }
}

/// Waits for the provider to leave `Initializing`, polling every `poll_interval`
/// at most `max_attempts` times, then returns whatever it has. Never fails:
/// a disabled, failed or slow provider yields a snapshot with a stale or
/// missing fix.
pub async fn acquire_fix(
    provider: &dyn LocationProvider,
    poll_interval: Duration,
    max_attempts: u32,
) -> LocationSnapshot {
    if !provider.is_enabled() {
        warn!("Location access is disabled; session will start without a GPS fix");
        return LocationSnapshot::read(provider);
    }

    provider.start();

    let mut remaining = max_attempts;
    while provider.status() == LocationStatus::Initializing && remaining > 0 {
        tokio::time::sleep(poll_interval).await;
        remaining -= 1;
    }

    if remaining == 0 && provider.status() == LocationStatus::Initializing {
        warn!("Timed out waiting for a location fix after {max_attempts} attempts");
    }
    if provider.status() == LocationStatus::Failed {
        warn!("Unable to determine device location");
    }

    let snapshot = LocationSnapshot::read(provider);
    if let Some(fix) = snapshot.fix {
        info!(
            "Location fix {:.5},{:.5} (±{}m)",
            fix.latitude, fix.longitude, fix.horizontal_accuracy
        );
    }
    snapshot
}

/// Provider that always reports the same reading. Used by hosts without a
/// positioning service and by tests.
#[derive(Debug, Clone, Default)]
pub struct FixedLocation {
    fix: Option<LocationFix>,
    heading: Heading,
}

impl FixedLocation {
    pub fn new(fix: LocationFix, heading: Heading) -> Self {
        Self {
            fix: Some(fix),
            heading,
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }
}

impl LocationProvider for FixedLocation {
    fn status(&self) -> LocationStatus {
        if self.fix.is_some() {
            LocationStatus::Running
        } else {
            LocationStatus::Failed
        }
    }

    fn last_fix(&self) -> Option<LocationFix> {
        self.fix
    }

    fn heading(&self) -> Heading {
        self.heading
    }
}
