//! Sensor sample types
//!
//! One sample type per channel plus the fused record that the buffer
//! emits once every channel has reported for a tick.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// A discrete sampling instant on the device's monotonic clock (seconds).
///
/// Ordered and hashed by total order over the underlying float so it can
/// key the pending-tick map.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tick(f64);

impl Tick {
    pub fn new(seconds: f64) -> Self {
        // -0.0 and 0.0 are the same instant
        if seconds == 0.0 {
            Self(0.0)
        } else {
            Self(seconds)
        }
    }

    pub fn seconds(self) -> f64 {
        self.0
    }
}

impl PartialEq for Tick {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for Tick {}

impl PartialOrd for Tick {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tick {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for Tick {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl From<f64> for Tick {
    fn from(seconds: f64) -> Self {
        Self::new(seconds)
    }
}

/// Three-axis reading
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Location fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSample {
    /// Tick the fix was attached to
    pub timestamp: f64,
    pub latitude: f64,
    pub longitude: f64,
}

impl PositionSample {
    pub fn new(timestamp: f64, latitude: f64, longitude: f64) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
        }
    }

    pub fn tick(&self) -> Tick {
        Tick::new(self.timestamp)
    }
}

/// Gyroscope reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrientationSample {
    pub timestamp: f64,
    /// Rotation rate in rad/s
    pub angular_velocity: Vector3,
}

impl OrientationSample {
    pub fn new(timestamp: f64, angular_velocity: Vector3) -> Self {
        Self {
            timestamp,
            angular_velocity,
        }
    }

    pub fn tick(&self) -> Tick {
        Tick::new(self.timestamp)
    }
}

/// Accelerometer reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionSample {
    pub timestamp: f64,
    /// Acceleration in g
    pub linear_acceleration: Vector3,
}

impl MotionSample {
    pub fn new(timestamp: f64, linear_acceleration: Vector3) -> Self {
        Self {
            timestamp,
            linear_acceleration,
        }
    }

    pub fn tick(&self) -> Tick {
        Tick::new(self.timestamp)
    }
}

/// All three channel readings for a single tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeRecord {
    pub position: PositionSample,
    pub orientation: OrientationSample,
    pub motion: MotionSample,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tick_negative_zero_is_zero() {
        assert_eq!(Tick::new(-0.0), Tick::new(0.0));

        let mut set = HashSet::new();
        set.insert(Tick::new(-0.0));
        assert!(set.contains(&Tick::new(0.0)));
    }

    #[test]
    fn test_tick_ordering() {
        let mut ticks = vec![Tick::new(2.5), Tick::new(-1.0), Tick::new(0.1)];
        ticks.sort();
        assert_eq!(
            ticks.iter().map(|t| t.seconds()).collect::<Vec<_>>(),
            vec![-1.0, 0.1, 2.5]
        );
    }

    #[test]
    fn test_samples_report_their_tick() {
        let orientation = OrientationSample::new(12.25, Vector3::new(0.1, 0.2, 0.3));
        let motion = MotionSample::new(12.25, Vector3::default());
        assert_eq!(orientation.tick(), motion.tick());
    }
}
