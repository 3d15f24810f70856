//! Device location types and sources.

pub mod gpsd;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use gpsd::GpsdSource;

/// A single device position fix.
///
/// Constructed only from a present fix; an unavailable position is
/// represented as the absence of a sample, never as a zeroed one. This is
/// also the wire body of a location submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    /// Latitude in decimal degrees.
    pub latitude: f64,

    /// Longitude in decimal degrees.
    pub longitude: f64,
}

impl LocationSample {
    /// Create a sample from a coordinate pair.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Errors from querying a location source.
#[derive(Debug, Error)]
pub enum LocationError {
    /// Could not reach the location daemon.
    #[error("falha ao conectar ao gpsd: {0}")]
    Connect(#[from] std::io::Error),

    /// The daemon sent something that is not a JSON report.
    #[error("resposta do gpsd inválida: {0}")]
    Protocol(#[source] serde_json::Error),
}

/// Best-effort device position provider.
///
/// Implementations answer with the most recent known fix, `Ok(None)` when
/// no fix is currently available (GPS off, no satellites), and an error
/// only when the source itself cannot be queried. No timeout is enforced
/// here; sources rely on their own completion guarantees.
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Query the last known device position.
    async fn last_known(&self) -> Result<Option<LocationSample>, LocationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_wire_shape() {
        let sample = LocationSample::new(-23.5, -46.6);
        let json = serde_json::to_string(&sample).unwrap();
        assert_eq!(json, r#"{"latitude":-23.5,"longitude":-46.6}"#);
    }

    #[test]
    fn test_sample_round_trip() {
        let sample: LocationSample =
            serde_json::from_str(r#"{"latitude":10.25,"longitude":-0.5}"#).unwrap();
        assert_eq!(sample, LocationSample::new(10.25, -0.5));
    }
}
