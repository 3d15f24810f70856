//! gpsd-backed location source.
//!
//! Speaks the gpsd JSON watch protocol: connect, enable JSON watching,
//! then read newline-delimited reports until a TPV (time-position-velocity)
//! report answers the query.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::location::{LocationError, LocationSample, LocationSource};

/// Watch command sent right after connecting.
const WATCH_COMMAND: &[u8] = b"?WATCH={\"enable\":true,\"json\":true};\n";

/// Reports to read before concluding the daemon has no fix for us.
/// gpsd greets with VERSION/DEVICES/WATCH before the first TPV.
const REPORT_BUDGET: usize = 32;

/// Location source backed by a gpsd daemon.
///
/// Each query opens a fresh connection; gpsd answers a new watcher with its
/// current state almost immediately, which matches last-known-fix semantics.
pub struct GpsdSource {
    addr: String,
}

impl GpsdSource {
    /// Create a source for the given gpsd `host:port` address.
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

/// One report from the gpsd stream, discriminated by its `class` field.
#[derive(Debug, Deserialize)]
#[serde(tag = "class")]
enum GpsdReport {
    #[serde(rename = "TPV")]
    Tpv(TpvReport),
    #[serde(other)]
    Other,
}

/// Time-position-velocity report. Mode 0/1 means no fix yet;
/// 2 is a 2D fix, 3 a 3D fix.
#[derive(Debug, Deserialize)]
struct TpvReport {
    #[serde(default)]
    mode: i32,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl TpvReport {
    fn sample(&self) -> Option<LocationSample> {
        if self.mode < 2 {
            return None;
        }
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(LocationSample::new(lat, lon)),
            _ => None,
        }
    }
}

#[async_trait]
impl LocationSource for GpsdSource {
    async fn last_known(&self) -> Result<Option<LocationSample>, LocationError> {
        let stream = TcpStream::connect(&self.addr).await?;
        let (read_half, mut write_half) = stream.into_split();

        write_half.write_all(WATCH_COMMAND).await?;

        let mut lines = BufReader::new(read_half).lines();
        let mut seen = 0;

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let report: GpsdReport =
                serde_json::from_str(line).map_err(LocationError::Protocol)?;

            match report {
                GpsdReport::Tpv(tpv) => {
                    let sample = tpv.sample();
                    if sample.is_none() {
                        tracing::debug!(mode = tpv.mode, "gpsd sem fix no momento");
                    }
                    return Ok(sample);
                }
                GpsdReport::Other => {}
            }

            seen += 1;
            if seen >= REPORT_BUDGET {
                break;
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_tpv_with_fix() {
        let report: GpsdReport = serde_json::from_str(
            r#"{"class":"TPV","device":"/dev/ttyACM0","mode":3,"lat":-23.5,"lon":-46.6,"alt":760.0}"#,
        )
        .unwrap();
        match report {
            GpsdReport::Tpv(tpv) => {
                assert_eq!(tpv.sample(), Some(LocationSample::new(-23.5, -46.6)));
            }
            GpsdReport::Other => panic!("expected TPV"),
        }
    }

    #[test]
    fn test_tpv_without_fix() {
        let report: GpsdReport =
            serde_json::from_str(r#"{"class":"TPV","device":"/dev/ttyACM0","mode":1}"#).unwrap();
        match report {
            GpsdReport::Tpv(tpv) => assert_eq!(tpv.sample(), None),
            GpsdReport::Other => panic!("expected TPV"),
        }
    }

    #[test]
    fn test_tpv_fix_missing_coordinates_is_no_sample() {
        let report: GpsdReport =
            serde_json::from_str(r#"{"class":"TPV","mode":2,"lat":12.0}"#).unwrap();
        match report {
            GpsdReport::Tpv(tpv) => assert_eq!(tpv.sample(), None),
            GpsdReport::Other => panic!("expected TPV"),
        }
    }

    #[test]
    fn test_non_tpv_classes_are_ignored() {
        let report: GpsdReport = serde_json::from_str(
            r#"{"class":"VERSION","release":"3.25","proto_major":3,"proto_minor":14}"#,
        )
        .unwrap();
        assert!(matches!(report, GpsdReport::Other));
    }

    async fn serve_once(lines: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            // Drain the watch command before answering.
            let mut buf = [0u8; 128];
            let _ = socket.read(&mut buf).await.unwrap();
            socket.write_all(lines.as_bytes()).await.unwrap();
        });

        addr
    }

    #[tokio::test]
    async fn test_last_known_reads_first_tpv() {
        let addr = serve_once(concat!(
            "{\"class\":\"VERSION\",\"release\":\"3.25\"}\n",
            "{\"class\":\"DEVICES\",\"devices\":[]}\n",
            "{\"class\":\"WATCH\",\"enable\":true,\"json\":true}\n",
            "{\"class\":\"TPV\",\"mode\":3,\"lat\":-23.5,\"lon\":-46.6}\n",
        ))
        .await;

        let source = GpsdSource::new(addr);
        let sample = source.last_known().await.unwrap();
        assert_eq!(sample, Some(LocationSample::new(-23.5, -46.6)));
    }

    #[tokio::test]
    async fn test_last_known_without_fix_is_none() {
        let addr = serve_once(concat!(
            "{\"class\":\"VERSION\",\"release\":\"3.25\"}\n",
            "{\"class\":\"TPV\",\"mode\":0}\n",
        ))
        .await;

        let source = GpsdSource::new(addr);
        assert_eq!(source.last_known().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_last_known_connect_failure() {
        // Nothing listens on a freshly bound-then-dropped port.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let source = GpsdSource::new(addr);
        assert!(matches!(
            source.last_known().await,
            Err(LocationError::Connect(_))
        ));
    }
}
