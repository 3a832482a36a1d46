//! Client side of the vision analysis service.
//!
//! The service takes one camera frame and answers with an `AnalysisResult`.
//! Calls are blocking; the controller runtime moves them onto blocking threads
//! so a slow analysis never delays the tick loop.

pub mod amqp_client;
pub mod simulated;

use crate::error::Result;
use crate::models::AnalysisResult;
use std::path::Path;

pub use amqp_client::AmqpVisionClient;
pub use simulated::SimulatedVisionAnalyzer;

/// One frame to analyze.
#[derive(Debug, Clone)]
pub struct FrameRequest {
    pub image_bytes: Vec<u8>,
    pub mime_type: String,
}

impl FrameRequest {
    pub fn new(image_bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            image_bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Reads a frame from disk, guessing the mime type from the extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let image_bytes = std::fs::read(path)?;
        Ok(Self::new(image_bytes, mime_type_for(path)))
    }
}

pub trait VisionAnalyzer: Send + Sync {
    fn analyze(&self, frame: &FrameRequest) -> Result<AnalysisResult>;
}

/// Decodes the service's JSON answer.
pub fn parse_analysis(body: &[u8]) -> Result<AnalysisResult> {
    Ok(serde_json::from_slice(body)?)
}

pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignalError;
    use crate::models::TrafficDensity;

    #[test]
    fn parses_service_json() {
        let body = br#"{
            "ambulance_present": false,
            "accident_present": true,
            "fight_present": false,
            "vehicle_counts": {"trucks": 2, "cars": 7, "bikes": 1},
            "traffic_density": "Medium",
            "summary": "Two-car collision blocking the left lane."
        }"#;
        let result = parse_analysis(body).unwrap();
        assert!(result.hazard_present());
        assert_eq!(result.vehicle_counts.cars, 7);
        assert_eq!(result.traffic_density, TrafficDensity::Medium);
    }

    #[test]
    fn rejects_unparsable_answers() {
        for body in [
            &b"not json"[..],
            br#"{"ambulance_present": true}"#,
            br#"{"ambulance_present": false, "accident_present": false, "fight_present": false,
                "vehicle_counts": {"trucks": -1, "cars": 0, "bikes": 0},
                "traffic_density": "Low", "summary": ""}"#,
            br#"{"ambulance_present": false, "accident_present": false, "fight_present": false,
                "vehicle_counts": {"trucks": 0, "cars": 0, "bikes": 0},
                "traffic_density": "Gridlock", "summary": ""}"#,
        ] {
            assert!(matches!(
                parse_analysis(body),
                Err(SignalError::MalformedAnalysis(_))
            ));
        }
    }

    #[test]
    fn mime_types_follow_extension() {
        assert_eq!(mime_type_for(Path::new("north.JPG")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("feed/east.png")), "image/png");
        assert_eq!(mime_type_for(Path::new("clip.mp4")), "video/mp4");
        assert_eq!(mime_type_for(Path::new("frame")), "application/octet-stream");
    }

    #[test]
    fn frame_from_file_reads_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("west.webp");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let frame = FrameRequest::from_file(&path).unwrap();
        assert_eq!(frame.image_bytes, vec![1, 2, 3]);
        assert_eq!(frame.mime_type, "image/webp");
    }
}
