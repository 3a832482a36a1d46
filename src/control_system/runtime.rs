use crate::control_system::intersection_controller::IntersectionController;
use crate::error::Result;
use crate::models::{AnalysisResult, Direction};
use crate::vision::{FrameRequest, VisionAnalyzer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{interval, MissedTickBehavior};

/// All mutation goes through this lock, one call at a time.
pub type SharedController = Arc<Mutex<IntersectionController>>;

pub fn shared(controller: IntersectionController) -> SharedController {
    Arc::new(Mutex::new(controller))
}

// Runs a dedicated loop that ticks the controller once per period.
// This function is intended to be spawned as an async task.
pub async fn run_tick_loop(controller: SharedController, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first interval tick completes immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        controller.lock().await.tick();
    }
}

/// Sends one frame through the analyzer and applies the answer.
///
/// The lock is released while the analyzer runs, so ticks keep flowing. On
/// failure only the processing flag is cleared and the error is returned.
pub async fn submit_frame(
    controller: &SharedController,
    analyzer: Arc<dyn VisionAnalyzer>,
    direction: Direction,
    frame: FrameRequest,
) -> Result<AnalysisResult> {
    controller.lock().await.begin_analysis(direction)?;

    let outcome = tokio::task::spawn_blocking(move || analyzer.analyze(&frame))
        .await
        .unwrap_or_else(|e| Err(e.into()));

    let mut ctrl = controller.lock().await;
    match outcome {
        Ok(result) => {
            ctrl.ingest_analysis(direction, result.clone())?;
            Ok(result)
        }
        Err(e) => {
            ctrl.fail_analysis(direction, &e)?;
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignalError;
    use crate::models::{OperatingMode, SignalPhase, TrafficDensity, VehicleCounts};
    use crate::vision::SimulatedVisionAnalyzer;

    struct Failing;

    impl VisionAnalyzer for Failing {
        fn analyze(&self, _frame: &FrameRequest) -> Result<AnalysisResult> {
            Err(SignalError::AnalysisService("service unavailable".to_string()))
        }
    }

    struct Accident;

    impl VisionAnalyzer for Accident {
        fn analyze(&self, _frame: &FrameRequest) -> Result<AnalysisResult> {
            Ok(AnalysisResult {
                ambulance_present: false,
                accident_present: true,
                fight_present: false,
                vehicle_counts: VehicleCounts { trucks: 1, cars: 1, bikes: 0 },
                traffic_density: TrafficDensity::Low,
                summary: "Collision in the intersection.".to_string(),
            })
        }
    }

    fn frame() -> FrameRequest {
        FrameRequest::new(vec![0x89, 0x50, 0x4e, 0x47], "image/png")
    }

    #[tokio::test]
    async fn successful_analysis_is_ingested() {
        let controller = shared(IntersectionController::default());
        controller.lock().await.tick();

        let result = submit_frame(&controller, Arc::new(Accident), Direction::North, frame())
            .await
            .unwrap();

        assert!(result.accident_present);
        let ctrl = controller.lock().await;
        let north = ctrl.approach(Direction::North);
        assert_eq!(north.mode, OperatingMode::Hazard);
        assert_eq!(north.phase, SignalPhase::Red);
        assert!(!north.processing);
    }

    #[tokio::test]
    async fn failed_analysis_only_clears_processing() {
        let controller = shared(IntersectionController::default());
        controller.lock().await.tick();
        let before = controller.lock().await.snapshot();

        let err = submit_frame(&controller, Arc::new(Failing), Direction::South, frame())
            .await
            .unwrap_err();

        assert!(matches!(err, SignalError::AnalysisService(_)));
        let ctrl = controller.lock().await;
        assert_eq!(ctrl.snapshot(), before);
        assert_eq!(ctrl.recent_events()[0].severity, crate::monitoring::event_log::Severity::Error);
    }

    #[tokio::test]
    async fn simulated_analyzer_feeds_controller() {
        let controller = shared(IntersectionController::default());
        let analyzer = Arc::new(SimulatedVisionAnalyzer::new(11).with_chances(0.0, 0.0));

        submit_frame(&controller, analyzer, Direction::East, frame())
            .await
            .unwrap();

        let ctrl = controller.lock().await;
        assert!(ctrl.approach(Direction::East).last_analysis.is_some());
        assert_eq!(ctrl.approach(Direction::East).mode, OperatingMode::Normal);
    }

    #[tokio::test]
    async fn tick_loop_drives_the_controller() {
        let controller = shared(IntersectionController::default());
        let handle = tokio::spawn(run_tick_loop(controller.clone(), Duration::from_millis(10)));

        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        let ctrl = controller.lock().await;
        assert!(ctrl
            .recent_events()
            .iter()
            .any(|e| e.message == "System Start: North/South Green"));
        assert_ne!(ctrl.approach(Direction::North).phase, SignalPhase::Red);
    }
}
