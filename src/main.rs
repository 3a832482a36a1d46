use smart_signal::config::ControllerConfig;
use smart_signal::control_system::{run_tick_loop, shared, submit_frame, IntersectionController};
use smart_signal::models::Direction;
use smart_signal::monitoring::console::run_cli;
use smart_signal::monitoring::CsvEventSink;
use smart_signal::vision::{FrameRequest, SimulatedVisionAnalyzer, VisionAnalyzer};
use std::sync::Arc;
use std::time::Duration;

// Self-contained run: simulated camera feeds, no broker needed.
#[tokio::main]
async fn main() {
    env_logger::init();
    let config = match ControllerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    let mut controller = IntersectionController::new(config.log_capacity);
    if let Some(path) = &config.event_csv_path {
        controller.add_sink(Box::new(CsvEventSink::new(path)));
    }
    let controller = shared(controller);
    let analyzer: Arc<dyn VisionAnalyzer> = Arc::new(SimulatedVisionAnalyzer::new(
        smart_signal::monitoring::current_timestamp(),
    ));

    tokio::spawn(run_tick_loop(controller.clone(), config.tick_interval));

    // Each approach's camera reports every few ticks, staggered.
    for (offset, direction) in Direction::ALL.into_iter().enumerate() {
        let controller = controller.clone();
        let analyzer = analyzer.clone();
        let period = config.tick_interval * 8;
        tokio::spawn(async move {
            tokio::time::sleep(period / 4 * offset as u32).await;
            loop {
                let frame = FrameRequest::new(vec![0u8; 64], "image/jpeg");
                if let Err(e) = submit_frame(&controller, analyzer.clone(), direction, frame).await {
                    log::warn!("Simulated feed for {} failed: {}", direction, e);
                }
                tokio::time::sleep(period).await;
            }
        });
    }

    if let Err(e) = run_cli(controller, analyzer).await {
        eprintln!("Console error: {}", e);
    }
    // Let the last events flush to the log before exiting.
    tokio::time::sleep(Duration::from_millis(50)).await;
}
