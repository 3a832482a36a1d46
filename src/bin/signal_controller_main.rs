use smart_signal::communication::{listen_analysis_results, publish_events};
use smart_signal::config::ControllerConfig;
use smart_signal::control_system::{run_tick_loop, shared, IntersectionController};
use smart_signal::monitoring::console::run_cli;
use smart_signal::monitoring::{ChannelEventSink, CsvEventSink};
use smart_signal::vision::{AmqpVisionClient, VisionAnalyzer};
use std::sync::Arc;

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
    log::info!("Starting signal controller against {}", config.amqp_url);

    let (event_tx, event_rx) = tokio::sync::mpsc::unbounded_channel();
    let mut controller = IntersectionController::new(config.log_capacity);
    controller.add_sink(Box::new(ChannelEventSink::new(event_tx)));
    if let Some(path) = &config.event_csv_path {
        controller.add_sink(Box::new(CsvEventSink::new(path)));
    }
    let controller = shared(controller);

    let publisher_url = config.amqp_url.clone();
    tokio::spawn(async move {
        if let Err(e) = publish_events(event_rx, publisher_url).await {
            log::error!("Error in event publisher: {}", e);
        }
    });

    let listener_controller = controller.clone();
    let listener_url = config.amqp_url.clone();
    tokio::spawn(async move {
        if let Err(e) = listen_analysis_results(listener_controller, listener_url).await {
            log::error!("Error in analysis results listener: {}", e);
        }
    });

    tokio::spawn(run_tick_loop(controller.clone(), config.tick_interval));

    let analyzer: Arc<dyn VisionAnalyzer> = Arc::new(AmqpVisionClient::new(
        config.amqp_url.clone(),
        config.analysis_timeout,
    ));
    if let Err(e) = run_cli(controller, analyzer).await {
        eprintln!("Console error: {}", e);
    }
}
