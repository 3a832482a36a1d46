use crate::communication::messages::AnalysisMessage;
use crate::control_system::runtime::SharedController;
use crate::error::Result;
use crate::global_variables::{QUEUE_ANALYSIS_RESULTS, QUEUE_SIGNAL_EVENTS};
use crate::monitoring::event_log::LogEntry;
use amiquip::{
    Connection, ConsumerMessage, ConsumerOptions, Exchange, Publish, QueueDeclareOptions,
};
use tokio::sync::mpsc::UnboundedReceiver;

// Listens to the "analysis_results" queue and ingests each pushed analysis.
pub async fn listen_analysis_results(controller: SharedController, amqp_url: String) -> Result<()> {
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut connection = Connection::insecure_open(&amqp_url)?;
        let channel = connection.open_channel(None)?;
        let queue = channel.queue_declare(QUEUE_ANALYSIS_RESULTS, QueueDeclareOptions::default())?;
        let consumer = queue.consume(ConsumerOptions::default())?;
        log::info!(
            "[SignalController] Waiting for analysis results on '{}'...",
            QUEUE_ANALYSIS_RESULTS
        );

        for message in consumer.receiver().iter() {
            match message {
                ConsumerMessage::Delivery(delivery) => {
                    handle_analysis_message(&controller, &delivery.body);
                    // Malformed messages are acked too; redelivery would not fix them.
                    consumer.ack(delivery)?;
                }
                other => {
                    log::info!("[SignalController] Analysis consumer ended: {:?}", other);
                    break;
                }
            }
        }
        connection.close()?;
        Ok(())
    })
    .await?
}

/// Decodes one pushed message and applies it. Must run off the async workers.
pub fn handle_analysis_message(controller: &SharedController, body: &[u8]) {
    let message: AnalysisMessage = match serde_json::from_slice(body) {
        Ok(message) => message,
        Err(e) => {
            log::error!("[SignalController] Discarding malformed analysis message: {}", e);
            return;
        }
    };
    let mut ctrl = controller.blocking_lock();
    if let Err(e) = ctrl.ingest_analysis(message.direction, message.result) {
        log::error!("[SignalController] Could not apply analysis: {}", e);
    }
}

// Publishes every controller event as JSON to the "signal_events" queue.
pub async fn publish_events(mut events: UnboundedReceiver<LogEntry>, amqp_url: String) -> Result<()> {
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut connection = Connection::insecure_open(&amqp_url)?;
        let channel = connection.open_channel(None)?;
        let exchange = Exchange::direct(&channel);
        channel.queue_declare(QUEUE_SIGNAL_EVENTS, QueueDeclareOptions::default())?;

        while let Some(entry) = events.blocking_recv() {
            match serde_json::to_string(&entry) {
                Ok(payload) => {
                    exchange.publish(Publish::new(payload.as_bytes(), QUEUE_SIGNAL_EVENTS))?
                }
                Err(e) => log::error!("[SignalController] Could not encode event: {}", e),
            }
        }
        connection.close()?;
        Ok(())
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_system::intersection_controller::IntersectionController;
    use crate::control_system::runtime::shared;
    use crate::models::{Direction, OperatingMode, SignalPhase};

    #[test]
    fn pushed_hazard_closes_the_lane() {
        let controller = shared(IntersectionController::default());
        controller.blocking_lock().tick();

        let body = br#"{
            "direction": "South",
            "result": {
                "ambulance_present": false,
                "accident_present": false,
                "fight_present": true,
                "vehicle_counts": {"trucks": 0, "cars": 3, "bikes": 2},
                "traffic_density": "Low",
                "summary": "Altercation on the crossing."
            }
        }"#;
        handle_analysis_message(&controller, body);

        let ctrl = controller.blocking_lock();
        let south = ctrl.approach(Direction::South);
        assert_eq!(south.mode, OperatingMode::Hazard);
        assert_eq!(south.phase, SignalPhase::Red);
        assert_eq!(ctrl.approach(Direction::North).phase, SignalPhase::Green);
    }

    #[test]
    fn malformed_message_changes_nothing() {
        let controller = shared(IntersectionController::default());
        let before = controller.blocking_lock().snapshot();

        handle_analysis_message(&controller, br#"{"direction": "Up", "result": {}}"#);

        let ctrl = controller.blocking_lock();
        assert_eq!(ctrl.snapshot(), before);
        assert!(ctrl.recent_events().is_empty());
    }
}
