use crate::error::{Result, SignalError};
use crate::global_variables::QUEUE_FRAME_REQUESTS;
use crate::models::AnalysisResult;
use crate::vision::{parse_analysis, FrameRequest, VisionAnalyzer};
use amiquip::{
    AmqpProperties, Connection, ConsumerMessage, ConsumerOptions, Exchange, Publish,
    QueueDeclareOptions,
};
use std::time::{Duration, Instant};

/// Request/reply client for a vision service listening on RabbitMQ.
///
/// The frame goes out as the raw message body with its mime type as the
/// content type. The service answers on our exclusive reply queue with the
/// analysis JSON and the same correlation id.
pub struct AmqpVisionClient {
    amqp_url: String,
    timeout: Duration,
}

impl AmqpVisionClient {
    pub fn new(amqp_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            amqp_url: amqp_url.into(),
            timeout,
        }
    }

    fn request_reply(&self, connection: &mut Connection, frame: &FrameRequest) -> Result<AnalysisResult> {
        let channel = connection.open_channel(None)?;
        let exchange = Exchange::direct(&channel);
        channel.queue_declare(QUEUE_FRAME_REQUESTS, QueueDeclareOptions::default())?;
        let reply_queue = channel.queue_declare(
            "",
            QueueDeclareOptions {
                exclusive: true,
                ..QueueDeclareOptions::default()
            },
        )?;
        let consumer = reply_queue.consume(ConsumerOptions {
            no_ack: true,
            ..ConsumerOptions::default()
        })?;

        let correlation_id = format!("{:016x}", rand::random::<u64>());
        exchange.publish(Publish::with_properties(
            &frame.image_bytes,
            QUEUE_FRAME_REQUESTS,
            AmqpProperties::default()
                .with_reply_to(reply_queue.name().to_string())
                .with_correlation_id(correlation_id.clone())
                .with_content_type(frame.mime_type.clone()),
        ))?;
        log::debug!(
            "[VisionClient] Sent {} byte frame ({}), correlation {}",
            frame.image_bytes.len(),
            frame.mime_type,
            correlation_id
        );

        let deadline = Instant::now() + self.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(SignalError::AnalysisService(format!(
                    "no reply within {}s",
                    self.timeout.as_secs()
                )));
            }
            match consumer.receiver().recv_timeout(remaining) {
                Ok(ConsumerMessage::Delivery(delivery)) => {
                    if delivery.properties.correlation_id().as_deref() == Some(correlation_id.as_str()) {
                        return parse_analysis(&delivery.body);
                    }
                    log::debug!("[VisionClient] Ignoring reply for another request");
                }
                Ok(other) => {
                    return Err(SignalError::AnalysisService(format!(
                        "reply consumer ended: {:?}",
                        other
                    )));
                }
                Err(e) if e.is_disconnected() => {
                    return Err(SignalError::AnalysisService(
                        "reply channel disconnected".to_string(),
                    ));
                }
                Err(_) => continue,
            }
        }
    }
}

impl VisionAnalyzer for AmqpVisionClient {
    fn analyze(&self, frame: &FrameRequest) -> Result<AnalysisResult> {
        let mut connection = Connection::insecure_open(&self.amqp_url)?;
        let outcome = self.request_reply(&mut connection, frame);
        if let Err(e) = connection.close() {
            log::debug!("[VisionClient] Error closing connection: {}", e);
        }
        outcome
    }
}
