pub mod amqp;
pub mod messages;

pub use amqp::{handle_analysis_message, listen_analysis_results, publish_events};
pub use messages::AnalysisMessage;
