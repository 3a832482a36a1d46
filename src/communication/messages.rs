use crate::models::{AnalysisResult, Direction};
use serde::{Deserialize, Serialize};

/// An analysis pushed by the vision service for one approach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMessage {
    pub direction: Direction,
    pub result: AnalysisResult,
}
