pub mod analysis;
pub mod approach;

pub use analysis::{AnalysisResult, TrafficDensity, VehicleCounts};
pub use approach::{Approach, Direction, OperatingMode, SignalPhase};
