use serde::{Deserialize, Serialize};

/// Vehicles seen on one approach by the vision service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleCounts {
    /// Heavy vehicles such as trucks and buses.
    pub trucks: u32,
    /// Cars, SUVs and vans.
    pub cars: u32,
    /// Motorcycles and bicycles.
    pub bikes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrafficDensity {
    Low,
    Medium,
    High,
}

/// One structured analysis of a camera frame, as produced by the vision service.
/// Only the flags and the vehicle counts drive signal control; density and
/// summary are carried along for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ambulance_present: bool,
    pub accident_present: bool,
    pub fight_present: bool,
    pub vehicle_counts: VehicleCounts,
    pub traffic_density: TrafficDensity,
    pub summary: String,
}

impl AnalysisResult {
    /// True when the frame shows an accident or a fight.
    pub fn hazard_present(&self) -> bool {
        self.accident_present || self.fight_present
    }

    /// A clear frame with the given counts.
    pub fn clear(vehicle_counts: VehicleCounts) -> Self {
        Self {
            ambulance_present: false,
            accident_present: false,
            fight_present: false,
            vehicle_counts,
            traffic_density: TrafficDensity::Low,
            summary: String::new(),
        }
    }
}
