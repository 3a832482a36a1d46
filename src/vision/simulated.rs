use crate::control_system::duration::duration_for;
use crate::error::{Result, SignalError};
use crate::models::{AnalysisResult, TrafficDensity, VehicleCounts};
use crate::vision::{FrameRequest, VisionAnalyzer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Stand-in for the real service: random but plausible frames.
pub struct SimulatedVisionAnalyzer {
    rng: Mutex<StdRng>,
    ambulance_chance: f64,
    hazard_chance: f64,
}

impl SimulatedVisionAnalyzer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ambulance_chance: 0.05,
            hazard_chance: 0.05,
        }
    }

    pub fn with_chances(mut self, ambulance: f64, hazard: f64) -> Self {
        self.ambulance_chance = ambulance.clamp(0.0, 1.0);
        self.hazard_chance = hazard.clamp(0.0, 1.0);
        self
    }
}

impl VisionAnalyzer for SimulatedVisionAnalyzer {
    fn analyze(&self, frame: &FrameRequest) -> Result<AnalysisResult> {
        if frame.image_bytes.is_empty() {
            return Err(SignalError::AnalysisService("empty frame".to_string()));
        }
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| SignalError::AnalysisService("simulator poisoned".to_string()))?;

        let vehicle_counts = VehicleCounts {
            trucks: rng.random_range(0..=4),
            cars: rng.random_range(0..=20),
            bikes: rng.random_range(0..=8),
        };
        let ambulance_present = rng.random_bool(self.ambulance_chance);
        let accident_present = rng.random_bool(self.hazard_chance);
        let fight_present = rng.random_bool(self.hazard_chance / 2.0);

        let traffic_density = density_for(vehicle_counts);
        let summary = format!(
            "{} trucks, {} cars, {} bikes; {:?} traffic.",
            vehicle_counts.trucks, vehicle_counts.cars, vehicle_counts.bikes, traffic_density
        );

        Ok(AnalysisResult {
            ambulance_present,
            accident_present,
            fight_present,
            vehicle_counts,
            traffic_density,
            summary,
        })
    }
}

// Label by how much green time the load would ask for.
fn density_for(counts: VehicleCounts) -> TrafficDensity {
    match duration_for(counts) {
        0..=20 => TrafficDensity::Low,
        21..=40 => TrafficDensity::Medium,
        _ => TrafficDensity::High,
    }
}
