use crate::global_variables::{
    BIKE_WEIGHT, CAR_WEIGHT, MAX_GREEN_SECONDS, MIN_GREEN_SECONDS, TRUCK_WEIGHT,
};
use crate::models::VehicleCounts;

// Green time grows with the weighted vehicle load, clamped to [10, 60] seconds.
pub fn compute_duration(trucks: u32, cars: u32, bikes: u32) -> u32 {
    let weighted = trucks
        .saturating_mul(TRUCK_WEIGHT)
        .saturating_add(cars.saturating_mul(CAR_WEIGHT))
        .saturating_add(bikes.saturating_mul(BIKE_WEIGHT));
    weighted.clamp(MIN_GREEN_SECONDS, MAX_GREEN_SECONDS)
}

pub fn duration_for(counts: VehicleCounts) -> u32 {
    compute_duration(counts.trucks, counts.cars, counts.bikes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_weighted_formula_within_bounds() {
        for t in 0..15 {
            for c in 0..35 {
                for b in 0..20 {
                    let expected = (5 * t + 2 * c + b).clamp(10, 60);
                    assert_eq!(compute_duration(t, c, b), expected);
                }
            }
        }
    }

    #[test]
    fn monotonic_in_each_vehicle_class() {
        for base in 0..40 {
            let d = compute_duration(base, base, base);
            assert!(compute_duration(base + 1, base, base) >= d);
            assert!(compute_duration(base, base + 1, base) >= d);
            assert!(compute_duration(base, base, base + 1) >= d);
        }
    }

    #[test]
    fn clamps_extremes() {
        assert_eq!(compute_duration(0, 0, 0), 10);
        assert_eq!(compute_duration(2, 3, 0), 16);
        assert_eq!(compute_duration(u32::MAX, u32::MAX, u32::MAX), 60);
        assert_eq!(duration_for(VehicleCounts { trucks: 0, cars: 0, bikes: 12 }), 12);
    }
}
