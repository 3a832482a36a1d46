use crate::models::analysis::{AnalysisResult, VehicleCounts};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four approaches into the intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Fixed order used for the controller's approach array.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::South => 1,
            Direction::East => 2,
            Direction::West => 3,
        }
    }

    /// The opposite approach sharing the same axis.
    pub fn partner(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    pub fn parse(s: &str) -> Option<Direction> {
        match s.trim().to_ascii_lowercase().as_str() {
            "n" | "north" => Some(Direction::North),
            "s" | "south" => Some(Direction::South),
            "e" | "east" => Some(Direction::East),
            "w" | "west" => Some(Direction::West),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The colour shown by an approach's signal head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalPhase {
    Red,
    Yellow,
    Green,
}

/// Safety classification of an approach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatingMode {
    Normal,
    /// An ambulance is waiting; the approach preempts normal cycling.
    Emergency,
    /// Accident or fight; the approach is held at Red until cleared.
    Hazard,
}

/// Signal state of one approach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approach {
    /// Which approach this is. Never changes.
    pub direction: Direction,
    /// The colour currently displayed.
    pub phase: SignalPhase,
    /// Seconds remaining in the current phase.
    pub timer: u32,
    pub mode: OperatingMode,
    /// Most recent analysis received for this approach, if any.
    pub last_analysis: Option<AnalysisResult>,
    /// Set while a frame for this approach is out for analysis. Display only.
    pub processing: bool,
}

impl Approach {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            phase: SignalPhase::Red,
            timer: 0,
            mode: OperatingMode::Normal,
            last_analysis: None,
            processing: false,
        }
    }

    /// Stores the analysis and derives the operating mode from its flags.
    /// An ambulance wins over any hazard. A hazard stops the approach at once
    /// instead of waiting for the next tick. Timer is never touched here.
    pub fn apply_analysis(&mut self, result: AnalysisResult) -> OperatingMode {
        let ambulance = result.ambulance_present;
        let hazard = result.hazard_present();
        self.last_analysis = Some(result);

        if ambulance {
            self.mode = OperatingMode::Emergency;
        } else if hazard {
            self.mode = OperatingMode::Hazard;
            self.phase = SignalPhase::Red;
        } else {
            self.mode = OperatingMode::Normal;
        }
        self.mode
    }

    /// Counts from the latest analysis, or zero when nothing has been seen yet.
    pub fn vehicle_counts(&self) -> VehicleCounts {
        self.last_analysis
            .as_ref()
            .map(|a| a.vehicle_counts)
            .unwrap_or_default()
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, SignalPhase::Green | SignalPhase::Yellow)
    }

    /// Decrements the timer by one second, floored at zero.
    pub fn count_down(&mut self) {
        self.timer = self.timer.saturating_sub(1);
    }

    pub fn set_signal(&mut self, phase: SignalPhase, timer: u32) {
        self.phase = phase;
        self.timer = timer;
    }
}
