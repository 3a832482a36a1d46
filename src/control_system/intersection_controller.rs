use crate::control_system::axis_cycle::run_cycle_step;
use crate::control_system::emergency_arbiter::run_emergency_step;
use crate::error::{Result, SignalError};
use crate::global_variables::EVENT_LOG_CAPACITY;
use crate::models::{AnalysisResult, Approach, Direction, OperatingMode};
use crate::monitoring::event_log::{EventLog, EventSink, LogEntry};
use serde::{Deserialize, Serialize};

/// What a tick will do, decided once from the current modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDecision {
    /// At least one approach carries an ambulance.
    EmergencyPreemption,
    /// Regular axis cycling, with hazard approaches held at Red.
    NormalCycle,
}

pub fn decide(approaches: &[Approach; 4]) -> TickDecision {
    if approaches
        .iter()
        .any(|a| a.mode == OperatingMode::Emergency)
    {
        TickDecision::EmergencyPreemption
    } else {
        TickDecision::NormalCycle
    }
}

/// Immutable copy of all four approaches for readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntersectionSnapshot {
    pub approaches: [Approach; 4],
}

impl IntersectionSnapshot {
    pub fn get(&self, direction: Direction) -> &Approach {
        &self.approaches[direction.index()]
    }
}

/// Owns the four approaches and is the only thing that mutates them.
pub struct IntersectionController {
    approaches: [Approach; 4],
    events: EventLog,
    sinks: Vec<Box<dyn EventSink>>,
}

impl Default for IntersectionController {
    fn default() -> Self {
        Self::new(EVENT_LOG_CAPACITY)
    }
}

impl IntersectionController {
    pub fn new(log_capacity: usize) -> Self {
        Self {
            approaches: Direction::ALL.map(Approach::new),
            events: EventLog::new(log_capacity),
            sinks: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_approaches(approaches: [Approach; 4]) -> Self {
        Self {
            approaches,
            ..Self::default()
        }
    }

    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Runs exactly one one-second step and returns the resulting state.
    pub fn tick(&mut self) -> IntersectionSnapshot {
        let mut pending = Vec::new();
        match decide(&self.approaches) {
            TickDecision::EmergencyPreemption => {
                run_emergency_step(&mut self.approaches, &mut pending)
            }
            TickDecision::NormalCycle => run_cycle_step(&mut self.approaches, &mut pending),
        }
        for entry in pending {
            self.emit(entry);
        }
        self.snapshot()
    }

    /// Applies a finished analysis to one approach. Independent of the tick clock.
    pub fn ingest_analysis(&mut self, direction: Direction, result: AnalysisResult) -> Result<()> {
        let density = result.traffic_density;
        let approach = self.approach_mut(direction)?;
        let previous = approach.mode;
        approach.processing = false;
        let mode = approach.apply_analysis(result);

        self.emit(LogEntry::success(format!(
            "Analysis complete for {}. Density: {:?}",
            direction, density
        )));
        match mode {
            OperatingMode::Emergency => self.emit(LogEntry::warning(format!(
                "AMBULANCE DETECTED AT {}! INITIATING EMERGENCY PROTOCOL.",
                direction
            ))),
            OperatingMode::Hazard => self.emit(LogEntry::error(format!(
                "HAZARD DETECTED AT {}! Lane closed.",
                direction
            ))),
            OperatingMode::Normal if previous != OperatingMode::Normal => self.emit(
                LogEntry::info(format!("{} back to normal operation", direction)),
            ),
            OperatingMode::Normal => {}
        }
        Ok(())
    }

    /// Flags an approach as waiting on the vision service.
    pub fn begin_analysis(&mut self, direction: Direction) -> Result<()> {
        self.approach_mut(direction)?.processing = true;
        self.emit(LogEntry::info(format!("Analyzing feed for {}...", direction)));
        Ok(())
    }

    /// Records a failed analysis. Only the processing flag changes.
    pub fn fail_analysis(&mut self, direction: Direction, error: &SignalError) -> Result<()> {
        self.approach_mut(direction)?.processing = false;
        self.emit(LogEntry::error(format!(
            "Failed to analyze {}: {}",
            direction, error
        )));
        Ok(())
    }

    pub fn snapshot(&self) -> IntersectionSnapshot {
        IntersectionSnapshot {
            approaches: self.approaches.clone(),
        }
    }

    pub fn approach(&self, direction: Direction) -> &Approach {
        &self.approaches[direction.index()]
    }

    pub fn recent_events(&self) -> Vec<LogEntry> {
        self.events.recent()
    }

    fn approach_mut(&mut self, direction: Direction) -> Result<&mut Approach> {
        self.approaches
            .iter_mut()
            .find(|a| a.direction == direction)
            .ok_or_else(|| {
                SignalError::InvariantViolation(format!("no approach for {}", direction))
            })
    }

    fn emit(&mut self, entry: LogEntry) {
        entry.trace_to_log();
        for sink in self.sinks.iter_mut() {
            if let Err(e) = sink.record(&entry) {
                log::error!("Error recording event '{}': {}", entry.message, e);
            }
        }
        self.events.push(entry);
    }
}
