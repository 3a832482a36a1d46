use crate::control_system::duration::duration_for;
use crate::global_variables::{MIN_GREEN_SECONDS, STARTUP_GREEN_SECONDS, YELLOW_SECONDS};
use crate::models::{Approach, Direction, OperatingMode, SignalPhase};
use crate::monitoring::event_log::LogEntry;

/// A synchronized pair of opposite approaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    NorthSouth,
    EastWest,
}

impl Axis {
    pub fn members(self) -> (Direction, Direction) {
        match self {
            Axis::NorthSouth => (Direction::North, Direction::South),
            Axis::EastWest => (Direction::East, Direction::West),
        }
    }

    pub fn cross(self) -> Axis {
        match self {
            Axis::NorthSouth => Axis::EastWest,
            Axis::EastWest => Axis::NorthSouth,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Axis::NorthSouth => "North/South",
            Axis::EastWest => "East/West",
        }
    }

    fn any_in(self, approaches: &[Approach; 4], phase: SignalPhase) -> bool {
        let (a, b) = self.members();
        approaches[a.index()].phase == phase || approaches[b.index()].phase == phase
    }

    fn timers_expired(self, approaches: &[Approach; 4]) -> bool {
        let (a, b) = self.members();
        approaches[a.index()].timer == 0 && approaches[b.index()].timer == 0
    }
}

/// Where the normal cycle stands, read off the current phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Green(Axis),
    Yellow(Axis),
    AllRed,
}

// Either member of a pair counts, which tolerates a hazard-held partner.
pub fn infer_state(approaches: &[Approach; 4]) -> CycleState {
    if Axis::NorthSouth.any_in(approaches, SignalPhase::Green) {
        CycleState::Green(Axis::NorthSouth)
    } else if Axis::NorthSouth.any_in(approaches, SignalPhase::Yellow) {
        CycleState::Yellow(Axis::NorthSouth)
    } else if Axis::EastWest.any_in(approaches, SignalPhase::Green) {
        CycleState::Green(Axis::EastWest)
    } else if Axis::EastWest.any_in(approaches, SignalPhase::Yellow) {
        CycleState::Yellow(Axis::EastWest)
    } else {
        CycleState::AllRed
    }
}

/// One normal-operation step: NS green, NS yellow, EW green, EW yellow, repeat.
pub fn run_cycle_step(approaches: &mut [Approach; 4], events: &mut Vec<LogEntry>) {
    let state = infer_state(approaches);
    let was_out_of_step = AXES.map(|axis| pair_out_of_step(approaches, axis));

    for approach in approaches.iter_mut() {
        approach.count_down();
    }

    match state {
        CycleState::Green(axis) => {
            if axis.timers_expired(approaches) {
                set_axis(approaches, axis, SignalPhase::Yellow, YELLOW_SECONDS);
                events.push(LogEntry::info(format!(
                    "{} switching to Yellow",
                    axis.label()
                )));
            }
        }
        CycleState::Yellow(axis) => {
            if axis.timers_expired(approaches) {
                set_axis(approaches, axis, SignalPhase::Red, 0);
                let next = axis.cross();
                let dur = axis_duration(approaches, next);
                grant_green(approaches, next, dur, events);
                events.push(LogEntry::success(format!(
                    "{} Axis Green for {}s",
                    next.label(),
                    dur
                )));
            }
        }
        CycleState::AllRed => start_cycle(approaches, events),
    }

    report_desync(approaches, was_out_of_step);
}

/// Longest green demanded by either member, never below the minimum.
pub fn axis_duration(approaches: &[Approach; 4], axis: Axis) -> u32 {
    let (a, b) = axis.members();
    duration_for(approaches[a.index()].vehicle_counts())
        .max(duration_for(approaches[b.index()].vehicle_counts()))
        .max(MIN_GREEN_SECONDS)
}

// A Hazard member only ever shows Red, so it sits out Green and Yellow.
fn set_axis(approaches: &mut [Approach; 4], axis: Axis, phase: SignalPhase, timer: u32) {
    let (a, b) = axis.members();
    for direction in [a, b] {
        let approach = &mut approaches[direction.index()];
        if phase != SignalPhase::Red && approach.mode == OperatingMode::Hazard {
            continue;
        }
        approach.set_signal(phase, timer);
    }
}

// Hazard approaches are skipped individually, so a pair can come out split.
fn grant_green(approaches: &mut [Approach; 4], axis: Axis, dur: u32, events: &mut Vec<LogEntry>) {
    let (a, b) = axis.members();
    for direction in [a, b] {
        let approach = &mut approaches[direction.index()];
        if approach.mode == OperatingMode::Hazard {
            events.push(LogEntry::warning(format!(
                "{} held at Red (hazard)",
                direction
            )));
        } else {
            approach.set_signal(SignalPhase::Green, dur);
        }
    }
}

// All Red: start up or recover. North/South goes first unless both are closed.
fn start_cycle(approaches: &mut [Approach; 4], events: &mut Vec<LogEntry>) {
    let ns_closed = {
        let (a, b) = Axis::NorthSouth.members();
        approaches[a.index()].mode == OperatingMode::Hazard
            && approaches[b.index()].mode == OperatingMode::Hazard
    };
    let axis = if ns_closed {
        Axis::EastWest
    } else {
        Axis::NorthSouth
    };

    let (a, b) = axis.members();
    let mut granted = false;
    for direction in [a, b] {
        let approach = &mut approaches[direction.index()];
        if approach.mode != OperatingMode::Hazard {
            approach.set_signal(SignalPhase::Green, STARTUP_GREEN_SECONDS);
            granted = true;
        }
    }

    if granted {
        events.push(LogEntry::success(format!(
            "System Start: {} Green",
            axis.label()
        )));
    }
}

const AXES: [Axis; 2] = [Axis::NorthSouth, Axis::EastWest];

/// Both members free of hazards yet showing different phase or timer.
pub fn pair_out_of_step(approaches: &[Approach; 4], axis: Axis) -> bool {
    let (a, b) = axis.members();
    let (first, second) = (&approaches[a.index()], &approaches[b.index()]);
    first.mode != OperatingMode::Hazard
        && second.mode != OperatingMode::Hazard
        && (first.phase != second.phase || first.timer != second.timer)
}

// Reported once, on the tick a pair falls out of step. Not repaired.
fn report_desync(approaches: &[Approach; 4], was_out_of_step: [bool; 2]) {
    for (axis, was_out) in AXES.into_iter().zip(was_out_of_step) {
        if was_out || !pair_out_of_step(approaches, axis) {
            continue;
        }
        let (a, b) = axis.members();
        let (first, second) = (&approaches[a.index()], &approaches[b.index()]);
        log::debug!(
            "{} pair out of step: {} {:?}/{}s, {} {:?}/{}s",
            axis.label(),
            a,
            first.phase,
            first.timer,
            b,
            second.phase,
            second.timer
        );
    }
}
