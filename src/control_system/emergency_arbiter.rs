use crate::global_variables::{EMERGENCY_GREEN_SECONDS, YELLOW_SECONDS};
use crate::models::{Approach, OperatingMode, SignalPhase};
use crate::monitoring::event_log::LogEntry;

/// One preemption step. Conflicting approaches are brought to Red through a
/// Yellow buffer first; emergency approaches only get Green once nothing else
/// is Green or Yellow.
pub fn run_emergency_step(approaches: &mut [Approach; 4], events: &mut Vec<LogEntry>) {
    let (emergency, others): (Vec<usize>, Vec<usize>) =
        (0..approaches.len()).partition(|&i| approaches[i].mode == OperatingMode::Emergency);

    let unsafe_idx: Vec<usize> = others
        .into_iter()
        .filter(|&i| approaches[i].is_active())
        .collect();

    if !unsafe_idx.is_empty() {
        for i in unsafe_idx {
            let approach = &mut approaches[i];
            match approach.phase {
                SignalPhase::Green => {
                    approach.set_signal(SignalPhase::Yellow, YELLOW_SECONDS);
                    events.push(LogEntry::warning(format!(
                        "Emergency Protocol: Switching {} to Yellow ({}s).",
                        approach.direction, YELLOW_SECONDS
                    )));
                }
                SignalPhase::Yellow if approach.timer > 0 => approach.timer -= 1,
                SignalPhase::Yellow => {
                    approach.set_signal(SignalPhase::Red, 0);
                    events.push(LogEntry::info(format!(
                        "Emergency Protocol: {} Stopped.",
                        approach.direction
                    )));
                }
                SignalPhase::Red => {}
            }
        }

        // An emergency approach must not sit mid-transition while others clear.
        for &i in &emergency {
            if approaches[i].phase == SignalPhase::Yellow {
                approaches[i].phase = SignalPhase::Red;
            }
        }
        return;
    }

    for i in emergency {
        let approach = &mut approaches[i];
        if approach.phase != SignalPhase::Green {
            approach.set_signal(SignalPhase::Green, EMERGENCY_GREEN_SECONDS);
            events.push(LogEntry::warning(format!(
                "EMERGENCY: Green for {}",
                approach.direction
            )));
        }
        // The granting tick already consumes one second.
        approach.count_down();

        if approach.timer == 0 {
            approach.mode = OperatingMode::Normal;
            events.push(LogEntry::info(format!(
                "Emergency cleared at {}",
                approach.direction
            )));
        }
    }
}
