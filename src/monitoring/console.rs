use crate::control_system::intersection_controller::IntersectionSnapshot;
use crate::control_system::runtime::{submit_frame, SharedController};
use crate::error::Result;
use crate::models::{Direction, OperatingMode, SignalPhase};
use crate::monitoring::event_log::{LogEntry, Severity};
use crate::vision::{FrameRequest, VisionAnalyzer};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

/// One text line per approach, e.g. `North  GREEN  12s  Normal`.
pub fn render_snapshot(snapshot: &IntersectionSnapshot) -> String {
    let mut out = String::new();
    for approach in &snapshot.approaches {
        let light = match approach.phase {
            SignalPhase::Red => "RED",
            SignalPhase::Yellow => "YELLOW",
            SignalPhase::Green => "GREEN",
        };
        let mode = match approach.mode {
            OperatingMode::Normal => "Normal",
            OperatingMode::Emergency => "EMERGENCY",
            OperatingMode::Hazard => "HAZARD",
        };
        let density = approach
            .last_analysis
            .as_ref()
            .map(|a| format!("{:?}", a.traffic_density))
            .unwrap_or_else(|| "-".to_string());
        let busy = if approach.processing { " (analyzing)" } else { "" };
        out.push_str(&format!(
            "{:<6} {:<6} {:>3}s  {:<9} density {}{}\n",
            approach.direction.to_string(),
            light,
            approach.timer,
            mode,
            density,
            busy
        ));
    }
    out
}

pub fn render_event(entry: &LogEntry) -> String {
    let tag = match entry.severity {
        Severity::Info => "INFO",
        Severity::Success => " OK ",
        Severity::Warning => "WARN",
        Severity::Error => "ERR ",
    };
    format!("[{}] {} {}", entry.timestamp, tag, entry.message)
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, text: &str) -> Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(lines.next_line().await?.map(|l| l.trim().to_string()))
}

// Operator menu on stdin. Frame submissions run in the background so the
// menu stays responsive while the vision service works.
pub async fn run_cli(controller: SharedController, analyzer: Arc<dyn VisionAnalyzer>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        println!("\nIntersection Signal Controller");
        println!("1. Show signal states");
        println!("2. Show recent events");
        println!("3. Submit camera frame");
        println!("4. Exit");
        let Some(choice) = prompt(&mut lines, "Enter your choice: ").await? else {
            break;
        };
        match choice.as_str() {
            "1" => {
                let snapshot = controller.lock().await.snapshot();
                print!("{}", render_snapshot(&snapshot));
            }
            "2" => {
                let events = controller.lock().await.recent_events();
                if events.is_empty() {
                    println!("System ready. Waiting for events...");
                }
                for entry in events.iter().rev() {
                    println!("{}", render_event(entry));
                }
            }
            "3" => {
                let Some(dir_input) = prompt(&mut lines, "Direction (N/S/E/W): ").await? else {
                    break;
                };
                let Some(direction) = Direction::parse(&dir_input) else {
                    println!("Unknown direction '{}'.", dir_input);
                    continue;
                };
                let Some(path) = prompt(&mut lines, "Image or video path: ").await? else {
                    break;
                };
                let frame = match FrameRequest::from_file(&path) {
                    Ok(frame) => frame,
                    Err(e) => {
                        println!("Could not read {}: {}", path, e);
                        continue;
                    }
                };
                let controller = controller.clone();
                let analyzer = analyzer.clone();
                tokio::spawn(async move {
                    if let Err(e) = submit_frame(&controller, analyzer, direction, frame).await {
                        log::warn!("Frame for {} not applied: {}", direction, e);
                    }
                });
                println!("Frame for {} sent for analysis.", direction);
            }
            "4" => {
                println!("Exiting CLI.");
                break;
            }
            _ => println!("Invalid choice. Try again."),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_system::intersection_controller::IntersectionController;

    #[test]
    fn renders_one_line_per_approach() {
        let mut controller = IntersectionController::default();
        controller.tick();
        let text = render_snapshot(&controller.snapshot());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("North  GREEN   15s"));
        assert!(lines[3].contains("RED"));
    }

    #[test]
    fn event_line_carries_severity_tag() {
        let entry = LogEntry::warning("EMERGENCY: Green for West");
        assert!(render_event(&entry).ends_with("WARN EMERGENCY: Green for West"));
    }
}
