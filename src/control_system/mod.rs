pub mod axis_cycle;
pub mod duration;
pub mod emergency_arbiter;
pub mod intersection_controller;
pub mod runtime;

pub use duration::compute_duration;
pub use intersection_controller::{decide, IntersectionController, IntersectionSnapshot, TickDecision};
pub use runtime::{run_tick_loop, shared, submit_frame, SharedController};
