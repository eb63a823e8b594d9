//! Lifecycle state machine module
//!
//! One independent machine per instrument:
//!
//! NONE -> READY -> CONFIRM -> ENTRY -> EXIT
//!
//! CONFIRM falls back to READY when the gate fails at confirmation time.
//! Scheduling is debounced by a per-instrument cooldown.

mod machine;
mod types;

pub use machine::{LifecycleMachine, ScheduleOutcome};
pub use types::{LifecycleConfig, LifecycleRecord, LifecycleState};
