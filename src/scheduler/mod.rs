pub mod throttle;
pub mod update;

pub use throttle::{Edge, Throttle};
pub use update::{PassInput, PassOutcome, SchedulerStats, Trigger, UpdateScheduler, ViewportState};
