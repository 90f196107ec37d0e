//! Backend availability tracking.
//!
//! A failed or timed-out fetch marks the backend as down and starts a
//! countdown; the monitor flips back to up on its own when the countdown
//! reaches zero.

mod availability;

pub use availability::{AvailabilityMonitor, AvailabilityState, MonitorConfig};
