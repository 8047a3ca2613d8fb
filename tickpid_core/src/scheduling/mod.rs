//! # tickpid Scheduling
//!
//! Drives registered nodes once per control tick:
//!
//! - **Simple Priorities**: Numeric priorities (0 = highest), ties keep insertion order
//! - **Optional Logging**: Per-node logging configuration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tickpid_core::Scheduler;
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.add(Box::new(sensor_node), 10, Some(true));  // Enable logging
//! scheduler.add(Box::new(control_node), 20, None);      // Default logging (false)
//! scheduler.run_ticks(1000, Duration::from_millis(10))?;
//! ```

pub mod scheduler;

pub use scheduler::Scheduler;
