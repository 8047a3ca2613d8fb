//! # tickpid Library
//!
//! The discrete-time PID controller and the pieces that drive it.
//!
//! ## Structure
//!
//! ```text
//! tickpid_library/
//! ── algorithms/     # The PID update rule (no I/O)
//! ── messages/       # Error samples, control outputs, gain configuration
//! ── nodes/          # PidControllerNode: runs the controller inside a tick loop
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use tickpid_library::PidController;
//!
//! let mut pid = PidController::new(1.0, 0.5, 0.1);
//! let u = pid.update(10.0, 1.0).get_u();
//! assert_eq!(u, 16.0);
//! ```

pub mod algorithms;
pub mod messages;
pub mod nodes;

// Re-export core traits needed for message types
pub use tickpid_core::LogSummary;

pub use algorithms::pid::{PidController, PidTerms};
pub use messages::*;
pub use nodes::PidControllerNode;
