//! # tickpid Core
//!
//! Runtime plumbing shared by the tickpid crates:
//!
//! - **Nodes**: units of work driven once per control tick
//! - **Scheduling**: a priority-ordered tick loop for nodes
//! - **Parameters**: a YAML-backed key/value store for runtime configuration
//! - **Errors**: the workspace error type
//!
//! ## Quick Start
//!
//! ```rust
//! use tickpid_core::{Node, NodeInfo, Scheduler};
//!
//! struct ExampleNode {
//!     ticks: u64,
//! }
//!
//! impl Node for ExampleNode {
//!     fn name(&self) -> &'static str { "example" }
//!
//!     fn tick(&mut self, _ctx: Option<&mut NodeInfo>) {
//!         self.ticks += 1;
//!     }
//! }
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.add(Box::new(ExampleNode { ticks: 0 }), 0, None);
//! scheduler.tick_once().unwrap();
//! ```

pub mod core;
pub mod error;
pub mod params;
pub mod scheduling;

pub use crate::core::{LogSummary, Node, NodeInfo, NodeMetrics, NodeState};
pub use error::{TickPidError, TickPidResult};
pub use params::RuntimeParams;
pub use scheduling::Scheduler;
