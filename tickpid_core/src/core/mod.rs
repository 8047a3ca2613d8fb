//! # Core types and traits for tickpid
//!
//! - **Node**: the base trait for anything driven once per control tick
//! - **NodeInfo**: runtime context handed to nodes (state, metrics, logging)
//!
//! ## Node Lifecycle
//!
//! 1. **Construction** - Node is created with its channels and configuration
//! 2. **Initialization** - `init()` is called before the first tick
//! 3. **Execution** - `tick()` is called once per control tick by the scheduler
//! 4. **Shutdown** - `shutdown()` is called when the scheduler stops

pub mod node;

pub use node::{LogSummary, Node, NodeInfo, NodeMetrics, NodeState};
