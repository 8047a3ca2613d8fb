//! Message types exchanged with the controller node
//!
//! All messages derive `Serialize`/`Deserialize` so they can be logged as JSON
//! or persisted alongside parameters.

pub mod control;

pub use control::{now_nanos, ControlOutput, ErrorSample, PidConfig};
