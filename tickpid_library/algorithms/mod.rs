//! Pure computational algorithms
//!
//! No I/O, no allocation, no logging: callers decide when to run them and what
//! to do with the results.
//!
//! ## Control
//! - **pid**: discrete PID update rule over raw error samples

pub mod pid;
