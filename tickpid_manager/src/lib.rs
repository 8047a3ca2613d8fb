//! tickpid Manager Library
//!
//! Command implementations behind the `tickpid` binary.

pub mod commands;
pub mod input;
