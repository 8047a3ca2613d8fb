//! Nodes that run the controller inside a tick loop

pub mod pid_controller;

pub use pid_controller::PidControllerNode;
