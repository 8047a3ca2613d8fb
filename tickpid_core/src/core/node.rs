use crate::error::TickPidResult;
use crate::params::RuntimeParams;
use std::fmt;
use std::time::{Duration, Instant};

/// Trait for providing lightweight logging summaries of message types
pub trait LogSummary {
    /// Return a compact string representation suitable for logging
    fn log_summary(&self) -> String;
}

/// Node states for monitoring and lifecycle management
#[derive(Debug, Clone, PartialEq)]
pub enum NodeState {
    Uninitialized,
    Initializing,
    Running,
    Stopping,
    Stopped,
    Error(String),
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeState::Uninitialized => write!(f, "Uninitialized"),
            NodeState::Initializing => write!(f, "Initializing"),
            NodeState::Running => write!(f, "Running"),
            NodeState::Stopping => write!(f, "Stopping"),
            NodeState::Stopped => write!(f, "Stopped"),
            NodeState::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// Performance metrics for node execution
#[derive(Debug, Clone, Default)]
pub struct NodeMetrics {
    pub total_ticks: u64,
    pub successful_ticks: u64,
    pub failed_ticks: u64,
    pub avg_tick_duration_us: f64,
    pub max_tick_duration_us: f64,
    pub last_tick_duration_us: f64,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub errors_count: u64,
    pub warnings_count: u64,
}

/// Runtime context and bookkeeping for a node
pub struct NodeInfo {
    name: String,
    state: NodeState,
    logging_enabled: bool,
    metrics: NodeMetrics,
    creation_time: Instant,
    tick_start_time: Option<Instant>,
    last_error: Option<String>,

    /// Runtime parameters
    pub params: RuntimeParams,
}

impl NodeInfo {
    /// Create a new NodeInfo backed by default parameters
    pub fn new(node_name: impl Into<String>, logging_enabled: bool) -> Self {
        Self::with_params(node_name, logging_enabled, RuntimeParams::with_defaults())
    }

    /// Create a NodeInfo sharing an existing parameter store
    pub fn with_params(
        node_name: impl Into<String>,
        logging_enabled: bool,
        params: RuntimeParams,
    ) -> Self {
        Self {
            name: node_name.into(),
            state: NodeState::Uninitialized,
            logging_enabled,
            metrics: NodeMetrics::default(),
            creation_time: Instant::now(),
            tick_start_time: None,
            last_error: None,
            params,
        }
    }

    // State Management Methods
    pub fn state(&self) -> &NodeState {
        &self.state
    }

    pub fn set_state(&mut self, new_state: NodeState) {
        if self.state != new_state {
            log::trace!(target: "tickpid::node", "[{}] {} -> {}", self.name, self.state, new_state);
            self.state = new_state;
        }
    }

    pub fn transition_to_error(&mut self, error_msg: String) {
        self.log_error(&error_msg);
        self.set_state(NodeState::Error(error_msg));
    }

    // Lifecycle Methods
    pub fn initialize(&mut self) -> TickPidResult<()> {
        self.set_state(NodeState::Initializing);
        self.set_state(NodeState::Running);
        Ok(())
    }

    pub fn shutdown(&mut self) -> TickPidResult<()> {
        self.set_state(NodeState::Stopping);
        self.set_state(NodeState::Stopped);
        Ok(())
    }

    // Tick Management
    pub fn start_tick(&mut self) {
        self.tick_start_time = Some(Instant::now());
    }

    pub fn record_tick(&mut self) {
        if let Some(start_time) = self.tick_start_time.take() {
            let duration_us = start_time.elapsed().as_secs_f64() * 1e6;

            self.metrics.total_ticks += 1;
            self.metrics.successful_ticks += 1;
            self.metrics.last_tick_duration_us = duration_us;

            if duration_us > self.metrics.max_tick_duration_us {
                self.metrics.max_tick_duration_us = duration_us;
            }

            // Running mean over successful ticks
            let n = self.metrics.successful_ticks as f64;
            self.metrics.avg_tick_duration_us +=
                (duration_us - self.metrics.avg_tick_duration_us) / n;
        }
    }

    pub fn record_tick_failure(&mut self, error_msg: String) {
        self.record_failed_tick();
        self.log_error(&error_msg);
    }

    /// Count the current tick as failed without logging (the failure was already reported)
    pub fn record_failed_tick(&mut self) {
        self.metrics.total_ticks += 1;
        self.metrics.failed_ticks += 1;
        if let Some(start_time) = self.tick_start_time.take() {
            self.metrics.last_tick_duration_us = start_time.elapsed().as_secs_f64() * 1e6;
        }
    }

    // Logging Methods
    pub fn log_pub<T: LogSummary>(&mut self, topic: &str, data: &T) {
        self.metrics.messages_sent += 1;
        if self.logging_enabled {
            log::debug!(
                target: "tickpid::node",
                "[{}] PUB {} {}",
                self.name,
                topic,
                data.log_summary()
            );
        }
    }

    pub fn log_sub<T: LogSummary>(&mut self, topic: &str, data: &T) {
        self.metrics.messages_received += 1;
        if self.logging_enabled {
            log::debug!(
                target: "tickpid::node",
                "[{}] SUB {} {}",
                self.name,
                topic,
                data.log_summary()
            );
        }
    }

    pub fn log_info(&self, message: &str) {
        if self.logging_enabled {
            log::info!(target: "tickpid::node", "[{}] {}", self.name, message);
        }
    }

    pub fn log_warning(&mut self, message: &str) {
        self.metrics.warnings_count += 1;
        if self.logging_enabled {
            log::warn!(target: "tickpid::node", "[{}] {}", self.name, message);
        }
    }

    /// Errors are always logged, regardless of the node's logging flag
    pub fn log_error(&mut self, message: &str) {
        self.metrics.errors_count += 1;
        self.last_error = Some(message.to_string());
        log::error!(target: "tickpid::node", "[{}] {}", self.name, message);
    }

    pub fn log_debug(&self, message: &str) {
        if self.logging_enabled {
            log::debug!(target: "tickpid::node", "[{}] {}", self.name, message);
        }
    }

    // Accessors
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn logging_enabled(&self) -> bool {
        self.logging_enabled
    }

    pub fn uptime(&self) -> Duration {
        self.creation_time.elapsed()
    }
}

/// Trait for units of work driven by the [`Scheduler`](crate::Scheduler)
pub trait Node: Send {
    /// Get the node's name (must be unique within a scheduler)
    fn name(&self) -> &'static str;

    /// Initialize the node (called once before the first tick)
    fn init(&mut self, ctx: &mut NodeInfo) -> TickPidResult<()> {
        ctx.log_info("Node initialized");
        Ok(())
    }

    /// Called once per control tick
    fn tick(&mut self, ctx: Option<&mut NodeInfo>);

    /// Shutdown the node (called once at cleanup)
    fn shutdown(&mut self, ctx: &mut NodeInfo) -> TickPidResult<()> {
        ctx.log_info("Node shutdown");
        Ok(())
    }
}

// LogSummary implementations for primitive types
impl LogSummary for f32 {
    fn log_summary(&self) -> String {
        format!("{:.3}", self)
    }
}

impl LogSummary for f64 {
    fn log_summary(&self) -> String {
        format!("{:.3}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        let mut info = NodeInfo::new("test_node", false);
        assert_eq!(info.state(), &NodeState::Uninitialized);

        info.initialize().unwrap();
        assert_eq!(info.state(), &NodeState::Running);

        info.shutdown().unwrap();
        assert_eq!(info.state(), &NodeState::Stopped);
    }

    #[test]
    fn test_tick_metrics() {
        let mut info = NodeInfo::new("test_node", false);

        for _ in 0..3 {
            info.start_tick();
            info.record_tick();
        }
        info.start_tick();
        info.record_tick_failure("boom".to_string());

        let metrics = info.metrics();
        assert_eq!(metrics.total_ticks, 4);
        assert_eq!(metrics.successful_ticks, 3);
        assert_eq!(metrics.failed_ticks, 1);
        assert_eq!(metrics.errors_count, 1);
        assert_eq!(info.last_error(), Some("boom"));
    }

    #[test]
    fn test_record_tick_without_start_is_ignored() {
        let mut info = NodeInfo::new("test_node", false);
        info.record_tick();
        assert_eq!(info.metrics().total_ticks, 0);
    }

    #[test]
    fn test_pub_sub_counters() {
        let mut info = NodeInfo::new("test_node", false);
        info.log_sub("errors", &1.5_f64);
        info.log_pub("control", &2.5_f64);
        info.log_pub("control", &3.5_f64);

        assert_eq!(info.metrics().messages_received, 1);
        assert_eq!(info.metrics().messages_sent, 2);
    }

    #[test]
    fn test_transition_to_error() {
        let mut info = NodeInfo::new("test_node", false);
        info.transition_to_error("channel closed".to_string());

        assert_eq!(info.state(), &NodeState::Error("channel closed".to_string()));
        assert_eq!(info.state().to_string(), "Error: channel closed");
        assert_eq!(info.metrics().errors_count, 1);
    }
}
