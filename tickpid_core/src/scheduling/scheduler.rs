use crate::core::{Node, NodeInfo, NodeState};
use crate::error::{TickPidError, TickPidResult};
use crate::params::RuntimeParams;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Node registration info with lifecycle tracking
struct RegisteredNode {
    node: Box<dyn Node>,
    priority: u32,
    initialized: bool,
    context: NodeInfo,
}

/// Central orchestrator: holds nodes, drives the tick loop.
pub struct Scheduler {
    nodes: Vec<RegisteredNode>,
    running: Arc<AtomicBool>,
    scheduler_name: String,
    params: RuntimeParams,
    tick_count: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            running: Arc::new(AtomicBool::new(true)),
            scheduler_name: "DefaultScheduler".to_string(),
            params: RuntimeParams::with_defaults(),
            tick_count: 0,
        }
    }

    /// Set the scheduler name used in log output (builder pattern)
    pub fn with_name(mut self, name: &str) -> Self {
        self.scheduler_name = name.to_string();
        self
    }

    /// Share a parameter store with every node added afterwards (builder pattern)
    pub fn with_params(mut self, params: RuntimeParams) -> Self {
        self.params = params;
        self
    }

    /// Add a node with given priority (lower number = higher priority)
    ///
    /// Nodes with equal priority tick in the order they were added.
    pub fn add(
        &mut self,
        node: Box<dyn Node>,
        priority: u32,
        logging_enabled: Option<bool>,
    ) -> &mut Self {
        let node_name = node.name().to_string();
        let logging_enabled = logging_enabled.unwrap_or(false);
        let context =
            NodeInfo::with_params(node_name.clone(), logging_enabled, self.params.clone());

        self.nodes.push(RegisteredNode {
            node,
            priority,
            initialized: false,
            context,
        });
        self.nodes.sort_by_key(|registered| registered.priority);

        log::info!(
            "[{}] Added node '{}' with priority {} (logging: {})",
            self.scheduler_name,
            node_name,
            priority,
            logging_enabled
        );

        self
    }

    /// Check if the scheduler is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the scheduler
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Handle that stops the scheduler from another thread when set to `false`
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Number of completed scheduler ticks
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Run a single tick over every node.
    ///
    /// Nodes are initialized lazily on their first tick. A node that fails to
    /// initialize, or that has entered the `Error` state, is skipped from then on.
    /// Returns an error naming the first node that failed to initialize this tick.
    pub fn tick_once(&mut self) -> TickPidResult<()> {
        let mut init_failure = None;

        for registered in self.nodes.iter_mut() {
            let node_name = registered.node.name();

            if !registered.initialized {
                if matches!(registered.context.state(), NodeState::Error(_)) {
                    continue;
                }
                match registered.node.init(&mut registered.context) {
                    Ok(()) => {
                        registered.context.initialize()?;
                        registered.initialized = true;
                        log::debug!("[{}] Initialized node '{}'", self.scheduler_name, node_name);
                    }
                    Err(e) => {
                        registered
                            .context
                            .transition_to_error(format!("Initialization failed: {}", e));
                        if init_failure.is_none() {
                            init_failure = Some(TickPidError::node(node_name, e.to_string()));
                        }
                        continue;
                    }
                }
            }

            if matches!(registered.context.state(), NodeState::Error(_)) {
                continue;
            }

            let ctx = &mut registered.context;
            ctx.start_tick();
            registered.node.tick(Some(&mut *ctx));
            if matches!(ctx.state(), NodeState::Error(_)) {
                ctx.record_failed_tick();
            } else {
                ctx.record_tick();
            }
        }

        self.tick_count += 1;

        match init_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Run `ticks` ticks spaced `period` apart, then shut every node down.
    ///
    /// Stops early when [`stop`](Self::stop) is called.
    pub fn run_ticks(&mut self, ticks: u64, period: Duration) -> TickPidResult<()> {
        let result = self.run_loop(period, |scheduler, _| scheduler.tick_count < ticks);
        self.shutdown();
        result
    }

    /// Run all nodes for a specified duration, then shut down gracefully
    pub fn run_for(&mut self, duration: Duration, period: Duration) -> TickPidResult<()> {
        let result = self.run_loop(period, |_, start| start.elapsed() < duration);
        self.shutdown();
        result
    }

    fn run_loop<F>(&mut self, period: Duration, mut keep_going: F) -> TickPidResult<()>
    where
        F: FnMut(&Self, Instant) -> bool,
    {
        let start = Instant::now();

        while self.is_running() && keep_going(self, start) {
            let tick_start = Instant::now();
            self.tick_once()?;

            if let Some(remaining) = period.checked_sub(tick_start.elapsed()) {
                std::thread::sleep(remaining);
            }
        }

        Ok(())
    }

    /// Shut down every initialized node
    pub fn shutdown(&mut self) {
        for registered in self.nodes.iter_mut() {
            if !registered.initialized {
                continue;
            }
            let node_name = registered.node.name();

            match registered.node.shutdown(&mut registered.context) {
                Ok(()) => log::debug!("[{}] Shutdown node '{}'", self.scheduler_name, node_name),
                Err(e) => log::warn!(
                    "[{}] Error shutting down node '{}': {}",
                    self.scheduler_name,
                    node_name,
                    e
                ),
            }
            let _ = registered.context.shutdown();
            registered.initialized = false;
        }

        log::info!(
            "[{}] Scheduler shutdown complete after {} ticks",
            self.scheduler_name,
            self.tick_count
        );
    }

    /// Names of all registered nodes, in tick order
    pub fn get_node_list(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|registered| registered.node.name().to_string())
            .collect()
    }

    /// Runtime context of a registered node
    pub fn node_info(&self, name: &str) -> Option<&NodeInfo> {
        self.nodes
            .iter()
            .find(|registered| registered.node.name() == name)
            .map(|registered| &registered.context)
    }
}
