use crate::algorithms::pid::PidController;
use crate::messages::{ControlOutput, ErrorSample, PidConfig};
use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use tickpid_core::error::{TickPidError, TickPidResult};
use tickpid_core::{Node, NodeInfo};

/// Elapsed time used for the first sample when nothing else is configured (seconds)
pub const DEFAULT_DELTA_T: f64 = 0.01;

/// PID Controller Node
///
/// Receives [`ErrorSample`]s, feeds each one to a [`PidController`] and
/// publishes a [`ControlOutput`] per sample. A sample carrying its own
/// `delta_t` is used as given. Otherwise elapsed time is derived from
/// consecutive sample timestamps; the first sample, and any sample whose
/// timestamp does not move forward, uses the default time step.
///
/// A [`PidConfig`] received on the optional config channel replaces the
/// controller with a new one built from those gains. Accumulated integral and
/// derivative history is discarded at that point.
pub struct PidControllerNode {
    // Channels
    sample_rx: Receiver<ErrorSample>,
    output_tx: Sender<ControlOutput>,
    config_rx: Option<Receiver<PidConfig>>,

    controller: PidController,
    config: PidConfig,

    default_dt: Option<f64>,
    last_timestamp: Option<u64>,
    samples_processed: u64,

    input_closed: bool,
    output_closed: bool,
}

impl PidControllerNode {
    /// Create a node over existing channels
    pub fn new(
        config: PidConfig,
        sample_rx: Receiver<ErrorSample>,
        output_tx: Sender<ControlOutput>,
    ) -> Self {
        Self {
            sample_rx,
            output_tx,
            config_rx: None,
            controller: PidController::from_config(&config),
            config,
            default_dt: None,
            last_timestamp: None,
            samples_processed: 0,
            input_closed: false,
            output_closed: false,
        }
    }

    /// Create a node with fresh unbounded channels
    ///
    /// Returns the node, the sender to push samples into and the receiver to
    /// read outputs from.
    pub fn with_channels(
        config: PidConfig,
    ) -> (Self, Sender<ErrorSample>, Receiver<ControlOutput>) {
        let (sample_tx, sample_rx) = channel::unbounded();
        let (output_tx, output_rx) = channel::unbounded();
        (Self::new(config, sample_rx, output_tx), sample_tx, output_rx)
    }

    /// Accept gain changes on a config channel (builder pattern)
    pub fn with_config_channel(mut self, config_rx: Receiver<PidConfig>) -> Self {
        self.config_rx = Some(config_rx);
        self
    }

    /// Set the default time step (builder pattern)
    ///
    /// Without this, `init` reads `pid_default_dt` from the runtime parameters.
    pub fn with_default_dt(mut self, default_dt: f64) -> Self {
        self.default_dt = Some(default_dt);
        self
    }

    /// The controller currently in use
    pub fn controller(&self) -> &PidController {
        &self.controller
    }

    /// Gains of the controller currently in use
    pub fn config(&self) -> &PidConfig {
        &self.config
    }

    /// Samples processed since the controller was last built
    pub fn samples_processed(&self) -> u64 {
        self.samples_processed
    }

    fn default_dt(&self) -> f64 {
        self.default_dt.unwrap_or(DEFAULT_DELTA_T)
    }

    /// Discard the current controller and start over with new gains
    fn apply_config(&mut self, config: PidConfig, ctx: Option<&mut NodeInfo>) {
        let message = format!(
            "Gains changed to kp={} ki={} kd={} after {} samples; controller re-created",
            config.kp, config.ki, config.kd, self.samples_processed
        );
        match ctx {
            Some(ctx) => {
                ctx.log_sub("pid_config", &config);
                ctx.log_info(&message);
            }
            None => log::info!("{}", message),
        }

        self.controller = PidController::from_config(&config);
        self.config = config;
        self.samples_processed = 0;
    }

    fn delta_t_for(&mut self, sample: &ErrorSample, ctx: Option<&mut NodeInfo>) -> f64 {
        let timestamp_ns = sample.timestamp_ns;
        let delta_t = match (sample.delta_t, self.last_timestamp) {
            (Some(delta_t), _) => delta_t,
            (None, Some(last)) if timestamp_ns > last => (timestamp_ns - last) as f64 / 1e9,
            (None, Some(last)) => {
                if let Some(ctx) = ctx {
                    ctx.log_warning(&format!(
                        "Sample timestamp {} does not advance past {}; using default time step",
                        timestamp_ns, last
                    ));
                }
                self.default_dt()
            }
            (None, None) => self.default_dt(),
        };
        self.last_timestamp = Some(timestamp_ns);
        delta_t
    }

    fn process_sample(
        &mut self,
        sample: ErrorSample,
        mut ctx: Option<&mut NodeInfo>,
    ) -> Result<(), ControlOutput> {
        if let Some(ctx) = ctx.as_deref_mut() {
            ctx.log_sub("errors", &sample);
        }

        let delta_t = self.delta_t_for(&sample, ctx.as_deref_mut());
        self.controller.update(sample.error, delta_t);
        self.samples_processed += 1;

        let output = ControlOutput {
            controller_id: self.config.controller_id,
            tick: self.samples_processed,
            delta_t,
            terms: self.controller.terms(),
            timestamp_ns: sample.timestamp_ns,
        };

        self.output_tx.send(output).map_err(|e| e.into_inner())?;
        if let Some(ctx) = ctx {
            ctx.log_pub("control", &output);
        }
        Ok(())
    }
}

impl Node for PidControllerNode {
    fn name(&self) -> &'static str {
        "pid_controller"
    }

    fn init(&mut self, ctx: &mut NodeInfo) -> TickPidResult<()> {
        if self.default_dt.is_none() {
            self.default_dt = Some(ctx.params.get_checked("pid_default_dt", DEFAULT_DELTA_T)?);
        }
        ctx.log_info(&format!(
            "Controller {} ready: kp={} ki={} kd={} default dt={}s",
            self.config.controller_id,
            self.config.kp,
            self.config.ki,
            self.config.kd,
            self.default_dt()
        ));
        Ok(())
    }

    fn tick(&mut self, mut ctx: Option<&mut NodeInfo>) {
        if self.output_closed {
            return;
        }

        // Only the newest configuration matters: each one re-creates the controller
        let latest_config = self.config_rx.as_ref().and_then(|rx| rx.try_iter().last());
        if let Some(config) = latest_config {
            self.apply_config(config, ctx.as_deref_mut());
        }

        loop {
            let sample = match self.sample_rx.try_recv() {
                Ok(sample) => sample,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.input_closed {
                        self.input_closed = true;
                        if let Some(ctx) = ctx.as_deref_mut() {
                            ctx.log_debug("Sample channel closed");
                        }
                    }
                    break;
                }
            };

            if let Err(output) = self.process_sample(sample, ctx.as_deref_mut()) {
                self.output_closed = true;
                let message = TickPidError::communication(format!(
                    "output channel closed; dropped output #{} (u={})",
                    output.tick,
                    output.u()
                ))
                .to_string();
                match ctx {
                    Some(ctx) => ctx.transition_to_error(message),
                    None => log::error!("{}", message),
                }
                return;
            }
        }
    }

    fn shutdown(&mut self, ctx: &mut NodeInfo) -> TickPidResult<()> {
        ctx.log_info(&format!(
            "Stopping after {} samples (last u={}, uptime {:.2?})",
            self.samples_processed,
            self.controller.get_u(),
            ctx.uptime()
        ));
        Ok(())
    }
}
