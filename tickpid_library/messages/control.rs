//! Control message types
//!
//! Error samples flow into the controller node, control outputs flow out, and
//! gain configurations re-create the controller.

use crate::algorithms::pid::PidTerms;
use serde::{Deserialize, Serialize};
use tickpid_core::{LogSummary, RuntimeParams, TickPidResult};

/// Current wall-clock time in nanoseconds since the Unix epoch
pub fn now_nanos() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

/// One error measurement fed to the controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ErrorSample {
    /// Setpoint minus measured process value
    pub error: f64,
    /// Sample time in nanoseconds (any monotonic origin)
    pub timestamp_ns: u64,
    /// Elapsed time since the previous sample (seconds), when the producer knows it.
    /// Takes precedence over the timestamp difference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_t: Option<f64>,
}

impl ErrorSample {
    /// Sample stamped with the current time
    pub fn new(error: f64) -> Self {
        Self::at(error, now_nanos())
    }

    /// Sample with an explicit timestamp
    pub fn at(error: f64, timestamp_ns: u64) -> Self {
        Self {
            error,
            timestamp_ns,
            delta_t: None,
        }
    }

    /// Attach an explicit elapsed time (builder pattern)
    pub fn with_delta_t(mut self, delta_t: f64) -> Self {
        self.delta_t = Some(delta_t);
        self
    }

    /// Sample computed from a setpoint and a measurement
    pub fn from_measurement(setpoint: f64, measurement: f64) -> Self {
        Self::new(setpoint - measurement)
    }
}

impl LogSummary for ErrorSample {
    fn log_summary(&self) -> String {
        match self.delta_t {
            Some(dt) => format!("error={:.4} t={} dt={}", self.error, self.timestamp_ns, dt),
            None => format!("error={:.4} t={}", self.error, self.timestamp_ns),
        }
    }
}

/// Controller output published once per processed sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ControlOutput {
    /// Controller ID
    pub controller_id: u8,
    /// Number of samples processed by the current controller, starting at 1
    pub tick: u64,
    /// Elapsed time handed to the controller for this sample (seconds)
    pub delta_t: f64,
    /// Controller state after the update
    pub terms: PidTerms,
    /// Timestamp of the sample that produced this output
    pub timestamp_ns: u64,
}

impl ControlOutput {
    /// Control output value
    pub fn u(&self) -> f64 {
        self.terms.u
    }
}

impl LogSummary for ControlOutput {
    fn log_summary(&self) -> String {
        format!(
            "#{} u={:.4} (eP={:.4} eI={:.4} eD={:.4})",
            self.tick, self.terms.u, self.terms.e_p, self.terms.e_i, self.terms.e_d
        )
    }
}

/// PID gains configuration message
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PidConfig {
    /// Controller ID
    pub controller_id: u8,
    /// Proportional gain
    pub kp: f64,
    /// Integral gain
    pub ki: f64,
    /// Derivative gain
    pub kd: f64,
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl PidConfig {
    /// Create a new PID configuration
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            controller_id: 0,
            kp,
            ki,
            kd,
            timestamp: now_nanos(),
        }
    }

    /// Create a P-only controller
    pub fn proportional(kp: f64) -> Self {
        Self::new(kp, 0.0, 0.0)
    }

    /// Create a PI controller
    pub fn pi(kp: f64, ki: f64) -> Self {
        Self::new(kp, ki, 0.0)
    }

    /// Create a PD controller
    pub fn pd(kp: f64, kd: f64) -> Self {
        Self::new(kp, 0.0, kd)
    }

    /// Set the controller ID
    pub fn with_id(mut self, controller_id: u8) -> Self {
        self.controller_id = controller_id;
        self
    }

    /// Read gains from the `pid_kp`, `pid_ki` and `pid_kd` parameters
    ///
    /// Missing keys fall back to 1.0, 0.1 and 0.05. A gain stored with a
    /// non-numeric value is an error.
    pub fn from_params(params: &RuntimeParams) -> TickPidResult<Self> {
        Ok(Self::new(
            params.get_checked("pid_kp", 1.0)?,
            params.get_checked("pid_ki", 0.1)?,
            params.get_checked("pid_kd", 0.05)?,
        ))
    }

    /// Write gains back to the parameter store
    pub fn store(&self, params: &RuntimeParams) -> TickPidResult<()> {
        params.set("pid_kp", self.kp)?;
        params.set("pid_ki", self.ki)?;
        params.set("pid_kd", self.kd)?;
        Ok(())
    }

    /// Check whether all gains are finite
    ///
    /// Informational only: the controller accepts any gains.
    pub fn is_finite(&self) -> bool {
        self.kp.is_finite() && self.ki.is_finite() && self.kd.is_finite()
    }
}

impl LogSummary for PidConfig {
    fn log_summary(&self) -> String {
        format!(
            "id={} kp={} ki={} kd={}",
            self.controller_id, self.kp, self.ki, self.kd
        )
    }
}
