//! PID (Proportional-Integral-Derivative) Controller
//!
//! Discrete feedback controller driven by raw error samples.
//!
//! # Time step
//!
//! [`PidController::update`] takes the elapsed time since the previous sample
//! but does not use it: the integral term is the plain sum of every error seen
//! so far and the derivative term is the plain difference between the last two
//! errors. Output therefore depends only on the error history, never on the
//! tick spacing. Gains tuned for this controller already absorb the sample
//! period; callers that want time-scaled terms must scale the errors
//! themselves.
//!
//! # Example
//!
//! ```rust
//! use tickpid_library::algorithms::pid::PidController;
//!
//! let mut pid = PidController::new(1.0, 0.5, 0.1); // Kp, Ki, Kd
//!
//! let setpoint = 100.0;
//! let feedback = 90.0;
//! let output = pid.update(setpoint - feedback, 0.01).get_u();
//! assert_eq!(output, 16.0);
//! ```
//!
//! # Concurrency
//!
//! The controller holds no locks. Share it between threads only behind an
//! external mutex held for the whole `update` call.

use crate::messages::PidConfig;
use serde::{Deserialize, Serialize};

/// Snapshot of the controller state after an update
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PidTerms {
    /// Error passed to the most recent update
    pub error: f64,
    /// Error passed to the update before that
    pub error_previous: f64,
    /// Proportional term
    pub e_p: f64,
    /// Integral term (running sum of errors)
    pub e_i: f64,
    /// Derivative term (difference of the last two errors)
    pub e_d: f64,
    /// Control output
    pub u: f64,
}

/// PID Controller
///
/// Gains are fixed at construction. The only way to clear the accumulated
/// integral is to build a new controller.
#[derive(Debug, Clone, PartialEq)]
pub struct PidController {
    kp: f64, // Proportional gain
    ki: f64, // Integral gain
    kd: f64, // Derivative gain

    error: f64,
    error_previous: f64,

    e_p: f64,
    e_i: f64,
    e_d: f64,

    u: f64,
}

impl PidController {
    /// Create new PID controller
    ///
    /// Gains are taken as given; zero, negative and non-finite values are all accepted.
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            error: 0.0,
            error_previous: 0.0,
            e_p: 0.0,
            e_i: 0.0,
            e_d: 0.0,
            u: 0.0,
        }
    }

    /// Create a controller from a gain configuration message
    pub fn from_config(config: &PidConfig) -> Self {
        Self::new(config.kp, config.ki, config.kd)
    }

    /// Advance the controller by one sample
    ///
    /// # Arguments
    /// * `error` - Setpoint minus measurement for this tick
    /// * `_delta_t` - Time since the previous tick (seconds); accepted, not used
    ///
    /// # Returns
    /// The controller itself, so the output can be read in the same expression.
    pub fn update(&mut self, error: f64, _delta_t: f64) -> &mut Self {
        self.error_previous = self.error;
        self.error = error;

        self.e_p = self.error;
        self.e_i += self.error;
        self.e_d = self.error - self.error_previous;

        self.u = self.e_p * self.kp + self.e_i * self.ki + self.e_d * self.kd;

        self
    }

    /// Control output computed by the most recent update (0 before the first)
    pub fn get_u(&self) -> f64 {
        self.u
    }

    /// Get current gains
    pub fn get_gains(&self) -> (f64, f64, f64) {
        (self.kp, self.ki, self.kd)
    }

    /// Error passed to the most recent update
    pub fn get_error(&self) -> f64 {
        self.error
    }

    /// Error passed to the update before the most recent one
    pub fn get_previous_error(&self) -> f64 {
        self.error_previous
    }

    /// Get proportional term
    pub fn get_proportional(&self) -> f64 {
        self.e_p
    }

    /// Get integral term
    pub fn get_integral(&self) -> f64 {
        self.e_i
    }

    /// Get derivative term
    pub fn get_derivative(&self) -> f64 {
        self.e_d
    }

    /// Snapshot of all state terms
    pub fn terms(&self) -> PidTerms {
        PidTerms {
            error: self.error,
            error_previous: self.error_previous,
            e_p: self.e_p,
            e_i: self.e_i,
            e_d: self.e_d,
            u: self.u,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn recompute(pid: &PidController) -> f64 {
        let (kp, ki, kd) = pid.get_gains();
        pid.get_proportional() * kp + pid.get_integral() * ki + pid.get_derivative() * kd
    }

    #[test]
    fn test_initial_output_is_zero() {
        for (kp, ki, kd) in [(1.0, 0.5, 0.1), (-3.0, 0.0, 12.5), (0.0, 0.0, 0.0)] {
            let pid = PidController::new(kp, ki, kd);
            assert_eq!(pid.get_u(), 0.0);
            assert_eq!(pid.terms(), PidTerms::default());
        }
    }

    #[test]
    fn test_single_step() {
        let mut pid = PidController::new(2.0, 0.5, 0.25);
        pid.update(4.0, 0.01);

        assert_eq!(pid.get_proportional(), 4.0);
        assert_eq!(pid.get_derivative(), 4.0);
        assert_eq!(pid.get_integral(), 4.0);
        assert_eq!(pid.get_previous_error(), 0.0);
        // 4*2 + 4*0.5 + 4*0.25
        assert_eq!(pid.get_u(), 11.0);
    }

    #[test]
    fn test_two_step_scenario() {
        let mut pid = PidController::new(1.0, 0.5, 0.1);

        pid.update(10.0, 1.0);
        assert_eq!(pid.get_proportional(), 10.0);
        assert_eq!(pid.get_integral(), 10.0);
        assert_eq!(pid.get_derivative(), 10.0);
        assert_eq!(pid.get_u(), 16.0);

        pid.update(6.0, 1.0);
        assert_eq!(pid.get_proportional(), 6.0);
        assert_eq!(pid.get_integral(), 16.0);
        assert_eq!(pid.get_derivative(), -4.0);
        assert_relative_eq!(pid.get_u(), 13.6, epsilon = 1e-12);
    }

    #[test]
    fn test_integral_accumulates_raw_errors() {
        let mut pid = PidController::new(0.0, 1.0, 0.0);
        let errors = [3.0, -1.5, 0.25, 8.0, -2.0, 0.0, 5.5];

        let mut expected = 0.0;
        for (i, &e) in errors.iter().enumerate() {
            pid.update(e, 0.001 * (i + 1) as f64);
            expected += e;
            assert_eq!(pid.get_integral(), expected);
        }
        assert_eq!(pid.get_u(), expected);
    }

    #[test]
    fn test_derivative_is_raw_difference() {
        let mut pid = PidController::new(0.0, 0.0, 1.0);
        let errors = [1.0, 4.0, 2.5, -3.0, -3.0];

        pid.update(errors[0], 0.5);
        for pair in errors.windows(2) {
            pid.update(pair[1], 0.5);
            assert_eq!(pid.get_derivative(), pair[1] - pair[0]);
            assert_eq!(pid.get_previous_error(), pair[0]);
            assert_eq!(pid.get_error(), pair[1]);
        }
    }

    #[test]
    fn test_output_reproducible_from_terms() {
        let mut pid = PidController::new(1.7, -0.3, 0.05);
        for e in [0.1, 0.7, -2.2, 13.0, 0.003] {
            pid.update(e, 0.02);
            assert_eq!(pid.get_u(), recompute(&pid));
            assert_eq!(pid.terms().u, pid.get_u());
        }
    }

    #[test]
    fn test_delta_t_has_no_effect() {
        let errors = [5.0, 3.0, -1.0, 0.5];
        let mut fast = PidController::new(1.2, 0.4, 0.9);
        let mut slow = PidController::new(1.2, 0.4, 0.9);

        for (i, &e) in errors.iter().enumerate() {
            fast.update(e, 0.001);
            slow.update(e, 10.0 + i as f64);
            assert_eq!(fast.get_u(), slow.get_u());
        }
        assert_eq!(fast, slow);
    }

    #[test]
    fn test_chained_updates() {
        let mut pid = PidController::new(1.0, 0.5, 0.1);
        let u = pid.update(10.0, 1.0).update(6.0, 1.0).get_u();

        assert_relative_eq!(u, 13.6, epsilon = 1e-12);
    }

    #[test]
    fn test_gains_never_change() {
        let mut pid = PidController::new(0.3, 0.2, 0.1);
        for e in [1.0, -1.0, 100.0] {
            pid.update(e, 0.1);
        }
        assert_eq!(pid.get_gains(), (0.3, 0.2, 0.1));
    }

    #[test]
    fn test_non_finite_inputs_propagate() {
        let mut pid = PidController::new(1.0, 1.0, 1.0);
        pid.update(f64::NAN, 0.1);
        assert!(pid.get_u().is_nan());
        assert!(pid.get_integral().is_nan());

        // The integral never recovers from a NaN sample
        pid.update(1.0, 0.1);
        assert!(pid.get_integral().is_nan());

        let mut pid = PidController::new(1.0, 1.0, 1.0);
        pid.update(f64::INFINITY, 0.1);
        assert_eq!(pid.get_u(), f64::INFINITY);

        // A zero gain times an infinite term is NaN, not zero
        let mut pid = PidController::new(1.0, 0.0, 0.0);
        pid.update(f64::INFINITY, 0.1);
        assert!(pid.get_u().is_nan());
    }

    #[test]
    fn test_zero_error_yields_zero_output() {
        let mut pid = PidController::new(2.0, 0.5, 0.1);
        assert_eq!(pid.update(0.0, 0.01).get_u(), 0.0);
    }

    #[test]
    fn test_negative_gains_accepted() {
        let mut pid = PidController::new(-2.0, 0.0, 0.0);
        assert_eq!(pid.update(3.0, 0.01).get_u(), -6.0);
    }

    #[test]
    fn test_from_config() {
        let config = PidConfig::new(1.0, 0.5, 0.1);
        let mut pid = PidController::from_config(&config);

        assert_eq!(pid.get_gains(), (1.0, 0.5, 0.1));
        assert_eq!(pid.update(10.0, 1.0).get_u(), 16.0);
    }
}
