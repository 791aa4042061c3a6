//! Threshold-driven registration session.
//!
//! The host pushes one correlation per tracking frame. Once the solver holds
//! `target_samples` correlations the session computes; after success it stops
//! accepting samples. A failed compute leaves the (filtered, hence smaller)
//! buffer in place, so collection simply resumes until the target is reached
//! again.

use anyhow::{Context, Result};
use coreg_linear::{Coregistration, CoregistrationError};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Session configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of buffered correlations that triggers a compute.
    pub target_samples: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target_samples: 300,
        }
    }
}

impl SessionConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse session config")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize session config")
    }
}

/// Progress reported after each push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Collecting { collected: usize, target: usize },
    Registered,
}

/// Wraps one solver and computes it when enough samples are buffered.
#[derive(Debug, Clone)]
pub struct RegistrationSession<S: Coregistration> {
    solver: S,
    target: usize,
    attempts: usize,
}

impl<S: Coregistration> RegistrationSession<S> {
    /// The effective target never drops below the solver's minimum.
    pub fn new(solver: S, config: SessionConfig) -> Self {
        let target = config.target_samples.max(S::MIN_SAMPLES);
        if target != config.target_samples {
            debug!(
                "session target raised from {} to solver minimum {}",
                config.target_samples, target
            );
        }
        Self {
            solver,
            target,
            attempts: 0,
        }
    }

    pub fn target_samples(&self) -> usize {
        self.target
    }

    /// Number of compute attempts made so far, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn into_solver(self) -> S {
        self.solver
    }

    pub fn is_registered(&self) -> bool {
        self.solver.is_registered()
    }

    pub fn estimate(&self) -> Option<S::Estimate> {
        self.solver.estimate()
    }

    fn status(&self) -> SessionStatus {
        if self.solver.is_registered() {
            SessionStatus::Registered
        } else {
            SessionStatus::Collecting {
                collected: self.solver.len(),
                target: self.target,
            }
        }
    }

    /// Buffer one correlation and compute if the target is reached.
    pub fn push(
        &mut self,
        observation: S::Observation,
    ) -> Result<SessionStatus, CoregistrationError> {
        if self.solver.is_registered() {
            debug!("session already registered, sample ignored");
            return Ok(SessionStatus::Registered);
        }

        self.solver.add(observation);
        if self.solver.len() >= self.target {
            self.compute_now()?;
        }
        Ok(self.status())
    }

    /// Compute with whatever is buffered, regardless of the target.
    pub fn compute_now(&mut self) -> Result<S::Estimate, CoregistrationError> {
        if !self.solver.is_registered() {
            self.attempts += 1;
        }
        self.solver.compute().inspect_err(|e| {
            warn!(
                "registration attempt {} failed with {} samples left: {e}",
                self.attempts,
                self.solver.len()
            );
        })
    }
}
