//! Solver configuration.
use crate::error::{CircuitError, Result};
use serde::{Deserialize, Serialize};

/// How the two sides of an assertion are compared.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum Equality {
    /// Bit-for-bit `f64` equality. Values are expected to be exactly representable.
    #[default]
    Exact,
    /// `|a - b| <= eps`.
    Within(f64),
}

impl Equality {
    #[inline]
    pub fn holds(&self, lhs: f64, rhs: f64) -> bool {
        match *self {
            Equality::Exact => lhs == rhs,
            Equality::Within(eps) => (lhs - rhs).abs() <= eps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Reject division by zero and square roots of negatives found while
    /// solving hints, instead of producing inf/NaN.
    pub runtime_domain_checks: bool,
    pub equality: Equality,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self { runtime_domain_checks: true, equality: Equality::Exact }
    }
}

impl SolverConfig {
    pub fn with_runtime_domain_checks(mut self, enabled: bool) -> Self {
        self.runtime_domain_checks = enabled;
        self
    }

    pub fn with_equality(mut self, equality: Equality) -> Self {
        self.equality = equality;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Equality::Within(eps) = self.equality {
            if !eps.is_finite() || eps < 0.0 {
                return Err(CircuitError::InvalidConfig(format!(
                    "tolerance must be finite and non-negative, got {}",
                    eps
                )));
            }
        }
        Ok(())
    }

    pub fn from_json(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s).map_err(|e| CircuitError::InvalidConfig(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
