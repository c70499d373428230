use crate::error::{ConfigError, invalid_value};

pub const DEFAULT_HALF_LIFE_MS: f64 = 300_000.0;

/// Exponential forgetting curve: `weight(t) = e^(-λt)` with
/// `λ = ln 2 / half_life`. The half-life is the only knob; the formula
/// itself is part of the contract and must not be approximated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForgettingCurve {
    half_life_ms: f64,
    lambda: f64,
}

impl Default for ForgettingCurve {
    fn default() -> Self {
        Self::with_half_life_unchecked(DEFAULT_HALF_LIFE_MS)
    }
}

impl ForgettingCurve {
    pub fn new(half_life_ms: f64) -> Result<Self, ConfigError> {
        if !half_life_ms.is_finite() || half_life_ms <= 0.0 {
            return Err(invalid_value(format!(
                "forgetting curve half-life must be a positive finite number of milliseconds, got {half_life_ms}"
            )));
        }
        Ok(Self::with_half_life_unchecked(half_life_ms))
    }

    fn with_half_life_unchecked(half_life_ms: f64) -> Self {
        Self {
            half_life_ms,
            lambda: std::f64::consts::LN_2 / half_life_ms,
        }
    }

    pub fn half_life_ms(&self) -> f64 {
        self.half_life_ms
    }

    /// Weight of an observation `elapsed_ms` old. Negative elapsed time is
    /// clock skew, not the future: it weighs as fresh (1.0).
    pub fn decay_weight(&self, elapsed_ms: f64) -> f64 {
        if elapsed_ms < 0.0 {
            return 1.0;
        }
        (-self.lambda * elapsed_ms).exp()
    }

    /// Exact inverse of [`decay_weight`](Self::decay_weight): the age at
    /// which an observation decays to `weight`.
    pub fn time_to_weight(&self, weight: f64) -> f64 {
        if weight >= 1.0 {
            return 0.0;
        }
        if weight <= 0.0 {
            return f64::INFINITY;
        }
        -weight.ln() / self.lambda
    }
}
