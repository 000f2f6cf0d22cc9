use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};

/// Spread of the open/close multiplier around 1.0.
pub const VARIATION: f64 = 0.05;

/// Upper bound of a wick drawn beyond the candle body.
pub const MAX_WICK: f64 = 2.0;

/// Day-to-day noise layered on interpolated candles.
pub trait Jitter {
    /// Multiplier for an interpolated open or close, within `1 ± VARIATION / 2`.
    fn factor(&mut self) -> f64;

    /// Wick length in `[0, MAX_WICK]`.
    fn wick(&mut self) -> f64;
}

/// Jitter drawn from any `rand` generator.
pub struct RngJitter<R> {
    rng: R,
}

impl<R: Rng> RngJitter<R> {
    pub fn new(rng: R) -> Self {
        RngJitter { rng }
    }
}

impl RngJitter<ThreadRng> {
    pub fn thread() -> Self {
        RngJitter::new(rand::rng())
    }
}

impl RngJitter<StdRng> {
    /// Reproducible jitter, same seed same candles.
    pub fn seeded(seed: u64) -> Self {
        RngJitter::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Jitter for RngJitter<R> {
    fn factor(&mut self) -> f64 {
        1.0 + (self.rng.random::<f64>() - 0.5) * VARIATION
    }

    fn wick(&mut self) -> f64 {
        self.rng.random::<f64>() * MAX_WICK
    }
}

/// No noise: open and close follow the interpolation exactly and wicks collapse onto the body.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl Jitter for NoJitter {
    fn factor(&mut self) -> f64 {
        1.0
    }

    fn wick(&mut self) -> f64 {
        0.0
    }
}
