use std::sync::Mutex;

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Uniform source of randomness for the catalog and battle engine.
pub trait RandomSource: Send + Sync {
    /// A value in `[0, 1)`.
    fn draw(&self) -> f64;

    /// Zero-based index in `0..n`, computed as `floor(draw * n)`.
    /// `n` must be non-zero.
    fn draw_index(&self, n: usize) -> usize {
        let idx = (self.draw() * n as f64).floor() as usize;
        idx.min(n.saturating_sub(1))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn draw(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Deterministic source, used when `RANDOM_SEED` is configured.
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn draw(&self) -> f64 {
        // a poisoned lock still holds a usable rng
        let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
        rng.gen::<f64>()
    }
}

/// Always returns the same draw.
#[cfg(test)]
pub struct FixedRandom(pub f64);

#[cfg(test)]
impl RandomSource for FixedRandom {
    fn draw(&self) -> f64 {
        self.0
    }
}
