//! Probabilistic gate deciding whether an observed event is processed.

use rand::Rng;

/// True with probability `rate`. Trials are independent; nothing is
/// remembered between calls.
///
/// A rate of 1.0 or more always passes without drawing from the generator,
/// so full-rate configurations stay deterministic. Zero or negative rates
/// never pass.
pub fn should_sample<R: Rng>(rate: f64, rng: &mut R) -> bool {
    if rate >= 1.0 {
        return true;
    }
    if rate <= 0.0 {
        return false;
    }
    rng.gen::<f64>() < rate
}

/// [`should_sample`] against the thread-local generator.
pub fn sample(rate: f64) -> bool {
    should_sample(rate, &mut rand::thread_rng())
}
