//! Randomising the order experiments run in, so neither path always gets the
//! warm caches (or the cold ones).

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::observation::Variant;

/// A strategy for ordering the experiments selected by `run`
pub trait Shuffle {
    /// Returns a new ordering of `order`. The input is left untouched.
    fn shuffle(&self, order: &[Variant]) -> Vec<Variant>;
}

impl<F> Shuffle for F
where
    F: Fn(&[Variant]) -> Vec<Variant>,
{
    fn shuffle(&self, order: &[Variant]) -> Vec<Variant> {
        self(order)
    }
}

/// Uniform Fisher-Yates shuffle using the thread-local generator. This is the
/// default strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngShuffle;

impl Shuffle for ThreadRngShuffle {
    fn shuffle(&self, order: &[Variant]) -> Vec<Variant> {
        let mut shuffled = order.to_vec();
        SliceRandom::shuffle(&mut shuffled[..], &mut rand::thread_rng());
        shuffled
    }
}

/// Uniform shuffle driven by a seeded generator, for reproducible orderings
pub struct SeededShuffle(Mutex<StdRng>);

impl SeededShuffle {
    pub fn new(seed: u64) -> Self {
        Self(Mutex::new(StdRng::seed_from_u64(seed)))
    }
}

impl Shuffle for SeededShuffle {
    fn shuffle(&self, order: &[Variant]) -> Vec<Variant> {
        let mut shuffled = order.to_vec();
        // a poisoned generator is still a usable generator
        let mut rng = match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        SliceRandom::shuffle(&mut shuffled[..], &mut *rng);
        shuffled
    }
}
