//! Random suffixes for reserved-name substitution

use std::sync::Mutex;

/// Exclusive upper bound for reserved-name suffixes
pub const SUFFIX_BOUND: u32 = 1000;

/// Source of numeric suffixes appended to reserved names.
///
/// Implementations must return values in `[0, SUFFIX_BOUND)`.
pub trait SuffixSource: Send + Sync {
    /// Next suffix
    fn next_suffix(&self) -> u32;
}

/// Uniform suffixes from the thread-local `fastrand` generator
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSuffix;

impl SuffixSource for RandomSuffix {
    fn next_suffix(&self) -> u32 {
        fastrand::u32(0..SUFFIX_BOUND)
    }
}

/// Reproducible suffixes from a seeded generator
#[derive(Debug)]
pub struct SeededSuffix {
    rng: Mutex<fastrand::Rng>,
}

impl SeededSuffix {
    /// Create a generator with a fixed seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }
}

impl SuffixSource for SeededSuffix {
    fn next_suffix(&self) -> u32 {
        match self.rng.lock() {
            Ok(mut rng) => rng.u32(0..SUFFIX_BOUND),
            // A poisoned lock still holds a usable generator
            Err(poisoned) => poisoned.into_inner().u32(0..SUFFIX_BOUND),
        }
    }
}
