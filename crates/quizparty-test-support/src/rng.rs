//! Test RNG: deterministic `DeterministicRng` implementations for tests.

use quizparty_core::rng::DeterministicRng;

/// A no-op RNG that always returns `min` for `next_u32_range` and `0.0` for
/// `next_f64`. Suitable for tests that do not depend on specific random values.
#[derive(Debug)]
pub struct MockRng;

impl DeterministicRng for MockRng {
    fn next_u32_range(&mut self, min: u32, _max: u32) -> u32 {
        min
    }

    fn next_f64(&mut self) -> f64 {
        0.0
    }
}

/// An RNG that returns values from a predetermined sequence, then `min` once
/// the sequence is used up. Used in tests that need specific, repeatable
/// random outcomes (e.g., a particular session code).
#[derive(Debug)]
pub struct SequenceRng {
    values: Vec<u32>,
    index: usize,
}

impl SequenceRng {
    /// Create a new `SequenceRng` with the given values.
    #[must_use]
    pub fn new(values: Vec<u32>) -> Self {
        Self { values, index: 0 }
    }
}

impl DeterministicRng for SequenceRng {
    fn next_u32_range(&mut self, min: u32, _max: u32) -> u32 {
        match self.values.get(self.index) {
            Some(&value) => {
                self.index += 1;
                value
            }
            None => min,
        }
    }

    fn next_f64(&mut self) -> f64 {
        0.0
    }
}

/// An RNG that walks through the requested range one step per call,
/// wrapping around. Never panics, never repeats until the range is exhausted.
#[derive(Debug, Default)]
pub struct CyclingRng {
    step: u32,
}

impl DeterministicRng for CyclingRng {
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32 {
        let span = max.saturating_sub(min).saturating_add(1);
        let value = min + self.step % span;
        self.step = self.step.wrapping_add(1);
        value
    }

    fn next_f64(&mut self) -> f64 {
        0.0
    }
}
