//! Random implementation.

use crate::infrastructure::ports::RandomPort;

/// System random - uses real randomness.
pub struct SystemRandom;

impl SystemRandom {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPort for SystemRandom {
    fn gen_index(&self, len: usize) -> usize {
        use rand::Rng;
        rand::thread_rng().gen_range(0..len.max(1))
    }
}

/// Fixed random for testing.
#[cfg(test)]
pub struct FixedRandom(pub usize);

#[cfg(test)]
impl RandomPort for FixedRandom {
    fn gen_index(&self, len: usize) -> usize {
        self.0 % len.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_random_stays_in_range() {
        let random = SystemRandom::new();
        for len in 1..20 {
            assert!(random.gen_index(len) < len);
        }
    }
}
