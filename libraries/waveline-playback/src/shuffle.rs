//! Shuffle algorithm for queue randomization

use crate::types::Song;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Source of queue permutations
///
/// Wraps the RNG so a fixed seed gives reproducible shuffles (useful for
/// tests and for replaying a session); without a seed it draws from OS
/// entropy.
#[derive(Debug, Clone)]
pub struct Shuffler {
    rng: StdRng,
}

impl Shuffler {
    /// Create a shuffler, seeded when `seed` is provided
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Return a shuffled copy of `songs`
    ///
    /// Fisher-Yates: each song has equal probability of landing at any
    /// position. The input is never modified.
    pub fn shuffled(&mut self, songs: &[Song]) -> Vec<Song> {
        let mut copy = songs.to_vec();
        copy.shuffle(&mut self.rng);
        copy
    }
}

impl Default for Shuffler {
    fn default() -> Self {
        Self::new(None)
    }
}
