//! Position sampler bookkeeping
//!
//! The sampler itself is just a timer owned by whoever drives the
//! controller (see [`crate::PlayerService`]). This type records whether that
//! timer should be running and at which generation, so ticks scheduled
//! before a stop/restart can be recognised and dropped.

use std::time::Duration;

/// Default sampling cadence (1 Hz)
pub const DEFAULT_CADENCE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct PositionSampler {
    cadence: Duration,
    generation: u64,
    running: bool,
}

impl PositionSampler {
    pub fn new(cadence: Duration) -> Self {
        Self {
            cadence,
            generation: 0,
            running: false,
        }
    }

    /// Start (or restart) sampling
    ///
    /// Always opens a new generation, invalidating any tick still in
    /// flight from the previous run.
    pub fn start(&mut self) -> u64 {
        self.generation += 1;
        self.running = true;
        self.generation
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    /// Whether a tick from `generation` should be processed
    pub fn accepts(&self, generation: u64) -> bool {
        self.running && generation == self.generation
    }
}

impl Default for PositionSampler {
    fn default() -> Self {
        Self::new(DEFAULT_CADENCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_sampler_rejects_ticks() {
        let sampler = PositionSampler::default();
        assert!(!sampler.is_running());
        assert!(!sampler.accepts(0));
    }

    #[test]
    fn restart_invalidates_old_generation() {
        let mut sampler = PositionSampler::default();
        let first = sampler.start();
        assert!(sampler.accepts(first));

        let second = sampler.start();
        assert_ne!(first, second);
        assert!(!sampler.accepts(first));
        assert!(sampler.accepts(second));
    }

    #[test]
    fn stop_rejects_current_generation() {
        let mut sampler = PositionSampler::new(Duration::from_millis(250));
        let generation = sampler.start();
        sampler.stop();

        assert!(!sampler.accepts(generation));
        assert_eq!(sampler.generation(), generation);
        assert_eq!(sampler.cadence(), Duration::from_millis(250));
    }
}
