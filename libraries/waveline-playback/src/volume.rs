//! Volume control
//!
//! Linear level in [0.0, 1.0] as understood by the audio handle, plus the
//! mute toggle of the transport's volume button.

/// Level restored by unmute when nothing else was remembered
pub const DEFAULT_LEVEL: f32 = 0.5;

/// Volume controller
///
/// Out-of-range levels are clamped, never rejected. Muting zeroes the
/// level and remembers the previous one so unmute can bring it back.
#[derive(Debug, Clone)]
pub struct Volume {
    /// Current level (0.0-1.0)
    level: f32,

    /// Level to restore on unmute
    restore_level: Option<f32>,
}

impl Volume {
    /// Create new volume controller at `level` (clamped)
    pub fn new(level: f32) -> Self {
        Self {
            level: clamp_level(level),
            restore_level: None,
        }
    }

    /// Set volume level, clamping into [0.0, 1.0]
    ///
    /// An explicit level always cancels a pending unmute restore.
    pub fn set_level(&mut self, level: f32) {
        self.level = clamp_level(level);
        self.restore_level = None;
    }

    /// Get current volume level
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Toggle mute state
    ///
    /// Audible → 0.0 (remembering the level). Silent → remembered level,
    /// or [`DEFAULT_LEVEL`] if the volume was slid down to zero by hand.
    pub fn toggle_mute(&mut self) {
        if self.level > 0.0 {
            self.restore_level = Some(self.level);
            self.level = 0.0;
        } else {
            self.level = self.restore_level.take().unwrap_or(DEFAULT_LEVEL);
        }
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.level == 0.0
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL)
    }
}

fn clamp_level(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}
