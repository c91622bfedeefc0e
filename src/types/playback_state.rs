/// Runtime playback state mirrored by the interface. The player backend is
/// the source of truth for position and duration; this struct is what the
/// widgets read and what the volume/mute bookkeeping lives on.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub current_time: f64,
    pub duration: f64,
    pub is_playing: bool,
    pub buffering: bool,
    /// Linear gain in [0, 3].
    pub volume: f64,
    /// Last non-zero volume, restored when unmuting.
    pub latest_volume: f64,
    pub muted: bool,
}

impl PlaybackState {
    pub fn new() -> Self {
        PlaybackState {
            current_time: 0.0,
            duration: 0.0,
            is_playing: false,
            buffering: false,
            volume: 1.0,
            latest_volume: 1.0,
            muted: false,
        }
    }

    /// Record an applied volume and keep the mute bookkeeping consistent:
    /// any non-zero volume unmutes and becomes the restore point, zero mutes.
    pub fn apply_volume(&mut self, volume: f64) {
        self.volume = volume;
        if volume != 0.0 {
            self.latest_volume = volume;
            self.muted = false;
        } else {
            self.muted = true;
        }
    }

    /// Toggle mute, returning the volume the player should now use.
    pub fn toggle_mute(&mut self) -> f64 {
        if self.volume != 0.0 && !self.muted {
            self.volume = 0.0;
            self.muted = true;
        } else {
            self.volume = self.latest_volume;
            self.muted = false;
        }
        self.volume
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new()
    }
}
