//! Cue port: audible feedback during a countdown.

use flowmate_domain::config::Volume;
use flowmate_domain::cue::Tone;

/// Plays short tones. Playback is fire-and-forget and must not block.
pub trait CuePlayer {
    fn play(&self, tone: Tone, volume: Volume);
}

impl<T: CuePlayer + ?Sized> CuePlayer for std::sync::Arc<T> {
    fn play(&self, tone: Tone, volume: Volume) {
        (**self).play(tone, volume);
    }
}
