//! A cue player for hosts without audio output.

use flowmate_app::ports::CuePlayer;
use flowmate_domain::config::Volume;
use flowmate_domain::cue::Tone;

/// Logs every tone instead of playing it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCuePlayer;

impl CuePlayer for TracingCuePlayer {
    fn play(&self, tone: Tone, volume: Volume) {
        let gain = f32::from(volume);
        if gain > 0.0 {
            tracing::info!(
                frequency_hz = tone.frequency_hz,
                duration_ms = tone.duration_ms,
                waveform = ?tone.waveform,
                gain,
                "beep"
            );
        }
    }
}
