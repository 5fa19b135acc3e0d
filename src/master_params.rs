//! Cross-channel playback state: the sequencer's cursor position, tempo,
//! global volume, jump bookkeeping, and the engine-wide RNG (§3's "Master
//! Params").

use crate::ordered_map::Cursor;
use crate::tstamp::Tstamp;

#[derive(Debug, Clone)]
pub struct MasterParams {
    /// Index into the album's track list.
    pub track: usize,
    /// Index into the current track's song order list.
    pub system: usize,
    pub row: Tstamp,
    pub tempo: f64,
    pub global_volume_db: f64,
    pub jump_counter: i64,
    pub tuning_state: usize,
    pub sustain: bool,
    /// Per-channel event cursor into the current pattern instance's event
    /// map, re-seeked whenever the pattern instance changes.
    pub cursors: Vec<Cursor>,
    pub rng: fastrand::Rng,
    pub total_frames: u64,
    /// Most recent dropped-event error, per §7's "logged as a single
    /// most-recent error retrievable by the host" rule.
    pub last_event_error: Option<String>,
}

impl MasterParams {
    pub fn new(channel_count: usize, seed: u64) -> Self {
        MasterParams {
            track: 0,
            system: 0,
            row: Tstamp::ZERO,
            tempo: 120.0,
            global_volume_db: 0.0,
            jump_counter: 0,
            tuning_state: 0,
            sustain: false,
            cursors: vec![Cursor::START; channel_count],
            rng: fastrand::Rng::with_seed(seed),
            total_frames: 0,
            last_event_error: None,
        }
    }

    pub fn reset(&mut self, channel_count: usize, seed: u64) {
        *self = MasterParams::new(channel_count, seed);
    }

    /// Re-seek every channel cursor to the start of a freshly-entered
    /// pattern instance.
    pub fn reset_cursors(&mut self) {
        for c in &mut self.cursors {
            *c = Cursor::START;
        }
    }

    pub fn record_event_error(&mut self, msg: impl Into<String>) {
        self.last_event_error = Some(msg.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_restores_defaults_but_reseeds_rng_deterministically() {
        let mut p = MasterParams::new(4, 7);
        p.tempo = 200.0;
        p.track = 2;
        p.reset(4, 7);
        assert_eq!(p.tempo, 120.0);
        assert_eq!(p.track, 0);
    }

    #[test]
    fn record_event_error_keeps_only_the_latest() {
        let mut p = MasterParams::new(1, 0);
        p.record_event_error("first");
        p.record_event_error("second");
        assert_eq!(p.last_event_error.as_deref(), Some("second"));
    }
}
