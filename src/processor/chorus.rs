//! Chorus: up to 8 modulated delay-line voices reading from one shared
//! history buffer, grounded on `Chorus_state.c`.

pub const CHORUS_VOICES_MAX: usize = 8;
/// Delay settings at or above this many seconds are disabled.
pub const CHORUS_DELAY_MAX: f64 = 2.0;

#[derive(Debug, Clone, Copy)]
pub struct ChorusVoiceConfig {
    pub delay_sec: f64,
    pub range_sec: f64,
    pub speed_hz: f64,
    pub volume_db: f64,
}

impl ChorusVoiceConfig {
    fn is_enabled(&self) -> bool {
        self.delay_sec >= 0.0 && self.delay_sec < CHORUS_DELAY_MAX
    }
}

#[derive(Debug, Clone)]
pub struct ChorusConfig {
    pub voices: Vec<ChorusVoiceConfig>,
}

#[derive(Debug, Clone, Copy)]
struct VoicePhase {
    phase: f64,
}

#[derive(Debug, Clone)]
pub struct ChorusState {
    history: Vec<f32>,
    write_pos: usize,
    phases: Vec<VoicePhase>,
}

impl ChorusState {
    pub fn new(audio_rate: i32) -> Self {
        let history_len = (CHORUS_DELAY_MAX * audio_rate as f64).ceil() as usize + 4;
        ChorusState {
            history: vec![0.0; history_len],
            write_pos: 0,
            phases: vec![VoicePhase { phase: 0.0 }; CHORUS_VOICES_MAX],
        }
    }

    fn read_interpolated(&self, delay_frames: f64) -> f32 {
        let len = self.history.len() as f64;
        let read_pos = (self.write_pos as f64 - delay_frames).rem_euclid(len);
        let i0 = read_pos.floor() as usize % self.history.len();
        let i1 = (i0 + 1) % self.history.len();
        let frac = read_pos.fract() as f32;
        self.history[i0] * (1.0 - frac) + self.history[i1] * frac
    }
}

fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

pub fn process(state: &mut ChorusState, cfg: &ChorusConfig, input: &[f32], output: &mut [f32], audio_rate: i32) {
    for (i, &x) in input.iter().enumerate() {
        state.history[state.write_pos] = x;

        let mut mix = 0.0f64;
        for (v, voice) in cfg.voices.iter().enumerate().take(CHORUS_VOICES_MAX) {
            if !voice.is_enabled() {
                continue;
            }
            let phase = &mut state.phases[v].phase;
            let lfo = (*phase * std::f64::consts::TAU).sin();
            *phase = (*phase + voice.speed_hz / audio_rate as f64).rem_euclid(1.0);

            let delay_frames = (voice.delay_sec + voice.range_sec * lfo) * audio_rate as f64;
            let delay_frames = delay_frames.max(0.0);
            let sample = state.read_interpolated(delay_frames) as f64;
            mix += sample * db_to_linear(voice.volume_db);
        }

        output[i] = mix as f32;
        state.write_pos = (state.write_pos + 1) % state.history.len();
    }
}
