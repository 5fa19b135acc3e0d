//! Freeverb-style Schroeder reverb: 8 parallel comb filters feeding 4
//! series allpass filters per channel, grounded on `Freeverb_state.c`.

const COMB_TUNINGS_L: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
const ALLPASS_TUNINGS_L: [usize; 4] = [556, 441, 341, 225];
const ALLPASS_FEEDBACK: f64 = 0.5;
const REFERENCE_RATE: f64 = 44100.0;

#[derive(Debug, Clone, Copy)]
pub struct FreeverbConfig {
    pub room_size: f64,
    pub damp01: f64,
    /// Reflectivity knob; mapped to a feedback coefficient via `2^(-5/refl)`.
    pub reflectivity: f64,
    pub stereo_spread_frames: usize,
    pub wet: f64,
    pub dry: f64,
}

#[derive(Debug, Clone)]
struct Comb {
    buffer: Vec<f32>,
    pos: usize,
    filter_store: f32,
}

impl Comb {
    fn new(len: usize) -> Self {
        Comb { buffer: vec![0.0; len.max(1)], pos: 0, filter_store: 0.0 }
    }

    fn process(&mut self, input: f32, feedback: f32, damp: f32) -> f32 {
        let out = self.buffer[self.pos];
        self.filter_store = out * (1.0 - damp) + self.filter_store * damp;
        self.buffer[self.pos] = input + self.filter_store * feedback;
        self.pos = (self.pos + 1) % self.buffer.len();
        out
    }
}

#[derive(Debug, Clone)]
struct Allpass {
    buffer: Vec<f32>,
    pos: usize,
}

impl Allpass {
    fn new(len: usize) -> Self {
        Allpass { buffer: vec![0.0; len.max(1)], pos: 0 }
    }

    fn process(&mut self, input: f32) -> f32 {
        let bufout = self.buffer[self.pos];
        let output = -input + bufout;
        self.buffer[self.pos] = input + bufout * ALLPASS_FEEDBACK as f32;
        self.pos = (self.pos + 1) % self.buffer.len();
        output
    }
}

#[derive(Debug, Clone)]
struct ChannelState {
    combs: Vec<Comb>,
    allpasses: Vec<Allpass>,
}

impl ChannelState {
    fn new(audio_rate: i32, stereo_offset: usize) -> Self {
        let scale = audio_rate as f64 / REFERENCE_RATE;
        let combs = COMB_TUNINGS_L
            .iter()
            .map(|&l| Comb::new((((l + stereo_offset) as f64) * scale) as usize))
            .collect();
        let allpasses = ALLPASS_TUNINGS_L
            .iter()
            .map(|&l| Allpass::new((((l + stereo_offset) as f64) * scale) as usize))
            .collect();
        ChannelState { combs, allpasses }
    }

    fn process(&mut self, input: f32, feedback: f32, damp: f32) -> f32 {
        let mut out = 0.0;
        for comb in &mut self.combs {
            out += comb.process(input, feedback, damp);
        }
        for allpass in &mut self.allpasses {
            out = allpass.process(out);
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct FreeverbState {
    left: ChannelState,
    right: ChannelState,
}

impl FreeverbState {
    pub fn new(audio_rate: i32, stereo_spread_frames: usize) -> Self {
        FreeverbState {
            left: ChannelState::new(audio_rate, 0),
            right: ChannelState::new(audio_rate, stereo_spread_frames),
        }
    }
}

fn damp_adjusted(damp01: f64, audio_rate: i32) -> f64 {
    damp01.powf(REFERENCE_RATE / audio_rate as f64).clamp(0.0, 1.0)
}

fn reflectivity_coef(refl_setting: f64) -> f64 {
    2f64.powf(-5.0 / refl_setting.max(1e-6))
}

pub fn process(
    state: &mut FreeverbState,
    cfg: &FreeverbConfig,
    input_l: &[f32],
    input_r: &[f32],
    out_l: &mut [f32],
    out_r: &mut [f32],
    audio_rate: i32,
) {
    let damp = damp_adjusted(cfg.damp01, audio_rate) as f32;
    let feedback = (cfg.room_size * reflectivity_coef(cfg.reflectivity)) as f32;

    for i in 0..input_l.len() {
        let mono_in = (input_l[i] + input_r[i]) * 0.5;
        let wet_l = state.left.process(mono_in, feedback, damp);
        let wet_r = state.right.process(mono_in, feedback, damp);
        out_l[i] = (input_l[i] * cfg.dry as f32) + (wet_l * cfg.wet as f32);
        out_r[i] = (input_r[i] * cfg.dry as f32) + (wet_r * cfg.wet as f32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverb_tail_extends_past_a_single_impulse() {
        let cfg = FreeverbConfig { room_size: 0.8, damp01: 0.3, reflectivity: 5.0, stereo_spread_frames: 23, wet: 1.0, dry: 0.0 };
        let mut state = FreeverbState::new(48000, cfg.stereo_spread_frames);
        let mut input_l = vec![0.0; 4096];
        input_l[0] = 1.0;
        let input_r = input_l.clone();
        let mut out_l = vec![0.0; 4096];
        let mut out_r = vec![0.0; 4096];
        process(&mut state, &cfg, &input_l, &input_r, &mut out_l, &mut out_r, 48000);

        let tail_energy: f32 = out_l[2000..].iter().map(|x| x.abs()).sum();
        assert!(tail_energy > 0.0);
    }
}
