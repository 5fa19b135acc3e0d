//! State-variable filter (lowpass/highpass), grounded on `Filter_state.c`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Lowpass,
    Highpass,
}

#[derive(Debug, Clone, Copy)]
pub struct FilterConfig {
    pub mode: FilterMode,
    pub cutoff_hz: f64,
    /// 0..100, warped per spec §4.5/§9 to keep content compatibility.
    pub resonance: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FilterState {
    s1: f64,
    s2: f64,
}

impl FilterState {
    pub fn new() -> Self {
        FilterState { s1: 0.0, s2: 0.0 }
    }

    pub fn reset(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
    }
}

/// Warp resonance 0..100 into the `k = 1/Q` coefficient used by the
/// update equations. Constants fixed per spec §9 to preserve parameter
/// compatibility with existing content.
fn warp_resonance(r: f64) -> f64 {
    (50f64.powf((100.0 - r) / 100.0) - 1.0) * 2.0 / (50.0 - 1.0)
}

pub fn process(state: &mut FilterState, cfg: &FilterConfig, input: &[f32], output: &mut [f32], audio_rate: i32) {
    let g = (std::f64::consts::PI * cfg.cutoff_hz / audio_rate as f64).tan();
    let k = warp_resonance(cfg.resonance).max(1e-6);

    for (i, &x) in input.iter().enumerate() {
        let x = x as f64;
        let hp = (x - state.s1 * (k + g) - state.s2) / (1.0 + k * g + g * g);

        let u1 = g * hp;
        let bp = u1 + state.s1;
        state.s1 = u1 + bp;

        let u2 = g * bp;
        let lp = u2 + state.s2;
        state.s2 = u2 + lp;

        output[i] = match cfg.mode {
            FilterMode::Lowpass => lp as f32,
            FilterMode::Highpass => hp as f32,
        };
    }
}
