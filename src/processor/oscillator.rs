//! Phase-accumulator oscillator driven by a pitch (cents) input.
//!
//! Waveforms are naive (not band-limited), matching spec's explicit
//! statement that band-limited forms are out of scope here. Noise is white
//! noise, optionally leaky-integrated `order` times to darken its colour.

use crate::work_buffer::WorkBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Sawtooth,
    Triangle,
    Square,
    Noise,
}

#[derive(Debug, Clone, Copy)]
pub struct OscillatorConfig {
    pub waveform: Waveform,
    /// Number of times to integrate white noise for a darker spectrum.
    /// Ignored for non-noise waveforms.
    pub noise_integration_order: u32,
}

#[derive(Debug, Clone)]
pub struct OscillatorVoiceState {
    phase: f64,
    rng: fastrand::Rng,
    integrator_state: Vec<f64>,
}

impl OscillatorVoiceState {
    pub fn new(seed: u64, noise_integration_order: u32) -> Self {
        OscillatorVoiceState {
            phase: 0.0,
            rng: fastrand::Rng::with_seed(seed),
            integrator_state: vec![0.0; noise_integration_order as usize],
        }
    }

    fn next_noise(&mut self) -> f64 {
        let mut v = self.rng.f64() * 2.0 - 1.0;
        for acc in &mut self.integrator_state {
            *acc += v;
            *acc *= 0.995;
            v = *acc;
        }
        v
    }
}

fn cents_to_freq(cents: f64) -> f64 {
    440.0 * 2f64.powf(cents / 1200.0)
}

fn waveform_value(waveform: Waveform, phase: f64) -> f64 {
    match waveform {
        Waveform::Sine => (phase * std::f64::consts::TAU).sin(),
        Waveform::Sawtooth => 2.0 * phase - 1.0,
        Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        Waveform::Square => {
            if phase < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        Waveform::Noise => 0.0, // handled by caller
    }
}

pub fn render_voice(
    vs: &mut OscillatorVoiceState,
    cfg: &OscillatorConfig,
    pitch_cents: &[f32],
    out: &mut WorkBuffer,
    frames: usize,
    audio_rate: i32,
) -> usize {
    let buf = out.as_mut_slice();
    for i in 0..frames {
        if cfg.waveform == Waveform::Noise {
            buf[i] = vs.next_noise() as f32;
            continue;
        }
        let freq = cents_to_freq(pitch_cents[i] as f64);
        buf[i] = waveform_value(cfg.waveform, vs.phase) as f32;
        vs.phase = (vs.phase + freq / audio_rate as f64).rem_euclid(1.0);
    }
    out.set_const_start(frames);
    out.set_final(false);
    frames
}
