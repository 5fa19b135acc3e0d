//! Envelope generator: publishes an arbitrary time-envelope value to a send
//! port, shaped by an incoming force stream and remapped to an output range.

use crate::param::Envelope;
use crate::processor::time_env::{self, TimeEnvConfig, TimeEnvState};
use crate::work_buffer::WorkBuffer;

#[derive(Debug, Clone)]
pub struct EnvGenConfig {
    pub time_env: TimeEnvConfig,
    /// Maps incoming force (linear amplitude, 0..1) to a scaling factor.
    /// `None` means force passes through linearly.
    pub force_curve: Option<Envelope>,
    pub y_min: f64,
    pub y_max: f64,
}

#[derive(Debug, Clone)]
pub struct EnvGenVoiceState {
    pub time_env_state: TimeEnvState,
}

impl EnvGenVoiceState {
    pub fn new() -> Self {
        EnvGenVoiceState { time_env_state: TimeEnvState::new() }
    }
}

impl Default for EnvGenVoiceState {
    fn default() -> Self {
        Self::new()
    }
}

fn force_scale(cfg: &EnvGenConfig, force_linear: f64) -> f64 {
    match &cfg.force_curve {
        Some(curve) => curve.value_at(force_linear),
        None => force_linear,
    }
}

pub fn render_voice(
    vs: &mut EnvGenVoiceState,
    cfg: &EnvGenConfig,
    force_linear: Option<&[f32]>,
    held: bool,
    out: &mut WorkBuffer,
    frames: usize,
    audio_rate: i32,
) -> usize {
    let buf = out.as_mut_slice();
    for (i, sample) in buf.iter_mut().take(frames).enumerate() {
        let env_value = time_env::step(&mut vs.time_env_state, &cfg.time_env, 0.0, held, audio_rate);
        let force = force_linear.map(|f| f[i] as f64).unwrap_or(1.0);
        let scaled = env_value * force_scale(cfg, force);
        let remapped = cfg.y_min + scaled * (cfg.y_max - cfg.y_min);
        *sample = remapped as f32;
    }

    if time_env::is_finished(&vs.time_env_state) {
        out.set_const_start(frames.min(1));
        out.set_final(true);
    } else {
        out.set_const_start(frames);
        out.set_final(false);
    }
    frames
}
