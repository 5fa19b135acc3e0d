//! Force processor: per-voice amplitude in dB.
//!
//! Grounded on `Force_state.c`: a carried base level plus tremolo slides
//! while the note is held; on note-off, either a release envelope or (if
//! none is configured) a fixed-rate linear ramp to silence takes over.

use crate::control::{Lfo, Slider};
use crate::event::types::EventArg;
use crate::processor::time_env::{self, TimeEnvConfig, TimeEnvState};
use crate::work_buffer::WorkBuffer;

/// dB/second fall rate of the default release ramp, matching the
/// reference engine's `RAMP_RELEASE_SPEED`.
pub const RAMP_RELEASE_SPEED: f64 = 200.0;

/// Ramp floor below which the voice is considered silent and deactivates.
const SILENCE_FLOOR_DB: f64 = -120.0;

#[derive(Debug, Clone, Default)]
pub struct ForceConfig {
    pub env_force: Option<TimeEnvConfig>,
    pub env_release: Option<TimeEnvConfig>,
    pub x_scale_tied_to_pitch: bool,
}

#[derive(Debug, Clone)]
pub struct ForceVoiceState {
    pub level: Slider,
    pub tremolo: Lfo,
    pub env_force_state: TimeEnvState,
    pub env_release_state: TimeEnvState,
    pub note_on: bool,
    ramp_offset_db: f64,
}

impl ForceVoiceState {
    pub fn new(initial_db: f64) -> Self {
        ForceVoiceState {
            level: Slider::new(initial_db),
            tremolo: Lfo::new(),
            env_force_state: TimeEnvState::new(),
            env_release_state: TimeEnvState::new(),
            note_on: true,
            ramp_offset_db: 0.0,
        }
    }

    pub fn fire_event(&mut self, name: &str, arg: EventArg, tempo: f64, audio_rate: i32) {
        match name {
            "note_off" => self.note_on = false,
            "force" => {
                if let Some(v) = arg.as_float() {
                    self.level.start(v, crate::tstamp::Tstamp::ZERO);
                }
            }
            "force_slide" => {
                if let Some(v) = arg.as_float() {
                    self.level.start(v, crate::tstamp::Tstamp::from_beats(1));
                }
            }
            "tremolo_speed" => {
                if let Some(v) = arg.as_float() {
                    self.tremolo.turn_on();
                    self.tremolo.set_speed(v, crate::tstamp::Tstamp::ZERO);
                }
            }
            "tremolo_depth" => {
                if let Some(v) = arg.as_float() {
                    self.tremolo.turn_on();
                    self.tremolo.set_depth(v, crate::tstamp::Tstamp::ZERO);
                }
            }
            "tremolo_off" => self.tremolo.turn_off(),
            _ => {}
        }
        let _ = (tempo, audio_rate);
    }
}

/// Returns `Some(n)` if the voice should deactivate after rendering `n`
/// frames of this call (silence reached), `None` if it remains active for
/// the whole chunk.
pub fn render_voice(
    vs: &mut ForceVoiceState,
    cfg: &ForceConfig,
    out: &mut WorkBuffer,
    pitch_cents: Option<&[f32]>,
    frames: usize,
    tempo: f64,
    audio_rate: i32,
) -> (usize, Option<usize>) {
    let buf = out.as_mut_slice();
    let mut deactivate_at: Option<usize> = None;
    let mut silence_from: Option<usize> = None;

    for i in 0..frames {
        let base = vs.level.step(tempo, audio_rate);
        let trem = vs.tremolo.step(tempo, audio_rate);
        let stretch = pitch_cents.map(|p| p[i] as f64).unwrap_or(0.0);
        let scale_x = if cfg.x_scale_tied_to_pitch { stretch } else { 0.0 };

        let level_db = if vs.note_on {
            let env_add = cfg
                .env_force
                .as_ref()
                .map(|e| time_env::step(&mut vs.env_force_state, e, scale_x, true, audio_rate))
                .unwrap_or(0.0);
            base + trem + env_add
        } else if let Some(rel_cfg) = &cfg.env_release {
            let v = time_env::step(&mut vs.env_release_state, rel_cfg, scale_x, false, audio_rate);
            if time_env::is_finished(&vs.env_release_state) && deactivate_at.is_none() {
                deactivate_at = Some(i + 1);
            }
            base + trem + v
        } else {
            vs.ramp_offset_db -= RAMP_RELEASE_SPEED / audio_rate as f64;
            if vs.ramp_offset_db <= SILENCE_FLOOR_DB {
                if deactivate_at.is_none() {
                    deactivate_at = Some(i + 1);
                }
                if silence_from.is_none() {
                    silence_from = Some(i);
                }
                f64::NEG_INFINITY
            } else {
                base + trem + vs.ramp_offset_db
            }
        };

        buf[i] = level_db as f32;
    }

    if let Some(from) = silence_from {
        out.set_const_start(from);
        out.set_final(true);
    } else {
        let settled = vs.note_on && !vs.level.is_active() && !vs.tremolo.is_active() && cfg.env_force.is_none();
        if settled {
            out.set_const_start(0);
            out.set_final(true);
        } else {
            out.set_const_start(frames);
            out.set_final(false);
        }
    }

    (frames, deactivate_at)
}
