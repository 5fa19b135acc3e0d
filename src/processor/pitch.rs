//! Pitch processor: emits a per-voice pitch stream in cents.

use crate::control::{Lfo, Slider};
use crate::event::types::EventArg;
use crate::param::NumList;
use crate::tstamp::Tstamp;
use crate::work_buffer::WorkBuffer;

/// Upper bound on simultaneously active arpeggio offsets, matching the
/// reference engine's `KQT_ARPEGGIO_NOTES_MAX`.
pub const ARPEGGIO_NOTES_MAX: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct PitchConfig {
    pub arpeggio_offsets: Option<NumList>,
    /// Frames held per arpeggio step.
    pub arpeggio_frames_per_note: u32,
}

#[derive(Debug, Clone)]
pub struct PitchVoiceState {
    pub base_cents: f64,
    pub slide: Slider,
    pub vibrato: Lfo,
    pub arpeggio_on: bool,
    pub arpeggio_phase_frames: u64,
}

impl PitchVoiceState {
    pub fn new(base_cents: f64) -> Self {
        PitchVoiceState {
            base_cents,
            slide: Slider::new(base_cents),
            vibrato: Lfo::new(),
            arpeggio_on: false,
            arpeggio_phase_frames: 0,
        }
    }

    fn arpeggio_offset(&self, cfg: &PitchConfig) -> f64 {
        let Some(offsets) = &cfg.arpeggio_offsets else { return 0.0 };
        if !self.arpeggio_on || offsets.is_empty() || cfg.arpeggio_frames_per_note == 0 {
            return 0.0;
        }
        let step = (self.arpeggio_phase_frames / cfg.arpeggio_frames_per_note as u64) as usize;
        let idx = step % offsets.len().min(ARPEGGIO_NOTES_MAX).max(1);
        offsets.get(idx).unwrap_or(0.0)
    }

    pub fn fire_event(&mut self, name: &str, arg: EventArg, _tempo: f64, _audio_rate: i32) {
        match name {
            "pitch_slide" => {
                if let Some(v) = arg.as_float() {
                    self.slide.start(v, Tstamp::from_beats(1));
                }
            }
            "vibrato_speed" => {
                if let Some(v) = arg.as_float() {
                    self.vibrato.turn_on();
                    self.vibrato.set_speed(v, Tstamp::ZERO);
                }
            }
            "vibrato_depth" => {
                if let Some(v) = arg.as_float() {
                    self.vibrato.turn_on();
                    self.vibrato.set_depth(v, Tstamp::ZERO);
                }
            }
            "vibrato_off" => self.vibrato.turn_off(),
            "arpeggio_on" => self.arpeggio_on = true,
            "arpeggio_off" => self.arpeggio_on = false,
            _ => {}
        }
    }
}

pub fn render_voice(
    vs: &mut PitchVoiceState,
    cfg: &PitchConfig,
    out: &mut WorkBuffer,
    frames: usize,
    tempo: f64,
    audio_rate: i32,
) -> usize {
    let buf = out.as_mut_slice();
    for sample in buf.iter_mut().take(frames) {
        let slid = vs.slide.step(tempo, audio_rate);
        let vib = vs.vibrato.step(tempo, audio_rate);
        let arp = vs.arpeggio_offset(cfg);
        *sample = (slid + vib + arp) as f32;
        vs.base_cents = slid;
        if vs.arpeggio_on {
            vs.arpeggio_phase_frames += 1;
        }
    }

    let settled = !vs.slide.is_active() && !vs.vibrato.is_active() && !vs.arpeggio_on;
    if settled {
        out.set_const_start(0);
        out.set_final(true);
    } else {
        out.set_const_start(frames);
        out.set_final(false);
    }
    frames
}
