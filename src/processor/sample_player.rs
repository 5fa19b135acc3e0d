//! Sample/PCM playback with linear interpolation and loop handling.

use crate::param::sample::{LoopMode, Sample};
use crate::work_buffer::WorkBuffer;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SamplePlayerConfig {
    pub sample: Arc<Sample>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone)]
pub struct SamplePlayerVoiceState {
    rel_pos: usize,
    rel_pos_rem: f64,
    direction: Direction,
}

impl SamplePlayerVoiceState {
    pub fn new() -> Self {
        SamplePlayerVoiceState { rel_pos: 0, rel_pos_rem: 0.0, direction: Direction::Forward }
    }
}

impl Default for SamplePlayerVoiceState {
    fn default() -> Self {
        Self::new()
    }
}

fn cents_to_freq(cents: f64) -> f64 {
    440.0 * 2f64.powf(cents / 1200.0)
}

fn read_interpolated(sample: &Sample, channel: usize, pos: usize, frac: f64) -> f32 {
    let a = sample.at(channel, pos);
    let b = sample.at(channel, pos + 1);
    a + (b - a) * frac as f32
}

/// Renders one output channel of sample playback. Returns `Some(n)` if the
/// voice should deactivate after `n` frames (non-looping sample exhausted).
pub fn render_voice(
    vs: &mut SamplePlayerVoiceState,
    cfg: &SamplePlayerConfig,
    pitch_cents: &[f32],
    out_channel: usize,
    out: &mut WorkBuffer,
    frames: usize,
    audio_rate: i32,
) -> (usize, Option<usize>) {
    let sample = &cfg.sample;
    let len = sample.len();
    let buf = out.as_mut_slice();
    let mut deactivate_at = None;

    for i in 0..frames {
        if len == 0 {
            buf[i] = 0.0;
            if deactivate_at.is_none() {
                deactivate_at = Some(i);
            }
            continue;
        }

        buf[i] = read_interpolated(sample, out_channel, vs.rel_pos, vs.rel_pos_rem);

        let freq = cents_to_freq(pitch_cents[i] as f64);
        let step = (freq / sample.mid_freq()) * (sample.storage_rate() / audio_rate as f64);
        advance_position(vs, sample, step);

        match sample.loop_mode() {
            LoopMode::Off => {
                if vs.rel_pos + 1 >= len {
                    if deactivate_at.is_none() {
                        deactivate_at = Some(i + 1);
                    }
                }
            }
            _ => {}
        }
    }

    out.set_const_start(frames);
    out.set_final(false);
    (frames, deactivate_at)
}

fn advance_position(vs: &mut SamplePlayerVoiceState, sample: &Sample, step: f64) {
    let len = sample.len();
    let (loop_start, loop_end) = (sample.loop_start(), sample.loop_end());

    let signed_step = match vs.direction {
        Direction::Forward => step,
        Direction::Backward => -step,
    };

    let mut pos = vs.rel_pos as f64 + vs.rel_pos_rem + signed_step;

    match sample.loop_mode() {
        LoopMode::Off => {
            if pos >= len as f64 {
                pos = len as f64 - 1.0;
            }
        }
        LoopMode::Unidirectional => {
            if loop_end > loop_start {
                while pos >= loop_end as f64 {
                    pos -= (loop_end - loop_start) as f64;
                }
            }
        }
        LoopMode::Bidirectional => {
            // Reflect at loop_end-1 and loop_start (spec §4.5), not at
            // loop_end itself: loop_end is exclusive, so the last sample
            // visited before turning around is loop_end-1. Using strict
            // `>`/`<` against that boundary (rather than `>=`) guarantees a
            // hit exactly on the boundary falls inside the valid range and
            // terminates instead of reflecting onto itself forever.
            if loop_end > loop_start {
                let upper = (loop_end - 1) as f64;
                let lower = loop_start as f64;
                if upper <= lower {
                    pos = lower;
                } else {
                    loop {
                        if pos > upper {
                            pos = 2.0 * upper - pos;
                            vs.direction = Direction::Backward;
                        } else if pos < lower {
                            pos = 2.0 * lower - pos;
                            vs.direction = Direction::Forward;
                        } else {
                            break;
                        }
                    }
                }
            }
        }
    }

    vs.rel_pos = pos.floor().max(0.0) as usize;
    vs.rel_pos_rem = pos - pos.floor();
}
