//! Debug pulse: a fixed, sample-accurate test tone used to pin down the
//! render pipeline's phase/note-on/note-off timing rather than to make
//! music. Each cycle emits one sample at full scale followed by three at
//! half scale; the note plays for a fixed number of cycles and then goes
//! silent even if still held, and a note-off mid-note truncates it to a
//! short negated release tail instead of continuing the held pattern.

use crate::work_buffer::WorkBuffer;

#[derive(Debug, Clone, Copy)]
pub struct DebugPulseConfig {
    /// Total cycles played while held, before auto-silencing.
    pub max_cycles: u32,
    /// Negated cycles played after note-off before the voice deactivates.
    pub release_cycles: u32,
}

impl Default for DebugPulseConfig {
    fn default() -> Self {
        DebugPulseConfig { max_cycles: 10, release_cycles: 2 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DebugPulseVoiceState {
    frame_in_cycle: u32,
    cycles_done: u32,
    released: bool,
    release_cycles_done: u32,
    sign: f32,
    done: bool,
}

impl DebugPulseVoiceState {
    pub fn new() -> Self {
        DebugPulseVoiceState {
            frame_in_cycle: 0,
            cycles_done: 0,
            released: false,
            release_cycles_done: 0,
            sign: 1.0,
            done: false,
        }
    }
}

impl Default for DebugPulseVoiceState {
    fn default() -> Self {
        Self::new()
    }
}

fn cents_to_freq(cents: f64) -> f64 {
    440.0 * 2f64.powf(cents / 1200.0)
}

/// Render one chunk, returning `(frames_rendered, deactivate)` — `deactivate`
/// is `Some` once the voice has finished its held run or its release tail.
pub fn render_voice(
    vs: &mut DebugPulseVoiceState,
    cfg: &DebugPulseConfig,
    pitch_cents: &[f32],
    note_on: bool,
    out: &mut WorkBuffer,
    frames: usize,
    audio_rate: i32,
) -> (usize, Option<usize>) {
    if !note_on && !vs.released {
        vs.released = true;
        vs.sign = -1.0;
        vs.release_cycles_done = 0;
    }

    let buf = out.as_mut_slice();
    let mut deactivate_at = None;

    for i in 0..frames {
        if vs.done {
            buf[i] = 0.0;
            deactivate_at.get_or_insert(i);
            continue;
        }

        buf[i] = if vs.frame_in_cycle == 0 { vs.sign } else { vs.sign * 0.5 };

        vs.frame_in_cycle += 1;
        let freq = cents_to_freq(pitch_cents[i] as f64).max(1.0);
        let period = ((audio_rate as f64 / freq).round() as u32).max(1);
        if vs.frame_in_cycle >= period {
            vs.frame_in_cycle = 0;
            vs.cycles_done += 1;
            if vs.released {
                vs.release_cycles_done += 1;
                if vs.release_cycles_done >= cfg.release_cycles {
                    vs.done = true;
                }
            } else if vs.cycles_done >= cfg.max_cycles {
                vs.done = true;
            }
        }
    }

    out.set_const_start(frames);
    out.set_final(false);
    (frames, deactivate_at)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pitch_for_freq(freq: f64, frames: usize) -> Vec<f32> {
        let cents = (1200.0 * (freq / 440.0).log2()) as f32;
        vec![cents; frames]
    }

    #[test]
    fn held_note_emits_ten_cycles_then_silence() {
        let cfg = DebugPulseConfig::default();
        let mut vs = DebugPulseVoiceState::new();
        let pitch = pitch_for_freq(16.0, 128);
        let mut out = WorkBuffer::new(128);
        let (_, deactivate) = render_voice(&mut vs, &cfg, &pitch, true, &mut out, 128, 64);

        let buf = out.as_slice();
        for i in (0..40).step_by(4) {
            assert!((buf[i] - 1.0).abs() < 1e-6, "index {i} should be the pulse peak");
        }
        for i in 0..40 {
            if i % 4 != 0 {
                assert!((buf[i] - 0.5).abs() < 1e-6, "index {i} should be the pulse tail");
            }
        }
        for i in 40..128 {
            assert_eq!(buf[i], 0.0, "index {i} should be silent after 10 cycles");
        }
        assert!(deactivate.is_some());
    }

    #[test]
    fn note_off_mid_phase_emits_negated_release_tail_then_silence() {
        let cfg = DebugPulseConfig::default();
        let mut vs = DebugPulseVoiceState::new();
        let pitch = pitch_for_freq(16.0, 128);

        let mut out = WorkBuffer::new(128);
        render_voice(&mut vs, &cfg, &pitch[..20], true, &mut out, 20, 64);

        let mut out2 = WorkBuffer::new(108);
        render_voice(&mut vs, &cfg, &pitch[20..], false, &mut out2, 108, 64);

        let buf = out2.as_slice();
        for i in (0..8).step_by(4) {
            assert!((buf[i] - (-1.0)).abs() < 1e-6, "index {} should be the negated peak", 20 + i);
        }
        for i in 0..8 {
            if i % 4 != 0 {
                assert!((buf[i] - (-0.5)).abs() < 1e-6, "index {} should be the negated tail", 20 + i);
            }
        }
        for i in 8..108 {
            assert_eq!(buf[i], 0.0, "index {} should be silent after the release tail", 20 + i);
        }
    }
}
