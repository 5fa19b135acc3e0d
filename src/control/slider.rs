//! Sample-accurate linear ramp between two values over a musical-time
//! duration.
//!
//! The original engine's `Slider` tracks progress internally and leaves
//! the tempo/rate-to-frames conversion to its caller; since the filtered
//! reference sources did not include `Slider.c` itself, this follows the
//! simpler contract spec.md states directly: `start`/`step`/`skip`/`break`,
//! with remaining distance recomputed every step from the remaining
//! `Tstamp` so tempo or audio-rate changes mid-slide never produce a
//! discontinuity (per the open question in spec §9, the reference
//! recomputes remaining distance each step, not just at `start`).

use crate::tstamp::Tstamp;

#[derive(Debug, Clone, Copy)]
pub struct Slider {
    value: f64,
    target: f64,
    remaining: Tstamp,
    active: bool,
}

impl Slider {
    pub fn new(initial: f64) -> Self {
        Slider {
            value: initial,
            target: initial,
            remaining: Tstamp::ZERO,
            active: false,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Begin sliding to `target` over `length` of musical time. A
    /// zero-length slide snaps immediately.
    pub fn start(&mut self, target: f64, length: Tstamp) {
        self.target = target;
        if length.is_zero() {
            self.value = target;
            self.active = false;
            self.remaining = Tstamp::ZERO;
        } else {
            self.remaining = length;
            self.active = true;
        }
    }

    /// Snap to the current value immediately, cancelling any slide.
    pub fn brk(&mut self) {
        self.active = false;
        self.target = self.value;
        self.remaining = Tstamp::ZERO;
    }

    /// Advance one frame at the given tempo/audio-rate, returning the new
    /// value.
    pub fn step(&mut self, tempo: f64, audio_rate: i32) -> f64 {
        if !self.active {
            return self.value;
        }

        let frames_left = self.remaining.to_frames(tempo, audio_rate);
        if frames_left <= 1.0 {
            self.value = self.target;
            self.active = false;
            self.remaining = Tstamp::ZERO;
            return self.value;
        }

        let delta = (self.target - self.value) / frames_left;
        self.value += delta;

        let one_frame = Tstamp::from_frames(1.0, tempo, audio_rate);
        self.remaining = if self.remaining > one_frame {
            self.remaining - one_frame
        } else {
            Tstamp::ZERO
        };

        self.value
    }

    /// Advance `n` frames at once, returning the resulting value.
    pub fn skip(&mut self, n: u32, tempo: f64, audio_rate: i32) -> f64 {
        for _ in 0..n {
            if !self.active {
                break;
            }
            self.step(tempo, audio_rate);
        }
        self.value
    }

    /// Remaining frames before this slide completes at the given tempo/rate.
    pub fn estimate_active_steps_left(&self, tempo: f64, audio_rate: i32) -> u64 {
        if !self.active {
            0
        } else {
            self.remaining.to_frames(tempo, audio_rate).ceil().max(0.0) as u64
        }
    }
}
