//! Sine-wave low-frequency oscillator with slidable speed and depth.
//!
//! Grounded on `LFO.c`: speed and depth are each carried by a [`Slider`] so
//! they can ramp smoothly (vibrato/tremolo "speed up" effects), and turning
//! the LFO off does not cut the signal mid-wave — it runs out the current
//! half-cycle to its next zero crossing first, so a release never clicks.

use crate::control::slider::Slider;
use crate::tstamp::Tstamp;

#[derive(Debug, Clone, Copy)]
pub struct Lfo {
    phase: f64,
    speed: Slider,
    depth: Slider,
    on: bool,
    turning_off: bool,
}

impl Lfo {
    pub fn new() -> Self {
        Lfo {
            phase: 0.0,
            speed: Slider::new(0.0),
            depth: Slider::new(0.0),
            on: false,
            turning_off: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.on || self.turning_off
    }

    pub fn turn_on(&mut self) {
        self.on = true;
        self.turning_off = false;
    }

    /// Request the LFO stop; it keeps running until the current half-cycle
    /// completes at its next zero crossing.
    pub fn turn_off(&mut self) {
        self.turning_off = true;
    }

    pub fn set_speed(&mut self, speed_hz: f64, slide_length: Tstamp) {
        self.speed.start(speed_hz, slide_length);
    }

    pub fn set_depth(&mut self, depth: f64, slide_length: Tstamp) {
        self.depth.start(depth, slide_length);
    }

    fn value(&self) -> f64 {
        if !self.on && !self.turning_off {
            return 0.0;
        }
        (self.phase * std::f64::consts::TAU).sin() * self.depth.value()
    }

    /// Advance one frame, returning the new output value.
    pub fn step(&mut self, tempo: f64, audio_rate: i32) -> f64 {
        if !self.on && !self.turning_off {
            return 0.0;
        }

        let speed_hz = self.speed.step(tempo, audio_rate);
        self.depth.step(tempo, audio_rate);

        let prev_phase = self.phase;
        self.phase += speed_hz / audio_rate as f64;

        if self.turning_off {
            // A zero crossing happens whenever the fractional phase wraps
            // past 0.5 (the sine's descending crossing) or past 1.0
            // (ascending). We treat either integer-or-half boundary
            // crossed this step as cycle completion.
            let prev_half = (prev_phase * 2.0).floor();
            let new_half = (self.phase * 2.0).floor();
            if new_half > prev_half {
                self.on = false;
                self.turning_off = false;
                self.phase = 0.0;
                return 0.0;
            }
        }

        self.phase = self.phase.rem_euclid(1.0);
        self.value()
    }

    pub fn skip(&mut self, n: u32, tempo: f64, audio_rate: i32) -> f64 {
        let mut last = self.value();
        for _ in 0..n {
            if !self.is_active() {
                break;
            }
            last = self.step(tempo, audio_rate);
        }
        last
    }

    pub fn estimate_active_steps_left(&self, tempo: f64, audio_rate: i32) -> u64 {
        let base = if !self.is_active() {
            0
        } else if self.turning_off {
            let speed_hz = self.speed.value().max(1e-6);
            let frames_per_cycle = audio_rate as f64 / speed_hz;
            (frames_per_cycle * (1.0 - self.phase.fract())).ceil().max(0.0) as u64
        } else {
            u64::MAX
        };
        base.max(self.speed.estimate_active_steps_left(tempo, audio_rate))
    }
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_lfo_outputs_zero() {
        let mut lfo = Lfo::new();
        assert_eq!(lfo.step(120.0, 48000), 0.0);
    }

    #[test]
    fn active_lfo_oscillates_with_depth() {
        let mut lfo = Lfo::new();
        lfo.turn_on();
        lfo.set_depth(1.0, Tstamp::ZERO);
        lfo.set_speed(1.0, Tstamp::ZERO);
        let mut max_abs = 0.0f64;
        for _ in 0..48000 {
            max_abs = max_abs.max(lfo.step(120.0, 48000).abs());
        }
        assert!(max_abs > 0.9);
    }

    #[test]
    fn turn_off_eventually_halts_and_returns_to_idle() {
        let mut lfo = Lfo::new();
        lfo.turn_on();
        lfo.set_depth(1.0, Tstamp::ZERO);
        lfo.set_speed(4.0, Tstamp::ZERO);
        lfo.turn_off();
        for _ in 0..48000 {
            lfo.step(120.0, 48000);
        }
        assert!(!lfo.is_active());
    }
}
