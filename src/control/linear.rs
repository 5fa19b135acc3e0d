//! A [`Slider`] wrapped with optional periodic oscillation and a value
//! range clamp, used for stream-written control signals (§4.2).

use crate::control::lfo::Lfo;
use crate::control::slider::Slider;
use crate::tstamp::Tstamp;

#[derive(Debug, Clone, Copy)]
pub struct LinearControl {
    slider: Slider,
    lfo: Lfo,
    current: f64,
    min: f64,
    max: f64,
}

impl LinearControl {
    pub fn new(initial: f64, min: f64, max: f64) -> Self {
        let clamped = initial.clamp(min, max);
        LinearControl {
            slider: Slider::new(clamped),
            lfo: Lfo::new(),
            current: clamped,
            min,
            max,
        }
    }

    pub fn value(&self) -> f64 {
        self.current
    }

    pub fn slide_to(&mut self, target: f64, length: Tstamp) {
        self.slider.start(target.clamp(self.min, self.max), length);
    }

    pub fn set_oscillation(&mut self, speed_hz: f64, depth: f64, slide_length: Tstamp) {
        self.lfo.turn_on();
        self.lfo.set_speed(speed_hz, slide_length);
        self.lfo.set_depth(depth, slide_length);
    }

    pub fn stop_oscillation(&mut self) {
        self.lfo.turn_off();
    }

    /// Advance one frame. Returns the clamped value after the slide and
    /// oscillator have both stepped.
    pub fn step(&mut self, tempo: f64, audio_rate: i32) -> f64 {
        let base = self.slider.step(tempo, audio_rate);
        let osc = self.lfo.step(tempo, audio_rate);
        self.current = (base + osc).clamp(self.min, self.max);
        self.current
    }

    pub fn estimate_active_steps_left(&self, tempo: f64, audio_rate: i32) -> u64 {
        self.slider
            .estimate_active_steps_left(tempo, audio_rate)
            .max(self.lfo.estimate_active_steps_left(tempo, audio_rate))
    }
}
