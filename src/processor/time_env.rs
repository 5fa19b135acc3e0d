//! Shared time-envelope iteration used by force, envelope-generator, and
//! sample release processing.
//!
//! Walks an [`Envelope`]'s x-axis at a rate derived from a stretch input in
//! cents (so the envelope can track pitch), optionally looping between its
//! loop markers while the voice is held, and reports when the final node
//! has been reached.

use crate::param::Envelope;

/// Clamp applied to the stretch input before exponentiating, avoiding a
/// runaway rate from a corrupt or extreme cents value.
const STRETCH_CLAMP_CENTS: f64 = 9600.0;

#[derive(Debug, Clone)]
pub struct TimeEnvConfig {
    pub envelope: Option<Envelope>,
    pub loop_enabled: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct TimeEnvState {
    pub x: f64,
    pub finished: bool,
}

impl TimeEnvState {
    pub fn new() -> Self {
        TimeEnvState { x: 0.0, finished: false }
    }

    pub fn reset(&mut self) {
        self.x = 0.0;
        self.finished = false;
    }
}

impl Default for TimeEnvState {
    fn default() -> Self {
        Self::new()
    }
}

/// Advance one frame, returning the value *before* advancing (so the first
/// call returns the envelope's starting value).
pub fn step(state: &mut TimeEnvState, cfg: &TimeEnvConfig, stretch_cents: f64, held: bool, audio_rate: i32) -> f64 {
    let Some(env) = &cfg.envelope else {
        state.finished = true;
        return 0.0;
    };
    let (lo, hi) = env.x_range();
    if state.finished {
        return env.value_at(hi);
    }

    let value = env.value_at(state.x.max(lo));

    let clamped_cents = stretch_cents.clamp(-STRETCH_CLAMP_CENTS, STRETCH_CLAMP_CENTS);
    let rate_mult = 2f64.powf(clamped_cents / 1200.0);
    state.x += rate_mult / audio_rate as f64;

    if cfg.loop_enabled && held {
        if let Some((ls, le)) = env.loop_range() {
            let (loop_start_x, loop_end_x) = (env.node(ls).0, env.node(le).0);
            if loop_end_x > loop_start_x && state.x >= loop_end_x {
                state.x = loop_start_x + (state.x - loop_end_x);
            }
        }
    }

    if state.x >= hi {
        state.finished = true;
    }

    value
}

pub fn is_finished(state: &TimeEnvState) -> bool {
    state.finished
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::envelope::Interpolation;

    #[test]
    fn finishes_at_last_node() {
        let env = Envelope::new(vec![(0.0, 0.0), (1.0, 1.0)], Interpolation::Linear).unwrap();
        let cfg = TimeEnvConfig { envelope: Some(env), loop_enabled: false };
        let mut state = TimeEnvState::new();
        for _ in 0..48000 {
            step(&mut state, &cfg, 0.0, true, 48000);
        }
        assert!(is_finished(&state));
    }

    #[test]
    fn loops_while_held_then_exits_when_released() {
        let mut env = Envelope::new(vec![(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)], Interpolation::Linear).unwrap();
        env.set_loop(0, 1).unwrap();
        let cfg = TimeEnvConfig { envelope: Some(env), loop_enabled: true };
        let mut state = TimeEnvState::new();
        for _ in 0..48000 * 3 {
            step(&mut state, &cfg, 0.0, true, 48000);
        }
        assert!(!is_finished(&state));
        for _ in 0..48000 * 2 {
            step(&mut state, &cfg, 0.0, false, 48000);
        }
        assert!(is_finished(&state));
    }
}
