//! Per-channel carried state: pitch/force/stream controls a note-on can
//! inherit, plus the channel's foreground voice group and local RNG.

use crate::control::{Lfo, LinearControl, Slider};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct CarriedPitch {
    pub current_cents: f64,
    pub orig_carried_cents: f64,
    pub slide: Slider,
    pub vibrato: Lfo,
    pub carry: bool,
}

impl CarriedPitch {
    fn new() -> Self {
        CarriedPitch { current_cents: 0.0, orig_carried_cents: 0.0, slide: Slider::new(0.0), vibrato: Lfo::new(), carry: false }
    }
}

#[derive(Debug, Clone)]
pub struct CarriedForce {
    pub force_db: f64,
    pub slide: Slider,
    pub tremolo: Lfo,
    pub carry: bool,
}

impl CarriedForce {
    fn new() -> Self {
        CarriedForce { force_db: 0.0, slide: Slider::new(0.0), tremolo: Lfo::new(), carry: false }
    }
}

#[derive(Debug, Clone)]
pub struct CarriedStream {
    pub control: LinearControl,
    pub carry: bool,
}

#[derive(Debug, Clone)]
pub struct ChannelState {
    pub audio_unit_index: Option<u32>,
    pub foreground_group: u64,
    pub pitch: CarriedPitch,
    pub force: CarriedForce,
    pub streams: HashMap<String, CarriedStream>,
    pub test_output_channel: Option<usize>,
    rng: fastrand::Rng,
}

impl ChannelState {
    pub fn new(seed: u64) -> Self {
        ChannelState {
            audio_unit_index: None,
            foreground_group: 0,
            pitch: CarriedPitch::new(),
            force: CarriedForce::new(),
            streams: HashMap::new(),
            test_output_channel: None,
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    pub fn reset(&mut self, seed: u64) {
        *self = ChannelState::new(seed);
    }

    /// Derive a deterministic per-note seed from the channel RNG, mixing
    /// in a disambiguating tag (e.g. `"np0"` for the 0th spawned
    /// processor) the way `voice_seed = rng(seed, "np<i>")` is described
    /// in §4.7.
    pub fn derive_seed(&mut self, tag: &str) -> u64 {
        let base = self.rng.u64(..);
        mix_seed(base, tag)
    }
}

/// Deterministically mix a seed with a disambiguating tag, e.g. to derive
/// `voice_seed = rng(note_seed, "np<i>")` (§4.7 step 6) from a note-level
/// seed already drawn from the channel RNG, without consuming more of that
/// RNG's state per voice.
pub fn mix_seed(base: u64, tag: &str) -> u64 {
    splitmix(base ^ fnv1a(tag.as_bytes()))
}

fn splitmix(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_seed_is_deterministic_for_a_fixed_channel_seed() {
        let mut a = ChannelState::new(42);
        let mut b = ChannelState::new(42);
        assert_eq!(a.derive_seed("np0"), b.derive_seed("np0"));
    }

    #[test]
    fn different_tags_produce_different_seeds() {
        let mut ch = ChannelState::new(1);
        let a = ch.derive_seed("np0");
        let b = ch.derive_seed("np1");
        assert_ne!(a, b);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut ch = ChannelState::new(1);
        ch.foreground_group = 7;
        ch.reset(1);
        assert_eq!(ch.foreground_group, 0);
    }
}
